use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use utoipa::ToSchema;
use validator::{Validate, ValidationError};

use crate::features::bills::models::{BillLineItem, BillWithItems, LineItemKind};
use crate::features::service_requests::models::ServiceRequestDetail;
use crate::shared::constants::bill_download_url;

/// Reads a JSON number or string into a `Decimal` without passing through `f64`
fn exact_decimal<'de, D>(deserializer: D) -> Result<Decimal, D::Error>
where
    D: Deserializer<'de>,
{
    rust_decimal::serde::arbitrary_precision::deserialize(deserializer)
}

fn non_negative(value: &Decimal) -> Result<(), ValidationError> {
    if value.is_sign_negative() && !value.is_zero() {
        let mut error = ValidationError::new("non_negative");
        error.message = Some("Amount must not be negative".into());
        return Err(error);
    }
    Ok(())
}

fn non_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut error = ValidationError::new("non_blank");
        error.message = Some("Description must not be blank".into());
        return Err(error);
    }
    Ok(())
}

/// One material or labor row entered by the advisor. The row total is
/// computed on the server.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BillLineItemDto {
    #[validate(
        length(max = 200, message = "Description must not exceed 200 characters"),
        custom(function = "non_blank")
    )]
    pub description: String,

    /// Units for materials, hours for labor
    #[validate(custom(function = "non_negative"))]
    #[schema(value_type = String, example = "2")]
    #[serde(deserialize_with = "exact_decimal")]
    pub quantity: Decimal,

    #[validate(custom(function = "non_negative"))]
    #[schema(value_type = String, example = "850.00")]
    #[serde(deserialize_with = "exact_decimal")]
    pub unit_price: Decimal,
}

/// Request DTO for generating a bill
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BillRequestDto {
    #[validate(custom(function = "non_negative"))]
    #[schema(value_type = String, example = "5000.00")]
    #[serde(deserialize_with = "exact_decimal")]
    pub materials_total: Decimal,

    #[validate(custom(function = "non_negative"))]
    #[schema(value_type = String, example = "3000.00")]
    #[serde(deserialize_with = "exact_decimal")]
    pub labor_total: Decimal,

    #[validate(custom(function = "non_negative"))]
    #[schema(value_type = String, example = "8000.00")]
    #[serde(deserialize_with = "exact_decimal")]
    pub subtotal: Decimal,

    #[validate(custom(function = "non_negative"))]
    #[schema(value_type = String, example = "1440.00")]
    #[serde(deserialize_with = "exact_decimal")]
    pub gst: Decimal,

    #[validate(custom(function = "non_negative"))]
    #[schema(value_type = String, example = "9440.00")]
    #[serde(deserialize_with = "exact_decimal")]
    pub grand_total: Decimal,

    #[validate(length(max = 2000, message = "Notes must not exceed 2000 characters"))]
    pub notes: Option<String>,

    /// Mail the bill to the customer after it is saved
    #[serde(default)]
    pub send_email: bool,

    #[serde(default)]
    #[validate(nested)]
    pub materials: Vec<BillLineItemDto>,

    #[serde(default)]
    #[validate(nested)]
    pub labor: Vec<BillLineItemDto>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BillLineItemResponseDto {
    pub description: String,
    #[schema(value_type = String)]
    pub quantity: Decimal,
    #[schema(value_type = String)]
    pub unit_price: Decimal,
    #[schema(value_type = String)]
    pub total: Decimal,
}

impl From<&BillLineItem> for BillLineItemResponseDto {
    fn from(item: &BillLineItem) -> Self {
        Self {
            description: item.description.clone(),
            quantity: item.quantity,
            unit_price: item.unit_price,
            total: item.total,
        }
    }
}

/// Response DTO for a generated bill
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BillResponseDto {
    pub bill_id: i64,
    pub request_id: i32,
    pub vehicle_name: String,
    pub registration_number: String,
    pub customer_name: String,
    pub customer_email: String,
    #[schema(value_type = String)]
    pub materials_total: Decimal,
    #[schema(value_type = String)]
    pub labor_total: Decimal,
    #[schema(value_type = String)]
    pub subtotal: Decimal,
    #[schema(value_type = String)]
    pub gst: Decimal,
    #[schema(value_type = String)]
    pub grand_total: Decimal,
    pub generated_at: DateTime<Utc>,
    pub notes: Option<String>,
    pub download_url: String,
    pub email_sent: bool,
    pub materials: Vec<BillLineItemResponseDto>,
    pub labor: Vec<BillLineItemResponseDto>,
}

impl BillResponseDto {
    pub fn from_parts(detail: &ServiceRequestDetail, saved: &BillWithItems) -> Self {
        let bill = &saved.bill;

        Self {
            bill_id: bill.id,
            request_id: bill.request_id,
            vehicle_name: detail.vehicle.display_name(),
            registration_number: detail.vehicle.registration_number.clone(),
            customer_name: detail.customer.user.full_name(),
            customer_email: detail.customer.user.email.clone(),
            materials_total: bill.materials_total,
            labor_total: bill.labor_total,
            subtotal: bill.subtotal,
            gst: bill.gst,
            grand_total: bill.grand_total,
            generated_at: bill.generated_at,
            notes: bill.notes.clone(),
            download_url: bill_download_url(bill.request_id),
            email_sent: bill.email_sent,
            materials: saved
                .items_of(LineItemKind::Material)
                .map(Into::into)
                .collect(),
            labor: saved.items_of(LineItemKind::Labor).map(Into::into).collect(),
        }
    }
}
