use minijinja::context;
use std::sync::Arc;
use validator::Validate;

use crate::core::config::BillingConfig;
use crate::core::error::{AppError, Result};
use crate::features::auth::model::AuthenticatedUser;
use crate::features::bills::dtos::{BillLineItemDto, BillRequestDto, BillResponseDto};
use crate::features::bills::models::{LineItemKind, NewBill, NewBillLineItem};
use crate::features::bills::repository::BillRepository;
use crate::features::bills::services::PdfRenderer;
use crate::features::service_requests::models::ServiceRequestDetail;
use crate::features::service_requests::repository::ServiceRequestRepository;
use crate::modules::email::EmailSender;
use crate::shared::templates::render_template;

pub struct BillService {
    requests: Arc<dyn ServiceRequestRepository>,
    bills: Arc<dyn BillRepository>,
    email: Arc<dyn EmailSender>,
    renderer: PdfRenderer,
    business_name: String,
}

impl BillService {
    pub fn new(
        requests: Arc<dyn ServiceRequestRepository>,
        bills: Arc<dyn BillRepository>,
        email: Arc<dyn EmailSender>,
        billing: &BillingConfig,
    ) -> Self {
        Self {
            requests,
            bills,
            email,
            renderer: PdfRenderer::new(billing),
            business_name: billing.business_name.clone(),
        }
    }

    /// Complete the service request and issue a bill for it.
    ///
    /// Totals are stored exactly as submitted. Mail delivery problems never
    /// fail the call; they only leave `email_sent` false.
    pub async fn generate_bill(
        &self,
        request_id: i32,
        dto: BillRequestDto,
    ) -> Result<BillResponseDto> {
        tracing::info!("Generating bill for service request ID: {}", request_id);

        dto.validate()
            .map_err(|e| AppError::Validation(e.to_string()))?;

        let detail = self.require_request(request_id).await?;
        let send_email = dto.send_email;
        let new_bill = build_new_bill(request_id, dto)?;

        let saved = self.bills.finalize(new_bill).await?;
        let mut response = BillResponseDto::from_parts(&detail, &saved);

        if send_email {
            response.email_sent = self.send_bill_email(&response).await;
            if response.email_sent {
                if let Err(e) = self.bills.set_email_sent(response.bill_id, true).await {
                    tracing::error!(
                        "Failed to record email delivery for bill {}: {}",
                        response.bill_id,
                        e
                    );
                }
            }
        }

        tracing::info!(
            "Bill {} generated for service request {} (email sent: {})",
            response.bill_id,
            request_id,
            response.email_sent
        );

        Ok(response)
    }

    /// Latest bill for a service request. Customers only see bills for their
    /// own vehicles; anything else looks like a missing request.
    pub async fn get_bill_by_service_request(
        &self,
        request_id: i32,
        viewer: &AuthenticatedUser,
    ) -> Result<BillResponseDto> {
        let detail = self.require_request(request_id).await?;

        let owns_vehicle = viewer.is_customer() && detail.customer.user.id == viewer.user_id;
        if !viewer.has_staff_access() && !owns_vehicle {
            tracing::warn!(
                "User {} attempted to read bill of request {}",
                viewer.user_id,
                request_id
            );
            return Err(not_found(request_id));
        }

        let saved = self
            .bills
            .latest_for_request(request_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!(
                    "No bill generated for service request ID: {}",
                    request_id
                ))
            })?;

        Ok(BillResponseDto::from_parts(&detail, &saved))
    }

    pub async fn generate_bill_pdf(
        &self,
        request_id: i32,
        viewer: &AuthenticatedUser,
    ) -> Result<Vec<u8>> {
        let bill = self.get_bill_by_service_request(request_id, viewer).await?;

        self.renderer.render(&bill).map_err(|e| {
            tracing::error!("Error generating bill PDF for request {}: {}", request_id, e);
            AppError::Internal("Failed to generate bill PDF".to_string())
        })
    }

    async fn require_request(&self, request_id: i32) -> Result<ServiceRequestDetail> {
        self.requests
            .find_detail(request_id)
            .await?
            .ok_or_else(|| not_found(request_id))
    }

    async fn send_bill_email(&self, bill: &BillResponseDto) -> bool {
        let subject = format!(
            "{} - Service Bill for {}",
            self.business_name, bill.vehicle_name
        );

        let body = match render_template(
            "email/bill_ready.txt",
            context! {
                customer_name => &bill.customer_name,
                vehicle_name => &bill.vehicle_name,
                registration_number => &bill.registration_number,
                bill_id => bill.bill_id,
                request_id => bill.request_id,
                grand_total => format!("{:.2}", bill.grand_total),
                business_name => &self.business_name,
            },
        ) {
            Ok(body) => body,
            Err(e) => {
                tracing::error!("Failed to render bill email: {}", e);
                return false;
            }
        };

        match self.email.send(&bill.customer_email, &subject, &body).await {
            Ok(()) => true,
            Err(e) => {
                tracing::error!("Failed to send bill email: {}", e);
                false
            }
        }
    }
}

fn not_found(request_id: i32) -> AppError {
    AppError::NotFound(format!("Service request not found with ID: {}", request_id))
}

fn build_new_bill(request_id: i32, dto: BillRequestDto) -> Result<NewBill> {
    let mut items = Vec::with_capacity(dto.materials.len() + dto.labor.len());
    for (kind, rows) in [
        (LineItemKind::Material, dto.materials),
        (LineItemKind::Labor, dto.labor),
    ] {
        for (position, row) in rows.into_iter().enumerate() {
            items.push(line_item(kind, position, row)?);
        }
    }

    Ok(NewBill {
        request_id,
        materials_total: dto.materials_total,
        labor_total: dto.labor_total,
        subtotal: dto.subtotal,
        gst: dto.gst,
        grand_total: dto.grand_total,
        notes: dto.notes.filter(|n| !n.trim().is_empty()),
        items,
    })
}

fn line_item(kind: LineItemKind, position: usize, row: BillLineItemDto) -> Result<NewBillLineItem> {
    let total = row.quantity.checked_mul(row.unit_price).ok_or_else(|| {
        AppError::Validation(format!("Line item '{}' total is out of range", row.description))
    })?;

    Ok(NewBillLineItem {
        kind,
        position: i32::try_from(position)
            .map_err(|_| AppError::Validation("Too many line items".to_string()))?,
        description: row.description.trim().to_string(),
        quantity: row.quantity,
        unit_price: row.unit_price,
        total,
    })
}
