use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use utoipa::ToSchema;

use crate::features::service_requests::models::{ServiceRequestDetail, ServiceRequestStatus};

/// Flat view of a service request for the advisor dashboard
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ServiceRequestDto {
    pub request_id: i32,
    pub vehicle_id: i32,
    pub vehicle_brand: String,
    pub vehicle_model: String,
    pub registration_number: String,
    pub service_type: String,
    pub delivery_date: Option<NaiveDate>,
    pub additional_description: Option<String>,
    pub admin_id: Option<i32>,
    pub service_advisor_id: Option<i32>,
    pub service_advisor_name: Option<String>,
    pub status: ServiceRequestStatus,
    pub customer_name: String,
    pub customer_id: i32,
    pub membership_status: Option<String>,
    pub customer_email: String,
    pub vehicle_category: Option<String>,
    pub vehicle_name: String,
}

impl ServiceRequestDto {
    /// JSON object projection used in dashboard responses. Absent values are
    /// kept as explicit nulls so every key is always present.
    pub fn to_map(&self) -> Map<String, Value> {
        let mut map = Map::new();
        map.insert("requestId".into(), self.request_id.into());
        map.insert("vehicleId".into(), self.vehicle_id.into());
        map.insert("vehicleBrand".into(), self.vehicle_brand.clone().into());
        map.insert("vehicleModel".into(), self.vehicle_model.clone().into());
        map.insert(
            "registrationNumber".into(),
            self.registration_number.clone().into(),
        );
        map.insert("serviceType".into(), self.service_type.clone().into());
        map.insert(
            "deliveryDate".into(),
            self.delivery_date.map(|d| d.to_string()).into(),
        );
        map.insert(
            "additionalDescription".into(),
            self.additional_description.clone().into(),
        );
        map.insert("adminId".into(), self.admin_id.into());
        map.insert("serviceAdvisorId".into(), self.service_advisor_id.into());
        map.insert(
            "serviceAdvisorName".into(),
            self.service_advisor_name.clone().into(),
        );
        map.insert("status".into(), self.status.to_string().into());
        map.insert("customerName".into(), self.customer_name.clone().into());
        map.insert("customerId".into(), self.customer_id.into());
        map.insert(
            "membershipStatus".into(),
            self.membership_status.clone().into(),
        );
        map.insert("customerEmail".into(), self.customer_email.clone().into());
        map.insert(
            "vehicleCategory".into(),
            self.vehicle_category.clone().into(),
        );
        map.insert("vehicleName".into(), self.vehicle_name.clone().into());
        map
    }
}

impl From<ServiceRequestDetail> for ServiceRequestDto {
    fn from(detail: ServiceRequestDetail) -> Self {
        let vehicle_name = detail.vehicle.display_name();
        let customer_name = detail.customer.user.full_name();

        Self {
            request_id: detail.request.id,
            vehicle_id: detail.vehicle.id,
            vehicle_brand: detail.vehicle.brand,
            vehicle_model: detail.vehicle.model,
            registration_number: detail.vehicle.registration_number,
            service_type: detail.request.service_type,
            delivery_date: detail.request.delivery_date,
            additional_description: detail.request.additional_description,
            admin_id: detail.request.admin_id,
            service_advisor_id: detail.request.service_advisor_id,
            service_advisor_name: detail.service_advisor_name,
            status: detail.request.status,
            customer_name,
            customer_id: detail.customer.id,
            membership_status: detail.customer.membership_status,
            customer_email: detail.customer.user.email,
            vehicle_category: detail.vehicle.category,
            vehicle_name,
        }
    }
}

/// Request body for `PUT /serviceAdvisor/api/update-status/{id}`
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct UpdateStatusDto {
    pub status: Option<String>,
}
