use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::Type;
use std::str::FromStr;
use utoipa::ToSchema;

use super::{CustomerProfile, Vehicle};

/// Service request status enum matching database enum
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type, ToSchema)]
#[sqlx(type_name = "service_request_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ServiceRequestStatus {
    New,
    InProgress,
    Completed,
}

impl ServiceRequestStatus {
    /// Completed requests are final; everything else may move freely.
    pub fn can_transition_to(self, next: ServiceRequestStatus) -> bool {
        self != ServiceRequestStatus::Completed || next == ServiceRequestStatus::Completed
    }
}

impl std::fmt::Display for ServiceRequestStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ServiceRequestStatus::New => write!(f, "new"),
            ServiceRequestStatus::InProgress => write!(f, "in_progress"),
            ServiceRequestStatus::Completed => write!(f, "completed"),
        }
    }
}

impl FromStr for ServiceRequestStatus {
    type Err = String;

    /// Accepts wire values as well as display forms such as "In Progress"
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .trim()
            .chars()
            .filter(|c| !matches!(c, ' ' | '_' | '-'))
            .flat_map(char::to_lowercase)
            .collect();

        match normalized.as_str() {
            "new" => Ok(ServiceRequestStatus::New),
            "inprogress" => Ok(ServiceRequestStatus::InProgress),
            "completed" => Ok(ServiceRequestStatus::Completed),
            _ => Err(format!("Unknown service request status: {}", s.trim())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceRequest {
    pub id: i32,
    pub vehicle_id: i32,
    pub service_type: String,
    pub delivery_date: Option<NaiveDate>,
    pub additional_description: Option<String>,
    pub admin_id: Option<i32>,
    pub service_advisor_id: Option<i32>,
    pub status: ServiceRequestStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A service request together with the vehicle, owner and assigned advisor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceRequestDetail {
    pub request: ServiceRequest,
    pub vehicle: Vehicle,
    pub customer: CustomerProfile,
    pub service_advisor_name: Option<String>,
}
