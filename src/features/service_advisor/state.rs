use axum::extract::FromRef;
use std::sync::Arc;

use crate::features::auth::JwtValidator;
use crate::features::service_requests::{AssignmentService, ServiceRequestService};

/// Shared state for the advisor dashboard routes
#[derive(Clone, FromRef)]
pub struct AdvisorState {
    pub service_requests: Arc<ServiceRequestService>,
    pub assignments: Arc<AssignmentService>,
    pub jwt_validator: Arc<JwtValidator>,
}
