use serde_json::{json, Map, Value};
use std::sync::Arc;

use crate::core::error::{AppError, Result};
use crate::features::auth::model::AuthenticatedUser;
use crate::features::service_requests::dtos::ServiceRequestDto;
use crate::features::service_requests::models::ServiceRequestStatus;
use crate::features::service_requests::repository::ServiceRequestRepository;
use super::service_request_service::rejected_write;
use crate::shared::constants::ROLE_SERVICE_ADVISOR;

/// Advisor work queues and request assignment
pub struct AssignmentService {
    repository: Arc<dyn ServiceRequestRepository>,
}

impl AssignmentService {
    pub fn new(repository: Arc<dyn ServiceRequestRepository>) -> Self {
        Self { repository }
    }

    /// Requests assigned to the advisor that have not been started
    pub async fn get_new_service_requests(
        &self,
        advisor: &AuthenticatedUser,
    ) -> Result<Vec<Map<String, Value>>> {
        self.list_projected(advisor.user_id, ServiceRequestStatus::New)
            .await
    }

    /// Requests the advisor is currently working on
    pub async fn get_assigned_requests(
        &self,
        advisor: &AuthenticatedUser,
    ) -> Result<Vec<Map<String, Value>>> {
        self.list_projected(advisor.user_id, ServiceRequestStatus::InProgress)
            .await
    }

    /// Assign a request from a free-form payload.
    ///
    /// Recognised keys: `serviceAdvisorId` (number or numeric string, defaults
    /// to the caller) and `status`. Assigning to another advisor is admin-only.
    pub async fn assign_service(
        &self,
        request_id: i32,
        assignment: &Map<String, Value>,
        caller: &AuthenticatedUser,
    ) -> Result<Map<String, Value>> {
        let advisor_id = match assignment.get("serviceAdvisorId") {
            None | Some(Value::Null) => caller.user_id,
            Some(value) => parse_id(value).ok_or_else(|| {
                AppError::BadRequest("serviceAdvisorId must be a numeric user id".to_string())
            })?,
        };

        let requested_status = match assignment.get("status") {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) if s.trim().is_empty() => None,
            Some(Value::String(s)) => Some(
                s.parse::<ServiceRequestStatus>()
                    .map_err(AppError::BadRequest)?,
            ),
            Some(_) => {
                return Err(AppError::BadRequest("status must be a string".to_string()));
            }
        };

        if advisor_id != caller.user_id && !caller.is_admin() {
            return Err(AppError::Forbidden(
                "Only admins can assign requests to other advisors".to_string(),
            ));
        }

        let advisor = self
            .repository
            .find_user(advisor_id)
            .await?
            .filter(|u| u.role == ROLE_SERVICE_ADVISOR)
            .ok_or_else(|| {
                AppError::BadRequest(format!("User {} is not a service advisor", advisor_id))
            })?;

        let current = self
            .repository
            .find_detail(request_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("Service request not found with ID: {}", request_id))
            })?;

        let status = requested_status.unwrap_or(current.request.status);
        if current.request.status == ServiceRequestStatus::Completed
            || !current.request.status.can_transition_to(status)
        {
            return Err(AppError::Conflict(format!(
                "Service request {} is already completed",
                request_id
            )));
        }

        if !self
            .repository
            .assign_advisor(request_id, advisor.id, status)
            .await?
        {
            return Err(rejected_write(self.repository.as_ref(), request_id).await);
        }

        tracing::info!(
            "Service request {} assigned to advisor {} by user {} (status {})",
            request_id,
            advisor.id,
            caller.user_id,
            status
        );

        let updated = self
            .repository
            .find_detail(request_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("Service request not found with ID: {}", request_id))
            })?;

        let mut result = Map::new();
        result.insert("success".to_string(), json!(true));
        result.insert(
            "message".to_string(),
            json!(format!("Service assigned to {}", advisor.full_name())),
        );
        result.insert(
            "request".to_string(),
            Value::Object(ServiceRequestDto::from(updated).to_map()),
        );
        Ok(result)
    }

    async fn list_projected(
        &self,
        advisor_id: i32,
        status: ServiceRequestStatus,
    ) -> Result<Vec<Map<String, Value>>> {
        let details = self.repository.list_for_advisor(advisor_id, status).await?;
        Ok(details
            .into_iter()
            .map(|d| ServiceRequestDto::from(d).to_map())
            .collect())
    }
}

fn parse_id(value: &Value) -> Option<i32> {
    match value {
        Value::Number(n) => n.as_i64().and_then(|n| i32::try_from(n).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
