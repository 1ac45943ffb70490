use std::sync::Arc;

use crate::core::error::{AppError, Result};
use crate::features::service_requests::dtos::ServiceRequestDto;
use crate::features::service_requests::models::{ServiceRequestDetail, ServiceRequestStatus};
use crate::features::service_requests::repository::ServiceRequestRepository;

/// Lookup and status changes for single service requests
pub struct ServiceRequestService {
    repository: Arc<dyn ServiceRequestRepository>,
}

impl ServiceRequestService {
    pub fn new(repository: Arc<dyn ServiceRequestRepository>) -> Self {
        Self { repository }
    }

    pub async fn get_service_request_by_id(&self, id: i32) -> Result<Option<ServiceRequestDto>> {
        let detail = self.repository.find_detail(id).await?;
        Ok(detail.map(ServiceRequestDto::from))
    }

    /// Like [`Self::get_service_request_by_id`] but absence is an error
    pub async fn require_detail(&self, id: i32) -> Result<ServiceRequestDetail> {
        self.repository
            .find_detail(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Service request not found with ID: {}", id)))
    }

    pub async fn update_service_request_status(
        &self,
        id: i32,
        status: &str,
    ) -> Result<ServiceRequestDto> {
        let next: ServiceRequestStatus = status.parse().map_err(AppError::BadRequest)?;

        let current = self.require_detail(id).await?;
        let previous = current.request.status;

        if !previous.can_transition_to(next) {
            return Err(AppError::Conflict(format!(
                "Service request {} is {} and cannot move to {}",
                id, previous, next
            )));
        }

        if previous != next && !self.repository.update_status(id, next).await? {
            return Err(rejected_write(self.repository.as_ref(), id).await);
        }

        tracing::info!(
            "Service request {} status changed: {} -> {}",
            id,
            previous,
            next
        );

        let updated = self.require_detail(id).await?;
        Ok(updated.into())
    }
}

/// Explain a guarded write that matched no row: the request is gone, or it
/// was completed after it was read.
pub(crate) async fn rejected_write(repository: &dyn ServiceRequestRepository, id: i32) -> AppError {
    match repository.find_detail(id).await {
        Ok(Some(_)) => {
            tracing::warn!("Service request {} was completed before the update", id);
            AppError::Conflict(format!("Service request {} is already completed", id))
        }
        Ok(None) => AppError::NotFound(format!("Service request not found with ID: {}", id)),
        Err(e) => e,
    }
}
