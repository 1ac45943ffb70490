mod postgres;

pub use postgres::PgServiceRequestRepository;

use async_trait::async_trait;

use crate::core::error::Result;
use crate::features::service_requests::models::{
    ServiceRequestDetail, ServiceRequestStatus, User,
};

/// Persistence for service requests and the people attached to them
#[async_trait]
pub trait ServiceRequestRepository: Send + Sync {
    async fn find_detail(&self, id: i32) -> Result<Option<ServiceRequestDetail>>;

    async fn list_for_advisor(
        &self,
        advisor_id: i32,
        status: ServiceRequestStatus,
    ) -> Result<Vec<ServiceRequestDetail>>;

    /// Completed requests are never written. Returns `false` when the
    /// request does not exist or is already completed.
    async fn update_status(&self, id: i32, status: ServiceRequestStatus) -> Result<bool>;

    /// Same guard as [`Self::update_status`]
    async fn assign_advisor(
        &self,
        id: i32,
        advisor_id: i32,
        status: ServiceRequestStatus,
    ) -> Result<bool>;

    async fn find_user(&self, id: i32) -> Result<Option<User>>;
}
