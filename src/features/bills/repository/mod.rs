mod postgres;

pub use postgres::PgBillRepository;

use async_trait::async_trait;

use crate::core::error::Result;
use crate::features::bills::models::{BillWithItems, NewBill};

/// Persistence for bills
#[async_trait]
pub trait BillRepository: Send + Sync {
    /// Mark the service request completed (unless it already is) and store the
    /// bill with its line items, atomically
    async fn finalize(&self, bill: NewBill) -> Result<BillWithItems>;

    async fn set_email_sent(&self, bill_id: i64, sent: bool) -> Result<()>;

    /// Most recently generated bill for a service request
    async fn latest_for_request(&self, request_id: i32) -> Result<Option<BillWithItems>>;
}
