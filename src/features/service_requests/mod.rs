//! Service requests: the vehicle jobs advisors work through
//! `new → in_progress → completed`.

pub mod dtos;
pub mod models;
pub mod repository;
pub mod services;

pub use repository::{PgServiceRequestRepository, ServiceRequestRepository};
pub use services::{AssignmentService, ServiceRequestService};
