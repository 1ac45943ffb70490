mod customer;
mod service_request;
mod vehicle;

pub use customer::{CustomerProfile, User};
pub use service_request::{ServiceRequest, ServiceRequestDetail, ServiceRequestStatus};
pub use vehicle::Vehicle;
