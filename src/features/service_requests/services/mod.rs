mod assignment_service;
mod service_request_service;

pub use assignment_service::AssignmentService;
pub use service_request_service::ServiceRequestService;
