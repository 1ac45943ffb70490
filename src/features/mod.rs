pub mod auth;
pub mod bills;
pub mod service_advisor;
pub mod service_requests;
