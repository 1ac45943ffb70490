// =============================================================================
// ROLE CONSTANTS
// =============================================================================

/// Admin role - full access, may assign requests to any advisor
pub const ROLE_ADMIN: &str = "admin";

/// Service advisor role - works assigned service requests and issues bills
pub const ROLE_SERVICE_ADVISOR: &str = "service_advisor";

/// Customer role - may view bills for their own vehicles
pub const ROLE_CUSTOMER: &str = "customer";

// =============================================================================
// ROUTES
// =============================================================================

pub const ADVISOR_LOGIN_PATH: &str = "/serviceAdvisor/login";

/// Public download location of the PDF invoice for a service request
pub fn bill_download_url(request_id: i32) -> String {
    format!("/api/bills/service-request/{}/download", request_id)
}
