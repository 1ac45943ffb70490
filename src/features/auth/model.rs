use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::shared::constants::{ROLE_ADMIN, ROLE_CUSTOMER, ROLE_SERVICE_ADVISOR};

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AuthenticatedUser {
    /// Numeric user id parsed from the `sub` claim
    pub user_id: i32,
    pub sub: String,
    pub roles: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl AuthenticatedUser {
    /// Check if user has a specific role
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }

    pub fn is_admin(&self) -> bool {
        self.has_role(ROLE_ADMIN)
    }

    pub fn is_service_advisor(&self) -> bool {
        self.has_role(ROLE_SERVICE_ADVISOR)
    }

    pub fn is_customer(&self) -> bool {
        self.has_role(ROLE_CUSTOMER)
    }

    /// Staff access covers service advisors and admins
    pub fn has_staff_access(&self) -> bool {
        self.is_admin() || self.is_service_advisor()
    }

    /// "First Last" when both names are known
    pub fn display_name(&self) -> Option<String> {
        match (&self.first_name, &self.last_name) {
            (Some(first), Some(last)) => Some(format!("{} {}", first, last)),
            _ => None,
        }
    }
}
