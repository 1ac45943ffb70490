mod store;

pub use store::{Session, SessionStore};

/// Session attribute holding the last token seen for this browser
pub const SESSION_TOKEN_KEY: &str = "jwt-token";
pub const SESSION_FIRST_NAME_KEY: &str = "firstName";
pub const SESSION_LAST_NAME_KEY: &str = "lastName";
