use super::model::AuthenticatedUser;
use crate::core::error::AppError;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::Deserialize;
use std::time::Duration;

/// Validates HS256 access tokens issued by the identity service
pub struct JwtValidator {
    decoding_key: DecodingKey,
    issuer: Option<String>,
    leeway: u64,
}

#[derive(Debug, Clone, Deserialize)]
struct Claims {
    sub: String,
    #[serde(rename = "exp")]
    _exp: u64,
    #[serde(default)]
    roles: Vec<String>,
    #[serde(default)]
    given_name: Option<String>,
    #[serde(default)]
    family_name: Option<String>,
    #[serde(default)]
    email: Option<String>,
}

impl JwtValidator {
    pub fn new(secret: &str, issuer: Option<String>, leeway: Duration) -> Self {
        Self {
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            issuer,
            leeway: leeway.as_secs(),
        }
    }

    pub fn validate_token(&self, token: &str) -> Result<AuthenticatedUser, AppError> {
        let mut validation = Validation::new(Algorithm::HS256);
        if let Some(issuer) = &self.issuer {
            validation.set_issuer(&[issuer]);
        }
        validation.validate_aud = false;
        validation.leeway = self.leeway;
        validation.validate_nbf = true;

        let token_data = decode::<Claims>(token, &self.decoding_key, &validation)
            .map_err(|e| AppError::Auth(e.to_string()))?;

        let claims = token_data.claims;

        let user_id = claims
            .sub
            .parse::<i32>()
            .map_err(|_| AppError::Auth("Token subject is not a user id".to_string()))?;

        Ok(AuthenticatedUser {
            user_id,
            sub: claims.sub,
            roles: claims.roles,
            first_name: claims.given_name,
            last_name: claims.family_name,
            email: claims.email,
        })
    }
}
