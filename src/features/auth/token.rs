//! Access token resolution for the advisor dashboard.
//!
//! Browsers reach the dashboard with a `?token=` link, API clients send a
//! Bearer header, and follow-up page requests rely on the session. Sources
//! are consulted in exactly that order.

use axum::{
    extract::{FromRef, FromRequestParts, Query},
    http::{header, request::Parts, StatusCode},
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use std::sync::Arc;

use crate::core::error::AppError;
use crate::features::auth::model::AuthenticatedUser;
use crate::features::auth::JwtValidator;
use crate::modules::session::{
    Session, SESSION_FIRST_NAME_KEY, SESSION_LAST_NAME_KEY, SESSION_TOKEN_KEY,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenSource {
    QueryParam,
    AuthorizationHeader,
    Session,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedToken {
    pub token: String,
    pub source: TokenSource,
}

#[derive(Debug, Default, Deserialize)]
pub struct TokenQuery {
    pub token: Option<String>,
}

/// Resolve a token: query parameter > `Authorization: Bearer` > session.
///
/// A query parameter token is also written to the session so later requests
/// without it stay authenticated.
pub fn resolve_token(
    param: Option<&str>,
    auth_header: Option<&str>,
    session: &Session,
) -> Option<ResolvedToken> {
    if let Some(token) = param.filter(|t| !t.is_empty()) {
        tracing::debug!("Using token from parameter");
        if session.get(SESSION_TOKEN_KEY).as_deref() != Some(token) {
            // cached display names belong to the previous token
            session.remove(SESSION_FIRST_NAME_KEY);
            session.remove(SESSION_LAST_NAME_KEY);
            session.insert(SESSION_TOKEN_KEY, token);
        }
        return Some(ResolvedToken {
            token: token.to_string(),
            source: TokenSource::QueryParam,
        });
    }

    if let Some(token) = auth_header.and_then(|h| h.strip_prefix("Bearer ")) {
        if !token.is_empty() {
            tracing::debug!("Using token from Authorization header");
            return Some(ResolvedToken {
                token: token.to_string(),
                source: TokenSource::AuthorizationHeader,
            });
        }
    }

    if let Some(token) = session.get(SESSION_TOKEN_KEY).filter(|t| !t.is_empty()) {
        tracing::debug!("Using token from session");
        return Some(ResolvedToken {
            token,
            source: TokenSource::Session,
        });
    }

    tracing::warn!("No valid token found from any source");
    None
}

/// Extractor for the advisor API: a resolved, valid token belonging to staff.
///
/// Missing or invalid tokens reject with a bare 401 (no body); non-staff
/// users get 403.
pub struct AdvisorAuth {
    pub source: TokenSource,
    pub user: AuthenticatedUser,
}

impl<S> FromRequestParts<S> for AdvisorAuth
where
    S: Send + Sync,
    Arc<JwtValidator>: FromRef<S>,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let session = Session::from_request_parts(parts, state)
            .await
            .map_err(IntoResponse::into_response)?;

        let param = Query::<TokenQuery>::try_from_uri(&parts.uri)
            .ok()
            .and_then(|Query(q)| q.token);
        let auth_header = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok());

        let token = resolve_token(param.as_deref(), auth_header, &session)
            .ok_or_else(|| StatusCode::UNAUTHORIZED.into_response())?;

        let validator = Arc::<JwtValidator>::from_ref(state);
        let user = validator.validate_token(&token.token).map_err(|e| {
            tracing::warn!("Rejected dashboard token ({:?}): {}", token.source, e);
            StatusCode::UNAUTHORIZED.into_response()
        })?;

        if !user.has_staff_access() {
            return Err(
                AppError::Forbidden("Service advisor access required".to_string()).into_response(),
            );
        }

        Ok(Self {
            source: token.source,
            user,
        })
    }
}
