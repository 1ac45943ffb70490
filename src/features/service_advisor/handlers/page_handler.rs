use std::sync::Arc;

use axum::{
    extract::{Query, State},
    response::{Html, IntoResponse, Redirect, Response},
};
use minijinja::context;
use serde::Deserialize;

use crate::core::error::AppError;
use crate::features::auth::token::{resolve_token, TokenQuery};
use crate::features::auth::JwtValidator;
use crate::modules::session::{Session, SESSION_FIRST_NAME_KEY, SESSION_LAST_NAME_KEY};
use crate::shared::constants::ADVISOR_LOGIN_PATH;
use crate::shared::templates::render_template;

const DEFAULT_USER_NAME: &str = "Service Advisor";

#[derive(Debug, Default, Deserialize)]
pub struct LoginQuery {
    pub error: Option<String>,
}

fn login_redirect(error: &str) -> Response {
    Redirect::to(&format!("{}?error={}", ADVISOR_LOGIN_PATH, error)).into_response()
}

fn render(template: &str, ctx: minijinja::Value) -> Response {
    match render_template(template, ctx) {
        Ok(html) => Html(html).into_response(),
        Err(e) => AppError::Internal(e.to_string()).into_response(),
    }
}

/// Name shown in the dashboard header: session first, then token claims
fn user_name(session: &Session, claims: Option<(String, String)>) -> String {
    if let (Some(first), Some(last)) = (
        session.get(SESSION_FIRST_NAME_KEY),
        session.get(SESSION_LAST_NAME_KEY),
    ) {
        return format!("{} {}", first, last);
    }

    match claims {
        Some((first, last)) => {
            session.insert(SESSION_FIRST_NAME_KEY, first.as_str());
            session.insert(SESSION_LAST_NAME_KEY, last.as_str());
            format!("{} {}", first, last)
        }
        None => DEFAULT_USER_NAME.to_string(),
    }
}

/// Dashboard page. Browsers arrive with `?token=` once; afterwards the
/// session carries the token.
pub async fn dashboard(
    State(validator): State<Arc<JwtValidator>>,
    session: Session,
    Query(query): Query<TokenQuery>,
) -> Response {
    tracing::info!("Accessing service advisor dashboard");

    let Some(token) = resolve_token(query.token.as_deref(), None, &session) else {
        tracing::warn!("No valid token found, redirecting to login");
        return login_redirect("session_expired");
    };

    let user = match validator.validate_token(&token.token) {
        Ok(user) => user,
        Err(e) => {
            tracing::warn!("Dashboard token rejected ({:?}): {}", token.source, e);
            session.destroy();
            return login_redirect("invalid_token");
        }
    };

    if !user.has_staff_access() {
        tracing::warn!("User {} lacks service advisor access", user.user_id);
        return login_redirect("access_denied");
    }

    let claims = user.first_name.clone().zip(user.last_name.clone());
    let user_name = user_name(&session, claims);

    render(
        "service_advisor/dashboard.html",
        context! { user_name => user_name },
    )
}

pub async fn login_page(Query(query): Query<LoginQuery>) -> Response {
    let error = query.error.as_deref().map(|code| match code {
        "session_expired" => "Your session has expired. Please sign in again.",
        "invalid_token" => "Your sign-in link is invalid or has expired.",
        "access_denied" => "This account does not have service advisor access.",
        _ => "Please sign in to continue.",
    });

    render("service_advisor/login.html", context! { error => error })
}

pub async fn logout(session: Session) -> Response {
    session.destroy();
    Redirect::to(ADVISOR_LOGIN_PATH).into_response()
}

#[cfg(test)]
mod tests {
    use axum::http::{header, StatusCode};
    use axum_test::TestResponse;
    use std::sync::Arc;

    use crate::shared::constants::{ROLE_CUSTOMER, ROLE_SERVICE_ADVISOR};
    use crate::shared::test_helpers::{
        advisor_server, bearer, issue_token, issue_token_with_names, session_cookie,
        InMemoryStore,
    };

    const DASHBOARD: &str = "/serviceAdvisor/dashboard";

    fn location(response: &TestResponse) -> String {
        response
            .headers()
            .get(header::LOCATION)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string()
    }

    #[tokio::test]
    async fn test_dashboard_without_token_redirects() {
        let server = advisor_server(&Arc::new(InMemoryStore::default()));

        let response = server.get(DASHBOARD).await;

        assert_eq!(response.status_code(), StatusCode::SEE_OTHER);
        assert_eq!(
            location(&response),
            "/serviceAdvisor/login?error=session_expired"
        );
    }

    #[tokio::test]
    async fn test_dashboard_ignores_authorization_header() {
        let server = advisor_server(&Arc::new(InMemoryStore::default()));
        let token = issue_token(1, &[ROLE_SERVICE_ADVISOR]);

        let response = server
            .get(DASHBOARD)
            .add_header(header::AUTHORIZATION, bearer(&token))
            .await;

        assert_eq!(
            location(&response),
            "/serviceAdvisor/login?error=session_expired"
        );
    }

    #[tokio::test]
    async fn test_dashboard_invalid_token_redirects() {
        let server = advisor_server(&Arc::new(InMemoryStore::default()));

        let response = server
            .get(DASHBOARD)
            .add_query_param("token", "expired-or-forged")
            .await;

        assert_eq!(response.status_code(), StatusCode::SEE_OTHER);
        assert_eq!(
            location(&response),
            "/serviceAdvisor/login?error=invalid_token"
        );
        assert!(session_cookie(&response).is_none());
    }

    #[tokio::test]
    async fn test_dashboard_denies_customers() {
        let server = advisor_server(&Arc::new(InMemoryStore::default()));

        let response = server
            .get(DASHBOARD)
            .add_query_param("token", &issue_token(7, &[ROLE_CUSTOMER]))
            .await;

        assert_eq!(
            location(&response),
            "/serviceAdvisor/login?error=access_denied"
        );
    }

    #[tokio::test]
    async fn test_dashboard_greets_user_and_keeps_session() {
        let server = advisor_server(&Arc::new(InMemoryStore::default()));
        let token = issue_token_with_names(3, &[ROLE_SERVICE_ADVISOR], "Ravi", "Kumar");

        let first = server.get(DASHBOARD).add_query_param("token", &token).await;

        assert_eq!(first.status_code(), StatusCode::OK);
        assert!(first.text().contains("Welcome, Ravi Kumar"));
        let cookie = session_cookie(&first).expect("session cookie");

        let second = server.get(DASHBOARD).add_header(header::COOKIE, cookie).await;

        assert_eq!(second.status_code(), StatusCode::OK);
        assert!(second.text().contains("Welcome, Ravi Kumar"));
    }

    #[tokio::test]
    async fn test_dashboard_switches_user_on_new_link() {
        let server = advisor_server(&Arc::new(InMemoryStore::default()));
        let first = issue_token_with_names(3, &[ROLE_SERVICE_ADVISOR], "Ravi", "Kumar");
        let second = issue_token_with_names(4, &[ROLE_SERVICE_ADVISOR], "Asha", "Menon");

        let login = server.get(DASHBOARD).add_query_param("token", &first).await;
        let cookie = session_cookie(&login).expect("session cookie");

        let switched = server
            .get(DASHBOARD)
            .add_query_param("token", &second)
            .add_header(header::COOKIE, cookie)
            .await;

        assert_eq!(switched.status_code(), StatusCode::OK);
        let html = switched.text();
        assert!(html.contains("Welcome, Asha Menon"));
        assert!(!html.contains("Ravi Kumar"));
    }

    #[tokio::test]
    async fn test_dashboard_default_name() {
        let server = advisor_server(&Arc::new(InMemoryStore::default()));
        let token = issue_token(3, &[ROLE_SERVICE_ADVISOR]);

        let response = server.get(DASHBOARD).add_query_param("token", &token).await;

        assert_eq!(response.status_code(), StatusCode::OK);
        assert!(response.text().contains("Welcome, Service Advisor"));
    }

    #[tokio::test]
    async fn test_login_page_shows_error_message() {
        let server = advisor_server(&Arc::new(InMemoryStore::default()));

        let plain = server.get("/serviceAdvisor/login").await;
        assert_eq!(plain.status_code(), StatusCode::OK);
        assert!(!plain.text().contains("class=\"error\""));

        let expired = server
            .get("/serviceAdvisor/login")
            .add_query_param("error", "session_expired")
            .await;
        assert!(expired.text().contains("Your session has expired"));
    }

    #[tokio::test]
    async fn test_logout_ends_session() {
        let server = advisor_server(&Arc::new(InMemoryStore::default()));
        let token = issue_token(3, &[ROLE_SERVICE_ADVISOR]);

        let login = server.get(DASHBOARD).add_query_param("token", &token).await;
        let cookie = session_cookie(&login).expect("session cookie");

        let logout = server
            .post("/serviceAdvisor/logout")
            .add_header(header::COOKIE, cookie.clone())
            .await;
        assert_eq!(logout.status_code(), StatusCode::SEE_OTHER);
        assert_eq!(location(&logout), "/serviceAdvisor/login");

        let after = server.get(DASHBOARD).add_header(header::COOKIE, cookie).await;
        assert_eq!(
            location(&after),
            "/serviceAdvisor/login?error=session_expired"
        );
    }
}
