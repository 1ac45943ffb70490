use axum::{
    routing::{get, post, put},
    Router,
};

use crate::features::service_advisor::handlers;
use crate::features::service_advisor::state::AdvisorState;

/// Dashboard pages and the JSON API behind them.
///
/// Authentication is resolved per request from the `token` query parameter,
/// the Authorization header or the session, so these routes sit outside the
/// bearer-token middleware but need the session layer.
pub fn routes(state: AdvisorState) -> Router {
    Router::new()
        .route("/serviceAdvisor/dashboard", get(handlers::dashboard))
        .route("/serviceAdvisor/login", get(handlers::login_page))
        .route("/serviceAdvisor/logout", post(handlers::logout))
        .route(
            "/serviceAdvisor/api/new-assignments",
            get(handlers::get_new_assignments),
        )
        .route(
            "/serviceAdvisor/api/assigned-services",
            get(handlers::get_assigned_services),
        )
        .route(
            "/serviceAdvisor/api/service-details/{id}",
            get(handlers::get_service_details),
        )
        .route(
            "/serviceAdvisor/api/update-status/{id}",
            put(handlers::update_status),
        )
        .route(
            "/serviceAdvisor/api/assign-service/{id}",
            post(handlers::assign_service),
        )
        .with_state(state)
}
