use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};

use crate::features::bills::handlers;
use crate::features::bills::services::BillService;

/// Bill routes. Mounted behind the bearer-token middleware.
pub fn routes(service: Arc<BillService>) -> Router {
    Router::new()
        .route(
            "/api/bills/service-request/{id}",
            post(handlers::generate_bill).get(handlers::get_bill),
        )
        .route(
            "/api/bills/service-request/{id}/download",
            get(handlers::download_bill),
        )
        .with_state(service)
}
