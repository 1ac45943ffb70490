use std::sync::Arc;

use axum::{
    extract::State,
    http::header,
    response::{IntoResponse, Response},
    Json,
};

use crate::core::error::Result;
use crate::core::extractor::{AppJson, AppPath};
use crate::features::auth::guards::RequireStaff;
use crate::features::auth::model::AuthenticatedUser;
use crate::features::bills::dtos::{BillRequestDto, BillResponseDto};
use crate::features::bills::services::BillService;
use crate::shared::types::ApiResponse;

/// Generate a bill and mark the service request completed
#[utoipa::path(
    post,
    path = "/api/bills/service-request/{id}",
    params(("id" = i32, Path, description = "Service request ID")),
    request_body = BillRequestDto,
    responses(
        (status = 200, description = "Bill generated", body = ApiResponse<BillResponseDto>),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Service advisor access required"),
        (status = 404, description = "Service request not found")
    ),
    security(("bearer_auth" = [])),
    tag = "bills"
)]
pub async fn generate_bill(
    State(service): State<Arc<BillService>>,
    RequireStaff(user): RequireStaff,
    AppPath(request_id): AppPath<i32>,
    AppJson(dto): AppJson<BillRequestDto>,
) -> Result<Json<ApiResponse<BillResponseDto>>> {
    tracing::debug!("User {} generating bill for {}", user.user_id, request_id);

    let bill = service.generate_bill(request_id, dto).await?;
    Ok(Json(ApiResponse::success(
        Some(bill),
        Some("Bill generated successfully".to_string()),
        None,
    )))
}

/// Get the latest bill for a service request
#[utoipa::path(
    get,
    path = "/api/bills/service-request/{id}",
    params(("id" = i32, Path, description = "Service request ID")),
    responses(
        (status = 200, description = "Bill retrieved", body = ApiResponse<BillResponseDto>),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Service request or bill not found")
    ),
    security(("bearer_auth" = [])),
    tag = "bills"
)]
pub async fn get_bill(
    State(service): State<Arc<BillService>>,
    user: AuthenticatedUser,
    AppPath(request_id): AppPath<i32>,
) -> Result<Json<ApiResponse<BillResponseDto>>> {
    let bill = service
        .get_bill_by_service_request(request_id, &user)
        .await?;
    Ok(Json(ApiResponse::success(Some(bill), None, None)))
}

/// Download the latest bill as a PDF
#[utoipa::path(
    get,
    path = "/api/bills/service-request/{id}/download",
    params(("id" = i32, Path, description = "Service request ID")),
    responses(
        (status = 200, description = "PDF document", content_type = "application/pdf"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Service request or bill not found"),
        (status = 500, description = "Failed to generate bill PDF")
    ),
    security(("bearer_auth" = [])),
    tag = "bills"
)]
pub async fn download_bill(
    State(service): State<Arc<BillService>>,
    user: AuthenticatedUser,
    AppPath(request_id): AppPath<i32>,
) -> Result<Response> {
    let pdf = service.generate_bill_pdf(request_id, &user).await?;

    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"bill-REQ-{}.pdf\"", request_id),
            ),
        ],
        pdf,
    )
        .into_response())
}

#[cfg(test)]
mod tests {
    use axum::http::{header, StatusCode};
    use axum_test::TestServer;
    use serde_json::{json, Value};
    use std::sync::Arc;

    use crate::core::config::BillingConfig;
    use crate::features::auth::model::AuthenticatedUser;
    use crate::features::bills::routes;
    use crate::features::bills::services::BillService;
    use crate::features::service_requests::models::ServiceRequestStatus;
    use crate::shared::constants::{ROLE_CUSTOMER, ROLE_SERVICE_ADVISOR};
    use crate::shared::test_helpers::{
        authenticated, with_user, InMemoryStore, RecordingEmailSender,
    };

    fn server(store: &Arc<InMemoryStore>, user: AuthenticatedUser) -> TestServer {
        let service = Arc::new(BillService::new(
            store.clone(),
            store.clone(),
            Arc::new(RecordingEmailSender::default()),
            &BillingConfig::default(),
        ));
        TestServer::new(with_user(routes::routes(service), user)).unwrap()
    }

    fn payload() -> Value {
        json!({
            "materialsTotal": 1700,
            "laborTotal": 500,
            "subtotal": 2200,
            "gst": 396,
            "grandTotal": 2596,
            "materials": [
                { "description": "Brake Pads", "quantity": 2, "unitPrice": 850 }
            ],
            "labor": [
                { "description": "Brake Service", "quantity": 1, "unitPrice": 500 }
            ]
        })
    }

    #[tokio::test]
    async fn test_staff_can_generate_and_fetch_bill() {
        let store = Arc::new(InMemoryStore::default());
        let advisor = store.add_user(ROLE_SERVICE_ADVISOR);
        let id = store.add_request(ServiceRequestStatus::InProgress, Some(advisor.id));
        let server = server(&store, authenticated(&advisor));
        let path = format!("/api/bills/service-request/{}", id);

        let created = server.post(&path).json(&payload()).await;

        assert_eq!(created.status_code(), StatusCode::OK);
        let body: Value = created.json();
        assert_eq!(body["message"], json!("Bill generated successfully"));
        assert_eq!(body["data"]["requestId"], json!(id));
        assert_eq!(body["data"]["grandTotal"], json!("2596"));
        assert_eq!(body["data"]["emailSent"], json!(false));
        assert_eq!(store.request(id).status, ServiceRequestStatus::Completed);

        let fetched = server.get(&path).await;
        assert_eq!(fetched.status_code(), StatusCode::OK);
        let fetched: Value = fetched.json();
        assert_eq!(fetched["data"]["billId"], body["data"]["billId"]);
    }

    #[tokio::test]
    async fn test_numeric_amounts_are_stored_exactly() {
        let store = Arc::new(InMemoryStore::default());
        let advisor = store.add_user(ROLE_SERVICE_ADVISOR);
        let id = store.add_request(ServiceRequestStatus::InProgress, None);
        let server = server(&store, authenticated(&advisor));
        let raw = r#"{
            "materialsTotal": 12345678901234567.89,
            "laborTotal": 1200.50,
            "subtotal": 12345678901235768.39,
            "gst": 0,
            "grandTotal": 9999999999999999.99
        }"#;

        let response = server
            .post(&format!("/api/bills/service-request/{}", id))
            .content_type("application/json")
            .bytes(raw.as_bytes().to_vec().into())
            .await;

        assert_eq!(response.status_code(), StatusCode::OK);
        let body: Value = response.json();
        assert_eq!(body["data"]["materialsTotal"], json!("12345678901234567.89"));
        assert_eq!(body["data"]["laborTotal"], json!("1200.50"));
        assert_eq!(body["data"]["grandTotal"], json!("9999999999999999.99"));
    }

    #[tokio::test]
    async fn test_customers_cannot_generate_bills() {
        let store = Arc::new(InMemoryStore::default());
        let id = store.add_request(ServiceRequestStatus::InProgress, None);
        let owner = store.request_detail(id).customer.user;
        let server = server(&store, authenticated(&owner));

        let response = server
            .post(&format!("/api/bills/service-request/{}", id))
            .json(&payload())
            .await;

        assert_eq!(response.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(store.request(id).status, ServiceRequestStatus::InProgress);
    }

    #[tokio::test]
    async fn test_generate_rejects_bad_input() {
        let store = Arc::new(InMemoryStore::default());
        let advisor = store.add_user(ROLE_SERVICE_ADVISOR);
        let id = store.add_request(ServiceRequestStatus::InProgress, None);
        let server = server(&store, authenticated(&advisor));

        let mut negative = payload();
        negative["gst"] = json!(-5);
        let invalid = server
            .post(&format!("/api/bills/service-request/{}", id))
            .json(&negative)
            .await;
        assert_eq!(invalid.status_code(), StatusCode::BAD_REQUEST);

        let bad_path = server
            .post("/api/bills/service-request/abc")
            .json(&payload())
            .await;
        assert_eq!(bad_path.status_code(), StatusCode::BAD_REQUEST);

        let missing = server
            .post("/api/bills/service-request/9999")
            .json(&payload())
            .await;
        assert_eq!(missing.status_code(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_get_bill_before_generation() {
        let store = Arc::new(InMemoryStore::default());
        let advisor = store.add_user(ROLE_SERVICE_ADVISOR);
        let id = store.add_request(ServiceRequestStatus::InProgress, None);
        let server = server(&store, authenticated(&advisor));

        let response = server
            .get(&format!("/api/bills/service-request/{}", id))
            .await;

        assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
        let body: Value = response.json();
        assert_eq!(
            body["message"],
            json!(format!("No bill generated for service request ID: {}", id))
        );
    }

    #[tokio::test]
    async fn test_download_returns_pdf_attachment() {
        let store = Arc::new(InMemoryStore::default());
        let advisor = store.add_user(ROLE_SERVICE_ADVISOR);
        let id = store.add_request(ServiceRequestStatus::InProgress, None);
        let server = server(&store, authenticated(&advisor));
        server
            .post(&format!("/api/bills/service-request/{}", id))
            .json(&payload())
            .await;

        let response = server
            .get(&format!("/api/bills/service-request/{}/download", id))
            .await;

        assert_eq!(response.status_code(), StatusCode::OK);
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            "application/pdf"
        );
        assert_eq!(
            response.headers().get(header::CONTENT_DISPOSITION).unwrap(),
            format!("attachment; filename=\"bill-REQ-{}.pdf\"", id).as_str()
        );
        assert!(response.as_bytes().starts_with(b"%PDF"));
    }

    #[tokio::test]
    async fn test_other_customers_cannot_see_bill() {
        let store = Arc::new(InMemoryStore::default());
        let advisor = store.add_user(ROLE_SERVICE_ADVISOR);
        let id = store.add_request(ServiceRequestStatus::InProgress, None);
        let owner = store.request_detail(id).customer.user;
        let stranger = store.add_user(ROLE_CUSTOMER);

        server(&store, authenticated(&advisor))
            .post(&format!("/api/bills/service-request/{}", id))
            .json(&payload())
            .await;

        let path = format!("/api/bills/service-request/{}", id);
        let own = server(&store, authenticated(&owner)).get(&path).await;
        assert_eq!(own.status_code(), StatusCode::OK);

        let other = server(&store, authenticated(&stranger)).get(&path).await;
        assert_eq!(other.status_code(), StatusCode::NOT_FOUND);
    }
}
