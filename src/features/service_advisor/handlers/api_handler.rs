use std::sync::Arc;

use axum::{extract::State, Json};
use serde_json::{Map, Value};

use crate::core::error::{AppError, Result};
use crate::core::extractor::{AppJson, AppPath};
use crate::features::auth::token::AdvisorAuth;
use crate::features::service_requests::dtos::{ServiceRequestDto, UpdateStatusDto};
use crate::features::service_requests::{AssignmentService, ServiceRequestService};
use crate::shared::types::ApiResponse;

type JsonMap = Map<String, Value>;

/// Requests assigned to the caller that have not been started
#[utoipa::path(
    get,
    path = "/serviceAdvisor/api/new-assignments",
    params(("token" = Option<String>, Query, description = "Access token (alternative to the Authorization header)")),
    responses(
        (status = 200, description = "New assignments", body = ApiResponse<Vec<ServiceRequestDto>>),
        (status = 401, description = "Missing or invalid token (empty body)"),
        (status = 403, description = "Service advisor access required")
    ),
    security(("bearer_auth" = [])),
    tag = "service-advisor"
)]
pub async fn get_new_assignments(
    State(service): State<Arc<AssignmentService>>,
    auth: AdvisorAuth,
) -> Result<Json<ApiResponse<Vec<JsonMap>>>> {
    let requests = service.get_new_service_requests(&auth.user).await?;
    Ok(Json(ApiResponse::list(requests)))
}

/// Requests the caller is currently working on
#[utoipa::path(
    get,
    path = "/serviceAdvisor/api/assigned-services",
    params(("token" = Option<String>, Query, description = "Access token (alternative to the Authorization header)")),
    responses(
        (status = 200, description = "In-progress assignments", body = ApiResponse<Vec<ServiceRequestDto>>),
        (status = 401, description = "Missing or invalid token (empty body)"),
        (status = 403, description = "Service advisor access required")
    ),
    security(("bearer_auth" = [])),
    tag = "service-advisor"
)]
pub async fn get_assigned_services(
    State(service): State<Arc<AssignmentService>>,
    auth: AdvisorAuth,
) -> Result<Json<ApiResponse<Vec<JsonMap>>>> {
    let requests = service.get_assigned_requests(&auth.user).await?;
    Ok(Json(ApiResponse::list(requests)))
}

#[utoipa::path(
    get,
    path = "/serviceAdvisor/api/service-details/{id}",
    params(
        ("id" = i32, Path, description = "Service request ID"),
        ("token" = Option<String>, Query, description = "Access token")
    ),
    responses(
        (status = 200, description = "Service request details", body = ApiResponse<ServiceRequestDto>),
        (status = 401, description = "Missing or invalid token (empty body)"),
        (status = 404, description = "Service request not found")
    ),
    security(("bearer_auth" = [])),
    tag = "service-advisor"
)]
pub async fn get_service_details(
    State(service): State<Arc<ServiceRequestService>>,
    _auth: AdvisorAuth,
    AppPath(request_id): AppPath<i32>,
) -> Result<Json<ApiResponse<JsonMap>>> {
    let dto = service
        .get_service_request_by_id(request_id)
        .await?
        .ok_or_else(|| {
            AppError::NotFound(format!("Service request not found with ID: {}", request_id))
        })?;

    Ok(Json(ApiResponse::success(Some(dto.to_map()), None, None)))
}

#[utoipa::path(
    put,
    path = "/serviceAdvisor/api/update-status/{id}",
    params(
        ("id" = i32, Path, description = "Service request ID"),
        ("token" = Option<String>, Query, description = "Access token")
    ),
    request_body = UpdateStatusDto,
    responses(
        (status = 200, description = "Status updated successfully", body = ApiResponse<ServiceRequestDto>),
        (status = 400, description = "Status missing or unknown"),
        (status = 401, description = "Missing or invalid token (empty body)"),
        (status = 404, description = "Service request not found"),
        (status = 409, description = "Request is already completed")
    ),
    security(("bearer_auth" = [])),
    tag = "service-advisor"
)]
pub async fn update_status(
    State(service): State<Arc<ServiceRequestService>>,
    auth: AdvisorAuth,
    AppPath(request_id): AppPath<i32>,
    AppJson(dto): AppJson<UpdateStatusDto>,
) -> Result<Json<ApiResponse<JsonMap>>> {
    let status = dto
        .status
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| AppError::BadRequest("Status is required".to_string()))?;

    tracing::info!(
        "User {} setting request {} status to {} (token from {:?})",
        auth.user.user_id,
        request_id,
        status,
        auth.source
    );

    let updated = service
        .update_service_request_status(request_id, status)
        .await?;

    Ok(Json(ApiResponse::success(
        Some(updated.to_map()),
        Some("Status updated successfully".to_string()),
        None,
    )))
}

/// Assign a request. Body keys: `serviceAdvisorId` (optional, defaults to the
/// caller) and `status` (optional).
#[utoipa::path(
    post,
    path = "/serviceAdvisor/api/assign-service/{id}",
    params(
        ("id" = i32, Path, description = "Service request ID"),
        ("token" = Option<String>, Query, description = "Access token")
    ),
    responses(
        (status = 200, description = "Service assigned"),
        (status = 400, description = "Invalid assignment"),
        (status = 401, description = "Missing or invalid token (empty body)"),
        (status = 403, description = "Only admins may assign other advisors"),
        (status = 404, description = "Service request not found"),
        (status = 409, description = "Request is already completed")
    ),
    security(("bearer_auth" = [])),
    tag = "service-advisor"
)]
pub async fn assign_service(
    State(service): State<Arc<AssignmentService>>,
    auth: AdvisorAuth,
    AppPath(request_id): AppPath<i32>,
    AppJson(assignment): AppJson<JsonMap>,
) -> Result<Json<ApiResponse<JsonMap>>> {
    let result = service
        .assign_service(request_id, &assignment, &auth.user)
        .await?;

    Ok(Json(ApiResponse::success(Some(result), None, None)))
}
