use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::features::auth;
use crate::features::bills::{dtos as bills_dtos, handlers as bills_handlers};
use crate::features::service_advisor::handlers as advisor_handlers;
use crate::features::service_requests::{dtos as requests_dtos, models as requests_models};
use crate::shared::types::{ApiResponse, Meta};

#[derive(OpenApi)]
#[openapi(
    paths(
        // Auth
        auth::handler::get_me,
        // Bills
        bills_handlers::generate_bill,
        bills_handlers::get_bill,
        bills_handlers::download_bill,
        // Service advisor dashboard API
        advisor_handlers::get_new_assignments,
        advisor_handlers::get_assigned_services,
        advisor_handlers::get_service_details,
        advisor_handlers::update_status,
        advisor_handlers::assign_service,
    ),
    components(
        schemas(
            // Shared
            Meta,
            // Auth
            auth::dto::MeResponseDto,
            auth::model::AuthenticatedUser,
            ApiResponse<auth::dto::MeResponseDto>,
            // Service requests
            requests_models::ServiceRequestStatus,
            requests_dtos::ServiceRequestDto,
            requests_dtos::UpdateStatusDto,
            ApiResponse<requests_dtos::ServiceRequestDto>,
            ApiResponse<Vec<requests_dtos::ServiceRequestDto>>,
            // Bills
            bills_dtos::BillLineItemDto,
            bills_dtos::BillRequestDto,
            bills_dtos::BillLineItemResponseDto,
            bills_dtos::BillResponseDto,
            ApiResponse<bills_dtos::BillResponseDto>,
        )
    ),
    tags(
        (name = "auth", description = "Authenticated user"),
        (name = "bills", description = "Service bills and PDF downloads"),
        (name = "service-advisor", description = "Service advisor dashboard API"),
    ),
    modifiers(&SecurityAddon),
    info(
        title = "Service Center API",
        version = "0.1.0",
        description = "API documentation for the service center backend",
    )
)]
pub struct ApiDoc;

/// Adds Bearer JWT security scheme to OpenAPI spec
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// Modifier to override OpenAPI info from config
pub struct SwaggerInfoModifier {
    pub title: String,
    pub version: String,
    pub description: String,
}

impl Modify for SwaggerInfoModifier {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        openapi.info.title = self.title.clone();
        openapi.info.version = self.version.clone();
        openapi.info.description = Some(self.description.clone());
    }
}
