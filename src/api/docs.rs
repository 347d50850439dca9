use crate::api::handlers::{auth, health, users};
use crate::types::{
    CreateUserRequest, LoginRequest, LoginResponse, Role, UpdateUserRequest, UserResponse,
};
use axum::Json;
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};

/// OpenAPI document for the HTTP API.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Usher",
        description = "User management with bearer-token authentication"
    ),
    paths(
        auth::login,
        users::create_user,
        users::list_users,
        users::get_user,
        users::update_user,
        users::delete_user,
        health::health_check,
    ),
    components(schemas(
        Role,
        LoginRequest,
        LoginResponse,
        CreateUserRequest,
        UpdateUserRequest,
        UserResponse,
        health::HealthResponse,
    )),
    modifiers(&BearerAuth),
    tags(
        (name = "auth", description = "Token issuance"),
        (name = "users", description = "User management"),
        (name = "health", description = "Liveness")
    )
)]
pub struct ApiDoc;

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer",
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

/// Serve the generated document as JSON.
pub async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
