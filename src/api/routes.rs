use crate::{
    auth::middleware::{authenticate_request, enforce_policy},
    types::{AppError, Result},
    utils::toml_config::CorsConfig,
    AppState,
};
use axum::{
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method},
    middleware,
    routing::{get, post},
    Router,
};
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowHeaders, Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};

/// Largest accepted request body.
const MAX_BODY_BYTES: usize = 64 * 1024;

/// Routes plus the authentication and authorization layers.
///
/// The authentication filter wraps the policy check, so every request has its
/// principal resolved before access is decided.
pub fn create_router(state: AppState) -> Router {
    let router = Router::new()
        .route("/auth/login", post(crate::api::handlers::auth::login))
        .route(
            "/users",
            get(crate::api::handlers::users::list_users)
                .post(crate::api::handlers::users::create_user),
        )
        .route(
            "/users/{id}",
            get(crate::api::handlers::users::get_user)
                .put(crate::api::handlers::users::update_user)
                .delete(crate::api::handlers::users::delete_user),
        )
        .route("/health", get(crate::api::handlers::health::health_check));

    #[cfg(feature = "swagger-ui")]
    let router = {
        use utoipa::OpenApi;
        router.merge(
            utoipa_swagger_ui::SwaggerUi::new("/swagger-ui")
                .url("/api-docs/openapi.json", crate::api::docs::ApiDoc::openapi()),
        )
    };
    #[cfg(not(feature = "swagger-ui"))]
    let router = router.route(
        "/api-docs/openapi.json",
        get(crate::api::docs::openapi_json),
    );

    let router = match &state.config.server.static_dir {
        Some(dir) => router.fallback_service(ServeDir::new(dir)),
        None => router,
    };

    router
        .layer(middleware::from_fn_with_state(state.clone(), enforce_policy))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            authenticate_request,
        ))
        .with_state(state)
}

/// Full application: router wrapped in tracing, CORS and body limits.
pub fn create_app(state: AppState) -> Result<Router> {
    let cors = cors_layer(&state.config.cors)?;

    Ok(create_router(state)
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        ))
}

/// Builds the CORS layer from the configured origin list.
pub fn cors_layer(config: &CorsConfig) -> Result<CorsLayer> {
    let base = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .max_age(Duration::from_secs(3600));

    if config.allows_any_origin() {
        // browsers refuse credentials alongside a wildcard origin
        return Ok(base.allow_origin(Any).allow_headers(Any));
    }

    let origins = config
        .origins()
        .iter()
        .map(|origin| {
            HeaderValue::from_str(origin).map_err(|_| {
                AppError::Configuration(format!("Invalid CORS origin: {}", origin))
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(base
        .allow_origin(origins)
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true))
}
