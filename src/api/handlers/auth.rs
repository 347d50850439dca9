use crate::{
    types::{LoginRequest, LoginResponse, Result},
    AppState,
};
use axum::{extract::State, Json};

/// Login with email and password
#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = LoginResponse),
        (status = 401, description = "Invalid credentials")
    ),
    tag = "auth"
)]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<LoginResponse>> {
    let principal = state
        .gate
        .authenticate(&payload.username, &payload.password)
        .await?;

    let token = state.token_service.issue(&principal.email)?;
    tracing::info!(user_id = principal.user_id, "user logged in");

    Ok(Json(LoginResponse { token }))
}
