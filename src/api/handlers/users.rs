//! User management handlers.
//!
//! CRUD over user records. Route access is decided by the route policy before
//! these run; the only check made here is that elevated roles at registration
//! come from an administrator.

use crate::{
    auth::{hash_blocking, middleware::AuthUser},
    types::{
        AppError, CreateUserRequest, NewUser, Result, Role, UpdateUserRequest, UserChanges,
        UserResponse,
    },
    AppState,
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

/// Register a new user
#[utoipa::path(
    post,
    path = "/users",
    request_body = CreateUserRequest,
    responses(
        (status = 201, description = "User created", body = UserResponse),
        (status = 400, description = "Invalid input"),
        (status = 403, description = "Elevated role requested by a non-administrator"),
        (status = 409, description = "Email already in use")
    ),
    tag = "users"
)]
pub async fn create_user(
    State(state): State<AppState>,
    caller: Option<AuthUser>,
    Json(payload): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<UserResponse>)> {
    let email = require_email(&payload.email)?;
    if payload.password.is_empty() {
        return Err(AppError::InvalidInput("Password is required".to_string()));
    }

    let role = Role::parse_optional(payload.role.as_deref())?.unwrap_or_default();
    if role != Role::User {
        let is_admin = caller.is_some_and(|AuthUser(p)| p.role == Role::Admin);
        if !is_admin {
            return Err(AppError::Forbidden(
                "Only administrators can assign elevated roles".to_string(),
            ));
        }
    }

    let password_hash = hash_blocking(&state.password_hasher, &payload.password).await?;
    let user = state
        .store
        .create_user(&NewUser {
            name: payload.name,
            email,
            password_hash,
            role,
        })
        .await?;

    tracing::info!(user_id = user.id, role = %user.role, "user created");
    Ok((StatusCode::CREATED, Json(UserResponse::from(user))))
}

/// List all users
#[utoipa::path(
    get,
    path = "/users",
    responses(
        (status = 200, description = "All users", body = Vec<UserResponse>),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    tag = "users",
    security(("bearer" = []))
)]
pub async fn list_users(State(state): State<AppState>) -> Result<Json<Vec<UserResponse>>> {
    let users = state.store.list_users().await?;
    Ok(Json(users.into_iter().map(UserResponse::from).collect()))
}

/// Get a user by ID
#[utoipa::path(
    get,
    path = "/users/{id}",
    params(
        ("id" = i64, Path, description = "User ID")
    ),
    responses(
        (status = 200, description = "User found", body = UserResponse),
        (status = 404, description = "User not found"),
        (status = 401, description = "Unauthorized")
    ),
    tag = "users",
    security(("bearer" = []))
)]
pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<UserResponse>> {
    state
        .store
        .get_user_by_id(id)
        .await?
        .map(|user| Json(UserResponse::from(user)))
        .ok_or_else(|| not_found(id))
}

/// Update a user (administrators only)
///
/// The password is re-hashed only when a non-empty one is supplied, and the
/// role changes only when a non-empty one is supplied.
#[utoipa::path(
    put,
    path = "/users/{id}",
    params(
        ("id" = i64, Path, description = "User ID")
    ),
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "User updated", body = UserResponse),
        (status = 400, description = "Invalid input"),
        (status = 404, description = "User not found"),
        (status = 409, description = "Email already in use"),
        (status = 403, description = "Forbidden")
    ),
    tag = "users",
    security(("bearer" = []))
)]
pub async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateUserRequest>,
) -> Result<Json<UserResponse>> {
    let email = require_email(&payload.email)?;
    let role = Role::parse_optional(payload.role.as_deref())?;
    let password_hash = match payload.password.as_deref() {
        Some(password) if !password.is_empty() => {
            Some(hash_blocking(&state.password_hasher, password).await?)
        }
        _ => None,
    };

    let user = state
        .store
        .update_user(
            id,
            &UserChanges {
                name: payload.name,
                email,
                password_hash,
                role,
            },
        )
        .await?
        .ok_or_else(|| not_found(id))?;

    tracing::info!(user_id = user.id, role = %user.role, "user updated");
    Ok(Json(UserResponse::from(user)))
}

/// Delete a user (administrators only)
#[utoipa::path(
    delete,
    path = "/users/{id}",
    params(
        ("id" = i64, Path, description = "User ID")
    ),
    responses(
        (status = 200, description = "User deleted"),
        (status = 404, description = "User not found"),
        (status = 403, description = "Forbidden")
    ),
    tag = "users",
    security(("bearer" = []))
)]
pub async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode> {
    if state.store.delete_user(id).await? {
        tracing::info!(user_id = id, "user deleted");
        Ok(StatusCode::OK)
    } else {
        Err(not_found(id))
    }
}

fn require_email(email: &str) -> Result<String> {
    let email = email.trim();
    if email.is_empty() {
        return Err(AppError::InvalidInput("Email is required".to_string()));
    }
    Ok(email.to_string())
}

fn not_found(id: i64) -> AppError {
    AppError::NotFound(format!("User {} not found", id))
}
