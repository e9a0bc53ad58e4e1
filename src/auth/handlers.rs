// HTTP handlers for authentication endpoints

use axum::{extract::State, http::StatusCode, Json};
use serde_json::json;
use validator::Validate;

use crate::auth::{
    error::AuthError,
    middleware::AuthenticatedUser,
    models::{
        AuthResponse, LoginRequest, LogoutRequest, RefreshRequest, RefreshResponse,
        RegisterRequest, UserResponse,
    },
};
use crate::AppState;

fn validation_message(errors: &validator::ValidationErrors) -> String {
    errors
        .field_errors()
        .iter()
        .map(|(field, _)| format!("invalid field '{}'", field))
        .collect::<Vec<_>>()
        .join(", ")
}

/// POST /api/auth/register
pub async fn register_handler(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<UserResponse>), AuthError> {
    request
        .validate()
        .map_err(|e| AuthError::ValidationError(validation_message(&e)))?;

    let user = state
        .auth
        .register(&request.name, &request.email, &request.password, request.address)
        .await?;
    Ok((StatusCode::CREATED, Json(user)))
}

/// POST /api/auth/login
pub async fn login_handler(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, AuthError> {
    request
        .validate()
        .map_err(|e| AuthError::ValidationError(validation_message(&e)))?;

    let response = state.auth.login(&request.email, &request.password).await?;
    Ok(Json(response))
}

/// POST /api/auth/refresh
pub async fn refresh_handler(
    State(state): State<AppState>,
    Json(request): Json<RefreshRequest>,
) -> Result<Json<RefreshResponse>, AuthError> {
    let access_token = state.auth.refresh(&request.refresh_token).await?;
    Ok(Json(RefreshResponse { access_token }))
}

/// POST /api/auth/logout
///
/// Always answers success; revocation is best-effort.
pub async fn logout_handler(
    State(state): State<AppState>,
    Json(request): Json<LogoutRequest>,
) -> Json<serde_json::Value> {
    state
        .auth
        .logout(&request.access_token, request.refresh_token.as_deref())
        .await;
    Json(json!({ "message": "Logged out" }))
}

/// GET /api/auth/me (protected)
pub async fn me_handler(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<Json<UserResponse>, AuthError> {
    let response = state.auth.current_user(user.user_id).await?;
    Ok(Json(response))
}

/// GET /api/admin/users (admin only)
pub async fn list_users_handler(
    State(state): State<AppState>,
) -> Result<Json<Vec<UserResponse>>, AuthError> {
    let users = state.auth.list_users().await?;
    Ok(Json(users))
}
