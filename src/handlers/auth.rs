use axum::{
    extract::{rejection::JsonRejection, State},
    Extension, Json,
};
use serde::Deserialize;
use serde_json::json;

use crate::app::AppState;
use crate::auth::{require_role, Session};
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: Option<String>,
    pub password: Option<String>,
}

/// POST /login - verify credentials and issue a bearer token
///
/// ```json
/// { "username": "bob", "password": "secret" }
/// ```
pub async fn login(
    State(state): State<AppState>,
    body: Result<Json<LoginRequest>, JsonRejection>,
) -> ApiResult<Session> {
    let Json(request) = body.map_err(|rejection| ApiError::invalid_json(rejection.body_text()))?;

    let (Some(username), Some(password)) = (request.username, request.password) else {
        return Err(ApiError::validation_error("username and password are required", None));
    };

    let session = state
        .auth
        .authenticate(state.store.as_ref(), &username, &password)
        .await?;

    Ok(ApiResponse::success("Login successful", session))
}

/// GET /admin - requires the configured manager role
pub async fn admin(State(state): State<AppState>, Extension(user): Extension<AuthUser>) -> ApiResult<serde_json::Value> {
    require_role(user.claims(), &state.admin_role)?;

    Ok(ApiResponse::success(
        "Welcome to the admin area",
        json!({ "user": user.user, "role": user.role }),
    ))
}
