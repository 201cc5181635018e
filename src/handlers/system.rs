use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value};

use crate::app::AppState;
use crate::error::ApiError;
use crate::registry::Registry;

/// GET / - service banner with the resource catalogue
pub async fn root() -> Json<Value> {
    let resources: Vec<&str> = Registry::all().iter().map(|r| r.name).collect();

    Json(json!({
        "success": true,
        "message": "Customer Management System API",
        "data": {
            "version": env!("CARGO_PKG_VERSION"),
            "resources": resources,
            "endpoints": {
                "data": "/:resource, /:resource/:id",
                "login": "/login (public - token acquisition)",
                "admin": "/admin (requires manager role)",
            }
        }
    }))
}

/// GET /health - pings the store
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let now = chrono::Utc::now();

    match state.store.ping().await {
        Ok(_) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "message": "ok",
                "data": { "status": "ok", "timestamp": now, "database": "ok" }
            })),
        ),
        Err(e) => {
            tracing::warn!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "success": false,
                    "error": "database unavailable",
                    "data": { "status": "degraded", "timestamp": now }
                })),
            )
        }
    }
}

/// Any unmatched route
pub async fn fallback() -> ApiError {
    ApiError::not_found("Route not found")
}
