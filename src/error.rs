// HTTP API Error Types
use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value};
use std::collections::HashMap;

use crate::auth::AuthError;
use crate::engine::CrudError;
use crate::store::StoreError;

/// HTTP API error with appropriate status codes and client-friendly messages
#[derive(Debug)]
pub enum ApiError {
    // 400 Bad Request
    ValidationError {
        message: String,
        field_errors: Option<HashMap<String, String>>,
    },
    InvalidJson(String),

    // 401 Unauthorized
    Unauthorized(String),

    // 403 Forbidden
    Forbidden(String),

    // 404 Not Found
    NotFound(String),

    // 500 Internal Server Error
    InternalServerError(String),

    // 503 Service Unavailable
    ServiceUnavailable(String),
}

impl ApiError {
    /// Get HTTP status code
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::ValidationError { .. } => StatusCode::BAD_REQUEST,
            ApiError::InvalidJson(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::InternalServerError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    /// Get client-safe error message
    pub fn message(&self) -> &str {
        match self {
            ApiError::ValidationError { message, .. } => message,
            ApiError::InvalidJson(msg) => msg,
            ApiError::Unauthorized(msg) => msg,
            ApiError::Forbidden(msg) => msg,
            ApiError::NotFound(msg) => msg,
            ApiError::InternalServerError(msg) => msg,
            ApiError::ServiceUnavailable(msg) => msg,
        }
    }

    /// Get error code for client handling
    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::ValidationError { .. } => "VALIDATION_ERROR",
            ApiError::InvalidJson(_) => "INVALID_JSON",
            ApiError::Unauthorized(_) => "UNAUTHORIZED",
            ApiError::Forbidden(_) => "FORBIDDEN",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::InternalServerError(_) => "INTERNAL_SERVER_ERROR",
            ApiError::ServiceUnavailable(_) => "SERVICE_UNAVAILABLE",
        }
    }

    /// Convert to JSON response body
    pub fn to_json(&self) -> Value {
        let mut response = json!({
            "success": false,
            "error": self.message(),
            "code": self.error_code()
        });

        if let ApiError::ValidationError {
            field_errors: Some(field_errors),
            ..
        } = self
        {
            response["field_errors"] = json!(field_errors);
        }

        response
    }
}

// Static constructor methods
impl ApiError {
    pub fn validation_error(message: impl Into<String>, field_errors: Option<HashMap<String, String>>) -> Self {
        ApiError::ValidationError {
            message: message.into(),
            field_errors,
        }
    }

    pub fn invalid_json(message: impl Into<String>) -> Self {
        ApiError::InvalidJson(message.into())
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        ApiError::Unauthorized(message.into())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        ApiError::Forbidden(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound(message.into())
    }

    pub fn internal_server_error(message: impl Into<String>) -> Self {
        ApiError::InternalServerError(message.into())
    }

    pub fn service_unavailable(message: impl Into<String>) -> Self {
        ApiError::ServiceUnavailable(message.into())
    }
}

// Convert other error types to ApiError
impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::ConfigMissing(_) => ApiError::service_unavailable("Database temporarily unavailable"),
            StoreError::QueryError(msg) => {
                // Don't expose internal SQL errors to clients
                tracing::error!("Database query error: {}", msg);
                ApiError::internal_server_error("An error occurred while processing your request")
            }
            StoreError::Sqlx(sqlx_err) => {
                // Log the real error but return generic message
                tracing::error!("SQLx error: {}", sqlx_err);
                ApiError::internal_server_error("Database error occurred")
            }
        }
    }
}

impl From<CrudError> for ApiError {
    fn from(err: CrudError) -> Self {
        match err {
            CrudError::UnknownResource(e) => ApiError::not_found(e.to_string()),
            CrudError::Validation { message, field } => {
                let field_errors = field.map(|field| {
                    let mut field_errors = HashMap::new();
                    field_errors.insert(field, message.clone());
                    field_errors
                });
                ApiError::validation_error(message, field_errors)
            }
            e @ CrudError::NotFound { .. } => ApiError::not_found(e.to_string()),
            CrudError::Store(e) => e.into(),
            CrudError::Hash(e) => {
                tracing::error!("Password hashing error: {}", e);
                ApiError::internal_server_error("An error occurred while processing your request")
            }
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            e @ (AuthError::InvalidCredentials | AuthError::Unauthorized(_)) => ApiError::unauthorized(e.to_string()),
            e @ AuthError::Forbidden { .. } => ApiError::forbidden(e.to_string()),
            e @ (AuthError::InvalidSecret | AuthError::TokenGeneration(_)) => {
                tracing::error!("Credential error: {}", e);
                ApiError::internal_server_error("Unable to issue credentials")
            }
            AuthError::Crud(e) => e.into(),
        }
    }
}

// Standard error trait implementations
impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for ApiError {}

// Automatic HTTP response conversion for Axum
impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        (self.status_code(), Json(self.to_json())).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::RegistryError;

    #[test]
    fn maps_crud_errors_to_status() {
        let not_found: ApiError = CrudError::NotFound { label: "Role", id: 999 }.into();
        assert_eq!(not_found.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(not_found.message(), "Role 999 not found");

        let unknown: ApiError = CrudError::UnknownResource(RegistryError::UnknownResource("x".into())).into();
        assert_eq!(unknown.status_code(), StatusCode::NOT_FOUND);

        let store: ApiError = CrudError::Store(StoreError::QueryError("syntax error at or near".into())).into();
        assert_eq!(store.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!store.message().contains("syntax"));
    }

    #[test]
    fn validation_body_names_field() {
        let err: ApiError = CrudError::Validation {
            message: "Missing required field: Country_Code".into(),
            field: Some("Country_Code".into()),
        }
        .into();
        let body = err.to_json();
        assert_eq!(body["success"], false);
        assert_eq!(body["code"], "VALIDATION_ERROR");
        assert_eq!(body["error"], "Missing required field: Country_Code");
        assert!(body["field_errors"].get("Country_Code").is_some());
    }

    #[test]
    fn maps_auth_errors_to_status() {
        let bad: ApiError = AuthError::InvalidCredentials.into();
        assert_eq!(bad.status_code(), StatusCode::UNAUTHORIZED);
        let forbidden: ApiError = AuthError::Forbidden {
            required: "Manager Role".into(),
            actual: "User".into(),
        }
        .into();
        assert_eq!(forbidden.status_code(), StatusCode::FORBIDDEN);
        assert!(forbidden.to_json().get("error").is_some());
    }

    #[test]
    fn client_errors_carry_distinct_codes() {
        let malformed = ApiError::invalid_json("EOF while parsing");
        assert_eq!(malformed.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(malformed.to_json()["code"], "INVALID_JSON");

        let invalid = ApiError::validation_error("No fields to update", None);
        assert_eq!(invalid.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(invalid.to_json()["code"], "VALIDATION_ERROR");
        assert!(invalid.to_json().get("field_errors").is_none());
    }
}
