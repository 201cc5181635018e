//! Login against the People table and HS256 bearer credentials.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{info, warn};

use crate::config::SecurityConfig;
use crate::engine::{CrudEngine, CrudError};
use crate::store::{column, TableStore};

const PEOPLE: &str = "people";
const LOGIN_FIELD: &str = "Login_Name";
/// Upper bound on credential lifetime (one year)
const MAX_EXPIRY_HOURS: u64 = 24 * 366;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    /// Login name
    pub sub: String,
    pub person_id: Option<i64>,
    pub role: String,
    pub exp: i64,
    pub iat: i64,
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error("{0}")]
    Unauthorized(String),

    #[error("Role '{actual}' is not permitted, '{required}' required")]
    Forbidden { required: String, actual: String },

    #[error("JWT secret not configured")]
    InvalidSecret,

    #[error("JWT generation error: {0}")]
    TokenGeneration(String),

    #[error(transparent)]
    Crud(#[from] CrudError),
}

/// Issued on successful login
#[derive(Debug, Clone, Serialize)]
pub struct Session {
    pub token: String,
    pub user: String,
    pub role: String,
    pub expires_in: i64,
}

#[derive(Debug, Clone)]
pub struct AuthGate {
    secret: String,
    expiry_hours: u64,
}

impl AuthGate {
    pub fn new(secret: impl Into<String>, expiry_hours: u64) -> Self {
        Self {
            secret: secret.into(),
            expiry_hours: expiry_hours.min(MAX_EXPIRY_HOURS),
        }
    }

    pub fn from_config(security: &SecurityConfig) -> Self {
        Self::new(security.jwt_secret.clone(), security.jwt_expiry_hours)
    }

    /// Verify `password` against the bcrypt hash stored for `username` and issue a credential
    pub async fn authenticate(
        &self,
        store: &dyn TableStore,
        username: &str,
        password: &str,
    ) -> Result<Session, AuthError> {
        if username.trim().is_empty() || password.is_empty() {
            return Err(AuthError::InvalidCredentials);
        }

        let rows = CrudEngine::new(store)
            .find_by(PEOPLE, LOGIN_FIELD, Value::from(username))
            .await?;
        let Some(person) = rows.first() else {
            warn!("Login failed: unknown user {}", username);
            return Err(AuthError::InvalidCredentials);
        };

        let stored = column(person, "Password").and_then(Value::as_str).unwrap_or_default();
        // Anything that is not a bcrypt hash (including legacy plaintext) fails verification
        if !bcrypt::verify(password, stored).unwrap_or(false) {
            warn!("Login failed: bad password for {}", username);
            return Err(AuthError::InvalidCredentials);
        }

        let role = column(person, "Role_Description")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let person_id = column(person, "Person_ID").and_then(Value::as_i64);

        let claims = self.claims(username.to_string(), person_id, role.clone());
        let expires_in = claims.exp - claims.iat;
        let token = self.issue(&claims)?;

        info!("User {} logged in with role '{}'", username, role);
        Ok(Session {
            token,
            user: username.to_string(),
            role,
            expires_in,
        })
    }

    pub fn claims(&self, user: String, person_id: Option<i64>, role: String) -> Claims {
        let now = Utc::now();
        let exp = (now + Duration::hours(self.expiry_hours as i64)).timestamp();
        Claims {
            sub: user,
            person_id,
            role,
            exp,
            iat: now.timestamp(),
        }
    }

    pub fn issue(&self, claims: &Claims) -> Result<String, AuthError> {
        if self.secret.is_empty() {
            return Err(AuthError::InvalidSecret);
        }
        let encoding_key = EncodingKey::from_secret(self.secret.as_bytes());
        encode(&Header::default(), claims, &encoding_key).map_err(|e| AuthError::TokenGeneration(e.to_string()))
    }

    /// Validate signature and expiry, returning the embedded claims
    pub fn resolve(&self, token: &str) -> Result<Claims, AuthError> {
        if self.secret.is_empty() {
            return Err(AuthError::InvalidSecret);
        }
        let decoding_key = DecodingKey::from_secret(self.secret.as_bytes());
        decode::<Claims>(token, &decoding_key, &Validation::default())
            .map(|data| data.claims)
            .map_err(|e| AuthError::Unauthorized(format!("Invalid JWT token: {}", e)))
    }

    pub fn resolve_role(&self, token: &str) -> Result<String, AuthError> {
        self.resolve(token).map(|claims| claims.role)
    }
}

/// Exact, case-sensitive role match
pub fn require_role(claims: &Claims, required: &str) -> Result<(), AuthError> {
    if claims.role == required {
        Ok(())
    } else {
        Err(AuthError::Forbidden {
            required: required.to_string(),
            actual: claims.role.clone(),
        })
    }
}
