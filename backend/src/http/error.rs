//! HTTP error handling and response types.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::auth::AuthError;
use crate::db::repository::RepositoryError;
use crate::services::messages::friendly_message;
use crate::services::validation::FieldError;

/// API error response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    /// Error code for programmatic handling
    pub code: String,
    /// Localized message for display
    pub message: String,
    /// Optional additional details
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    /// Field errors of a rejected form
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<FieldError>,
}

impl ApiError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
            errors: Vec::new(),
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

/// Application error type for HTTP handlers.
#[derive(Debug)]
pub enum AppError {
    /// Resource not found
    NotFound(String),
    /// Invalid request (malformed query or body)
    BadRequest(String),
    /// Missing or invalid session
    Unauthorized(String),
    /// Internal server error
    Internal(String),
    /// Repository error
    Repository(RepositoryError),
    /// Auth service or rate limiter error
    Auth(AuthError),
}

fn repository_response(err: &RepositoryError) -> (StatusCode, ApiError) {
    let message = friendly_message(err);
    let (status, fallback) = match err {
        RepositoryError::NotFound { .. } => (StatusCode::NOT_FOUND, "NOT_FOUND"),
        RepositoryError::ValidationError { .. } => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
        _ => (StatusCode::INTERNAL_SERVER_ERROR, "REPOSITORY_ERROR"),
    };
    let mut body = ApiError::new(err.code().unwrap_or(fallback), message);
    body.details = err.context().details.clone();
    body.errors = err.context().fields.clone();
    (status, body)
}

fn auth_response(err: &AuthError) -> (StatusCode, ApiError) {
    let message = err.to_string();
    match err {
        AuthError::RateLimited { .. } => (
            StatusCode::TOO_MANY_REQUESTS,
            ApiError::new("RATE_LIMITED", message),
        ),
        AuthError::Rejected(_) | AuthError::Unauthorized => (
            StatusCode::UNAUTHORIZED,
            ApiError::new("UNAUTHORIZED", message),
        ),
        AuthError::Connection | AuthError::SignOut => (
            StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::new("AUTH_ERROR", message),
        ),
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error) = match self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, ApiError::new("NOT_FOUND", msg)),
            AppError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, ApiError::new("BAD_REQUEST", msg))
            }
            AppError::Unauthorized(msg) => {
                (StatusCode::UNAUTHORIZED, ApiError::new("UNAUTHORIZED", msg))
            }
            AppError::Internal(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ApiError::new("INTERNAL_ERROR", msg),
            ),
            AppError::Repository(e) => {
                if !matches!(
                    e,
                    RepositoryError::NotFound { .. } | RepositoryError::ValidationError { .. }
                ) {
                    log::error!("Request failed: {}", e);
                }
                repository_response(&e)
            }
            AppError::Auth(e) => auth_response(&e),
        };

        (status, Json(error)).into_response()
    }
}

impl From<RepositoryError> for AppError {
    fn from(err: RepositoryError) -> Self {
        AppError::Repository(err)
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        AppError::Auth(err)
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}
