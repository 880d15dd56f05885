//! Application error handling
//!
//! Converts internal errors to HTTP responses. Client errors use the body
//! shapes API clients already parse:
//! - field validation: `{"field": ["message", ...]}`
//! - credential mismatch: `{"non_field_errors": ["message"]}`
//! - authentication / token problems: `{"detail": "...", "code": "..."}`

use crate::repositories::StoreError;
use accounts_shared::errors::{FieldErrors, NON_FIELD_ERRORS};
use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

pub const NOT_AUTHENTICATED_MESSAGE: &str = "Authentication credentials were not provided.";
pub const NO_ACTIVE_ACCOUNT_MESSAGE: &str = "No active account found with the given credentials";

/// API error type that can be converted to HTTP responses
#[derive(Error, Debug)]
pub enum ApiError {
    /// Malformed, missing or out-of-range input fields
    #[error("Validation error: {0}")]
    Validation(#[from] FieldErrors),

    /// Credentials did not match an active user (legacy token endpoint)
    #[error("Authorization error: {0}")]
    Authorization(String),

    /// A unique field already holds the submitted value
    #[error("Uniqueness error on {field}: {message}")]
    Uniqueness { field: String, message: String },

    /// Credentials did not match an active user (JWT endpoint)
    #[error("No active account")]
    NoActiveAccount,

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("Authentication credentials were not provided")]
    NotAuthenticated,

    #[error("Malformed request body: {0}")]
    MalformedBody(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Internal server error")]
    Internal(#[from] anyhow::Error),

    #[error("Database error")]
    Database(#[from] sqlx::Error),
}

/// Body of errors that are not about specific fields
#[derive(Serialize)]
pub struct DetailResponse {
    pub detail: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<&'static str>,
}

fn detail(status: StatusCode, detail: impl Into<String>, code: Option<&'static str>) -> Response {
    let mut response = (
        status,
        Json(DetailResponse {
            detail: detail.into(),
            code,
        }),
    )
        .into_response();

    if status == StatusCode::UNAUTHORIZED {
        response.headers_mut().insert(
            header::WWW_AUTHENTICATE,
            HeaderValue::from_static("Bearer realm=\"api\""),
        );
    }
    response
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Validation(errors) => (StatusCode::BAD_REQUEST, Json(errors)).into_response(),
            ApiError::Authorization(message) => (
                StatusCode::BAD_REQUEST,
                Json(FieldErrors::single(NON_FIELD_ERRORS, message)),
            )
                .into_response(),
            ApiError::Uniqueness { field, message } => (
                StatusCode::BAD_REQUEST,
                Json(FieldErrors::single(&field, message)),
            )
                .into_response(),
            ApiError::NoActiveAccount => detail(
                StatusCode::UNAUTHORIZED,
                NO_ACTIVE_ACCOUNT_MESSAGE,
                Some("no_active_account"),
            ),
            ApiError::AuthenticationFailed(message) => detail(
                StatusCode::UNAUTHORIZED,
                message,
                Some("authentication_failed"),
            ),
            ApiError::InvalidToken(message) => {
                detail(StatusCode::UNAUTHORIZED, message, Some("token_not_valid"))
            }
            ApiError::NotAuthenticated => detail(
                StatusCode::UNAUTHORIZED,
                NOT_AUTHENTICATED_MESSAGE,
                Some("not_authenticated"),
            ),
            ApiError::MalformedBody(message) => {
                detail(StatusCode::BAD_REQUEST, message, Some("parse_error"))
            }
            ApiError::NotFound(message) => detail(StatusCode::NOT_FOUND, message, Some("not_found")),
            ApiError::Internal(err) => {
                error!("Internal error: {:?}", err);
                detail(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "A server error occurred.",
                    None,
                )
            }
            ApiError::Database(err) => {
                error!("Database error: {:?}", err);
                detail(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "A server error occurred.",
                    None,
                )
            }
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Duplicate(field) => ApiError::Uniqueness {
                field: field.to_string(),
                message: format!("A user with that {} already exists.", field),
            },
            StoreError::NotFound => ApiError::NotFound("Not found.".to_string()),
            StoreError::Database(err) => ApiError::Database(err),
            StoreError::Other(err) => ApiError::Internal(err),
        }
    }
}

/// Result type alias for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
