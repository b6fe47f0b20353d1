//! Unified API error type and HTTP response mapping.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use std::collections::BTreeMap;
use thiserror::Error;

use crate::database::store::StoreError;

/// Field name -> human message, rendered inline by form UIs.
pub type FieldErrors = BTreeMap<String, String>;

/// Every failure a route handler can surface to a caller.
///
/// The taxonomy is deliberately coarse on the authentication side: a wrong
/// password and an unknown email both map to `AuthenticationFailed`, and all
/// token sub-checks (signature, shape, expiry) map to `InvalidOrExpiredToken`,
/// so responses never reveal which check rejected the request.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("validation failed")]
    Validation(FieldErrors),

    #[error("email already registered")]
    DuplicateEmail,

    #[error("incorrect email or password")]
    AuthenticationFailed,

    #[error("authorization header required")]
    AuthorizationRequired,

    #[error("invalid or expired token")]
    InvalidOrExpiredToken,

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("internal error")]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) | ApiError::DuplicateEmail => StatusCode::BAD_REQUEST,
            ApiError::AuthenticationFailed
            | ApiError::AuthorizationRequired
            | ApiError::InvalidOrExpiredToken => StatusCode::UNAUTHORIZED,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn body(&self) -> serde_json::Value {
        match self {
            ApiError::Validation(errors) => json!({
                "detail": "Validation failed",
                "errors": errors,
            }),
            ApiError::DuplicateEmail => json!({
                "detail": "User with this email already exists",
                "message": "An account with this email already exists. Please use a different email or try logging in.",
            }),
            ApiError::AuthenticationFailed => json!({
                "detail": "Incorrect email or password",
                "message": "The email or password you entered is incorrect. Please try again.",
            }),
            ApiError::AuthorizationRequired => json!({
                "detail": "Authorization header required",
            }),
            ApiError::InvalidOrExpiredToken => json!({
                "detail": "Invalid or expired token",
            }),
            ApiError::NotFound(what) => json!({
                "detail": format!("{what} not found"),
            }),
            // Detail stays in the server log only.
            ApiError::Internal(_) => json!({
                "detail": "Internal server error",
                "message": "An unexpected error occurred. Please try again later.",
            }),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let ApiError::Internal(err) = &self {
            tracing::error!("internal error: {err:#}");
        }
        (self.status_code(), Json(self.body())).into_response()
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::DuplicateEmail => ApiError::DuplicateEmail,
            StoreError::Database(source) => ApiError::Internal(source),
        }
    }
}
