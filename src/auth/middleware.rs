//! Authentication Middleware
//!
//! Axum middleware for bearer-token validation and user identity injection.

use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

use crate::auth::{jwt::JwtService, models::AuthUser};
use crate::error::ApiError;

/// Authentication middleware that validates session tokens and injects the
/// account identity into request extensions.
pub struct AuthMiddleware;

impl AuthMiddleware {
    /// Require a valid `Authorization: Bearer <token>` header.
    ///
    /// A missing or malformed header is `AuthorizationRequired`; a token
    /// that fails any verification check is `InvalidOrExpiredToken`. The
    /// two are distinct statuses for the client, but no finer detail leaks.
    pub async fn require_auth(
        State(jwt_service): State<Arc<JwtService>>,
        mut req: Request,
        next: Next,
    ) -> Result<Response, ApiError> {
        let token = extract_bearer(&req).ok_or(ApiError::AuthorizationRequired)?;

        let claims = jwt_service.decode_claims(&token).map_err(|e| {
            tracing::debug!("token rejected: {e:#}");
            ApiError::InvalidOrExpiredToken
        })?;

        let auth_user = AuthUser {
            id: claims.sub,
            email: claims.email,
        };

        req.extensions_mut().insert(auth_user);
        Ok(next.run(req).await)
    }
}

fn extract_bearer(req: &Request) -> Option<String> {
    req.headers()
        .get(header::AUTHORIZATION)
        .and_then(|header| header.to_str().ok())
        .and_then(|auth_header| {
            auth_header
                .strip_prefix("Bearer ")
                .filter(|t| !t.is_empty())
                .map(|t| t.to_string())
        })
}
