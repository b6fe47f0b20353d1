//! Auth routes for signup, login, session info, profile, and verification.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post, put};
use axum::{Extension, Json, Router, extract::Query, extract::State, middleware};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

use crate::auth::jwt::JwtService;
use crate::auth::middleware::AuthMiddleware;
use crate::auth::models::{
    AuthUser, LoginRequest, ProfileUpdateRequest, SignupRequest, TokenResponse,
};
use crate::auth::password::{hash_password, verify_dummy, verify_password};
use crate::database::models::{NewAccount, ProfilePatch, UserProfile, VerifyOutcome};
use crate::error::ApiError;
use crate::server::AppState;
use crate::validation::{validate_login, validate_signup};

pub async fn signup(
    State(state): State<AppState>,
    Json(payload): Json<SignupRequest>,
) -> Result<Json<TokenResponse>, ApiError> {
    let email = payload.email.trim().to_lowercase();

    let errors = validate_signup(&email, &payload.password, &payload.full_name);
    if !errors.is_empty() {
        return Err(ApiError::Validation(errors));
    }

    let password_hash = hash_password(&payload.password).map_err(ApiError::Internal)?;
    let verification_token = Uuid::new_v4().simple().to_string();

    // The unique index on email decides duplicates; no read-before-write.
    let account = state
        .store
        .create(NewAccount {
            id: Uuid::new_v4(),
            email,
            password_hash,
            full_name: payload.full_name.trim().to_string(),
            company: payload.company.filter(|c| !c.trim().is_empty()),
            phone: payload.phone.filter(|p| !p.trim().is_empty()),
            verification_token: verification_token.clone(),
        })
        .await?;

    tracing::info!("account created: {}", account.id);
    state
        .mailer
        .send_verification(&account.email, &verification_token);

    let access_token = state
        .jwt_service
        .create_token(account.id, account.email.clone())
        .map_err(ApiError::Internal)?;

    Ok(Json(TokenResponse::new(access_token, account.profile())))
}

pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<TokenResponse>, ApiError> {
    let email = payload.email.trim().to_lowercase();

    let errors = validate_login(&email, &payload.password);
    if !errors.is_empty() {
        return Err(ApiError::Validation(errors));
    }

    // Unknown email and wrong password converge on the same response so the
    // endpoint cannot be used to enumerate accounts.
    let account = match state.store.find_by_email(&email).await? {
        Some(account) => account,
        None => {
            verify_dummy(&payload.password);
            return Err(ApiError::AuthenticationFailed);
        }
    };

    if !verify_password(&payload.password, &account.password_hash) {
        return Err(ApiError::AuthenticationFailed);
    }

    let access_token = state
        .jwt_service
        .create_token(account.id, account.email.clone())
        .map_err(ApiError::Internal)?;

    tracing::debug!("login succeeded for account {}", account.id);
    Ok(Json(TokenResponse::new(access_token, account.profile())))
}

/// Fresh profile for the authenticated account. The store lookup is
/// authoritative: a verified token for a since-removed account is a 404.
pub async fn me(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> Result<Json<UserProfile>, ApiError> {
    let account = state
        .store
        .find_by_id(auth_user.id)
        .await?
        .ok_or(ApiError::NotFound("User"))?;
    Ok(Json(account.profile()))
}

pub async fn update_profile(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Json(payload): Json<ProfileUpdateRequest>,
) -> Result<Json<UserProfile>, ApiError> {
    let patch = ProfilePatch {
        full_name: payload.full_name.filter(|n| !n.trim().is_empty()),
        company: payload.company,
        phone: payload.phone,
    };
    let account = state
        .store
        .update_profile(auth_user.id, patch)
        .await?
        .ok_or(ApiError::NotFound("User"))?;
    Ok(Json(account.profile()))
}

/// Stateless logout: the session dies when the client discards its token,
/// so this never fails, authenticated or not.
pub async fn logout() -> Json<serde_json::Value> {
    Json(json!({ "message": "Logged out successfully" }))
}

#[derive(Debug, Deserialize)]
pub struct VerifyEmailQuery {
    pub token: Option<String>,
}

pub async fn verify_email(
    State(state): State<AppState>,
    Query(query): Query<VerifyEmailQuery>,
) -> Result<Response, ApiError> {
    let Some(token) = query.token.filter(|t| !t.is_empty()) else {
        return Ok((
            StatusCode::BAD_REQUEST,
            Json(json!({ "detail": "Verification token is missing" })),
        )
            .into_response());
    };

    let response = match state.store.consume_verification_token(&token).await? {
        VerifyOutcome::Verified => (
            StatusCode::OK,
            Json(json!({ "detail": "Email verified successfully" })),
        ),
        VerifyOutcome::AlreadyVerified => (
            StatusCode::OK,
            Json(json!({ "detail": "Email already verified" })),
        ),
        VerifyOutcome::UnknownToken => (
            StatusCode::BAD_REQUEST,
            Json(json!({ "detail": "Invalid or expired verification token" })),
        ),
    };
    Ok(response.into_response())
}

pub fn create_auth_routes(jwt_service: Arc<JwtService>) -> Router<AppState> {
    let protected = Router::new()
        .route("/auth/me", get(me))
        .route("/auth/profile", put(update_profile))
        .layer(middleware::from_fn_with_state(
            jwt_service,
            AuthMiddleware::require_auth,
        ));

    Router::new()
        .route("/auth/signup", post(signup))
        .route("/auth/login", post(login))
        .route("/auth/logout", post(logout))
        .route("/auth/verify-email", get(verify_email))
        .merge(protected)
}
