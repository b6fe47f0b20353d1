//! Contact-form submission endpoint.

use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::database::models::NewContact;
use crate::error::ApiError;
use crate::server::AppState;
use crate::validation::validate_contact;

// Serialize as well: the session client submits this same shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContactRequest {
    pub name: String,
    pub email: String,
    pub subject: String,
    pub message: String,
    #[serde(default)]
    pub phone: Option<String>,
}

/// Persist the submission, then notify by email. The notification is
/// fire-and-forget: delivery problems never fail the submission.
pub async fn submit(
    State(state): State<AppState>,
    Json(payload): Json<ContactRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let errors = validate_contact(
        &payload.name,
        &payload.email,
        &payload.subject,
        &payload.message,
    );
    if !errors.is_empty() {
        return Err(ApiError::Validation(errors));
    }

    let submission = NewContact {
        name: payload.name.trim().to_string(),
        email: payload.email.trim().to_lowercase(),
        subject: payload.subject.trim().to_string(),
        message: payload.message,
        phone: payload.phone.filter(|p| !p.trim().is_empty()),
    };

    let submission_id = state.store.insert_contact(submission.clone()).await?;
    state.mailer.send_contact_notification(&submission);

    Ok(Json(json!({
        "message": "Contact form submitted successfully",
        "submission_id": submission_id,
        "status": "success",
    })))
}
