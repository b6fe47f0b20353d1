// Database Models
//
// Tokio-postgres compatible models for the account store and the
// contact-submission log.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio_postgres::Row;
use uuid::Uuid;

/// Trait for converting from tokio-postgres Row
pub trait FromRow {
    fn from_row(row: &Row) -> Result<Self, tokio_postgres::Error>
    where
        Self: Sized;
}

/// Account record as persisted. The password hash never leaves this type:
/// everything user-facing goes through [`UserProfile`].
#[derive(Debug, Clone)]
pub struct Account {
    pub id: Uuid,
    pub email: String,
    pub password_hash: String,
    pub full_name: String,
    pub company: Option<String>,
    pub phone: Option<String>,
    pub email_verified: bool,
    pub verification_token: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl FromRow for Account {
    fn from_row(row: &Row) -> Result<Self, tokio_postgres::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            email: row.try_get("email")?,
            password_hash: row.try_get("password_hash")?,
            full_name: row.try_get("full_name")?,
            company: row.try_get("company")?,
            phone: row.try_get("phone")?,
            email_verified: row.try_get("email_verified")?,
            verification_token: row.try_get("verification_token")?,
            is_active: row.try_get("is_active")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

impl Account {
    /// Public projection, safe to serialize into responses.
    pub fn profile(&self) -> UserProfile {
        UserProfile {
            id: self.id,
            email: self.email.clone(),
            full_name: self.full_name.clone(),
            company: self.company.clone(),
            phone: self.phone.clone(),
            created_at: self.created_at,
            is_active: self.is_active,
        }
    }
}

/// The `user` object exposed by the API. Excludes the secret hash and the
/// verification token unconditionally.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: Uuid,
    pub email: String,
    pub full_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    pub created_at: DateTime<Utc>,
    pub is_active: bool,
}

/// Insert payload for a fresh account
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub id: Uuid,
    pub email: String,
    pub password_hash: String,
    pub full_name: String,
    pub company: Option<String>,
    pub phone: Option<String>,
    pub verification_token: String,
}

/// Partial profile update; `None` fields keep their stored values.
#[derive(Debug, Clone, Default)]
pub struct ProfilePatch {
    pub full_name: Option<String>,
    pub company: Option<String>,
    pub phone: Option<String>,
}

/// Outcome of consuming an email-verification token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerifyOutcome {
    Verified,
    AlreadyVerified,
    UnknownToken,
}

/// Contact-form submission insert payload
#[derive(Debug, Clone)]
pub struct NewContact {
    pub name: String,
    pub email: String,
    pub subject: String,
    pub message: String,
    pub phone: Option<String>,
}
