//! Account store abstraction and its PostgreSQL implementation.
//!
//! Route handlers depend on [`AccountStore`] rather than the concrete
//! connection so tests can substitute an in-memory double. Production has
//! exactly one implementation, backed by the pooled Postgres connection.

use async_trait::async_trait;
use thiserror::Error;
use tokio_postgres::error::SqlState;
use uuid::Uuid;

use crate::database::connection::DatabaseConnection;
use crate::database::models::{
    Account, FromRow, NewAccount, NewContact, ProfilePatch, VerifyOutcome,
};

#[derive(Debug, Error)]
pub enum StoreError {
    /// Unique-index violation on the email column. Uniqueness is enforced
    /// by the storage layer itself, not by a preceding read, so concurrent
    /// signups for one identity cannot both succeed.
    #[error("email already registered")]
    DuplicateEmail,

    #[error(transparent)]
    Database(#[from] anyhow::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Durable mapping from account identity to account record.
#[async_trait]
pub trait AccountStore: Send + Sync {
    /// Insert a fresh account; `DuplicateEmail` if the identity exists.
    async fn create(&self, account: NewAccount) -> StoreResult<Account>;

    async fn find_by_email(&self, email: &str) -> StoreResult<Option<Account>>;

    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<Account>>;

    /// Merge the supplied fields into the profile. Email and creation
    /// timestamp are immutable; absent fields keep their stored values.
    async fn update_profile(&self, id: Uuid, patch: ProfilePatch) -> StoreResult<Option<Account>>;

    /// Mark the account carrying this verification token as verified.
    async fn consume_verification_token(&self, token: &str) -> StoreResult<VerifyOutcome>;

    async fn insert_contact(&self, submission: NewContact) -> StoreResult<Uuid>;

    async fn health_check(&self) -> StoreResult<()>;
}

fn db_err(err: tokio_postgres::Error, context: &'static str) -> StoreError {
    if err.code() == Some(&SqlState::UNIQUE_VIOLATION) {
        return StoreError::DuplicateEmail;
    }
    StoreError::Database(anyhow::Error::new(err).context(context))
}

fn pool_err(err: deadpool_postgres::PoolError) -> StoreError {
    StoreError::Database(anyhow::Error::new(err).context("Failed to get DB connection"))
}

#[async_trait]
impl AccountStore for DatabaseConnection {
    async fn create(&self, account: NewAccount) -> StoreResult<Account> {
        let client = self.pool().get().await.map_err(pool_err)?;
        let row = client
            .query_one(
                "INSERT INTO users (id, email, password_hash, full_name, company, phone, verification_token) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7) \
                 RETURNING *",
                &[
                    &account.id,
                    &account.email,
                    &account.password_hash,
                    &account.full_name,
                    &account.company,
                    &account.phone,
                    &account.verification_token,
                ],
            )
            .await
            .map_err(|e| db_err(e, "Failed to insert account"))?;
        Account::from_row(&row).map_err(|e| db_err(e, "Failed to decode inserted account"))
    }

    async fn find_by_email(&self, email: &str) -> StoreResult<Option<Account>> {
        let client = self.pool().get().await.map_err(pool_err)?;
        let row = client
            .query_opt("SELECT * FROM users WHERE email = $1", &[&email])
            .await
            .map_err(|e| db_err(e, "Failed to query account by email"))?;
        row.map(|r| Account::from_row(&r))
            .transpose()
            .map_err(|e| db_err(e, "Failed to decode account row"))
    }

    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<Account>> {
        let client = self.pool().get().await.map_err(pool_err)?;
        let row = client
            .query_opt("SELECT * FROM users WHERE id = $1", &[&id])
            .await
            .map_err(|e| db_err(e, "Failed to query account by id"))?;
        row.map(|r| Account::from_row(&r))
            .transpose()
            .map_err(|e| db_err(e, "Failed to decode account row"))
    }

    async fn update_profile(&self, id: Uuid, patch: ProfilePatch) -> StoreResult<Option<Account>> {
        let client = self.pool().get().await.map_err(pool_err)?;
        let row = client
            .query_opt(
                "UPDATE users SET \
                   full_name = COALESCE($2, full_name), \
                   company = COALESCE($3, company), \
                   phone = COALESCE($4, phone), \
                   updated_at = NOW() \
                 WHERE id = $1 \
                 RETURNING *",
                &[&id, &patch.full_name, &patch.company, &patch.phone],
            )
            .await
            .map_err(|e| db_err(e, "Failed to update profile"))?;
        row.map(|r| Account::from_row(&r))
            .transpose()
            .map_err(|e| db_err(e, "Failed to decode updated account"))
    }

    async fn consume_verification_token(&self, token: &str) -> StoreResult<VerifyOutcome> {
        let client = self.pool().get().await.map_err(pool_err)?;
        let updated = client
            .execute(
                "UPDATE users SET email_verified = TRUE, updated_at = NOW() \
                 WHERE verification_token = $1 AND NOT email_verified",
                &[&token],
            )
            .await
            .map_err(|e| db_err(e, "Failed to mark email verified"))?;
        if updated > 0 {
            return Ok(VerifyOutcome::Verified);
        }
        let row = client
            .query_opt(
                "SELECT id FROM users WHERE verification_token = $1",
                &[&token],
            )
            .await
            .map_err(|e| db_err(e, "Failed to look up verification token"))?;
        Ok(if row.is_some() {
            VerifyOutcome::AlreadyVerified
        } else {
            VerifyOutcome::UnknownToken
        })
    }

    async fn insert_contact(&self, submission: NewContact) -> StoreResult<Uuid> {
        let client = self.pool().get().await.map_err(pool_err)?;
        let id = Uuid::new_v4();
        client
            .execute(
                "INSERT INTO contact_submissions (id, name, email, subject, message, phone) \
                 VALUES ($1, $2, $3, $4, $5, $6)",
                &[
                    &id,
                    &submission.name,
                    &submission.email,
                    &submission.subject,
                    &submission.message,
                    &submission.phone,
                ],
            )
            .await
            .map_err(|e| db_err(e, "Failed to insert contact submission"))?;
        Ok(id)
    }

    async fn health_check(&self) -> StoreResult<()> {
        DatabaseConnection::health_check(self)
            .await
            .map_err(StoreError::Database)
    }
}
