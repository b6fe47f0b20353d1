//! In-memory [`AccountStore`] double for tests.
//!
//! Implements the same trait as the Postgres store so handler tests can run
//! without a database. Not compiled into production builds.

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use uuid::Uuid;

use crate::database::models::{Account, NewAccount, NewContact, ProfilePatch, VerifyOutcome};
use crate::database::store::{AccountStore, StoreError, StoreResult};

#[derive(Default)]
pub struct MemoryStore {
    accounts: Mutex<Vec<Account>>,
    contacts: Mutex<Vec<(Uuid, NewContact)>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn account_count(&self) -> usize {
        self.accounts.lock().len()
    }

    pub fn contact_count(&self) -> usize {
        self.contacts.lock().len()
    }

    pub fn verification_token_for(&self, email: &str) -> Option<String> {
        self.accounts
            .lock()
            .iter()
            .find(|a| a.email == email)
            .and_then(|a| a.verification_token.clone())
    }
}

#[async_trait]
impl AccountStore for MemoryStore {
    async fn create(&self, account: NewAccount) -> StoreResult<Account> {
        let mut accounts = self.accounts.lock();
        if accounts.iter().any(|a| a.email == account.email) {
            return Err(StoreError::DuplicateEmail);
        }
        let now = Utc::now();
        let record = Account {
            id: account.id,
            email: account.email,
            password_hash: account.password_hash,
            full_name: account.full_name,
            company: account.company,
            phone: account.phone,
            email_verified: false,
            verification_token: Some(account.verification_token),
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        accounts.push(record.clone());
        Ok(record)
    }

    async fn find_by_email(&self, email: &str) -> StoreResult<Option<Account>> {
        Ok(self
            .accounts
            .lock()
            .iter()
            .find(|a| a.email == email)
            .cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<Account>> {
        Ok(self.accounts.lock().iter().find(|a| a.id == id).cloned())
    }

    async fn update_profile(&self, id: Uuid, patch: ProfilePatch) -> StoreResult<Option<Account>> {
        let mut accounts = self.accounts.lock();
        let Some(account) = accounts.iter_mut().find(|a| a.id == id) else {
            return Ok(None);
        };
        if let Some(full_name) = patch.full_name {
            account.full_name = full_name;
        }
        if let Some(company) = patch.company {
            account.company = Some(company);
        }
        if let Some(phone) = patch.phone {
            account.phone = Some(phone);
        }
        account.updated_at = Utc::now();
        Ok(Some(account.clone()))
    }

    async fn consume_verification_token(&self, token: &str) -> StoreResult<VerifyOutcome> {
        let mut accounts = self.accounts.lock();
        let Some(account) = accounts
            .iter_mut()
            .find(|a| a.verification_token.as_deref() == Some(token))
        else {
            return Ok(VerifyOutcome::UnknownToken);
        };
        if account.email_verified {
            return Ok(VerifyOutcome::AlreadyVerified);
        }
        account.email_verified = true;
        account.updated_at = Utc::now();
        Ok(VerifyOutcome::Verified)
    }

    async fn insert_contact(&self, submission: NewContact) -> StoreResult<Uuid> {
        let id = Uuid::new_v4();
        self.contacts.lock().push((id, submission));
        Ok(id)
    }

    async fn health_check(&self) -> StoreResult<()> {
        Ok(())
    }
}
