//! Disk-persisted mirror of the authenticated session.
//!
//! The browser equivalent keeps two local-storage keys, `access_token` and
//! `user`; here both live in one JSON file and are always written and
//! cleared together. The cache is best-effort: it hydrates the UI between
//! process starts, but a live profile fetch supersedes it on every
//! initialization.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

use crate::database::models::UserProfile;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedSession {
    pub access_token: String,
    pub user: UserProfile,
}

#[derive(Debug, Clone)]
pub struct SessionCache {
    path: PathBuf,
}

impl SessionCache {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Read the cached session. A missing file is simply `None`; a corrupt
    /// file is discarded so the next load starts clean.
    pub fn load(&self) -> Option<CachedSession> {
        let bytes = fs::read(&self.path).ok()?;
        match serde_json::from_slice(&bytes) {
            Ok(session) => Some(session),
            Err(e) => {
                tracing::warn!("discarding corrupt session cache: {e}");
                self.clear();
                None
            }
        }
    }

    pub fn store(&self, session: &CachedSession) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create cache directory {parent:?}"))?;
        }
        let bytes = serde_json::to_vec_pretty(session).context("Failed to serialize session")?;
        fs::write(&self.path, bytes)
            .with_context(|| format!("Failed to write session cache {:?}", self.path))
    }

    /// Remove the cached token and profile. Idempotent and unconditional:
    /// clearing must always win, even racing a concurrent refetch.
    pub fn clear(&self) {
        if let Err(e) = fs::remove_file(&self.path) {
            if e.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!("failed to clear session cache: {e}");
            }
        }
    }
}
