//! # Client Module
//!
//! Session-aware API client for front-end processes: a retry/backoff
//! transport gated by a connectivity probe, and a disk-persisted mirror of
//! the authenticated profile and bearer token.

pub mod cache;
pub mod net;
pub mod session;

pub use cache::{CachedSession, SessionCache};
pub use net::{ClientError, ConnectionStatus, RetryPolicy};
pub use session::{AuthState, SessionClient};
