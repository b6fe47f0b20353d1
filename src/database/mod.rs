//! # Database Module
//!
//! PostgreSQL integration via tokio-postgres and deadpool pooling.
//! Includes connection management, the account store, models, and
//! embedded refinery migrations.

pub mod connection;
#[cfg(test)]
pub mod memory;
pub mod migrations;
pub mod models;
pub mod store;

pub use connection::{DatabaseConfig, DatabaseConnection};
pub use store::{AccountStore, StoreError};
