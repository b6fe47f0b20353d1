//! # Authentication Module
//!
//! Handles JWT token issuance, validation, and middleware for securing API
//! endpoints, plus argon2 password hashing for the credential store.

pub mod jwt;
pub mod middleware;
pub mod models;
pub mod password;
