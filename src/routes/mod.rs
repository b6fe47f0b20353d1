// # Routes Module
//
// - This module contains all HTTP route handlers for the Portico server.
// - Routes are organized by functionality into separate submodules.
//
// ## Route Organization
// - Group related endpoints in the same module
// - Register the routes in `server.rs` using the Router

/// Health check and monitoring endpoints
pub mod health;

/// Signup, login, session, and profile endpoints
pub mod auth;

/// Contact-form submission endpoint
pub mod contact;
