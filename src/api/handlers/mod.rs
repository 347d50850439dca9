//! API request handlers.
//!
//! This module contains all HTTP request handlers organized by functionality.

/// Login handler.
pub mod auth;
/// Liveness probe.
pub mod health;
/// User CRUD handlers.
pub mod users;
