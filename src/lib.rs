//! # Usher - authenticated user management
//!
//! A small HTTP service that stores user accounts, exchanges credentials for
//! signed bearer tokens, and gates every route behind a declarative
//! role-based policy.
//!
//! ## Overview
//!
//! Usher can be used in two ways:
//!
//! 1. **As a standalone server** - Run the `usher-server` binary
//! 2. **As a library** - Build the router into your own axum application
//!
//! ## Quick Start (Library Usage)
//!
//! ```rust,ignore
//! use usher::{api::routes::create_app, AppState, UsherConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = UsherConfig::load("usher.toml")?;
//!     let state = AppState::from_config(config).await?;
//!     let app = create_app(state)?;
//!
//!     let listener = tokio::net::TcpListener::bind("127.0.0.1:3000").await?;
//!     axum::serve(listener, app).await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `turso` | Remote Turso database |
//! | `swagger-ui` | Interactive API docs at `/swagger-ui` |
//!
//! ## Modules
//!
//! - [`api`] - REST API handlers and routes
//! - [`auth`] - Tokens, password hashing, request authentication and route policy
//! - [`db`] - Credential store abstraction (SQLite, Turso)
//! - [`types`] - Common types and error handling
//! - [`utils`] - TOML configuration

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(rustdoc::missing_crate_level_docs)]

/// HTTP API handlers and routes.
pub mod api;
/// Authentication, authorization and password hashing.
pub mod auth;
/// Command-line interface for the server binary.
pub mod cli;
/// Credential store clients (Turso/SQLite).
pub mod db;
/// Core types (requests, responses, errors).
pub mod types;
/// Configuration utilities (TOML).
pub mod utils;

// Re-export commonly used types
pub use auth::{
    Access, Argon2Hasher, AuthenticationGate, PasswordHasher, Principal, RoutePolicy, TokenService,
};
pub use db::{DatabaseProvider, TursoClient, UserStore};
pub use types::{AppError, Result, Role};
pub use utils::toml_config::UsherConfig;

use crate::types::NewUser;
use std::sync::Arc;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Immutable infrastructure configuration
    pub config: Arc<UsherConfig>,
    /// Credential store
    pub store: Arc<dyn UserStore>,
    /// Issues and validates bearer tokens
    pub token_service: Arc<TokenService>,
    /// Hashes passwords on create and update
    pub password_hasher: Arc<dyn PasswordHasher>,
    /// Verifies credentials and loads principals
    pub gate: Arc<AuthenticationGate>,
    /// Route access table
    pub policy: Arc<RoutePolicy>,
}

impl AppState {
    /// Assembles state from already-built parts, with the standard route policy.
    pub fn new(
        config: UsherConfig,
        store: Arc<dyn UserStore>,
        token_service: TokenService,
        password_hasher: Arc<dyn PasswordHasher>,
    ) -> Self {
        let gate = AuthenticationGate::new(store.clone(), password_hasher.clone());
        Self {
            config: Arc::new(config),
            store,
            token_service: Arc::new(token_service),
            password_hasher,
            gate: Arc::new(gate),
            policy: Arc::new(RoutePolicy::standard()),
        }
    }

    /// Builds every component from configuration and the environment.
    ///
    /// Fails with [`AppError::Configuration`] when the signing key or hashing
    /// parameters are unusable.
    pub async fn from_config(config: UsherConfig) -> Result<Self> {
        let secret = config.auth.jwt_secret()?;
        let token_service = TokenService::new(
            &secret,
            config.auth.token_ttl_secs,
            config.auth.leeway_secs,
        )?;
        let hasher: Arc<dyn PasswordHasher> =
            Arc::new(Argon2Hasher::new(config.auth.password.cost())?);
        let store = config.database.provider()?.create_client().await?;

        let state = Self::new(config, store, token_service, hasher);
        state.ensure_initial_admin().await?;
        Ok(state)
    }

    /// Replaces the route policy.
    pub fn with_policy(mut self, policy: RoutePolicy) -> Self {
        self.policy = Arc::new(policy);
        self
    }

    /// Creates the configured initial administrator if the email is unused.
    pub async fn ensure_initial_admin(&self) -> Result<()> {
        let Some(admin) = &self.config.auth.initial_admin else {
            return Ok(());
        };

        if self.store.get_user_by_email(&admin.email).await?.is_some() {
            tracing::info!(email = %admin.email, "initial admin already exists, skipping seed");
            return Ok(());
        }

        let password_hash =
            auth::hash_blocking(&self.password_hasher, &admin.password()?).await?;
        let user = self
            .store
            .create_user(&NewUser {
                name: admin.name.clone(),
                email: admin.email.clone(),
                password_hash,
                role: Role::Admin,
            })
            .await?;
        tracing::info!(user_id = user.id, email = %user.email, "created initial admin");
        Ok(())
    }
}
