//! Credential store abstraction
//!
//! This module provides the `UserStore` trait that abstracts over the backends
//! holding user records (in-memory SQLite, file-based SQLite, remote Turso).
//!
//! # Example
//!
//! ```rust,ignore
//! use usher::db::DatabaseProvider;
//!
//! // In-memory database (default for development/testing)
//! let store = DatabaseProvider::Memory.create_client().await?;
//!
//! // File-based SQLite
//! let store = DatabaseProvider::SQLite { path: "data/usher.db".into() }.create_client().await?;
//! ```

use crate::types::{NewUser, Result, User, UserChanges};
use async_trait::async_trait;
use std::sync::Arc;

/// Database provider configuration
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum DatabaseProvider {
    /// In-memory SQLite database (ephemeral, lost on restart)
    #[default]
    Memory,
    /// File-based SQLite database
    SQLite {
        /// Path to the SQLite database file
        path: String,
    },
    /// Remote Turso database (requires network access)
    #[cfg(feature = "turso")]
    Turso {
        /// The Turso database URL (e.g., `libsql://your-db.turso.io`)
        url: String,
        /// Authentication token for the Turso database
        auth_token: String,
    },
}

impl DatabaseProvider {
    /// Create a store from this provider configuration
    pub async fn create_client(&self) -> Result<Arc<dyn UserStore>> {
        match self {
            DatabaseProvider::Memory => {
                let client = super::turso::TursoClient::new_memory().await?;
                Ok(Arc::new(client))
            }
            DatabaseProvider::SQLite { path } => {
                let client = super::turso::TursoClient::new_local(path).await?;
                Ok(Arc::new(client))
            }
            #[cfg(feature = "turso")]
            DatabaseProvider::Turso { url, auth_token } => {
                let client =
                    super::turso::TursoClient::new_remote(url.clone(), auth_token.clone()).await?;
                Ok(Arc::new(client))
            }
        }
    }
}

/// Storage operations for user records.
///
/// Implementations own consistency: email uniqueness must be enforced by the
/// store (violations surface as `AppError::Conflict`) and each update must be
/// applied atomically.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Insert a user and return it with its assigned id
    async fn create_user(&self, user: &NewUser) -> Result<User>;

    /// Get a user by ID
    async fn get_user_by_id(&self, id: i64) -> Result<Option<User>>;

    /// Get a user by email (the login identifier)
    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>>;

    /// All users ordered by id
    async fn list_users(&self) -> Result<Vec<User>>;

    /// Apply `changes` to a user. Returns `None` if the id does not exist.
    async fn update_user(&self, id: i64, changes: &UserChanges) -> Result<Option<User>>;

    /// Delete a user. Returns `false` if the id does not exist.
    async fn delete_user(&self, id: i64) -> Result<bool>;
}
