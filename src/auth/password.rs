//! Password hashing.
//!
//! [`PasswordHasher`] is the seam between credential handling and the concrete
//! algorithm. The production implementation is [`Argon2Hasher`].
//!
//! Request handlers go through [`hash_blocking`] and [`verify_blocking`] so the
//! memory-hard work runs on tokio's blocking pool instead of a runtime worker.

use crate::types::{AppError, Result};
use std::sync::Arc;
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, PasswordHasher as _, Version,
};

/// One-way, salted password hashing with constant-time verification.
#[cfg_attr(test, mockall::automock)]
pub trait PasswordHasher: Send + Sync {
    /// Hashes `password`, returning a self-describing hash string.
    fn hash(&self, password: &str) -> Result<String>;

    /// Checks `password` against a hash produced by [`PasswordHasher::hash`].
    fn verify(&self, password: &str, hash: &str) -> Result<bool>;
}

/// Argon2id cost parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Argon2Cost {
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

impl Default for Argon2Cost {
    fn default() -> Self {
        Self {
            memory_kib: Params::DEFAULT_M_COST,
            iterations: Params::DEFAULT_T_COST,
            parallelism: Params::DEFAULT_P_COST,
        }
    }
}

/// Argon2id hasher producing PHC-formatted strings.
pub struct Argon2Hasher {
    argon2: Argon2<'static>,
}

impl Argon2Hasher {
    /// Builds a hasher with the given cost, rejecting parameters Argon2 cannot use.
    pub fn new(cost: Argon2Cost) -> Result<Self> {
        let params = Params::new(cost.memory_kib, cost.iterations, cost.parallelism, None)
            .map_err(|e| AppError::Configuration(format!("Invalid Argon2 parameters: {}", e)))?;

        Ok(Self {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
        })
    }
}

impl Default for Argon2Hasher {
    fn default() -> Self {
        Self {
            argon2: Argon2::default(),
        }
    }
}

impl PasswordHasher for Argon2Hasher {
    fn hash(&self, password: &str) -> Result<String> {
        let salt = SaltString::generate(&mut OsRng);

        self.argon2
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))
    }

    fn verify(&self, password: &str, hash: &str) -> Result<bool> {
        let parsed_hash = PasswordHash::new(hash)
            .map_err(|e| AppError::Internal(format!("Invalid password hash: {}", e)))?;

        // Cost parameters are read from the hash itself.
        Ok(self
            .argon2
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok())
    }
}

/// Hashes `password` on the blocking thread pool.
pub async fn hash_blocking(hasher: &Arc<dyn PasswordHasher>, password: &str) -> Result<String> {
    let hasher = Arc::clone(hasher);
    let password = password.to_string();

    tokio::task::spawn_blocking(move || hasher.hash(&password))
        .await
        .map_err(join_failed)?
}

/// Verifies `password` against `hash` on the blocking thread pool.
pub async fn verify_blocking(
    hasher: &Arc<dyn PasswordHasher>,
    password: &str,
    hash: &str,
) -> Result<bool> {
    let hasher = Arc::clone(hasher);
    let password = password.to_string();
    let hash = hash.to_string();

    tokio::task::spawn_blocking(move || hasher.verify(&password, &hash))
        .await
        .map_err(join_failed)?
}

fn join_failed(e: tokio::task::JoinError) -> AppError {
    AppError::Internal(format!("Password hashing task failed: {}", e))
}
