//! TOML-based configuration for Usher
//!
//! All settings live in `usher.toml`. Secrets are never written to the file;
//! the file names the environment variable that holds them instead.
//!
//! Configuration is loaded once at startup and is immutable afterwards, so the
//! signing key cannot change under running requests.

use crate::auth::password::{Argon2Cost, Argon2Hasher};
use crate::db::DatabaseProvider;
use crate::types::{AppError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::warn;

/// Recommended minimum length of the HMAC signing key, in bytes.
pub const MIN_SECRET_LEN: usize = 32;

/// Root configuration structure loaded from usher.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UsherConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub cors: CorsConfig,
}

// ============= Server Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Directory served for static assets (`/*.html`, `/css/**`, `/js/**`)
    #[serde(default)]
    pub static_dir: Option<String>,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            log_level: default_log_level(),
            static_dir: None,
        }
    }
}

// ============= Authentication Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Environment variable name containing the JWT secret
    #[serde(default = "default_jwt_secret_env")]
    pub jwt_secret_env: String,

    /// Session token validity in seconds
    #[serde(default = "default_token_ttl")]
    pub token_ttl_secs: i64,

    /// Clock skew tolerated when checking expiry, in seconds
    #[serde(default)]
    pub leeway_secs: i64,

    #[serde(default)]
    pub password: PasswordConfig,

    /// Administrator created at startup when no user has this email yet
    #[serde(default)]
    pub initial_admin: Option<InitialAdminConfig>,
}

fn default_jwt_secret_env() -> String {
    "JWT_SECRET".to_string()
}

fn default_token_ttl() -> i64 {
    3600
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret_env: default_jwt_secret_env(),
            token_ttl_secs: default_token_ttl(),
            leeway_secs: 0,
            password: PasswordConfig::default(),
            initial_admin: None,
        }
    }
}

impl AuthConfig {
    /// Reads the signing key from the configured environment variable.
    pub fn jwt_secret(&self) -> Result<String> {
        let secret = std::env::var(&self.jwt_secret_env).map_err(|_| {
            AppError::Configuration(format!(
                "Environment variable {} is not set",
                self.jwt_secret_env
            ))
        })?;

        if secret.trim().is_empty() {
            return Err(AppError::Configuration(format!(
                "Environment variable {} is empty",
                self.jwt_secret_env
            )));
        }
        if secret.len() < MIN_SECRET_LEN {
            warn!(
                env = %self.jwt_secret_env,
                "JWT secret is shorter than {} bytes",
                MIN_SECRET_LEN
            );
        }

        Ok(secret)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InitialAdminConfig {
    pub email: String,

    #[serde(default = "default_admin_name")]
    pub name: String,

    /// Environment variable name containing the initial password
    #[serde(default = "default_admin_password_env")]
    pub password_env: String,
}

fn default_admin_name() -> String {
    "Administrator".to_string()
}

fn default_admin_password_env() -> String {
    "USHER_ADMIN_PASSWORD".to_string()
}

impl InitialAdminConfig {
    pub fn password(&self) -> Result<String> {
        match std::env::var(&self.password_env) {
            Ok(password) if !password.is_empty() => Ok(password),
            _ => Err(AppError::Configuration(format!(
                "Environment variable {} must hold the initial admin password",
                self.password_env
            ))),
        }
    }
}

/// Argon2id cost settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PasswordConfig {
    #[serde(default = "default_memory_kib")]
    pub memory_kib: u32,

    #[serde(default = "default_iterations")]
    pub iterations: u32,

    #[serde(default = "default_parallelism")]
    pub parallelism: u32,
}

fn default_memory_kib() -> u32 {
    Argon2Cost::default().memory_kib
}

fn default_iterations() -> u32 {
    Argon2Cost::default().iterations
}

fn default_parallelism() -> u32 {
    Argon2Cost::default().parallelism
}

impl Default for PasswordConfig {
    fn default() -> Self {
        Self {
            memory_kib: default_memory_kib(),
            iterations: default_iterations(),
            parallelism: default_parallelism(),
        }
    }
}

impl PasswordConfig {
    pub fn cost(&self) -> Argon2Cost {
        Argon2Cost {
            memory_kib: self.memory_kib,
            iterations: self.iterations,
            parallelism: self.parallelism,
        }
    }
}

// ============= Database Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Local database path, or `:memory:`
    #[serde(default = "default_database_url")]
    pub url: String,

    /// Environment variable for Turso URL (optional cloud config)
    pub turso_url_env: Option<String>,

    /// Environment variable for Turso auth token
    pub turso_token_env: Option<String>,
}

fn default_database_url() -> String {
    "./data/usher.db".to_string()
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: default_database_url(),
            turso_url_env: None,
            turso_token_env: None,
        }
    }
}

impl DatabaseConfig {
    /// Chooses the backend: remote Turso when both env vars are set, else the local url.
    pub fn provider(&self) -> Result<DatabaseProvider> {
        if let (Some(url_env), Some(token_env)) = (&self.turso_url_env, &self.turso_token_env) {
            if let (Ok(url), Ok(token)) = (std::env::var(url_env), std::env::var(token_env)) {
                if !url.is_empty() && !token.is_empty() {
                    return remote_provider(url, token);
                }
            }
        }

        if self.url.is_empty() || self.url == ":memory:" {
            Ok(DatabaseProvider::Memory)
        } else {
            Ok(DatabaseProvider::SQLite {
                path: self.url.clone(),
            })
        }
    }
}

#[cfg(feature = "turso")]
fn remote_provider(url: String, auth_token: String) -> Result<DatabaseProvider> {
    Ok(DatabaseProvider::Turso { url, auth_token })
}

#[cfg(not(feature = "turso"))]
fn remote_provider(_url: String, _auth_token: String) -> Result<DatabaseProvider> {
    Err(AppError::Configuration(
        "Turso credentials are set but this build lacks the `turso` feature".to_string(),
    ))
}

// ============= CORS Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorsConfig {
    /// Comma-separated list of allowed origins, or `*`
    #[serde(default = "default_allowed_origins")]
    pub allowed_origins: String,
}

fn default_allowed_origins() -> String {
    "*".to_string()
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: default_allowed_origins(),
        }
    }
}

impl CorsConfig {
    /// Trimmed, non-empty origins from the comma-separated list.
    pub fn origins(&self) -> Vec<String> {
        self.allowed_origins
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    }

    pub fn allows_any_origin(&self) -> bool {
        self.origins().iter().any(|o| o == "*")
    }
}

// ============= Loading =============

impl UsherConfig {
    /// Loads and validates a configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            AppError::Configuration(format!("Failed to read {}: {}", path.display(), e))
        })?;

        Self::from_toml_str(&content)
    }

    /// Parses and validates configuration from a TOML string.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: UsherConfig = toml::from_str(content)
            .map_err(|e| AppError::Configuration(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Checks values that do not depend on the environment.
    pub fn validate(&self) -> Result<()> {
        if self.auth.jwt_secret_env.trim().is_empty() {
            return Err(AppError::Configuration(
                "auth.jwt_secret_env must name an environment variable".to_string(),
            ));
        }
        if self.auth.token_ttl_secs <= 0 {
            return Err(AppError::Configuration(
                "auth.token_ttl_secs must be positive".to_string(),
            ));
        }
        if self.auth.leeway_secs < 0 {
            return Err(AppError::Configuration(
                "auth.leeway_secs must not be negative".to_string(),
            ));
        }
        Argon2Hasher::new(self.auth.password.cost())?;

        if let Some(admin) = &self.auth.initial_admin {
            if admin.email.trim().is_empty() {
                return Err(AppError::Configuration(
                    "auth.initial_admin.email must not be empty".to_string(),
                ));
            }
        }

        let origins = self.cors.origins();
        if origins.is_empty() {
            return Err(AppError::Configuration(
                "cors.allowed_origins must list at least one origin".to_string(),
            ));
        }
        if origins.len() > 1 && origins.iter().any(|o| o == "*") {
            return Err(AppError::Configuration(
                "cors.allowed_origins cannot mix `*` with explicit origins".to_string(),
            ));
        }

        Ok(())
    }

    /// Socket address string for the listener.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
