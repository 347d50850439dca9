//! Init command implementation
//!
//! Writes a starter `usher.toml`, `.env.example` and `.gitignore`.

use super::output::Output;
use std::fs;
use std::path::{Path, PathBuf};

/// Result of the init operation
#[derive(Debug)]
pub enum InitResult {
    /// Initialization completed successfully
    Success,
    /// usher.toml exists and `--force` was not given
    AlreadyExists,
    /// An error occurred during initialization
    Error(String),
}

/// Configuration for the init command
pub struct InitConfig {
    /// Directory to initialize
    pub path: PathBuf,
    /// Overwrite existing files
    pub force: bool,
    /// Host address for the server
    pub host: String,
    /// Port for the server
    pub port: u16,
}

/// Run the init command
pub fn run(config: InitConfig, output: &Output) -> InitResult {
    output.banner();
    output.header("Initializing Usher");

    let base_path = &config.path;
    let config_path = base_path.join("usher.toml");
    if config_path.exists() && !config.force {
        output.warning("usher.toml already exists!");
        output.hint("Use --force to overwrite existing files");
        return InitResult::AlreadyExists;
    }

    let data_dir = base_path.join("data");
    if data_dir.exists() {
        output.skipped("data", "already exists");
    } else if let Err(e) = fs::create_dir_all(&data_dir) {
        output.error(&format!("Failed to create data: {}", e));
        return InitResult::Error(e.to_string());
    } else {
        output.created("directory", "data");
    }

    if let Err(e) = write_file(&config_path, &generate_usher_toml(&config), config.force) {
        output.error(&format!("Failed to create usher.toml: {}", e));
        return InitResult::Error(e.to_string());
    }
    output.created("config", "usher.toml");

    let env_example_path = base_path.join(".env.example");
    if let Err(e) = write_file(&env_example_path, generate_env_example(), config.force) {
        output.error(&format!("Failed to create .env.example: {}", e));
        return InitResult::Error(e.to_string());
    }
    output.created("env", ".env.example");

    let gitignore_path = base_path.join(".gitignore");
    if gitignore_path.exists() {
        output.skipped(".gitignore", "already exists");
    } else if let Err(e) = write_file(&gitignore_path, generate_gitignore(), false) {
        output.warning(&format!("Failed to create .gitignore: {}", e));
    } else {
        output.created("file", ".gitignore");
    }

    output.success("Usher initialized");

    output.header("Next Steps");
    output.info("1. Set the signing key:");
    output.command("cp .env.example .env");
    output.command("# Edit .env and set JWT_SECRET (min 32 chars)");
    output.info("2. Start the server:");
    output.command("usher-server");

    output.hint(&format!(
        "Server will be available at http://{}:{}",
        config.host, config.port
    ));

    InitResult::Success
}

fn write_file(path: &Path, content: &str, force: bool) -> std::io::Result<()> {
    if path.exists() && !force {
        return Ok(());
    }
    fs::write(path, content)
}

fn generate_usher_toml(config: &InitConfig) -> String {
    format!(
        r#"# Usher configuration

[server]
host = "{host}"
port = {port}
log_level = "info"
# static_dir = "public"

[auth]
# Name of the environment variable holding the signing key
jwt_secret_env = "JWT_SECRET"
token_ttl_secs = 3600
leeway_secs = 0

# Created at startup if no user has this email
# [auth.initial_admin]
# email = "admin@example.com"
# password_env = "USHER_ADMIN_PASSWORD"

[auth.password]
memory_kib = 19456
iterations = 2
parallelism = 1

[database]
# Local file, or ":memory:" for an ephemeral store
url = "./data/usher.db"
# turso_url_env = "TURSO_URL"
# turso_token_env = "TURSO_AUTH_TOKEN"

[cors]
# Comma-separated list, or "*" for any origin (credentials disabled)
allowed_origins = "*"
"#,
        host = config.host,
        port = config.port
    )
}

fn generate_env_example() -> &'static str {
    r#"# Usher Environment Variables
# Copy this file to .env and fill in the values.

# REQUIRED: JWT signing key (minimum 32 characters)
# Generate with: openssl rand -base64 32
JWT_SECRET=change-me-in-production-use-at-least-32-characters

# Optional: initial administrator password (see [auth.initial_admin])
# USHER_ADMIN_PASSWORD=

# Optional: Logging level (trace, debug, info, warn, error)
RUST_LOG=info,usher=debug

# Optional: Turso cloud database
# TURSO_URL=libsql://your-db.turso.io
# TURSO_AUTH_TOKEN=your-token
"#
}

fn generate_gitignore() -> &'static str {
    r#"/data/
*.db
*.db-journal

.env
.env.local
"#
}
