//! CLI module for Usher
//!
//! Provides command-line interface parsing for the usher-server binary.
//! Uses clap for argument parsing and owo-colors for colored terminal output.

pub mod init;
pub mod output;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Usher - authenticated user management server
#[derive(Parser, Debug)]
#[command(
    name = "usher-server",
    version,
    about = "Usher - authenticated user management server",
    long_about = "User management over HTTP with bearer-token sessions and role-based route access.\n\n\
                  Run without arguments to start the server, or use 'init' to scaffold a config.",
    after_help = "EXAMPLES:\n    \
                  usher-server init                     # Write usher.toml and .env.example\n    \
                  usher-server                          # Start the server (requires usher.toml)\n    \
                  usher-server --config prod.toml       # Use a custom config file\n    \
                  usher-server config --validate        # Check the config without starting\n    \
                  usher-server hash-password 's3cret'   # Print an Argon2 hash"
)]
pub struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "usher.toml", global = true)]
    pub config: PathBuf,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub json_logs: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Write a starter usher.toml and .env.example
    Init {
        /// Directory to initialize (defaults to current directory)
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Overwrite existing files
        #[arg(short, long)]
        force: bool,

        /// Host address for the server
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Port for the server
        #[arg(long, default_value = "3000")]
        port: u16,
    },

    /// Show configuration information
    Config {
        /// Also resolve secrets and hashing parameters from the environment
        #[arg(long)]
        validate: bool,
    },

    /// Hash a password with the configured Argon2 parameters
    HashPassword {
        /// Password to hash (read from stdin when omitted)
        password: Option<String>,
    },
}

impl Cli {
    /// Parse CLI arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_subcommand_starts_server() {
        let cli = Cli::try_parse_from(["usher-server"]).unwrap();
        assert!(cli.command.is_none());
        assert_eq!(cli.config, PathBuf::from("usher.toml"));
        assert!(!cli.json_logs);
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli =
            Cli::try_parse_from(["usher-server", "config", "--validate", "-c", "prod.toml"])
                .unwrap();
        assert_eq!(cli.config, PathBuf::from("prod.toml"));
        assert!(matches!(cli.command, Some(Commands::Config { validate: true })));
    }

    #[test]
    fn test_init_defaults() {
        let cli = Cli::try_parse_from(["usher-server", "init"]).unwrap();
        match cli.command {
            Some(Commands::Init {
                path,
                force,
                host,
                port,
            }) => {
                assert_eq!(path, PathBuf::from("."));
                assert!(!force);
                assert_eq!(host, "127.0.0.1");
                assert_eq!(port, 3000);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_hash_password_argument_is_optional() {
        let cli = Cli::try_parse_from(["usher-server", "hash-password"]).unwrap();
        assert!(matches!(
            cli.command,
            Some(Commands::HashPassword { password: None })
        ));
    }
}
