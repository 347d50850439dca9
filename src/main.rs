use anyhow::{Context, Result};
use std::io::BufRead;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use usher::{
    api::routes::{cors_layer, create_app},
    cli::{
        init::{self, InitConfig, InitResult},
        output::Output,
        Cli, Commands,
    },
    AppState, Argon2Hasher, PasswordHasher, TokenService, UsherConfig,
};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse_args();
    let output = if cli.no_color {
        Output::no_color()
    } else {
        Output::new()
    };

    match cli.command {
        None => serve(&cli, &output).await,
        Some(Commands::Init {
            ref path,
            force,
            ref host,
            port,
        }) => {
            let result = init::run(
                InitConfig {
                    path: path.clone(),
                    force,
                    host: host.clone(),
                    port,
                },
                &output,
            );
            match result {
                InitResult::Success | InitResult::AlreadyExists => Ok(()),
                InitResult::Error(e) => anyhow::bail!("init failed: {}", e),
            }
        }
        Some(Commands::Config { validate }) => show_config(&cli, &output, validate),
        Some(Commands::HashPassword { ref password }) => hash_password(&cli, password.clone()),
    }
}

async fn serve(cli: &Cli, output: &Output) -> Result<()> {
    let config = match UsherConfig::load(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            output.error(&e.to_string());
            output.hint("Run `usher-server init` to create a starter configuration");
            return Err(e).context("could not load configuration");
        }
    };

    init_tracing(&config.server.log_level, cli.json_logs);
    tracing::info!(config = %cli.config.display(), "starting usher");

    let addr = config.bind_address();
    let state = AppState::from_config(config)
        .await
        .context("failed to initialise application state")?;
    let app = create_app(state)?;

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    tracing::info!(%addr, "listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    tracing::info!("shut down");
    Ok(())
}

fn init_tracing(log_level: &str, json: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("{},libsql=warn,hyper=warn", log_level)));
    let registry = tracing_subscriber::registry().with(filter);

    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}

fn show_config(cli: &Cli, output: &Output, validate: bool) -> Result<()> {
    let config = match UsherConfig::load(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            output.error(&e.to_string());
            return Err(e.into());
        }
    };

    output.header("Configuration");
    output.kv("file", &cli.config.display().to_string());
    output.kv("listen", &config.bind_address());
    output.kv("log level", &config.server.log_level);
    output.kv("database", &config.database.url);
    output.kv("token ttl", &format!("{}s", config.auth.token_ttl_secs));
    output.kv("signing key env", &config.auth.jwt_secret_env);
    output.kv("cors origins", &config.cors.origins().join(", "));
    if let Some(admin) = &config.auth.initial_admin {
        output.kv("initial admin", &admin.email);
    }

    if !validate {
        return Ok(());
    }

    let checks = (|| -> usher::Result<()> {
        let secret = config.auth.jwt_secret()?;
        TokenService::new(
            &secret,
            config.auth.token_ttl_secs,
            config.auth.leeway_secs,
        )?;
        Argon2Hasher::new(config.auth.password.cost())?;
        config.database.provider()?;
        cors_layer(&config.cors).map(drop)?;
        if let Some(admin) = &config.auth.initial_admin {
            admin.password()?;
        }
        Ok(())
    })();

    match checks {
        Ok(()) => {
            output.success("Configuration is valid");
            Ok(())
        }
        Err(e) => {
            output.error(&e.to_string());
            Err(e.into())
        }
    }
}

fn hash_password(cli: &Cli, password: Option<String>) -> Result<()> {
    let config = if cli.config.exists() {
        UsherConfig::load(&cli.config)?
    } else {
        UsherConfig::default()
    };

    let password = match password {
        Some(password) => password,
        None => {
            let mut line = String::new();
            std::io::stdin()
                .lock()
                .read_line(&mut line)
                .context("failed to read password from stdin")?;
            line.trim_end_matches(['\r', '\n']).to_string()
        }
    };
    if password.is_empty() {
        anyhow::bail!("password must not be empty");
    }

    let hasher = Argon2Hasher::new(config.auth.password.cost())?;
    println!("{}", hasher.hash(&password)?);
    Ok(())
}
