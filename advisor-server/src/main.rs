use std::sync::Arc;
use std::time::Duration;

use advisor_core::{AdvisorConfig, AuthService, OpenRouterClient, OpenRouterConfig, SessionSettings};
use clap::Parser;
use tokio::sync::broadcast;
use tracing_subscriber::{fmt, EnvFilter};

use advisor_server::http::{start_http_server, HttpState};
use advisor_server::sessions::run_session_sweeper;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[arg(short, long, default_value = "advisor.toml")]
    config: String,

    #[arg(long)]
    health: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present (dev convenience: production uses real env vars)
    dotenvy::dotenv().ok();

    let args = Args::parse();

    // Load config
    let config = match AdvisorConfig::load(&args.config) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load config from {}: {}", args.config, e);
            std::process::exit(1);
        }
    };

    // Init logging (RUST_LOG wins over service.log_level)
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.service.log_level));
    fmt().with_env_filter(filter).init();

    // The API key is required before anything else starts
    let api_key = match config.resolve_api_key() {
        Ok(k) => k,
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    };

    // Open the users database
    let store = match advisor_core::db::open_credential_store(&config.database, &config.auth).await
    {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Failed to open user database {}: {}", config.database.path, e);
            std::process::exit(1);
        }
    };

    if args.health {
        match advisor_core::db::health_check(store.pool()).await {
            Ok(v) => println!("✅ SQLite connected: {}", v),
            Err(e) => {
                println!("❌ SQLite check failed: {}", e);
                std::process::exit(1);
            }
        }

        match store.count().await {
            Ok(n) => println!("✅ Registered users: {}", n),
            Err(e) => {
                println!("❌ Users table check failed: {}", e);
                std::process::exit(1);
            }
        }

        println!("✅ Advisor health check passed");
        return Ok(());
    }

    let client = match OpenRouterClient::new(OpenRouterConfig::from_model_config(
        &config.model,
        api_key,
    )) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to create chat client: {}", e);
            std::process::exit(1);
        }
    };
    tracing::info!(model = %config.model.model, endpoint = %config.model.endpoint, "Chat backend ready");

    let (tx, _rx) = broadcast::channel(1);
    let shutdown_tx = tx.clone();

    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            return;
        }
        tracing::info!("Shutdown signal received");
        let _ = shutdown_tx.send(());
    });

    if !config.http.enabled {
        tracing::warn!("http.enabled is false; nothing to serve");
        return Ok(());
    }

    let state = HttpState::new(
        AuthService::new(store),
        Arc::new(client),
        SessionSettings::from_model_config(&config.model),
    );

    tokio::spawn(run_session_sweeper(
        state.sessions.clone(),
        Duration::from_secs(config.http.session_idle_secs),
        Duration::from_secs(config.http.session_sweep_secs.max(1)),
        tx.subscribe(),
    ));

    let addr = format!("{}:{}", config.http.host, config.http.port);
    start_http_server(&addr, state, tx.subscribe()).await?;

    Ok(())
}
