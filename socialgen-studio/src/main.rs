//! SocialGen Studio - web studio for social media content
//!
//! Resolves configuration, opens the content database, builds both
//! generation clients and serves the studio until Ctrl+C or SIGTERM.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use socialgen_common::config::{AppConfig, ConfigOverrides};
use socialgen_studio::generation::{build_http_client, GeminiClient, IdeogramClient};
use socialgen_studio::{build_router, db, AppState};

/// Command-line arguments for socialgen-studio
///
/// Each option overrides the matching environment variable and config file
/// entry.
#[derive(Parser, Debug)]
#[command(name = "socialgen-studio")]
#[command(about = "Social media content studio")]
#[command(version)]
struct Args {
    /// Config file (default: <config dir>/socialgen/config.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Address to listen on, e.g. 127.0.0.1:8501
    #[arg(short, long)]
    bind: Option<String>,

    /// SQLite database URL, e.g. sqlite:socialgen.db
    #[arg(long)]
    database_url: Option<String>,

    /// Gemini API key
    #[arg(long)]
    gemini_api_key: Option<String>,

    /// Ideogram API key
    #[arg(long)]
    ideogram_api_key: Option<String>,

    /// Gemini model name
    #[arg(long)]
    gemini_model: Option<String>,

    /// Gemini API base URL
    #[arg(long)]
    gemini_base_url: Option<String>,

    /// Ideogram API base URL
    #[arg(long)]
    ideogram_base_url: Option<String>,

    /// Timeout for generation requests, in seconds
    #[arg(long)]
    request_timeout_secs: Option<u64>,
}

impl From<Args> for ConfigOverrides {
    fn from(args: Args) -> Self {
        ConfigOverrides {
            config_file: args.config,
            gemini_api_key: args.gemini_api_key,
            ideogram_api_key: args.ideogram_api_key,
            database_url: args.database_url,
            bind_address: args.bind,
            gemini_model: args.gemini_model,
            gemini_base_url: args.gemini_base_url,
            ideogram_base_url: args.ideogram_base_url,
            request_timeout_secs: args.request_timeout_secs,
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "socialgen_studio=info,socialgen_common=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(
        "Starting SocialGen Studio v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    let overrides = ConfigOverrides::from(Args::parse());
    let config = match AppConfig::resolve(&overrides) {
        Ok(config) => config,
        Err(e) => {
            error!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    match run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(config: AppConfig) -> Result<()> {
    info!(?config, "Resolved configuration");

    let store = db::open_store(&config.database_url)
        .await
        .context("Failed to open content database")?;
    info!("✓ Content database ready");

    let http = build_http_client(config.request_timeout).context("Failed to build HTTP client")?;
    let text = GeminiClient::new(
        http.clone(),
        &config.gemini_base_url,
        &config.gemini_model,
        &config.gemini_api_key,
    );
    let images = IdeogramClient::new(http, &config.ideogram_base_url, &config.ideogram_api_key);

    let state = AppState::new(store, Arc::new(text), Arc::new(images));
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_address)
        .await
        .with_context(|| format!("Failed to bind to {}", config.bind_address))?;
    info!("socialgen-studio listening on http://{}", config.bind_address);
    info!("Health check: http://{}/health", config.bind_address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
