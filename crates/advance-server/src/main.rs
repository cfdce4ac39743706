//! Advance Access - user, role and permission service

use anyhow::{Context, Result};
use axum::http::{HeaderValue, Method, header};
use clap::Parser;
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

mod bootstrap;
mod config;

use advance_api::{AppState, create_router};
use advance_auth::TokenManager;
use advance_db::Database;
use config::{Config, CorsConfig, LogFormat, LoggingConfig};

/// Advance Access - credential and permission service
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file path
    #[arg(short, long, default_value = "config/default.toml")]
    config: String,

    /// Bind address
    #[arg(long, env = "ADVANCE_BIND")]
    bind: Option<String>,

    /// Port
    #[arg(short, long, env = "ADVANCE_PORT")]
    port: Option<u16>,

    /// Token signing secret
    #[arg(long, env = "ADVANCE_JWT_SECRET", hide_env_values = true)]
    jwt_secret: Option<String>,

    /// Database URL
    #[arg(long, env = "ADVANCE_DATABASE_URL")]
    database_url: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = Config::load(&args.config)?;
    if let Some(bind) = args.bind {
        config.server.bind_address = bind;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }
    if let Some(secret) = args.jwt_secret {
        config.auth.jwt_secret = Some(secret);
    }
    if let Some(url) = args.database_url {
        config.database.url = url;
    }

    init_logging(&config.logging);
    config.validate()?;

    info!("Starting Advance Access v{}", env!("CARGO_PKG_VERSION"));

    ensure_database_dir(&config.database.url).await?;
    let db = Database::new(&config.database.url, config.database.max_connections)
        .await
        .context("Failed to open database")?;

    bootstrap::seed_catalog(&db, &config.catalog).await?;

    let secret = config
        .jwt_secret()
        .context("auth.jwt_secret is not configured")?;
    let tokens = Arc::new(TokenManager::new(secret, config.auth.token_ttl_secs)?);

    let state = AppState::new(db, tokens)?;
    if bootstrap::bootstrap_admin(&state, &config.auth.bootstrap_admin).await? {
        info!("Bootstrap administrator is ready; change its password after first login");
    }

    let metrics_handle = PrometheusBuilder::new()
        .install_recorder()
        .context("Failed to install Prometheus recorder")?;

    let app = create_router(state, Some(Arc::new(metrics_handle)))
        .layer(cors_layer(&config.cors)?)
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("{}:{}", config.server.bind_address, config.server.port)
        .parse()
        .context("Invalid bind address")?;

    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

/// Initialize logging. RUST_LOG takes precedence over the configured level.
fn init_logging(logging: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));

    match logging.format {
        LogFormat::Json => tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(filter)
            .init(),
        LogFormat::Pretty => tracing_subscriber::registry()
            .with(fmt::layer())
            .with(filter)
            .init(),
    }
}

/// Build the CORS layer; an empty origin list is permissive
fn cors_layer(cors: &CorsConfig) -> Result<CorsLayer> {
    if cors.allowed_origins.is_empty() {
        return Ok(CorsLayer::permissive());
    }

    let origins = cors
        .allowed_origins
        .iter()
        .map(|origin| {
            origin
                .parse::<HeaderValue>()
                .with_context(|| format!("Invalid CORS origin: {}", origin))
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]))
}

/// Create the parent directory of a file-backed SQLite database
async fn ensure_database_dir(url: &str) -> Result<()> {
    let path = url
        .strip_prefix("sqlite://")
        .or_else(|| url.strip_prefix("sqlite:"))
        .unwrap_or(url);
    let path = path.split('?').next().unwrap_or(path);

    if path.is_empty() || path.starts_with(":memory:") {
        return Ok(());
    }

    if let Some(parent) = Path::new(path).parent()
        && !parent.as_os_str().is_empty()
    {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("Failed to create database directory {}", parent.display()))?;
    }
    Ok(())
}

/// Wait for shutdown signal
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        return;
    }
    info!("Shutdown signal received");
}
