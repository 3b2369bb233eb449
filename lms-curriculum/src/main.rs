//! lms-curriculum - Curriculum resolution microservice
//!
//! Serves normalized course curricula resolved from the LMS API, with a TTL
//! cache, shared in-flight requests and sample fallback.

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use lms_common::config::{ConfigResolver, API_BASE_ENV_VAR, CONFIG_ENV_VAR};
use tokio::signal;
use tower_http::cors::CorsLayer;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use lms_curriculum::{build_router, AppState, CurriculumResolver};

/// Command-line arguments for lms-curriculum
#[derive(Parser, Debug)]
#[command(name = "lms-curriculum")]
#[command(about = "Curriculum resolution microservice")]
#[command(version)]
struct Args {
    /// Path to the TOML config file
    #[arg(short, long, env = CONFIG_ENV_VAR)]
    config: Option<PathBuf>,

    /// Port to listen on (overrides config)
    #[arg(short, long, env = "LMS_CURRICULUM_PORT")]
    port: Option<u16>,

    /// LMS API base URL (overrides config)
    #[arg(long, env = API_BASE_ENV_VAR)]
    api_base: Option<String>,

    /// Log level when RUST_LOG is unset (overrides config)
    #[arg(long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Tracing is not up yet; resolution warnings are repeated below
    let config_resolver = ConfigResolver::new(args.config.clone());
    let mut config = config_resolver
        .load()
        .context("Failed to load configuration")?;

    if let Some(api_base) = &args.api_base {
        config.api.base_url = api_base.clone();
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }
    let level = args.log_level.as_deref().unwrap_or(&config.logging.level);

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "lms_curriculum={level},lms_common={level},tower_http={level}"
            ))
        }))
        .init();

    // Build identification first, before any network activity
    info!(
        "Starting lms-curriculum v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    match config_resolver.resolve() {
        Some((path, _)) => info!(path = %path.display(), "Configuration loaded"),
        None => warn!("No config file found, using compiled defaults"),
    }

    let resolver = match CurriculumResolver::from_config(&config) {
        Ok(resolver) => resolver,
        Err(e) => {
            error!(error = %e, "Failed to configure curriculum resolver");
            return Err(e).context("Invalid API configuration");
        }
    };

    let app = build_router(AppState::new(resolver)).layer(CorsLayer::permissive());

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;
    info!("lms-curriculum listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

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
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install signal handler");
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
