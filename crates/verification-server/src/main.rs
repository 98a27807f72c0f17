//! # Passport Verification Server
//!
//! Serves the proof-of-personhood HTTP API.
//!
//! ## Startup Sequence
//!
//! 1. Parse CLI arguments and set up logging
//! 2. Load configuration (file, then `PP_*` environment overrides)
//! 3. Validate configuration (signer keys, provider keys, chains)
//! 4. Build the service container
//! 5. Serve until Ctrl+C

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing::{error, info, Level};
use tracing_subscriber::{fmt, EnvFilter};

use verification_server::{ServerConfig, ServiceContainer};

/// Passport proof-of-personhood verification server
#[derive(Parser, Debug)]
#[command(name = "verification-server")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to a JSON configuration file
    #[arg(short, long, env = "PP_CONFIG")]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "PP_LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Log format (plain, json)
    #[arg(long, env = "PP_LOG_FORMAT", default_value = "plain")]
    log_format: String,
}

fn setup_logging(log_level: &str, log_format: &str) -> Result<()> {
    let level = match log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let filter = EnvFilter::from_default_env()
        .add_directive(level.into())
        .add_directive("hyper=warn".parse()?)
        .add_directive("reqwest=warn".parse()?);

    match log_format.to_lowercase().as_str() {
        "json" => {
            let subscriber = fmt::Subscriber::builder()
                .with_env_filter(filter)
                .json()
                .flatten_event(true)
                .with_current_span(false)
                .finish();
            tracing::subscriber::set_global_default(subscriber)
                .context("Failed to set subscriber")?;
        }
        _ => {
            let subscriber = fmt::Subscriber::builder()
                .with_env_filter(filter)
                .with_target(true)
                .finish();
            tracing::subscriber::set_global_default(subscriber)
                .context("Failed to set subscriber")?;
        }
    }

    Ok(())
}

fn load_config(args: &Args) -> Result<ServerConfig> {
    let mut config = match &args.config {
        Some(path) => ServerConfig::from_file(path)
            .with_context(|| format!("Failed to load {}", path.display()))?,
        None => ServerConfig::default(),
    };
    config
        .apply_env(std::env::vars())
        .context("Invalid environment override")?;
    config.validate().context("Invalid configuration")?;
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    setup_logging(&args.log_level, &args.log_format)?;

    info!("===========================================");
    info!("  Passport Verification Server v{}", env!("CARGO_PKG_VERSION"));
    info!("===========================================");

    let config = load_config(&args)?;
    let container = ServiceContainer::new(config).context("Failed to build services")?;
    let mut gateway = container.gateway().context("Failed to build gateway")?;
    let addr = gateway.start().await.context("Failed to start HTTP server")?;

    info!(%addr, "Server is running. Press Ctrl+C to stop.");

    tokio::select! {
        result = tokio::signal::ctrl_c() => {
            result.context("Failed to listen for Ctrl+C")?;
            info!("Shutdown signal received");
            gateway.shutdown();
            gateway.wait().await.context("HTTP server error during shutdown")?;
        }
        result = gateway.wait() => {
            if let Err(e) = &result {
                error!(error = %e, "HTTP server exited");
            }
            result.context("HTTP server exited")?;
        }
    }

    info!("Server stopped");
    Ok(())
}
