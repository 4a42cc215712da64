//! reelcheck-review - Script review service
//!
//! Classifies submitted film scripts against the Bechdel test through an
//! external classifier, stores the verdicts and serves the comment threads.
//!
//! Default port: 5790

use std::fs::OpenOptions;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use clap::Parser;
use reelcheck_common::config::{
    default_config_path, load_toml_config_or_default, write_toml_config, LoggingConfig,
    RootFolderInitializer, RootFolderResolver,
};
use reelcheck_common::time::millis_to_duration;
use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use reelcheck_review::classifier::HttpClassifier;
use reelcheck_review::AppState;

const MODULE_NAME: &str = "reelcheck-review";

/// Command-line arguments for reelcheck-review
#[derive(Parser, Debug)]
#[command(name = "reelcheck-review")]
#[command(about = "Bechdel script review service")]
#[command(version)]
struct Args {
    /// Port to listen on
    #[arg(short, long, env = "REELCHECK_REVIEW_PORT")]
    port: Option<u16>,

    /// Address to bind
    #[arg(long, env = "REELCHECK_REVIEW_HOST")]
    host: Option<String>,

    /// Root folder holding the database
    #[arg(short, long)]
    root_folder: Option<PathBuf>,

    /// Path to the TOML config file
    #[arg(short, long, env = "REELCHECK_REVIEW_CONFIG")]
    config: Option<PathBuf>,

    /// Classifier endpoint URL
    #[arg(long, env = "REELCHECK_CLASSIFIER_URL")]
    classifier_url: Option<String>,

    /// Classifier timeout in milliseconds
    #[arg(long, env = "REELCHECK_CLASSIFIER_TIMEOUT_MS")]
    classifier_timeout_ms: Option<u64>,

    /// Save the effective settings to the config file and exit
    #[arg(long)]
    write_config: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config_path = args
        .config
        .clone()
        .or_else(|| default_config_path(MODULE_NAME));
    let mut toml_config = load_toml_config_or_default(config_path.as_deref());

    init_tracing(&toml_config.logging)?;

    // Command-line overrides take precedence over the TOML file
    if let Some(url) = args.classifier_url.clone() {
        toml_config.classifier.endpoint = url;
    }
    if let Some(timeout_ms) = args.classifier_timeout_ms {
        toml_config.classifier.timeout_ms = timeout_ms;
    }
    if let Some(host) = args.host.clone() {
        toml_config.server.host = host;
    }
    if let Some(port) = args.port {
        toml_config.server.port = port;
    }

    if args.write_config {
        let path = config_path.context("No config file location available; pass --config")?;
        if args.root_folder.is_some() {
            toml_config.root_folder = args.root_folder.clone();
        }
        write_toml_config(&toml_config, &path)
            .with_context(|| format!("Failed to write config file {}", path.display()))?;
        info!("Wrote config file: {}", path.display());
        return Ok(());
    }

    info!("Starting reelcheck-review v{}", env!("CARGO_PKG_VERSION"));
    if let Some(path) = &config_path {
        info!("Config file: {}", path.display());
    }

    // Root folder: CLI → ENV → TOML → default
    let root_folder = RootFolderResolver::new(MODULE_NAME)
        .with_cli_arg(args.root_folder.clone())
        .with_toml(&toml_config)
        .resolve();

    let initializer = RootFolderInitializer::new(root_folder);
    initializer
        .ensure_directory_exists()
        .context("Failed to initialize root folder")?;

    let db_path = initializer.database_path();
    info!("Database: {}", db_path.display());

    let db_pool = reelcheck_common::db::init_database(&db_path)
        .await
        .context("Failed to open database")?;

    let classifier = HttpClassifier::from_config(&toml_config.classifier)
        .context("Failed to create classifier client")?;
    info!(
        "Classifier: {} (timeout {} ms)",
        classifier.endpoint(),
        toml_config.classifier.timeout_ms
    );

    let state = AppState::new(db_pool, Arc::new(classifier))
        .with_classify_timeout(millis_to_duration(toml_config.classifier.timeout_ms));

    let app = reelcheck_review::build_router(state);

    let host = toml_config.server.host;
    let port = toml_config.server.port;
    let addr: SocketAddr = format!("{}:{}", host, port)
        .parse()
        .with_context(|| format!("Invalid bind address {}:{}", host, port))?;

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;
    info!("Listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Console logging, plus an optional plain-text log file
fn init_tracing(logging: &LoggingConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "reelcheck_review={0},reelcheck_common={0},tower_http=info",
            logging.level
        ))
    });

    let file_layer = match &logging.file {
        Some(path) => Some(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(Mutex::new(open_log_file(path)?)),
        ),
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .with(file_layer)
        .try_init()
        .context("Failed to initialize logging")?;

    Ok(())
}

fn open_log_file(path: &Path) -> Result<std::fs::File> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create log directory {}", parent.display()))?;
    }

    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Failed to open log file {}", path.display()))
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
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
                tracing::error!("Failed to install SIGTERM handler: {}", e);
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
