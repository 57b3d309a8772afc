//! dwelld - dwell-time tracking service
//!
//! This is the main entry point for the dwelld service.
//! It wires together all the components:
//! - Configuration loading
//! - Store initialization
//! - Session tracker
//! - HTTP API
//! - Periodic heartbeat-log maintenance

use anyhow::{Context, Result};
use clap::Parser;
use dwell_config::load_config;
use dwell_core::SessionTracker;
use dwell_store::{AuditEvent, AuditEventType, SqliteStore, Store};
use dwell_util::{Clock, DATABASE_FILENAME, SystemClock, default_config_path};
use dwelld::api::{AppContext, create_router};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal::unix::{SignalKind, signal};
use tokio::sync::oneshot;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// How often old heartbeat samples and idle per-record state are dropped
const MAINTENANCE_INTERVAL: Duration = Duration::from_secs(300);

/// dwelld - Validated dwell-time tracking for learning content
#[derive(Parser, Debug)]
#[command(name = "dwelld")]
#[command(about = "Validated dwell-time tracking for learning content", long_about = None)]
struct Args {
    /// Configuration file path (default: ~/.config/dwelld/config.toml)
    #[arg(short, long, default_value_os_t = default_config_path())]
    config: PathBuf,

    /// Listen address override (or set DWELL_LISTEN env var)
    #[arg(long, env = "DWELL_LISTEN")]
    listen: Option<SocketAddr>,

    /// Data directory override (or set DWELL_DATA_DIR env var)
    #[arg(short, long, env = "DWELL_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Log level
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Emit logs as JSON lines
    #[arg(long)]
    log_json: bool,
}

/// Main service state
struct Service {
    tracker: Arc<SessionTracker>,
    store: Arc<dyn Store>,
    clock: Arc<dyn Clock>,
    listen_addr: SocketAddr,
    heartbeat_retention: Duration,
}

impl Service {
    fn new(args: &Args) -> Result<Self> {
        let config = load_config(&args.config)
            .with_context(|| format!("Failed to load config from {:?}", args.config))?;

        info!(
            config_path = %args.config.display(),
            subsection_count = config.subsections.len(),
            "Configuration loaded"
        );

        let listen_addr = args.listen.unwrap_or(config.service.listen_addr);
        let data_dir = args
            .data_dir
            .clone()
            .unwrap_or_else(|| config.service.data_dir.clone());

        std::fs::create_dir_all(&data_dir)
            .with_context(|| format!("Failed to create data directory {:?}", data_dir))?;

        let db_path = data_dir.join(DATABASE_FILENAME);
        let store: Arc<dyn Store> = Arc::new(
            SqliteStore::open(&db_path, config.service.store_timeout)
                .with_context(|| format!("Failed to open database {:?}", db_path))?,
        );

        info!(db_path = %db_path.display(), "Store initialized");

        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let now = clock.now();
        store.append_audit(AuditEvent::new(AuditEventType::ServiceStarted, now))?;
        store.append_audit(AuditEvent::new(
            AuditEventType::ConfigLoaded {
                subsection_count: config.subsections.len(),
            },
            now,
        ))?;

        let tracker = Arc::new(SessionTracker::new(&config, store.clone()));

        Ok(Self {
            tracker,
            store,
            clock,
            listen_addr,
            heartbeat_retention: config.service.heartbeat_retention,
        })
    }

    async fn run(self) -> Result<()> {
        let router = create_router(AppContext {
            tracker: self.tracker.clone(),
            clock: self.clock.clone(),
        });

        let listener = tokio::net::TcpListener::bind(self.listen_addr)
            .await
            .with_context(|| format!("Failed to bind {}", self.listen_addr))?;

        info!(listen_addr = %self.listen_addr, "HTTP server listening");

        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let server = tokio::spawn(async move {
            axum::serve(listener, router)
                .with_graceful_shutdown(async {
                    let _ = shutdown_rx.await;
                })
                .await
        });

        let mut sigterm =
            signal(SignalKind::terminate()).context("Failed to create SIGTERM handler")?;
        let mut sigint =
            signal(SignalKind::interrupt()).context("Failed to create SIGINT handler")?;

        let mut maintenance_timer = tokio::time::interval(MAINTENANCE_INTERVAL);

        info!("Service running");

        loop {
            tokio::select! {
                _ = sigterm.recv() => {
                    info!("Received SIGTERM, shutting down gracefully");
                    break;
                }
                _ = sigint.recv() => {
                    info!("Received SIGINT, shutting down gracefully");
                    break;
                }

                _ = maintenance_timer.tick() => {
                    match self.tracker.run_maintenance(self.clock.now(), self.heartbeat_retention) {
                        Ok(report) if report.heartbeats_pruned > 0 || report.idle_locks_pruned > 0 => {
                            info!(
                                heartbeats_pruned = report.heartbeats_pruned,
                                idle_locks_pruned = report.idle_locks_pruned,
                                "Maintenance pass"
                            );
                        }
                        Ok(_) => {}
                        Err(e) => warn!(error = %e, "Maintenance pass failed"),
                    }
                }
            }
        }

        let _ = shutdown_tx.send(());
        match server.await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => error!(error = %e, "HTTP server error"),
            Err(e) => error!(error = %e, "HTTP server task failed"),
        }

        if let Err(e) = self
            .store
            .append_audit(AuditEvent::new(AuditEventType::ServiceStopped, self.clock.now()))
        {
            warn!(error = %e, "Failed to record shutdown");
        }

        info!("Service stopped");
        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    if args.log_json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .init();
    }

    info!(version = env!("CARGO_PKG_VERSION"), "dwelld starting");

    let service = Service::new(&args)?;
    service.run().await
}
