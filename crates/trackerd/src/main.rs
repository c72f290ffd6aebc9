//! Main application entry point for the invite tracker daemon.
//!
//! Loads configuration, wires the tracker pipeline to the join-event feed
//! and the notification transport, and runs until a shutdown signal,
//! reloading configuration on SIGHUP.

use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use invite_tracker::{
    AdminActor, InviteTracker, NotificationTransport, VisitLedger, RELOAD_CAPABILITY,
};

mod cli;
mod config;
mod feed;
mod signals;
mod transport;

use cli::CliArgs;
use config::{AppConfig, LoggingSettings};
use signals::{Lifecycle, SignalListener};
use transport::LoggingTransport;

/// Initialize the logging system.
fn setup_logging(config: &LoggingSettings, json_format: bool) -> Result<(), Box<dyn std::error::Error>> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    let registry = tracing_subscriber::registry().with(filter);

    if json_format || config.json_format {
        registry.with(fmt::layer().json().with_target(false)).init();
    } else {
        registry.with(fmt::layer().with_target(false)).init();
    }

    Ok(())
}

/// Main application struct.
pub struct Application {
    config_path: PathBuf,
    config: AppConfig,
    tracker: Arc<InviteTracker>,
    admin: AdminActor,
}

impl Application {
    /// Creates the application: configuration, logging, ledger, tracker.
    pub async fn new(args: CliArgs) -> Result<Self, Box<dyn std::error::Error>> {
        let created_default = !args.config_path.exists();
        let mut config = AppConfig::load_from_file(&args.config_path).await?;

        // Apply CLI overrides
        if let Some(data_file) = args.data_file {
            config.tracker.data_file = data_file.to_string_lossy().to_string();
        }
        if let Some(log_level) = args.log_level {
            config.logging.level = log_level;
        }
        if args.json_logs {
            config.logging.json_format = true;
        }

        if let Err(e) = config.validate() {
            return Err(format!("Configuration validation failed: {}", e).into());
        }

        setup_logging(&config.logging, args.json_logs)?;

        // The config load runs before the subscriber exists, so the
        // first-run creation is announced here instead.
        if created_default {
            info!(
                "Created default configuration file: {}",
                args.config_path.display()
            );
        }

        info!("Invite Tracker v{}", env!("CARGO_PKG_VERSION"));
        info!(
            "Config: {} | Ledger: {}",
            args.config_path.display(),
            config.tracker.data_file
        );

        let ledger = VisitLedger::open(&config.tracker.data_file).await?;
        let factory = |_credential: &str| -> Arc<dyn NotificationTransport> {
            Arc::new(LoggingTransport::new())
        };
        let tracker = Arc::new(InviteTracker::new(ledger, Box::new(factory)));

        // The local console holds the reload capability; remote actors
        // would have to earn it elsewhere.
        let admin = AdminActor::new("local-console", vec![RELOAD_CAPABILITY.to_string()]);

        tracker
            .reload(
                &admin,
                &config.domain_entries(),
                &config.notifications.credential,
            )
            .await?;

        Ok(Self {
            config_path: args.config_path,
            config,
            tracker,
            admin,
        })
    }

    /// Runs until a shutdown signal arrives, reloading on SIGHUP.
    pub async fn run(mut self) -> Result<(), Box<dyn std::error::Error>> {
        let feed_handle = {
            let tracker = Arc::clone(&self.tracker);
            tokio::spawn(async move {
                feed::run_join_feed(tracker).await;
            })
        };

        let mut listener = SignalListener::new()?;
        info!(
            "Invite tracker is running (ledger at {}); SIGHUP reloads, SIGINT/SIGTERM stop",
            self.config.tracker.data_file
        );

        loop {
            match listener.recv().await {
                Lifecycle::Reload => {
                    if let Err(e) = self.reload().await {
                        warn!("Reload failed: {}", e);
                    }
                }
                Lifecycle::Shutdown => break,
            }
        }

        info!("Shutting down...");
        feed_handle.abort();
        self.tracker.shutdown().await?;
        info!("Invite tracker shutdown complete");
        Ok(())
    }

    /// Re-reads the configuration file and applies it to the tracker.
    async fn reload(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        let config = AppConfig::load_from_file(&self.config_path).await?;
        config.validate()?;

        let took = self
            .tracker
            .reload(
                &self.admin,
                &config.domain_entries(),
                &config.notifications.credential,
            )
            .await?;
        self.config = config;

        info!("Configuration reloaded in {}ms", took.as_millis());
        Ok(())
    }
}

#[tokio::main(flavor = "multi_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();

    match Application::new(args).await {
        Ok(app) => {
            if let Err(e) = app.run().await {
                error!("Application error: {:?}", e);
                std::process::exit(1);
            }
        }
        Err(e) => {
            eprintln!("Failed to start application: {:?}", e);
            std::process::exit(1);
        }
    }

    Ok(())
}
