//! `remindd` -- task-reminder HTTP server.
//!
//! An axum server exposing a per-user task API with a background scheduler
//! that scans every minute for tasks whose reminder time falls within the
//! next five minutes and emails their owners.
//!
//! # Usage
//!
//! ```bash
//! # Run on default address 0.0.0.0:5000
//! cargo run --bin remindd
//!
//! # Run on custom address
//! cargo run --bin remindd -- --bind 127.0.0.1:8080
//!
//! # Or via environment variable
//! REMINDD_ADDR=127.0.0.1:8080 cargo run --bin remindd
//! ```

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use remindd_core::clock::SystemClock;
use remindd_core::notify::{MemoryDirectory, Notifier};
use remindd_core::scheduler::ReminderScheduler;
use remindd_core::service::TaskService;
use remindd_core::store::{MemoryStore, TaskStore};
use remindd_server::api::{self, AppState};
use remindd_server::config::{CliArgs, ServerConfig};

#[tokio::main]
async fn main() {
    let cli = CliArgs::parse();

    // Load config from CLI args + config file + env vars + defaults.
    let config = match ServerConfig::load(&cli) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error loading configuration: {e}");
            std::process::exit(1);
        }
    };

    // Initialize tracing with the resolved log level.
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_level));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    tracing::info!(addr = %config.bind_addr, "starting remindd server");

    let clock = Arc::new(SystemClock);
    let store: Arc<dyn TaskStore> = Arc::new(MemoryStore::new(clock.clone()));
    let directory = Arc::new(MemoryDirectory::new());

    // No mail transport is wired up here, so reminders are logged rather
    // than sent. Deployments put a real transport behind the Notifier.
    let notifier = Arc::new(Notifier::new(directory.clone()));

    let scheduler = Arc::new(
        ReminderScheduler::new(Arc::clone(&store), notifier, clock.clone()).with_timing(
            Duration::from_secs(config.scan_period_secs),
            chrono::Duration::minutes(config.reminder_window_mins),
        ),
    );
    let scheduler_handle = scheduler.start();
    tracing::info!(
        period_secs = config.scan_period_secs,
        window_mins = config.reminder_window_mins,
        "reminder scheduler running"
    );

    let state = Arc::new(AppState {
        service: TaskService::new(store, clock),
        directory,
    });

    match api::start_server(&config.bind_addr, state).await {
        Ok((bound_addr, handle)) => {
            tracing::info!(addr = %bound_addr, "remindd server listening");
            if let Err(e) = handle.await {
                tracing::error!(error = %e, "server task failed");
            }
        }
        Err(e) => {
            tracing::error!(error = %e, "failed to start server");
            scheduler_handle.stop().await;
            std::process::exit(1);
        }
    }
}
