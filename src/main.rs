use std::sync::Arc;
use std::time::Duration;

use tracing::info;
use tracing_subscriber::EnvFilter;

use chairtime::desk::BookingDesk;
use chairtime::limits::DEFAULT_SLOT_STEP_MINUTES;
use chairtime::model::SlotStep;
use chairtime::notify::NotifyHub;
use chairtime::store::{ScheduleFile, ScheduleStore};
use chairtime::{observability, pruner, session};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // stdout carries responses; logs go to stderr.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let metrics_port: Option<u16> = std::env::var("CHAIRTIME_METRICS_PORT")
        .ok()
        .and_then(|s| s.parse().ok());
    observability::init(metrics_port);

    let slot_step: u16 = std::env::var("CHAIRTIME_SLOT_STEP")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(DEFAULT_SLOT_STEP_MINUTES);
    let default_step = SlotStep::new(slot_step)?;
    let prune_every: u64 = std::env::var("CHAIRTIME_PRUNE_INTERVAL_SECS")
        .ok()
        .and_then(|s| s.parse().ok())
        .filter(|secs| *secs > 0)
        .unwrap_or(30);
    let schedule_path = std::env::var("CHAIRTIME_SCHEDULE").ok();

    let store = Arc::new(ScheduleStore::new(Arc::new(NotifyHub::new())));
    if let Some(path) = &schedule_path {
        let raw = std::fs::read_to_string(path)?;
        let file = ScheduleFile::from_json(&raw)?;
        store.load(file).await?;
    }

    tokio::spawn(pruner::run_pruner(
        store.clone(),
        Duration::from_secs(prune_every),
    ));

    let desk = Arc::new(BookingDesk::new(store, default_step));
    info!("chairtime ready");
    info!("  schedule: {}", schedule_path.as_deref().unwrap_or("(empty)"));
    info!("  default slot step: {} min", default_step.minutes());
    info!("  metrics: {}", metrics_port.map_or("disabled".to_string(), |p| format!("http://0.0.0.0:{p}/metrics")));

    // Graceful shutdown: stop serving on SIGTERM/ctrl-c
    let shutdown = async {
        let ctrl_c = tokio::signal::ctrl_c();
        #[cfg(unix)]
        {
            let mut sigterm =
                tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
                    .expect("failed to register SIGTERM handler");
            tokio::select! {
                _ = ctrl_c => {}
                _ = sigterm.recv() => {}
            }
        }
        #[cfg(not(unix))]
        {
            ctrl_c.await.ok();
        }
    };

    tokio::select! {
        result = session::process_session(tokio::io::stdin(), tokio::io::stdout(), desk) => {
            if let Err(e) = result {
                tracing::error!("session error: {e}");
                return Err(e.into());
            }
        }
        _ = shutdown => {
            info!("shutdown signal received");
        }
    }

    info!("chairtime stopped");
    Ok(())
}
