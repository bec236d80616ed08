use dotenvy::dotenv;
mod application;
mod domain;
mod infrastructure;
mod utils;

use anyhow::Result;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::info;

use crate::application::services::deadline_backfill::DeadlineBackfill;
use crate::application::services::notification_service::NotificationService;
use crate::domain::value_objects::deadline::DeadlineCodec;
use crate::infrastructure::config::AppConfig;
use crate::infrastructure::notifier::HttpGatewayNotifier;
use crate::infrastructure::repositories::{SqlitePreferenceRepository, SqliteTaskRepository};
use crate::infrastructure::scheduler::ReminderScheduler;

#[tokio::main]
async fn main() -> Result<()> {
    utils::setup_logging();
    dotenv().ok();

    let config = AppConfig::from_env()?;
    let task_repo = Arc::new(SqliteTaskRepository::new(&config.database_path)?);
    // Schema initialization only: opening the preference store creates its
    // table in the shared database file. Preference writes come from the
    // external write path, not this process.
    SqlitePreferenceRepository::new(&config.database_path)?;

    // One-shot maintenance mode: rewrite legacy deadlines and exit.
    if std::env::args().any(|arg| arg == "--fix-deadlines") {
        let backfill = DeadlineBackfill::new(task_repo, DeadlineCodec::local());
        let report = backfill.run().await?;
        info!(
            examined = report.examined,
            rewritten = report.rewritten,
            unparseable = report.unparseable,
            "Backfill complete"
        );
        return Ok(());
    }

    let notifier = Arc::new(HttpGatewayNotifier::new(
        config.email_gateway_url.clone(),
        config.whatsapp_gateway_url.clone(),
    ));
    let notification_service = Arc::new(NotificationService::new(notifier, config.send_timeout));

    let scheduler = Arc::new(ReminderScheduler::new(
        task_repo,
        notification_service,
        config.tick_interval,
    ));

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let scheduler_handle = scheduler.start(shutdown_rx);

    tokio::signal::ctrl_c().await?;
    info!("Shutdown requested, finishing current tick");
    let _ = shutdown_tx.send(true);
    scheduler_handle.await?;

    Ok(())
}
