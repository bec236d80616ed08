use anyhow::{Context, Result};
use std::time::Duration;

/// Process configuration, read once at startup from the environment
/// (`.env` friendly via dotenvy).
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_path: String,
    /// Cadence of the reminder scan. One minute is the target granularity;
    /// finer values still match at whole minutes.
    pub tick_interval: Duration,
    /// Upper bound for a single Notifier call.
    pub send_timeout: Duration,
    pub email_gateway_url: Option<String>,
    pub whatsapp_gateway_url: Option<String>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        let database_path =
            std::env::var("TASK_TICK_DB").unwrap_or_else(|_| "task_tick.db".to_string());

        let tick_interval = Duration::from_secs(
            env_u64("SCHEDULER_TICK_SECS", 60).context("Invalid SCHEDULER_TICK_SECS")?,
        );
        let send_timeout = Duration::from_secs(
            env_u64("NOTIFY_SEND_TIMEOUT_SECS", 10).context("Invalid NOTIFY_SEND_TIMEOUT_SECS")?,
        );

        Ok(Self {
            database_path,
            tick_interval,
            send_timeout,
            email_gateway_url: env_opt("EMAIL_GATEWAY_URL"),
            whatsapp_gateway_url: env_opt("WHATSAPP_GATEWAY_URL"),
        })
    }
}

fn env_u64(name: &str, default: u64) -> Result<u64> {
    match std::env::var(name) {
        Ok(raw) => raw
            .parse::<u64>()
            .with_context(|| format!("{} must be a positive integer, got {:?}", name, raw)),
        Err(_) => Ok(default),
    }
}

fn env_opt(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}
