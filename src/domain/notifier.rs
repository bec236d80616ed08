use async_trait::async_trait;

use crate::domain::entities::task::NotificationChannel;

#[derive(Debug)]
pub enum NotifyError {
    Send(String),
    Timeout,
}

impl std::fmt::Display for NotifyError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            NotifyError::Send(msg) => write!(f, "Send failed: {}", msg),
            NotifyError::Timeout => write!(f, "Send timed out"),
        }
    }
}

impl std::error::Error for NotifyError {}

/// Outbound message transport. Implementations deliver to an email address or
/// a WhatsApp number; the scheduler treats them as fire-and-forget and never
/// retries inline.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(
        &self,
        channel: NotificationChannel,
        address: &str,
        subject: &str,
        body: &str,
    ) -> Result<(), NotifyError>;
}
