use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;

use crate::domain::entities::task::Task;
use crate::domain::notifier::{Notifier, NotifyError};

/// Renders reminder messages and pushes them through the configured
/// [`Notifier`], bounded by a per-send timeout so a hung transport cannot
/// stall the scheduler's next tick.
pub struct NotificationService {
    notifier: Arc<dyn Notifier>,
    send_timeout: Duration,
}

impl NotificationService {
    pub fn new(notifier: Arc<dyn Notifier>, send_timeout: Duration) -> Self {
        Self {
            notifier,
            send_timeout,
        }
    }

    /// Send the one-time reminder for a task to the given address.
    pub async fn send_reminder(&self, task: &Task, address: &str) -> Result<(), NotifyError> {
        let subject = format!("Reminder for task: {}", task.title);
        let body = Self::render_body(task);

        match timeout(
            self.send_timeout,
            self.notifier.send(task.channel, address, &subject, &body),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(NotifyError::Timeout),
        }
    }

    fn render_body(task: &Task) -> String {
        // The stored deadline is already the human wall clock; displaying it
        // means swapping the T for a space, never converting through a zone.
        let deadline_display = task.deadline.replace('T', " ");
        format!(
            "Hello,\n\nThis is a reminder for your task:\n\n\
             Title: {}\nDescription: {}\nDeadline: {}\nPriority: {}\n\n\
             Please complete your task before the deadline.\n\n- Task Tick",
            task.title,
            task.description,
            deadline_display,
            task.priority.as_str(),
        )
    }
}
