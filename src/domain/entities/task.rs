use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Medium,
    High,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "low" => Some(Priority::Low),
            "medium" => Some(Priority::Medium),
            "high" => Some(Priority::High),
            _ => None,
        }
    }
}

/// Reminder delivery channel. Snapshotted onto the task at creation time, so
/// later preference changes never retarget an existing task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationChannel {
    Email,
    WhatsApp,
}

impl NotificationChannel {
    pub const ALL: [NotificationChannel; 2] =
        [NotificationChannel::Email, NotificationChannel::WhatsApp];

    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationChannel::Email => "email",
            NotificationChannel::WhatsApp => "whatsapp",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "email" => Some(NotificationChannel::Email),
            "whatsapp" => Some(NotificationChannel::WhatsApp),
            _ => None,
        }
    }
}

impl std::fmt::Display for NotificationChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: u64,
    pub user_id: u64,
    pub title: String,
    pub description: String,
    /// Canonical wall-clock deadline, `YYYY-MM-DDTHH:mm`. The write gate in
    /// TaskService guarantees this shape for everything it persists; the
    /// scheduler still re-parses defensively on every scan.
    pub deadline: String,
    pub priority: Priority,
    pub channel: NotificationChannel,
    pub notification_email: Option<String>,
    pub notification_whatsapp: Option<String>,
    /// Lead time in minutes before the deadline. Zero means "at the deadline".
    pub notification_lead_minutes: u32,
    /// One-shot flag, false at creation, flipped to true exactly once by the
    /// scheduler. Never reset.
    pub notified: bool,
    pub created_at: DateTime<Utc>,
}

impl Task {
    /// Destination address for this task's channel, if a non-empty one was
    /// snapshotted at creation.
    pub fn notify_address(&self) -> Option<&str> {
        let address = match self.channel {
            NotificationChannel::Email => self.notification_email.as_deref(),
            NotificationChannel::WhatsApp => self.notification_whatsapp.as_deref(),
        };
        address.filter(|a| !a.trim().is_empty())
    }
}
