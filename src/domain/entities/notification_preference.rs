use serde::{Deserialize, Serialize};

use crate::domain::entities::task::NotificationChannel;

/// Per-user reminder settings. Saved wholesale: a save replaces the previous
/// record, it is never merged field by field. Tasks copy these values at
/// creation time, so editing a preference only affects tasks created later.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationPreference {
    pub user_id: u64,
    pub channel: NotificationChannel,
    pub notification_email: Option<String>,
    pub notification_whatsapp: Option<String>,
    pub notification_lead_minutes: u32,
}

impl NotificationPreference {
    /// Address configured for the preferred channel, if non-empty.
    pub fn address_for_channel(&self) -> Option<&str> {
        let address = match self.channel {
            NotificationChannel::Email => self.notification_email.as_deref(),
            NotificationChannel::WhatsApp => self.notification_whatsapp.as_deref(),
        };
        address.filter(|a| !a.trim().is_empty())
    }
}
