use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::Mutex;

use crate::domain::entities::notification_preference::NotificationPreference;
use crate::domain::repositories::preference_repository::PreferenceRepository;
use crate::domain::repositories::task_repository::Result;

/// In-memory PreferenceRepository for tests and local runs.
#[derive(Debug, Default)]
pub struct MemoryPreferenceRepository {
    preferences: Mutex<HashMap<u64, NotificationPreference>>,
}

#[allow(dead_code)]
impl MemoryPreferenceRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PreferenceRepository for MemoryPreferenceRepository {
    async fn get(&self, user_id: u64) -> Result<Option<NotificationPreference>> {
        let preferences = self.preferences.lock().await;
        Ok(preferences.get(&user_id).cloned())
    }

    async fn save(&self, preference: &NotificationPreference) -> Result<()> {
        let mut preferences = self.preferences.lock().await;
        preferences.insert(preference.user_id, preference.clone());
        Ok(())
    }
}
