use async_trait::async_trait;

use crate::domain::entities::notification_preference::NotificationPreference;
use crate::domain::repositories::task_repository::Result;

#[async_trait]
pub trait PreferenceRepository: Send + Sync {
    /// Obtain a user's notification preference by user id.
    async fn get(&self, user_id: u64) -> Result<Option<NotificationPreference>>;

    /// Save or replace a user's preference. Whole-record overwrite.
    async fn save(&self, preference: &NotificationPreference) -> Result<()>;
}
