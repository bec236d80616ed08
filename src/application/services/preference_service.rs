use std::sync::Arc;

use crate::domain::entities::notification_preference::NotificationPreference;
use crate::domain::entities::task::NotificationChannel;
use crate::domain::repositories::preference_repository::PreferenceRepository;
use crate::domain::repositories::task_repository::RepositoryError;

#[derive(Debug)]
pub enum PreferenceError {
    /// Lead time must be whole minutes in `0..=u32::MAX`; it is never
    /// defaulted or truncated silently downstream.
    InvalidLeadTime(i64),
    /// The chosen channel has no usable destination address.
    MissingAddress(NotificationChannel),
    Storage(RepositoryError),
}

impl std::fmt::Display for PreferenceError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            PreferenceError::InvalidLeadTime(minutes) => {
                write!(f, "Notification lead time out of range: {}", minutes)
            }
            PreferenceError::MissingAddress(channel) => {
                write!(f, "No {} address configured for that channel", channel)
            }
            PreferenceError::Storage(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for PreferenceError {}

impl From<RepositoryError> for PreferenceError {
    fn from(err: RepositoryError) -> Self {
        PreferenceError::Storage(err)
    }
}

/// Write path for per-user notification settings. Saves replace the whole
/// record; validation happens here so the scheduler never has to second-guess
/// a stored preference.
#[allow(dead_code)]
pub struct PreferenceService {
    preference_repo: Arc<dyn PreferenceRepository>,
}

#[allow(dead_code)]
impl PreferenceService {
    pub fn new(preference_repo: Arc<dyn PreferenceRepository>) -> Self {
        Self { preference_repo }
    }

    pub async fn save_preference(
        &self,
        user_id: u64,
        channel: NotificationChannel,
        notification_email: Option<String>,
        notification_whatsapp: Option<String>,
        lead_minutes: i64,
    ) -> Result<(), PreferenceError> {
        let lead = u32::try_from(lead_minutes)
            .map_err(|_| PreferenceError::InvalidLeadTime(lead_minutes))?;

        let preference = NotificationPreference {
            user_id,
            channel,
            notification_email,
            notification_whatsapp,
            notification_lead_minutes: lead,
        };

        if preference.address_for_channel().is_none() {
            return Err(PreferenceError::MissingAddress(channel));
        }

        Ok(self.preference_repo.save(&preference).await?)
    }

    pub async fn get_preference(
        &self,
        user_id: u64,
    ) -> Result<Option<NotificationPreference>, PreferenceError> {
        Ok(self.preference_repo.get(user_id).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::repositories::memory_preference_repository::MemoryPreferenceRepository;

    fn service() -> PreferenceService {
        PreferenceService::new(Arc::new(MemoryPreferenceRepository::new()))
    }

    #[tokio::test]
    async fn negative_lead_time_is_rejected_at_save() {
        let service = service();
        let err = service
            .save_preference(
                7,
                NotificationChannel::Email,
                Some("user@example.com".to_string()),
                None,
                -5,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, PreferenceError::InvalidLeadTime(-5)));
        assert!(service.get_preference(7).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn zero_lead_time_means_fire_at_deadline_and_is_valid() {
        let service = service();
        service
            .save_preference(
                7,
                NotificationChannel::Email,
                Some("user@example.com".to_string()),
                None,
                0,
            )
            .await
            .unwrap();
        let saved = service.get_preference(7).await.unwrap().unwrap();
        assert_eq!(saved.notification_lead_minutes, 0);
    }

    #[tokio::test]
    async fn lead_time_beyond_u32_is_rejected_not_truncated() {
        let service = service();
        let too_large = i64::from(u32::MAX) + 1;
        let err = service
            .save_preference(
                7,
                NotificationChannel::Email,
                Some("user@example.com".to_string()),
                None,
                too_large,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, PreferenceError::InvalidLeadTime(v) if v == too_large));
        assert!(service.get_preference(7).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn channel_without_address_is_rejected() {
        let service = service();
        let err = service
            .save_preference(
                7,
                NotificationChannel::WhatsApp,
                Some("user@example.com".to_string()),
                None,
                10,
            )
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            PreferenceError::MissingAddress(NotificationChannel::WhatsApp)
        ));
    }

    #[tokio::test]
    async fn save_replaces_the_whole_record() {
        let service = service();
        service
            .save_preference(
                7,
                NotificationChannel::Email,
                Some("old@example.com".to_string()),
                Some("+555123".to_string()),
                15,
            )
            .await
            .unwrap();
        service
            .save_preference(
                7,
                NotificationChannel::WhatsApp,
                None,
                Some("+555999".to_string()),
                5,
            )
            .await
            .unwrap();

        let saved = service.get_preference(7).await.unwrap().unwrap();
        assert_eq!(saved.channel, NotificationChannel::WhatsApp);
        // not merged: the old email is gone
        assert_eq!(saved.notification_email, None);
        assert_eq!(saved.notification_whatsapp.as_deref(), Some("+555999"));
        assert_eq!(saved.notification_lead_minutes, 5);
    }
}
