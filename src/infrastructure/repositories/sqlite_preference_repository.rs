use async_trait::async_trait;
use rusqlite::{Connection, OptionalExtension, params};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use crate::domain::entities::notification_preference::NotificationPreference;
use crate::domain::entities::task::NotificationChannel;
use crate::domain::repositories::preference_repository::PreferenceRepository;
use crate::domain::repositories::task_repository::{RepositoryError, Result};

pub struct SqlitePreferenceRepository {
    conn: Arc<Mutex<Connection>>,
}

impl SqlitePreferenceRepository {
    pub fn new(db_path: impl Into<PathBuf>) -> Result<Self> {
        let path = db_path.into();
        let conn = Connection::open(path).map_err(|e| {
            RepositoryError::StorageError(format!("Failed to open SQLite DB: {}", e))
        })?;

        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS notification_preferences (
                user_id                 INTEGER PRIMARY KEY,
                channel                 TEXT NOT NULL,
                notification_email      TEXT,
                notification_whatsapp   TEXT,
                notification_lead_minutes INTEGER NOT NULL
            );
            ",
        )
        .map_err(|e| RepositoryError::StorageError(format!("Failed to create schema: {}", e)))?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }
}

#[async_trait]
impl PreferenceRepository for SqlitePreferenceRepository {
    async fn get(&self, user_id: u64) -> Result<Option<NotificationPreference>> {
        let conn = self.conn.clone();

        tokio::task::spawn_blocking(move || -> Result<Option<NotificationPreference>> {
            let conn_lock = conn.lock().unwrap();

            let row = conn_lock
                .query_row(
                    "SELECT user_id, channel, notification_email, notification_whatsapp,
                            notification_lead_minutes
                     FROM notification_preferences WHERE user_id = ?1",
                    params![user_id as i64],
                    |row| {
                        Ok((
                            row.get::<_, i64>(0)?,
                            row.get::<_, String>(1)?,
                            row.get::<_, Option<String>>(2)?,
                            row.get::<_, Option<String>>(3)?,
                            row.get::<_, i64>(4)?,
                        ))
                    },
                )
                .optional()
                .map_err(|e| RepositoryError::StorageError(e.to_string()))?;

            let Some((user_id, channel_raw, email, whatsapp, lead_minutes)) = row else {
                return Ok(None);
            };

            let channel = NotificationChannel::parse(&channel_raw).ok_or_else(|| {
                RepositoryError::InvalidData(format!("Unknown channel {:?}", channel_raw))
            })?;

            Ok(Some(NotificationPreference {
                user_id: user_id as u64,
                channel,
                notification_email: email,
                notification_whatsapp: whatsapp,
                notification_lead_minutes: lead_minutes.max(0) as u32,
            }))
        })
        .await
        .map_err(|e| RepositoryError::StorageError(e.to_string()))?
    }

    async fn save(&self, preference: &NotificationPreference) -> Result<()> {
        let conn = self.conn.clone();
        let preference = preference.clone();

        tokio::task::spawn_blocking(move || -> Result<()> {
            let conn_lock = conn.lock().unwrap();
            // Whole-record replace, matching the save semantics of the store.
            conn_lock
                .execute(
                    "INSERT OR REPLACE INTO notification_preferences (
                        user_id, channel, notification_email, notification_whatsapp,
                        notification_lead_minutes
                     )
                     VALUES (?1, ?2, ?3, ?4, ?5)",
                    params![
                        preference.user_id as i64,
                        preference.channel.as_str(),
                        preference.notification_email,
                        preference.notification_whatsapp,
                        preference.notification_lead_minutes as i64,
                    ],
                )
                .map_err(|e| RepositoryError::StorageError(e.to_string()))?;
            Ok(())
        })
        .await
        .map_err(|e| RepositoryError::StorageError(e.to_string()))?
    }
}
