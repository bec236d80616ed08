use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use rusqlite::{Connection, params};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tracing::warn;

use crate::domain::entities::task::{NotificationChannel, Priority, Task};
use crate::domain::repositories::task_repository::{RepositoryError, Result, TaskRepository};

pub struct SqliteTaskRepository {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteTaskRepository {
    pub fn new(db_path: impl Into<PathBuf>) -> Result<Self> {
        let path = db_path.into();
        let conn = Connection::open(path).map_err(|e| {
            RepositoryError::StorageError(format!("Failed to open SQLite DB: {}", e))
        })?;

        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS tasks (
                id               INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id          INTEGER NOT NULL,
                title            TEXT NOT NULL,
                description      TEXT NOT NULL,
                deadline         TEXT NOT NULL,
                priority         TEXT NOT NULL,
                channel          TEXT NOT NULL,
                notification_email     TEXT,
                notification_whatsapp  TEXT,
                notification_lead_minutes INTEGER NOT NULL,
                notified         INTEGER NOT NULL DEFAULT 0,
                created_at       INTEGER NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_tasks_pending
                ON tasks (channel, notified);
            ",
        )
        .map_err(|e| RepositoryError::StorageError(format!("Failed to create schema: {}", e)))?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    // Row -> Task helper; synchronous because it runs inside spawn_blocking.
    fn row_to_task(row: &rusqlite::Row) -> std::result::Result<Task, String> {
        let id: i64 = row.get("id").map_err(|e| e.to_string())?;
        let user_id: i64 = row.get("user_id").map_err(|e| e.to_string())?;
        let title: String = row.get("title").map_err(|e| e.to_string())?;
        let description: String = row.get("description").map_err(|e| e.to_string())?;
        let deadline: String = row.get("deadline").map_err(|e| e.to_string())?;

        let priority_raw: String = row.get("priority").map_err(|e| e.to_string())?;
        let priority = Priority::parse(&priority_raw)
            .ok_or_else(|| format!("Unknown priority {:?}", priority_raw))?;

        let channel_raw: String = row.get("channel").map_err(|e| e.to_string())?;
        let channel = NotificationChannel::parse(&channel_raw)
            .ok_or_else(|| format!("Unknown channel {:?}", channel_raw))?;

        let notification_email: Option<String> =
            row.get("notification_email").map_err(|e| e.to_string())?;
        let notification_whatsapp: Option<String> =
            row.get("notification_whatsapp").map_err(|e| e.to_string())?;
        let lead_minutes: i64 = row
            .get("notification_lead_minutes")
            .map_err(|e| e.to_string())?;
        let notified: bool = row.get("notified").map_err(|e| e.to_string())?;

        let created_ts: i64 = row.get("created_at").map_err(|e| e.to_string())?;
        let created_at = Utc
            .timestamp_opt(created_ts, 0)
            .single()
            .ok_or_else(|| format!("Invalid created_at timestamp {}", created_ts))?;

        Ok(Task {
            id: id as u64,
            user_id: user_id as u64,
            title,
            description,
            deadline,
            priority,
            channel,
            notification_email,
            notification_whatsapp,
            notification_lead_minutes: lead_minutes.max(0) as u32,
            notified,
            created_at,
        })
    }

    // Prepare/query failures are storage errors and bubble up to the caller;
    // a row that cannot be converted is logged and skipped so one bad record
    // does not hide the rest of the scan.
    fn query_tasks(
        conn: &Connection,
        sql: &str,
        args: &[&dyn rusqlite::ToSql],
    ) -> Result<Vec<Task>> {
        let mut stmt = conn
            .prepare(sql)
            .map_err(|e| RepositoryError::StorageError(e.to_string()))?;

        let rows = stmt
            .query_map(args, |row| Ok(SqliteTaskRepository::row_to_task(row)))
            .map_err(|e| RepositoryError::StorageError(e.to_string()))?;

        let mut tasks = Vec::new();
        for row in rows {
            match row.map_err(|e| RepositoryError::StorageError(e.to_string()))? {
                Ok(task) => tasks.push(task),
                Err(reason) => warn!("Skipping unreadable task row: {}", reason),
            }
        }
        Ok(tasks)
    }
}

#[async_trait]
impl TaskRepository for SqliteTaskRepository {
    async fn add_task(&self, task: Task) -> Result<u64> {
        let conn = self.conn.clone();

        tokio::task::spawn_blocking(move || -> Result<u64> {
            let conn_lock = conn.lock().unwrap();
            conn_lock
                .execute(
                    "INSERT INTO tasks (
                        user_id, title, description, deadline, priority, channel,
                        notification_email, notification_whatsapp,
                        notification_lead_minutes, notified, created_at
                     )
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
                    params![
                        task.user_id as i64,
                        task.title,
                        task.description,
                        task.deadline,
                        task.priority.as_str(),
                        task.channel.as_str(),
                        task.notification_email,
                        task.notification_whatsapp,
                        task.notification_lead_minutes as i64,
                        task.notified,
                        task.created_at.timestamp(),
                    ],
                )
                .map_err(|e| RepositoryError::StorageError(e.to_string()))?;

            Ok(conn_lock.last_insert_rowid() as u64)
        })
        .await
        .map_err(|e| RepositoryError::StorageError(e.to_string()))?
    }

    async fn list_by_user(&self, user_id: u64) -> Result<Vec<Task>> {
        let conn = self.conn.clone();

        tokio::task::spawn_blocking(move || -> Result<Vec<Task>> {
            let conn_lock = conn.lock().unwrap();
            Self::query_tasks(
                &conn_lock,
                "SELECT * FROM tasks WHERE user_id = ?1",
                &[&(user_id as i64)],
            )
        })
        .await
        .map_err(|e| RepositoryError::StorageError(e.to_string()))?
    }

    async fn find_pending(&self, channel: NotificationChannel) -> Result<Vec<Task>> {
        let conn = self.conn.clone();

        tokio::task::spawn_blocking(move || -> Result<Vec<Task>> {
            let conn_lock = conn.lock().unwrap();
            Self::query_tasks(
                &conn_lock,
                "SELECT * FROM tasks WHERE channel = ?1 AND notified = 0",
                &[&channel.as_str()],
            )
        })
        .await
        .map_err(|e| RepositoryError::StorageError(e.to_string()))?
    }

    async fn try_mark_notified(&self, task_id: u64) -> Result<bool> {
        let conn = self.conn.clone();

        tokio::task::spawn_blocking(move || -> Result<bool> {
            let conn_lock = conn.lock().unwrap();
            // Single conditional UPDATE: the row count says whether this call
            // won the false -> true transition.
            let changed = conn_lock
                .execute(
                    "UPDATE tasks SET notified = 1 WHERE id = ?1 AND notified = 0",
                    params![task_id as i64],
                )
                .map_err(|e| RepositoryError::StorageError(e.to_string()))?;
            Ok(changed > 0)
        })
        .await
        .map_err(|e| RepositoryError::StorageError(e.to_string()))?
    }

    async fn list_all(&self) -> Result<Vec<Task>> {
        let conn = self.conn.clone();

        tokio::task::spawn_blocking(move || -> Result<Vec<Task>> {
            let conn_lock = conn.lock().unwrap();
            Self::query_tasks(&conn_lock, "SELECT * FROM tasks", &[])
        })
        .await
        .map_err(|e| RepositoryError::StorageError(e.to_string()))?
    }

    async fn update_deadline(&self, task_id: u64, deadline: &str) -> Result<()> {
        let conn = self.conn.clone();
        let deadline = deadline.to_string();

        tokio::task::spawn_blocking(move || -> Result<()> {
            let conn_lock = conn.lock().unwrap();
            let changed = conn_lock
                .execute(
                    "UPDATE tasks SET deadline = ?2 WHERE id = ?1",
                    params![task_id as i64, deadline],
                )
                .map_err(|e| RepositoryError::StorageError(e.to_string()))?;
            if changed == 0 {
                return Err(RepositoryError::NotFound);
            }
            Ok(())
        })
        .await
        .map_err(|e| RepositoryError::StorageError(e.to_string()))?
    }
}
