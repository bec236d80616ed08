use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::entities::task::{NotificationChannel, Task};
use crate::domain::repositories::task_repository::{RepositoryError, Result, TaskRepository};

/// In-memory TaskRepository. Backs the unit tests and small local runs; the
/// `notified` transition has the same conditional semantics as the SQLite
/// implementation.
#[derive(Debug, Default)]
pub struct MemoryTaskRepository {
    tasks: Mutex<Vec<Task>>,
}

#[allow(dead_code)]
impl MemoryTaskRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TaskRepository for MemoryTaskRepository {
    async fn add_task(&self, mut task: Task) -> Result<u64> {
        let mut tasks = self.tasks.lock().await;
        let id = tasks.iter().map(|t| t.id).max().unwrap_or(0) + 1;
        task.id = id;
        tasks.push(task);
        Ok(id)
    }

    async fn list_by_user(&self, user_id: u64) -> Result<Vec<Task>> {
        let tasks = self.tasks.lock().await;
        Ok(tasks
            .iter()
            .filter(|t| t.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn find_pending(&self, channel: NotificationChannel) -> Result<Vec<Task>> {
        let tasks = self.tasks.lock().await;
        Ok(tasks
            .iter()
            .filter(|t| t.channel == channel && !t.notified)
            .cloned()
            .collect())
    }

    async fn try_mark_notified(&self, task_id: u64) -> Result<bool> {
        let mut tasks = self.tasks.lock().await;
        match tasks.iter_mut().find(|t| t.id == task_id) {
            Some(task) if !task.notified => {
                task.notified = true;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn list_all(&self) -> Result<Vec<Task>> {
        let tasks = self.tasks.lock().await;
        Ok(tasks.clone())
    }

    async fn update_deadline(&self, task_id: u64, deadline: &str) -> Result<()> {
        let mut tasks = self.tasks.lock().await;
        let task = tasks
            .iter_mut()
            .find(|t| t.id == task_id)
            .ok_or(RepositoryError::NotFound)?;
        task.deadline = deadline.to_string();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::task::Priority;
    use chrono::Utc;

    fn task() -> Task {
        Task {
            id: 0,
            user_id: 1,
            title: "t".to_string(),
            description: "d".to_string(),
            deadline: "2025-08-10T11:30".to_string(),
            priority: Priority::Low,
            channel: NotificationChannel::Email,
            notification_email: Some("a@b.c".to_string()),
            notification_whatsapp: None,
            notification_lead_minutes: 10,
            notified: false,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn mark_notified_wins_only_once() {
        let repo = MemoryTaskRepository::new();
        let id = repo.add_task(task()).await.unwrap();

        assert!(repo.try_mark_notified(id).await.unwrap());
        assert!(!repo.try_mark_notified(id).await.unwrap());
        assert!(!repo.try_mark_notified(9999).await.unwrap());

        // flipped tasks drop out of the pending scan
        assert!(repo
            .find_pending(NotificationChannel::Email)
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn pending_filter_is_per_channel() {
        let repo = MemoryTaskRepository::new();
        repo.add_task(task()).await.unwrap();
        let mut whatsapp_task = task();
        whatsapp_task.channel = NotificationChannel::WhatsApp;
        repo.add_task(whatsapp_task).await.unwrap();

        assert_eq!(
            repo.find_pending(NotificationChannel::Email)
                .await
                .unwrap()
                .len(),
            1
        );
        assert_eq!(
            repo.find_pending(NotificationChannel::WhatsApp)
                .await
                .unwrap()
                .len(),
            1
        );
    }
}
