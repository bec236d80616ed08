use chrono::Utc;
use std::sync::Arc;

use crate::domain::entities::task::{Priority, Task};
use crate::domain::repositories::preference_repository::PreferenceRepository;
use crate::domain::repositories::task_repository::{RepositoryError, TaskRepository};
use crate::domain::value_objects::deadline::CanonicalDeadline;

#[derive(Debug)]
pub enum TaskServiceError {
    /// The deadline is not in canonical `YYYY-MM-DDTHH:mm` form. The write is
    /// rejected outright; the service never repairs a deadline on the way in.
    InvalidDeadline(String),
    /// No saved notification preference for the user, so there is nothing to
    /// snapshot reminder settings from.
    MissingPreference(u64),
    InvalidField(&'static str),
    Storage(RepositoryError),
}

impl std::fmt::Display for TaskServiceError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            TaskServiceError::InvalidDeadline(input) => {
                write!(
                    f,
                    "Invalid deadline format, must be YYYY-MM-DDTHH:mm: {:?}",
                    input
                )
            }
            TaskServiceError::MissingPreference(user_id) => {
                write!(f, "Notification settings not found for user {}", user_id)
            }
            TaskServiceError::InvalidField(field) => {
                write!(f, "Task {} cannot be empty", field)
            }
            TaskServiceError::Storage(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for TaskServiceError {}

impl From<RepositoryError> for TaskServiceError {
    fn from(err: RepositoryError) -> Self {
        TaskServiceError::Storage(err)
    }
}

/// Write path for tasks: validates, snapshots the user's notification
/// preference, and persists. Everything that reaches the repository has
/// already passed the canonical-deadline gate.
#[allow(dead_code)]
pub struct TaskService {
    task_repo: Arc<dyn TaskRepository>,
    preference_repo: Arc<dyn PreferenceRepository>,
}

#[allow(dead_code)]
impl TaskService {
    pub fn new(
        task_repo: Arc<dyn TaskRepository>,
        preference_repo: Arc<dyn PreferenceRepository>,
    ) -> Self {
        Self {
            task_repo,
            preference_repo,
        }
    }

    pub async fn create_task(
        &self,
        user_id: u64,
        title: String,
        description: String,
        deadline: String,
        priority: Priority,
    ) -> Result<u64, TaskServiceError> {
        if title.trim().is_empty() {
            return Err(TaskServiceError::InvalidField("title"));
        }
        if description.trim().is_empty() {
            return Err(TaskServiceError::InvalidField("description"));
        }

        // Fail-closed gate: the value must already be canonical. Callers that
        // hold looser input run it through DeadlineCodec::canonicalize first.
        let deadline = CanonicalDeadline::parse(&deadline)
            .map_err(|_| TaskServiceError::InvalidDeadline(deadline.clone()))?;

        let preference = self
            .preference_repo
            .get(user_id)
            .await?
            .ok_or(TaskServiceError::MissingPreference(user_id))?;

        let task = Task {
            id: 0, // assigned by the repository
            user_id,
            title,
            description,
            deadline: deadline.into_string(),
            priority,
            channel: preference.channel,
            notification_email: preference.notification_email.clone(),
            notification_whatsapp: preference.notification_whatsapp.clone(),
            notification_lead_minutes: preference.notification_lead_minutes,
            notified: false,
            created_at: Utc::now(),
        };

        Ok(self.task_repo.add_task(task).await?)
    }

    pub async fn get_user_tasks(&self, user_id: u64) -> Result<Vec<Task>, TaskServiceError> {
        Ok(self.task_repo.list_by_user(user_id).await?)
    }
}
