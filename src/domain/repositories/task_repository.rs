use async_trait::async_trait;

use crate::domain::entities::task::{NotificationChannel, Task};

#[derive(Debug)]
pub enum RepositoryError {
    NotFound,
    InvalidData(String),
    StorageError(String),
}

impl std::fmt::Display for RepositoryError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            RepositoryError::NotFound => write!(f, "Record not found"),
            RepositoryError::InvalidData(msg) => write!(f, "Invalid data: {}", msg),
            RepositoryError::StorageError(msg) => write!(f, "Storage error: {}", msg),
        }
    }
}

impl std::error::Error for RepositoryError {}

pub type Result<T> = std::result::Result<T, RepositoryError>;

#[async_trait]
pub trait TaskRepository: Send + Sync {
    /// Persist a new task and return its assigned id.
    async fn add_task(&self, task: Task) -> Result<u64>;

    /// All tasks owned by a user.
    async fn list_by_user(&self, user_id: u64) -> Result<Vec<Task>>;

    /// Tasks on the given channel that have not been notified yet. This
    /// filter is the scheduler's first line of defense against re-sending.
    async fn find_pending(&self, channel: NotificationChannel) -> Result<Vec<Task>>;

    /// Atomically flip `notified` from false to true. Returns true iff this
    /// call made the transition; false when the task was already notified or
    /// does not exist. The winner of this race is the one allowed to send.
    async fn try_mark_notified(&self, task_id: u64) -> Result<bool>;

    /// Every task in the store, notified or not. Maintenance use only.
    async fn list_all(&self) -> Result<Vec<Task>>;

    /// Overwrite a task's stored deadline string. Maintenance use only; the
    /// caller is responsible for passing a canonical value.
    async fn update_deadline(&self, task_id: u64, deadline: &str) -> Result<()>;
}
