pub mod memory_preference_repository;
pub mod memory_task_repository;
pub mod sqlite_preference_repository;
pub mod sqlite_task_repository;

pub use sqlite_preference_repository::SqlitePreferenceRepository;
pub use sqlite_task_repository::SqliteTaskRepository;
