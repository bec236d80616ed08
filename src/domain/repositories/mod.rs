pub mod preference_repository;
pub mod task_repository;
