pub mod deadline_backfill;
pub mod notification_service;
pub mod preference_service;
pub mod task_service;
