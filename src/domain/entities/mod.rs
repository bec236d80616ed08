pub mod notification_preference;
pub mod task;
