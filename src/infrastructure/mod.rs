pub mod config;
pub mod notifier;
pub mod repositories;
pub mod scheduler;
