pub mod reminder_scheduler;

pub use reminder_scheduler::ReminderScheduler;
