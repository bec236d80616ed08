pub mod entities;
pub mod notifier;
pub mod repositories;
pub mod value_objects;
