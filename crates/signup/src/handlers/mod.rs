pub mod dashboard;
pub mod entry;
pub mod health;
mod template;
