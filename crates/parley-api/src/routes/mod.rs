pub mod health;
pub mod messages;
pub mod settings;
pub mod threads;
