mod db_message;
mod db_thread;

// Export database-agnostic models
pub use db_message::{Message, MessageRole};
pub use db_thread::{Thread, DEFAULT_THREAD_TITLE};
