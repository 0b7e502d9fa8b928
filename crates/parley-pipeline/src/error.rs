use parley_persist::PersistError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Run queue is full ({capacity} runs admitted)")]
    QueueFull { capacity: usize },

    #[error("A reply is already being generated for thread {thread_id}")]
    SessionBusy { thread_id: String },

    #[error(transparent)]
    Persist(#[from] PersistError),

    #[error("Generation failed: {0}")]
    Generation(String),
}

pub type Result<T> = std::result::Result<T, PipelineError>;
