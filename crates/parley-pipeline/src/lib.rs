pub mod builder;
pub mod error;
pub mod pipeline;
pub mod queue;
pub mod session;
pub mod stages;

pub use builder::PipelineBuilder;
pub use error::{PipelineError, Result};
pub use pipeline::{Pipeline, RunHandle, Submission};
pub use queue::RunQueue;
pub use session::{SessionGuard, SessionRegistry};
pub use stages::{EventSink, PipelineStage, RunState, StageFlow};

// Re-export key types from parley-types
pub use parley_types::{PipelineConfig, PipelineEvent, SessionPolicy, Stage, Transcript, UiUpdate};
