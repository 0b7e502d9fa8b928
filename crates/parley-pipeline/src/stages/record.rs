use async_trait::async_trait;
use parley_persist::{MessageRole, ThreadDirectory};
use parley_types::Stage;

use super::{EventSink, PipelineStage, RunState, StageFlow};
use crate::error::Result;

/// Stores the accepted user message before anything else touches the thread.
pub struct RecordTurnStage {
    directory: ThreadDirectory,
}

impl RecordTurnStage {
    pub fn new(directory: ThreadDirectory) -> Self {
        Self { directory }
    }
}

#[async_trait]
impl PipelineStage for RecordTurnStage {
    fn stage(&self) -> Stage {
        Stage::RecordTurn
    }

    async fn execute(&self, state: &mut RunState, _sink: &EventSink) -> Result<StageFlow> {
        let Some(thread_id) = state.thread_id.as_deref() else {
            return Ok(StageFlow::Stop);
        };

        let message = self
            .directory
            .append_message(thread_id, MessageRole::User, state.prompt.clone())
            .await?;
        tracing::debug!(run_id = %state.run_id, thread_id, message_id = %message.id, "user turn recorded");
        Ok(StageFlow::Continue)
    }
}
