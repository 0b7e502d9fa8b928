use async_trait::async_trait;
use parley_persist::ThreadDirectory;
use parley_types::{PipelineEvent, Stage};

use super::{EventSink, PipelineStage, RunState, StageFlow};
use crate::error::Result;

/// Binds the submission to a thread, creating one for the first real input.
pub struct EnsureThreadStage {
    directory: ThreadDirectory,
}

impl EnsureThreadStage {
    pub fn new(directory: ThreadDirectory) -> Self {
        Self { directory }
    }
}

#[async_trait]
impl PipelineStage for EnsureThreadStage {
    fn stage(&self) -> Stage {
        Stage::EnsureThread
    }

    async fn execute(&self, state: &mut RunState, sink: &EventSink) -> Result<StageFlow> {
        if let Some(thread_id) = &state.thread_id {
            sink.emit(PipelineEvent::ThreadAssigned {
                thread_id: thread_id.clone(),
                created: false,
            })
            .await;
            return Ok(StageFlow::Continue);
        }

        // Empty input never creates persisted state.
        if state.text.trim().is_empty() {
            return Ok(StageFlow::Continue);
        }

        let thread = self.directory.create_thread(None).await?;
        tracing::info!(run_id = %state.run_id, thread_id = %thread.id, "started new thread");

        state.thread_id = Some(thread.id.clone());
        sink.emit(PipelineEvent::ThreadAssigned {
            thread_id: thread.id,
            created: true,
        })
        .await;
        Ok(StageFlow::Continue)
    }
}
