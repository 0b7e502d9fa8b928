use std::time::Duration;

use async_trait::async_trait;
use parley_types::{status, PipelineEvent, Stage, UiUpdate};

use super::{EventSink, PipelineStage, RunState, StageFlow};
use crate::error::Result;
use crate::session::SessionRegistry;

/// Resets the status line a little while after a completed reply.
///
/// Runs after the session and worker slot are released, so it never holds
/// up the next submission.
pub struct SettleStage {
    sessions: SessionRegistry,
    delay: Duration,
}

impl SettleStage {
    pub fn new(sessions: SessionRegistry, delay: Duration) -> Self {
        Self { sessions, delay }
    }
}

#[async_trait]
impl PipelineStage for SettleStage {
    fn stage(&self) -> Stage {
        Stage::Settle
    }

    async fn execute(&self, state: &mut RunState, sink: &EventSink) -> Result<StageFlow> {
        let (Some(thread_id), Some(generation)) = (state.thread_id.as_deref(), state.generation) else {
            return Ok(StageFlow::Stop);
        };
        if sink.is_closed() {
            return Ok(StageFlow::Stop);
        }

        tokio::time::sleep(self.delay).await;

        if self.sessions.is_latest(thread_id, generation) {
            let update = UiUpdate::unchanged().with_status(status::READY);
            sink.emit(PipelineEvent::Settled { update }).await;
        } else {
            tracing::debug!(run_id = %state.run_id, thread_id, "newer run on thread, skipping settle");
        }
        Ok(StageFlow::Stop)
    }
}
