use async_trait::async_trait;
use parley_types::{status, PipelineEvent, Stage, UiUpdate};

use super::{EventSink, PipelineStage, RunState, StageFlow};
use crate::error::Result;

/// Absorbs empty input and drafts the transcript for real input.
/// Never touches storage.
pub struct GuardStage;

#[async_trait]
impl PipelineStage for GuardStage {
    fn stage(&self) -> Stage {
        Stage::Guard
    }

    async fn execute(&self, state: &mut RunState, sink: &EventSink) -> Result<StageFlow> {
        let prompt = state.text.trim();

        if prompt.is_empty() {
            state.go = false;
            sink.emit(PipelineEvent::Guarded {
                go: false,
                update: UiUpdate::unchanged(),
            })
            .await;
            return Ok(StageFlow::Continue);
        }

        state.prompt = prompt.to_string();
        state.go = true;
        state.transcript.push_draft(state.prompt.clone(), status::DRAFT_PLACEHOLDER);

        let update = UiUpdate::unchanged()
            .with_transcript(state.transcript.clone())
            .with_status(status::GENERATING)
            .with_controls(false, true)
            .with_input("");
        sink.emit(PipelineEvent::Guarded { go: true, update }).await;
        Ok(StageFlow::Continue)
    }
}
