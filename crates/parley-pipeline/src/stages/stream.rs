use std::sync::Arc;

use async_trait::async_trait;
use futures::StreamExt;
use parley_llm::{GenerationRequest, Message, ResponseGenerator};
use parley_persist::{MessageRole, ThreadDirectory};
use parley_types::{status, PipelineEvent, Stage, Transcript, UiUpdate};

use super::{EventSink, PipelineStage, RunState, StageFlow};
use crate::error::{PipelineError, Result};

enum Outcome {
    Exhausted,
    Cancelled,
    /// Nobody is listening to the run anymore
    Abandoned,
}

/// Pulls reply fragments and forwards them until the generator is exhausted
/// or the run is cancelled. Only a naturally completed reply is stored.
pub struct StreamStage {
    directory: ThreadDirectory,
    generator: Arc<dyn ResponseGenerator>,
}

impl StreamStage {
    pub fn new(directory: ThreadDirectory, generator: Arc<dyn ResponseGenerator>) -> Self {
        Self { directory, generator }
    }
}

#[async_trait]
impl PipelineStage for StreamStage {
    fn stage(&self) -> Stage {
        Stage::Stream
    }

    async fn execute(&self, state: &mut RunState, sink: &EventSink) -> Result<StageFlow> {
        if !state.go {
            sink.emit(PipelineEvent::NoOp {
                stage: Stage::Stream,
                update: UiUpdate::unchanged(),
            })
            .await;
            return Ok(StageFlow::Stop);
        }
        let Some(thread_id) = state.thread_id.clone() else {
            return Ok(StageFlow::Stop);
        };

        let request = GenerationRequest::new(state.prompt.clone()).with_history(history_of(&state.transcript));
        let cancel = state.cancel.clone();
        let mut fragments = self
            .generator
            .generate(request, cancel.clone())
            .await
            .map_err(|e| PipelineError::Generation(e.to_string()))?;

        let mut reply = String::new();
        let outcome = loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break Outcome::Cancelled,
                // A generator may stall between fragments with nobody left to read them.
                _ = sink.closed() => break Outcome::Abandoned,
                next = fragments.next() => match next {
                    Some(Ok(fragment)) => {
                        reply.push_str(&fragment);
                        state.transcript.set_last_reply(reply.clone());
                        let update = UiUpdate::unchanged()
                            .with_transcript(state.transcript.clone())
                            .with_status(status::GENERATING)
                            .with_controls(false, true);
                        if !sink.emit(PipelineEvent::Fragment { content: fragment, update }).await {
                            break Outcome::Abandoned;
                        }
                    }
                    Some(Err(e)) => {
                        // Partial text is discarded, same as on cancel.
                        return Err(PipelineError::Generation(e.to_string()));
                    }
                    // A generator that honours the token may end its stream on cancel.
                    None if cancel.is_cancelled() => break Outcome::Cancelled,
                    None => break Outcome::Exhausted,
                }
            }
        };
        // Stop the generator's own work as well.
        drop(fragments);

        match outcome {
            Outcome::Cancelled => {
                tracing::info!(run_id = %state.run_id, thread_id = %thread_id, chars = reply.len(), "generation cancelled");
                let update = UiUpdate::unchanged()
                    .with_transcript(state.transcript.clone())
                    .with_status(status::STOPPED)
                    .with_controls(true, false);
                sink.emit(PipelineEvent::Cancelled { update }).await;
                Ok(StageFlow::Stop)
            }
            Outcome::Abandoned => {
                cancel.cancel();
                tracing::info!(run_id = %state.run_id, thread_id = %thread_id, "event receiver dropped, abandoning generation");
                Ok(StageFlow::Stop)
            }
            Outcome::Exhausted => {
                let message = self
                    .directory
                    .append_message(&thread_id, MessageRole::Assistant, reply.clone())
                    .await?;
                tracing::info!(
                    run_id = %state.run_id,
                    thread_id = %thread_id,
                    message_id = %message.id,
                    chars = reply.len(),
                    "reply stored"
                );

                state.transcript.set_last_reply(reply.clone());
                let update = UiUpdate::unchanged()
                    .with_transcript(state.transcript.clone())
                    .with_status(status::COMPLETED)
                    .with_controls(true, false);
                sink.emit(PipelineEvent::Completed {
                    message_id: message.id,
                    content: reply,
                    update,
                })
                .await;
                Ok(StageFlow::Continue)
            }
        }
    }
}

/// Conversation context for the generator: every turn before the draft.
fn history_of(transcript: &Transcript) -> Vec<Message> {
    let turns = transcript.turns();
    let prior = &turns[..turns.len().saturating_sub(1)];

    let mut history = Vec::with_capacity(prior.len() * 2);
    for turn in prior {
        if !turn.user.is_empty() {
            history.push(Message::human(turn.user.clone()));
        }
        if let Some(reply) = &turn.assistant {
            history.push(Message::ai(reply.clone()));
        }
    }
    history
}
