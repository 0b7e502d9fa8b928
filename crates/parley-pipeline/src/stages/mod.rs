mod ensure;
mod guard;
mod record;
mod rename;
mod settle;
mod stream;

pub use ensure::EnsureThreadStage;
pub use guard::GuardStage;
pub use record::RecordTurnStage;
pub use rename::RenameTitleStage;
pub use settle::SettleStage;
pub use stream::StreamStage;

use async_trait::async_trait;
use parley_types::{status, PipelineEvent, Stage, Transcript, UiUpdate};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::error::Result;

/// Everything a run carries from one stage to the next.
#[derive(Debug, Clone)]
pub struct RunState {
    pub run_id: String,
    /// Raw input as submitted
    pub text: String,
    /// Trimmed input, set by the guard
    pub prompt: String,
    pub thread_id: Option<String>,
    pub transcript: Transcript,
    /// False when the guard absorbed the submission
    pub go: bool,
    pub cancel: CancellationToken,
    /// Session generation, set once the thread is claimed
    pub generation: Option<u64>,
    /// Title assigned by the rename stage, if any
    pub renamed: Option<String>,
}

impl RunState {
    pub fn new(run_id: impl Into<String>, text: impl Into<String>, thread_id: Option<String>, transcript: Transcript) -> Self {
        Self {
            run_id: run_id.into(),
            text: text.into(),
            prompt: String::new(),
            thread_id,
            transcript,
            go: false,
            cancel: CancellationToken::new(),
            generation: None,
            renamed: None,
        }
    }
}

/// Sending half of a run's event channel.
#[derive(Clone)]
pub struct EventSink {
    tx: mpsc::Sender<PipelineEvent>,
}

impl EventSink {
    pub fn new(tx: mpsc::Sender<PipelineEvent>) -> Self {
        Self { tx }
    }

    /// Deliver an event. Returns false once the receiver is gone.
    pub async fn emit(&self, event: PipelineEvent) -> bool {
        tracing::trace!(event = event.name(), "pipeline event");
        self.tx.send(event).await.is_ok()
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }

    /// Resolves once the receiver is dropped.
    pub async fn closed(&self) {
        self.tx.closed().await
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageFlow {
    Continue,
    Stop,
}

/// One step of a submission run
#[async_trait]
pub trait PipelineStage: Send + Sync {
    fn stage(&self) -> Stage;

    /// Run the stage, emitting its events on `sink`. An error ends the run
    /// with a `Failed` event tagged with [`PipelineStage::stage`].
    async fn execute(&self, state: &mut RunState, sink: &EventSink) -> Result<StageFlow>;
}

/// UI state after a failed stage: controls back to idle, error in the status line.
pub fn failure_update(message: &str) -> UiUpdate {
    UiUpdate::unchanged()
        .with_status(status::failure(message))
        .with_controls(true, false)
}
