use std::sync::Arc;

use parley_persist::ThreadDirectory;
use parley_types::{PipelineConfig, PipelineEvent, Transcript};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

use crate::error::Result;
use crate::queue::{Admission, RunQueue};
use crate::session::{SessionGuard, SessionRegistry};
use crate::stages::{
    failure_update, EnsureThreadStage, EventSink, GuardStage, PipelineStage, RecordTurnStage, RenameTitleStage,
    RunState, SettleStage, StageFlow, StreamStage,
};

const EVENT_BUFFER: usize = 256;

/// One user submission
#[derive(Debug, Clone, Default)]
pub struct Submission {
    pub text: String,
    /// Current thread, if the conversation already has one
    pub thread_id: Option<String>,
    /// What the user currently sees
    pub transcript: Transcript,
}

impl Submission {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    pub fn on_thread(mut self, thread_id: impl Into<String>) -> Self {
        self.thread_id = Some(thread_id.into());
        self
    }

    pub fn with_transcript(mut self, transcript: Transcript) -> Self {
        self.transcript = transcript;
        self
    }
}

/// Receiving end of a run
pub struct RunHandle {
    pub run_id: String,
    /// Thread the run is bound to; None for an empty submission without a thread
    pub thread_id: Option<String>,
    pub events: mpsc::Receiver<PipelineEvent>,
}

impl RunHandle {
    pub fn into_stream(self) -> ReceiverStream<PipelineEvent> {
        ReceiverStream::new(self.events)
    }

    /// Wait for the run to finish and return every event it emitted.
    pub async fn collect(mut self) -> Vec<PipelineEvent> {
        let mut events = Vec::new();
        while let Some(event) = self.events.recv().await {
            events.push(event);
        }
        events
    }
}

pub(crate) struct PipelineInner {
    pub(crate) config: PipelineConfig,
    pub(crate) queue: RunQueue,
    pub(crate) sessions: SessionRegistry,
    pub(crate) ensure: EnsureThreadStage,
    pub(crate) guard: GuardStage,
    pub(crate) record: RecordTurnStage,
    pub(crate) rename: RenameTitleStage,
    pub(crate) stream: StreamStage,
    pub(crate) settle: SettleStage,
    pub(crate) directory: ThreadDirectory,
}

/// Submission controller.
///
/// EnsureThread, Guard and session acquisition run before `submit` returns,
/// so overload and busy threads are reported to the caller directly. The rest
/// of the run (record, rename, stream, settle) executes on the run queue and
/// reports through the returned [`RunHandle`].
#[derive(Clone)]
pub struct Pipeline {
    inner: Arc<PipelineInner>,
}

impl Pipeline {
    pub(crate) fn from_inner(inner: PipelineInner) -> Self {
        Self { inner: Arc::new(inner) }
    }

    /// Create a builder for fluent construction
    pub fn builder() -> crate::builder::PipelineBuilder {
        crate::builder::PipelineBuilder::new()
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.inner.config
    }

    pub fn directory(&self) -> &ThreadDirectory {
        &self.inner.directory
    }

    pub async fn submit(&self, submission: Submission) -> Result<RunHandle> {
        // Blank input is absorbed by the guard and never occupies a slot.
        let admission = if submission.text.trim().is_empty() {
            None
        } else {
            Some(self.inner.queue.try_admit()?)
        };

        let run_id = uuid::Uuid::new_v4().to_string();
        let (tx, rx) = mpsc::channel(EVENT_BUFFER);
        let sink = EventSink::new(tx);
        let mut state = RunState::new(
            run_id.clone(),
            submission.text,
            submission.thread_id,
            submission.transcript,
        );

        tracing::debug!(run_id = %run_id, thread_id = ?state.thread_id, "submission received");

        let bootstrap: [&dyn PipelineStage; 2] = [&self.inner.ensure, &self.inner.guard];
        for stage in bootstrap {
            if let Err(e) = stage.execute(&mut state, &sink).await {
                tracing::error!(run_id = %run_id, stage = %stage.stage(), error = %e, "stage failed");
                sink.emit(PipelineEvent::Failed {
                    stage: stage.stage(),
                    message: e.to_string(),
                    update: failure_update(&e.to_string()),
                })
                .await;
                return Ok(Self::handle(run_id, &state, rx));
            }
        }

        if !state.go {
            // Emits the stream stage's no-op; nothing else runs for empty input.
            if let Err(e) = self.inner.stream.execute(&mut state, &sink).await {
                tracing::error!(run_id = %run_id, stage = %self.inner.stream.stage(), error = %e, "stage failed");
            }
            return Ok(Self::handle(run_id, &state, rx));
        }

        // The ensure stage assigns a thread to every non-empty submission.
        let (Some(thread_id), Some(admission)) = (state.thread_id.clone(), admission) else {
            return Ok(Self::handle(run_id, &state, rx));
        };

        let session = self
            .inner
            .sessions
            .acquire(&thread_id, &run_id, self.inner.config.session_policy)?;
        state.cancel = session.token();
        state.generation = Some(session.generation());

        let handle = Self::handle(run_id, &state, rx);
        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move {
            inner.drive(state, sink, admission, session).await;
        });

        Ok(handle)
    }

    /// Cancel the running generation of a thread. False when nothing is running.
    pub fn cancel(&self, thread_id: &str) -> bool {
        let cancelled = self.inner.sessions.cancel(thread_id);
        if cancelled {
            tracing::info!(thread_id, "cancellation requested");
        } else {
            tracing::debug!(thread_id, "cancel ignored, no active generation");
        }
        cancelled
    }

    pub fn is_streaming(&self, thread_id: &str) -> bool {
        self.inner.sessions.is_active(thread_id)
    }

    pub fn active_sessions(&self) -> usize {
        self.inner.sessions.active_count()
    }

    /// Runs admitted and not yet finished
    pub fn runs_in_flight(&self) -> usize {
        self.inner.queue.in_flight()
    }

    fn handle(run_id: String, state: &RunState, events: mpsc::Receiver<PipelineEvent>) -> RunHandle {
        RunHandle {
            run_id,
            thread_id: state.thread_id.clone(),
            events,
        }
    }
}

impl PipelineInner {
    async fn drive(&self, mut state: RunState, sink: EventSink, admission: Admission, session: SessionGuard) {
        let slot = admission.wait_for_slot().await;
        tracing::debug!(run_id = %state.run_id, thread_id = %session.thread_id(), "run started");

        let completed = self.run_stages(&mut state, &sink).await;

        // Free the thread and the worker before the cosmetic delay.
        drop(session);
        drop(slot);

        if completed {
            if let Err(e) = self.settle.execute(&mut state, &sink).await {
                tracing::error!(run_id = %state.run_id, stage = %self.settle.stage(), error = %e, "stage failed");
            }
        }
        tracing::debug!(run_id = %state.run_id, completed, "run finished");
    }

    /// Returns true when every stage ran to completion.
    async fn run_stages(&self, state: &mut RunState, sink: &EventSink) -> bool {
        let stages: [&dyn PipelineStage; 3] = [&self.record, &self.rename, &self.stream];

        for stage in stages {
            match stage.execute(state, sink).await {
                Ok(StageFlow::Continue) => {}
                Ok(StageFlow::Stop) => return false,
                Err(e) => {
                    tracing::error!(run_id = %state.run_id, stage = %stage.stage(), error = %e, "stage failed");
                    sink.emit(PipelineEvent::Failed {
                        stage: stage.stage(),
                        message: e.to_string(),
                        update: failure_update(&e.to_string()),
                    })
                    .await;
                    return false;
                }
            }
        }
        true
    }
}
