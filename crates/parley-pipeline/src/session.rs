use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use parley_types::SessionPolicy;
use tokio_util::sync::CancellationToken;

use crate::error::{PipelineError, Result};

/// Lifecycle of the one generation a thread may have in flight.
#[derive(Debug)]
struct ActiveSession {
    run_id: String,
    generation: u64,
    cancel: CancellationToken,
}

#[derive(Debug, Default)]
struct Sessions {
    active: HashMap<String, ActiveSession>,
    /// Generation of the most recent run started on each thread
    latest: HashMap<String, u64>,
    next_generation: u64,
}

/// Per-thread generation sessions.
///
/// Holds lifecycle only (cancellation and run identity); the reply text is
/// owned by the run itself.
#[derive(Clone, Debug, Default)]
pub struct SessionRegistry {
    inner: Arc<Mutex<Sessions>>,
}

fn lock(inner: &Mutex<Sessions>) -> MutexGuard<'_, Sessions> {
    // The critical sections never panic midway, so a poisoned map is still consistent.
    inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the thread for `run_id`.
    pub fn acquire(&self, thread_id: &str, run_id: &str, policy: SessionPolicy) -> Result<SessionGuard> {
        let mut sessions = lock(&self.inner);

        if let Some(current) = sessions.active.get(thread_id) {
            match policy {
                SessionPolicy::Reject => {
                    return Err(PipelineError::SessionBusy {
                        thread_id: thread_id.to_string(),
                    });
                }
                SessionPolicy::CancelAndReplace => {
                    tracing::info!(
                        thread_id,
                        replaced_run = %current.run_id,
                        run_id,
                        "cancelling running generation in favour of a new submission"
                    );
                    current.cancel.cancel();
                }
            }
        }

        sessions.next_generation += 1;
        let generation = sessions.next_generation;
        let cancel = CancellationToken::new();

        sessions.active.insert(
            thread_id.to_string(),
            ActiveSession {
                run_id: run_id.to_string(),
                generation,
                cancel: cancel.clone(),
            },
        );
        sessions.latest.insert(thread_id.to_string(), generation);

        Ok(SessionGuard {
            registry: self.clone(),
            thread_id: thread_id.to_string(),
            generation,
            cancel,
        })
    }

    /// Request cancellation of the thread's running generation. False when none is running.
    pub fn cancel(&self, thread_id: &str) -> bool {
        let sessions = lock(&self.inner);
        match sessions.active.get(thread_id) {
            Some(session) => {
                session.cancel.cancel();
                true
            }
            None => false,
        }
    }

    pub fn is_active(&self, thread_id: &str) -> bool {
        lock(&self.inner).active.contains_key(thread_id)
    }

    pub fn active_count(&self) -> usize {
        lock(&self.inner).active.len()
    }

    /// Whether no run has started on the thread since `generation`.
    pub fn is_latest(&self, thread_id: &str, generation: u64) -> bool {
        lock(&self.inner).latest.get(thread_id) == Some(&generation)
    }

    fn release(&self, thread_id: &str, generation: u64) {
        let mut sessions = lock(&self.inner);
        if sessions.active.get(thread_id).map(|s| s.generation) == Some(generation) {
            sessions.active.remove(thread_id);
        }
    }
}

/// Exclusive claim on a thread. Dropping it ends the session.
#[derive(Debug)]
pub struct SessionGuard {
    registry: SessionRegistry,
    thread_id: String,
    generation: u64,
    cancel: CancellationToken,
}

impl SessionGuard {
    pub fn thread_id(&self) -> &str {
        &self.thread_id
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn token(&self) -> CancellationToken {
        self.cancel.clone()
    }
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        self.registry.release(&self.thread_id, self.generation);
    }
}
