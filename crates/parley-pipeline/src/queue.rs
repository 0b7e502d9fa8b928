use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::sync::{OwnedSemaphorePermit, Semaphore};

use crate::error::{PipelineError, Result};

/// Bounded pool for pipeline runs.
///
/// At most `max_concurrency` runs execute at once and at most
/// `max_concurrency + queue_depth` are admitted in total. Admission is
/// decided synchronously so overflow is reported to the submitter instead
/// of piling up.
#[derive(Clone)]
pub struct RunQueue {
    workers: Arc<Semaphore>,
    admitted: Arc<AtomicUsize>,
    capacity: usize,
}

impl RunQueue {
    pub fn new(max_concurrency: usize, queue_depth: usize) -> Self {
        let max_concurrency = max_concurrency.max(1);
        Self {
            workers: Arc::new(Semaphore::new(max_concurrency)),
            admitted: Arc::new(AtomicUsize::new(0)),
            capacity: max_concurrency + queue_depth,
        }
    }

    pub fn try_admit(&self) -> Result<Admission> {
        let capacity = self.capacity;
        self.admitted
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| (n < capacity).then_some(n + 1))
            .map_err(|_| PipelineError::QueueFull { capacity })?;

        Ok(Admission {
            workers: Arc::clone(&self.workers),
            admitted: Arc::clone(&self.admitted),
        })
    }

    /// Runs admitted and not yet finished, running or waiting.
    pub fn in_flight(&self) -> usize {
        self.admitted.load(Ordering::Acquire)
    }
}

/// A run that holds a place in the queue but may still be waiting for a worker.
pub struct Admission {
    workers: Arc<Semaphore>,
    admitted: Arc<AtomicUsize>,
}

impl Admission {
    pub async fn wait_for_slot(self) -> RunSlot {
        // The semaphore is never closed, so a permit always arrives.
        let permit = Arc::clone(&self.workers).acquire_owned().await.ok();
        RunSlot {
            _permit: permit,
            _admission: self,
        }
    }
}

impl Drop for Admission {
    fn drop(&mut self) {
        self.admitted.fetch_sub(1, Ordering::AcqRel);
    }
}

/// A running run. Dropping it frees the worker and the queue place.
pub struct RunSlot {
    _permit: Option<OwnedSemaphorePermit>,
    _admission: Admission,
}
