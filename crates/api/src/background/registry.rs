//! In-memory status of restoration jobs, keyed by content hash.
//!
//! Every submission for a hash opens a new generation. Only the task
//! holding the current generation may write results or record an outcome;
//! tasks from superseded generations are ignored.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use restora_core::content_hash::ContentHash;
use restora_core::record::JobStatus;

#[derive(Debug, Clone, Copy)]
struct JobEntry {
    generation: u64,
    status: JobStatus,
}

#[derive(Default)]
pub struct JobRegistry {
    jobs: Mutex<HashMap<ContentHash, JobEntry>>,
}

impl JobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn jobs(&self) -> std::sync::MutexGuard<'_, HashMap<ContentHash, JobEntry>> {
        self.jobs.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Open a new generation for `hash`, marking it pending.
    ///
    /// Callers hold the hash lock and have already prepared the store, so
    /// an opened generation always gets a task.
    pub fn begin(&self, hash: &ContentHash) -> u64 {
        let mut jobs = self.jobs();
        let generation = jobs.get(hash).map_or(1, |e| e.generation + 1);
        jobs.insert(
            hash.clone(),
            JobEntry {
                generation,
                status: JobStatus::Pending,
            },
        );
        generation
    }

    pub fn is_current(&self, hash: &ContentHash, generation: u64) -> bool {
        self.jobs()
            .get(hash)
            .is_some_and(|e| e.generation == generation)
    }

    /// Record the outcome of `generation`. Returns `false` if it was
    /// superseded and the outcome was dropped.
    pub fn finish(&self, hash: &ContentHash, generation: u64, status: JobStatus) -> bool {
        let mut jobs = self.jobs();
        match jobs.get_mut(hash) {
            Some(entry) if entry.generation == generation => {
                entry.status = status;
                true
            }
            _ => false,
        }
    }

    /// Status of the latest job for `hash`, if this process has seen one.
    pub fn status(&self, hash: &ContentHash) -> Option<JobStatus> {
        self.jobs().get(hash).map(|e| e.status)
    }

    /// Number of jobs not yet finished.
    pub fn pending(&self) -> usize {
        self.jobs()
            .values()
            .filter(|e| !e.status.is_terminal())
            .count()
    }
}
