//! Fire-and-forget restoration tasks.
//!
//! A task waits for a concurrency permit, runs the model once and, if its
//! generation is still current, writes the result under the hash lock.
//! Failures are logged and recorded as [`JobStatus::Failed`]; they never
//! reach the client that submitted the job.

use std::sync::Arc;

use restora_core::content_hash::ContentHash;
use restora_core::record::JobStatus;
use restora_model::{ModelSettings, Restorer};
use restora_store::{ContentStore, HashGuard};
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;

use super::registry::JobRegistry;

/// Everything one restoration task needs.
#[derive(Debug, Clone)]
pub struct RestoreJob {
    pub hash: ContentHash,
    pub generation: u64,
    /// PNG bytes of the original.
    pub image: Vec<u8>,
    pub hide_faces: Vec<u32>,
}

/// Spawns and tracks restoration tasks.
///
/// Cheaply cloneable; clones share the registry, permits and model handle.
#[derive(Clone)]
pub struct Restorations {
    store: Arc<ContentStore>,
    restorer: Arc<dyn Restorer>,
    settings: Arc<ModelSettings>,
    registry: Arc<JobRegistry>,
    permits: Arc<Semaphore>,
}

impl Restorations {
    pub fn new(
        store: Arc<ContentStore>,
        restorer: Arc<dyn Restorer>,
        settings: ModelSettings,
        max_concurrent: usize,
    ) -> Self {
        Self {
            store,
            restorer,
            settings: Arc::new(settings),
            registry: Arc::new(JobRegistry::new()),
            permits: Arc::new(Semaphore::new(max_concurrent.max(1))),
        }
    }

    /// Open a new job generation for `hash`, superseding any running one.
    ///
    /// Call with the hash lock held (see [`HashGuard`]) once the store holds
    /// the original, and spawn the job afterwards.
    pub fn begin(&self, guard: &HashGuard) -> u64 {
        self.registry.begin(guard.hash())
    }

    pub fn status(&self, hash: &ContentHash) -> Option<JobStatus> {
        self.registry.status(hash)
    }

    pub fn pending(&self) -> usize {
        self.registry.pending()
    }

    /// Run `job` in its own task. The caller does not wait for it.
    pub fn spawn(&self, job: RestoreJob) -> JoinHandle<()> {
        tracing::info!(
            hash = %job.hash,
            generation = job.generation,
            hide_faces = ?job.hide_faces,
            "Restoration scheduled",
        );
        let this = self.clone();
        tokio::spawn(async move { this.run(job).await })
    }

    async fn run(self, job: RestoreJob) {
        let RestoreJob {
            hash,
            generation,
            image,
            hide_faces,
        } = job;

        let _permit = match Arc::clone(&self.permits).acquire_owned().await {
            Ok(permit) => permit,
            Err(_) => {
                tracing::warn!(%hash, "Restoration permits closed, dropping job");
                return;
            }
        };

        if !self.registry.is_current(&hash, generation) {
            tracing::debug!(%hash, generation, "Restoration superseded before start");
            return;
        }

        let options = self.settings.options(hide_faces);
        let enhancement = match self.restorer.enhance(&image, &options).await {
            Ok(enhancement) => enhancement,
            Err(e) => {
                tracing::error!(%hash, generation, error = %e, "Restoration failed");
                self.registry.finish(&hash, generation, JobStatus::Failed);
                return;
            }
        };

        let guard = self.store.lock(&hash).await;
        if !self.registry.is_current(&hash, generation) {
            tracing::debug!(%hash, generation, "Restoration superseded, discarding result");
            return;
        }

        match self
            .store
            .write_result(&guard, &enhancement.restored, &enhancement.restored_faces)
            .await
        {
            Ok(()) => {
                self.registry.finish(&hash, generation, JobStatus::Done);
                tracing::info!(
                    %hash,
                    generation,
                    faces = enhancement.restored_faces.len(),
                    "Restoration complete",
                );
            }
            Err(e) => {
                self.registry.finish(&hash, generation, JobStatus::Failed);
                tracing::error!(%hash, generation, error = %e, "Failed to store restoration result");
            }
        }
    }
}
