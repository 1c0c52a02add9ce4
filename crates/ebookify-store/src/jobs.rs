//! Durable job record store.
//!
//! Single source of truth for job state; survives process restarts. All
//! mutations funnel through one async mutex that covers both the in-memory
//! map and the snapshot rewrite, so writes are serialized and callers get
//! read-your-writes consistency per key.

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use uuid::Uuid;

use ebookify_core::constants::{SNAPSHOT_FILE_NAME, SNAPSHOT_QUARANTINE_NAME};
use ebookify_core::models::{Job, JobUpdate};

use crate::error::{StoreError, StoreResult};

#[derive(Clone)]
pub struct JobStore {
    inner: Arc<Mutex<HashMap<Uuid, Job>>>,
    snapshot_path: PathBuf,
}

impl JobStore {
    /// Open the store rooted at `dir`, creating the directory if needed.
    ///
    /// A missing snapshot file means a first run and yields an empty store.
    /// An unreadable snapshot is moved aside to `jobs.json.corrupt` (kept
    /// for inspection rather than silently discarded) and the store starts
    /// empty.
    pub async fn open(dir: impl Into<PathBuf>) -> StoreResult<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir).await?;
        let snapshot_path = dir.join(SNAPSHOT_FILE_NAME);

        let jobs = match fs::read(&snapshot_path).await {
            Ok(bytes) => match serde_json::from_slice::<HashMap<Uuid, Job>>(&bytes) {
                Ok(map) => {
                    tracing::info!(
                        count = map.len(),
                        path = %snapshot_path.display(),
                        "Loaded job snapshot"
                    );
                    map
                }
                Err(e) => {
                    let quarantine = dir.join(SNAPSHOT_QUARANTINE_NAME);
                    tracing::error!(
                        error = %StoreError::Corrupt {
                            path: snapshot_path.clone(),
                            source: e,
                        },
                        quarantine = %quarantine.display(),
                        "Job snapshot is corrupt; quarantining it and starting empty"
                    );
                    fs::rename(&snapshot_path, &quarantine).await?;
                    HashMap::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => HashMap::new(),
            Err(e) => return Err(e.into()),
        };

        Ok(Self {
            inner: Arc::new(Mutex::new(jobs)),
            snapshot_path,
        })
    }

    pub fn snapshot_path(&self) -> &Path {
        &self.snapshot_path
    }

    /// Rewrite the snapshot from the full map. Callers hold the map lock, so
    /// writes never interleave. Write-new-then-rename: an interrupted write
    /// leaves the previous snapshot intact.
    async fn persist(&self, jobs: &HashMap<Uuid, Job>) -> StoreResult<()> {
        let bytes = serde_json::to_vec_pretty(jobs)?;
        let tmp = self.snapshot_path.with_extension("json.tmp");

        let mut file = fs::File::create(&tmp).await?;
        file.write_all(&bytes).await?;
        file.sync_all().await?;
        drop(file);

        fs::rename(&tmp, &self.snapshot_path).await?;
        Ok(())
    }

    /// Raw read; callers on the HTTP read path must additionally filter with
    /// [`Job::is_expired`] so a not-yet-swept record is never served.
    pub async fn get(&self, id: Uuid) -> Option<Job> {
        self.inner.lock().await.get(&id).cloned()
    }

    /// Insert or fully replace a record, then persist.
    pub async fn put(&self, job: Job) -> StoreResult<()> {
        let mut jobs = self.inner.lock().await;
        jobs.insert(job.id, job);
        self.persist(&jobs).await
    }

    /// Merge partial fields into an existing record, then persist.
    /// Returns `None` without touching disk when the id is absent.
    pub async fn update(&self, id: Uuid, update: &JobUpdate) -> StoreResult<Option<Job>> {
        let mut jobs = self.inner.lock().await;
        let Some(job) = jobs.get_mut(&id) else {
            return Ok(None);
        };
        job.apply(update);
        let updated = job.clone();
        self.persist(&jobs).await?;
        Ok(Some(updated))
    }

    /// Remove a record, then persist. Returns whether a record existed.
    pub async fn delete(&self, id: Uuid) -> StoreResult<bool> {
        let mut jobs = self.inner.lock().await;
        if jobs.remove(&id).is_none() {
            return Ok(false);
        }
        self.persist(&jobs).await?;
        Ok(true)
    }

    pub async fn list_all(&self) -> Vec<Job> {
        self.inner.lock().await.values().cloned().collect()
    }

    pub async fn len(&self) -> usize {
        self.inner.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.lock().await.is_empty()
    }

    /// Remove every record whose TTL has passed, in one locked pass with a
    /// single snapshot rewrite. The removed jobs are returned so the caller
    /// can reclaim their assets; a record without its assets deleted would
    /// leak disk.
    pub async fn sweep_expired(&self, now: DateTime<Utc>) -> StoreResult<Vec<Job>> {
        let mut jobs = self.inner.lock().await;
        let expired_ids: Vec<Uuid> = jobs
            .values()
            .filter(|job| job.is_expired(now))
            .map(|job| job.id)
            .collect();

        if expired_ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut removed = Vec::with_capacity(expired_ids.len());
        for id in expired_ids {
            if let Some(job) = jobs.remove(&id) {
                removed.push(job);
            }
        }
        self.persist(&jobs).await?;

        tracing::info!(count = removed.len(), "Swept expired job records");
        Ok(removed)
    }
}
