//! Retention collector.
//!
//! Bounds storage growth and keeps user data around only for its promised
//! lifetime. One sweep implementation serves both cadences: a background
//! interval task and the on-demand cleanup endpoint. Sweeps are idempotent
//! and safe to run concurrently with live traffic; every deletion failure
//! is logged and absorbed.

use chrono::{DateTime, Utc};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::interval;
use uuid::Uuid;

use ebookify_store::{AssetArea, JobStore};

#[derive(Debug, Default, Clone, Copy)]
pub struct CleanupReport {
    pub files_deleted: usize,
    pub jobs_deleted: usize,
    pub jobs_remaining: usize,
}

pub struct CleanupService {
    store: JobStore,
    assets: AssetArea,
    /// TTL applied to orphan assets; record expiry uses each job's own
    /// `expires_at`.
    ttl: Duration,
    /// Delay between serving a download and reclaiming its assets.
    grace: Duration,
}

impl CleanupService {
    pub fn new(store: JobStore, assets: AssetArea, ttl: Duration, grace: Duration) -> Self {
        Self {
            store,
            assets,
            ttl,
            grace,
        }
    }

    /// Start the background sweep task.
    /// Returns a JoinHandle for graceful shutdown.
    pub fn start(self: Arc<Self>, every: Duration) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            let mut sweep_interval = interval(every);
            sweep_interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            // Consume the immediate first tick; boot is not a sweep
            sweep_interval.tick().await;

            loop {
                sweep_interval.tick().await;

                tracing::info!("Starting scheduled cleanup of expired jobs");
                let report = self.run_once(Utc::now()).await;
                tracing::info!(
                    files_deleted = report.files_deleted,
                    jobs_deleted = report.jobs_deleted,
                    jobs_remaining = report.jobs_remaining,
                    "Cleanup completed"
                );
            }
        })
    }

    /// One full reclamation pass: expired records plus their assets, then
    /// orphan assets nothing references. Calling it again immediately
    /// reports zeros.
    #[tracing::instrument(skip(self))]
    pub async fn run_once(&self, now: DateTime<Utc>) -> CleanupReport {
        let removed = match self.store.sweep_expired(now).await {
            Ok(removed) => removed,
            Err(e) => {
                tracing::error!(error = %e, "Failed to sweep expired job records");
                Vec::new()
            }
        };

        let mut files_deleted = 0;
        for job in &removed {
            tracing::info!(
                job_id = %job.id,
                status = %job.status,
                expires_at = %job.expires_at,
                "Deleting expired job"
            );
            files_deleted += self.assets.delete_for_id(job.id).await;
        }

        let live: HashSet<Uuid> = self
            .store
            .list_all()
            .await
            .iter()
            .map(|job| job.id)
            .collect();
        files_deleted += self.assets.sweep_orphans(self.ttl, &live).await;

        CleanupReport {
            files_deleted,
            jobs_deleted: removed.len(),
            jobs_remaining: self.store.len().await,
        }
    }

    /// After a successful download, reclaim the job's assets and record once
    /// the grace delay has passed, so a slow client retry inside the window
    /// still succeeds.
    pub fn schedule_delete_after_serve(&self, id: Uuid) {
        let store = self.store.clone();
        let assets = self.assets.clone();
        let grace = self.grace;

        tokio::spawn(async move {
            tokio::time::sleep(grace).await;

            let deleted = assets.delete_for_id(id).await;
            match store.delete(id).await {
                Ok(existed) => {
                    tracing::info!(
                        job_id = %id,
                        files_deleted = deleted,
                        record_existed = existed,
                        "Reclaimed job after serving download"
                    );
                }
                Err(e) => {
                    tracing::warn!(error = %e, job_id = %id, "Failed to delete job record after serving");
                }
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration as ChronoDuration;
    use ebookify_core::models::Job;
    use std::path::PathBuf;
    use tempfile::tempdir;

    struct Fixture {
        store: JobStore,
        assets: AssetArea,
        _dir: tempfile::TempDir,
    }

    async fn fixture() -> Fixture {
        let dir = tempdir().unwrap();
        let store = JobStore::open(dir.path()).await.unwrap();
        let assets = AssetArea::new(dir.path()).await.unwrap();
        Fixture {
            store,
            assets,
            _dir: dir,
        }
    }

    fn service(fx: &Fixture) -> CleanupService {
        CleanupService::new(
            fx.store.clone(),
            fx.assets.clone(),
            Duration::from_secs(3600),
            Duration::from_millis(20),
        )
    }

    async fn insert_job(fx: &Fixture, expired: bool) -> Job {
        let id = Uuid::new_v4();
        let input = fx.assets.save_input(id, "pdf", b"data").await.unwrap();
        let mut job = Job::new(id, "scan.pdf", input, ChronoDuration::hours(1));
        if expired {
            job.created_at = Utc::now() - ChronoDuration::hours(3);
            job.expires_at = job.created_at + ChronoDuration::hours(1);
        }
        fx.store.put(job.clone()).await.unwrap();
        job
    }

    #[tokio::test]
    async fn test_run_once_reclaims_expired_jobs_and_assets() {
        let fx = fixture().await;
        let cleanup = service(&fx);

        let stale = insert_job(&fx, true).await;
        let fresh = insert_job(&fx, false).await;

        let report = cleanup.run_once(Utc::now()).await;
        assert_eq!(report.jobs_deleted, 1);
        assert_eq!(report.files_deleted, 1);
        assert_eq!(report.jobs_remaining, 1);

        assert!(fx.store.get(stale.id).await.is_none());
        assert!(!PathBuf::from(&stale.input_path).exists());
        assert!(fx.store.get(fresh.id).await.is_some());
        assert!(fresh.input_path.exists());
    }

    #[tokio::test]
    async fn test_run_once_is_idempotent() {
        let fx = fixture().await;
        let cleanup = service(&fx);
        insert_job(&fx, true).await;

        let first = cleanup.run_once(Utc::now()).await;
        assert_eq!(first.jobs_deleted, 1);

        let second = cleanup.run_once(Utc::now()).await;
        assert_eq!(second.jobs_deleted, 0);
        assert_eq!(second.files_deleted, 0);
        assert_eq!(second.jobs_remaining, first.jobs_remaining);
    }

    #[tokio::test]
    async fn test_delete_after_serve_waits_for_grace() {
        let fx = fixture().await;
        let cleanup = service(&fx);
        let job = insert_job(&fx, false).await;

        cleanup.schedule_delete_after_serve(job.id);

        // Inside the grace window the job is still servable
        assert!(fx.store.get(job.id).await.is_some());
        assert!(job.input_path.exists());

        tokio::time::sleep(Duration::from_millis(120)).await;
        assert!(fx.store.get(job.id).await.is_none());
        assert!(!job.input_path.exists());
    }

    #[tokio::test]
    async fn test_delete_after_serve_tolerates_already_reclaimed_job() {
        let fx = fixture().await;
        let cleanup = service(&fx);
        let id = Uuid::new_v4();

        // Nothing exists for this id; the spawned reclaim must not blow up
        cleanup.schedule_delete_after_serve(id);
        tokio::time::sleep(Duration::from_millis(60)).await;
        assert!(fx.store.get(id).await.is_none());
    }
}
