//! Job lifecycle controller.
//!
//! Drives one job through `uploaded → processing → complete | error` as a
//! fire-and-forget task: the submit handler returns as soon as the record
//! exists and the input asset is saved. Each job's own transitions stay
//! strictly ordered because the ticker is joined before the terminal write
//! and the store freezes terminal records against stragglers.

use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use ebookify_core::constants::{
    DOWNLOAD_PATH_PREFIX, PROGRESS_PROCESSING_START, PROGRESS_TICK_CEILING, PROGRESS_TICK_STEP,
};
use ebookify_core::models::{Job, JobUpdate};
use ebookify_store::{AssetArea, JobStore};

use crate::convert::{ConvertError, TextConverter};

/// Attempts at persisting a terminal transition before giving up. Losing
/// the fact that a conversion finished is the worst persistence failure, so
/// it gets retries where progress ticks get a log line.
const TERMINAL_PERSIST_ATTEMPTS: u32 = 3;

/// Backoff before retry `attempt` (0-based): exponential, capped.
fn terminal_retry_backoff(attempt: u32) -> Duration {
    Duration::from_secs(2_u64.pow(attempt).min(8))
}

#[derive(Clone)]
pub struct ConversionPipeline {
    store: JobStore,
    assets: AssetArea,
    converter: Arc<dyn TextConverter>,
    progress_tick: Duration,
}

impl ConversionPipeline {
    pub fn new(
        store: JobStore,
        assets: AssetArea,
        converter: Arc<dyn TextConverter>,
        progress_tick: Duration,
    ) -> Self {
        Self {
            store,
            assets,
            converter,
            progress_tick,
        }
    }

    /// Launch the conversion for an already-registered job. Not awaited by
    /// the caller; the handle is returned for tests and shutdown
    /// coordination.
    pub fn spawn(&self, job: Job) -> JoinHandle<()> {
        let pipeline = self.clone();
        tokio::spawn(async move {
            pipeline.run(job).await;
        })
    }

    #[tracing::instrument(skip(self, job), fields(job_id = %job.id))]
    pub async fn run(&self, job: Job) {
        let id = job.id;

        match self
            .store
            .update(id, &JobUpdate::processing(PROGRESS_PROCESSING_START))
            .await
        {
            Ok(Some(_)) => {}
            Ok(None) => {
                // Swept before we started; nothing to resurrect
                tracing::info!(job_id = %id, "Job record gone before processing, discarding input");
                self.assets.delete_for_id(id).await;
                return;
            }
            Err(e) => {
                // The conversion can still succeed; the terminal write will
                // bring the record up to date
                tracing::warn!(error = %e, job_id = %id, "Failed to persist processing transition, continuing");
            }
        }

        let (cancel, ticker) = self.spawn_progress_ticker(id);

        let output_path = self.assets.output_path(id);
        // Run the invoker in its own task so even a panic comes back as a
        // join error and the terminal transition still happens
        let converter = self.converter.clone();
        let input_path = job.input_path.clone();
        let convert_output = output_path.clone();
        let result = match tokio::spawn(async move {
            converter.convert(&input_path, &convert_output).await
        })
        .await
        {
            Ok(result) => result,
            Err(join_err) => Err(ConvertError::Failed(format!(
                "Conversion task aborted: {}",
                join_err
            ))),
        };

        cancel.cancel();
        // Join before the terminal write so no progress persist can land
        // after it, even at the snapshot level
        let _ = ticker.await;

        let update = match result {
            Ok(()) => JobUpdate::completed(
                output_path,
                format!("{}/{}", DOWNLOAD_PATH_PREFIX, id),
            ),
            Err(e) => {
                tracing::warn!(error = %e, job_id = %id, "Conversion failed");
                JobUpdate::failed(format!("Conversion failed: {}", e))
            }
        };

        self.finalize(id, update).await;
    }

    /// Advisory progress while the converter runs: +10 per tick, capped at
    /// 90. Decoupled from the converter's real progress, which it does not
    /// expose. A failed tick persist is logged and skipped.
    fn spawn_progress_ticker(&self, id: Uuid) -> (CancellationToken, JoinHandle<()>) {
        let token = CancellationToken::new();
        let child = token.clone();
        let store = self.store.clone();
        let tick = self.progress_tick;

        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(tick);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            // The first tick of tokio's interval fires immediately
            interval.tick().await;

            loop {
                tokio::select! {
                    _ = child.cancelled() => break,
                    _ = interval.tick() => {
                        let Some(job) = store.get(id).await else {
                            break;
                        };
                        if job.status.is_terminal() {
                            break;
                        }
                        if job.progress >= PROGRESS_TICK_CEILING {
                            continue;
                        }
                        let next = job
                            .progress
                            .saturating_add(PROGRESS_TICK_STEP)
                            .min(PROGRESS_TICK_CEILING);
                        if let Err(e) = store.update(id, &JobUpdate::progress(next)).await {
                            tracing::warn!(error = %e, job_id = %id, "Failed to persist progress tick, skipping");
                        }
                    }
                }
            }
        });

        (token, handle)
    }

    /// Persist the terminal transition, retrying with backoff. A record
    /// that disappeared (TTL sweep won the race) is a normal outcome: the
    /// produced assets are discarded and nothing comes back to life.
    async fn finalize(&self, id: Uuid, update: JobUpdate) {
        for attempt in 0..TERMINAL_PERSIST_ATTEMPTS {
            match self.store.update(id, &update).await {
                Ok(Some(job)) => {
                    tracing::info!(
                        job_id = %id,
                        status = %job.status,
                        progress = job.progress,
                        "Job reached terminal state"
                    );
                    return;
                }
                Ok(None) => {
                    tracing::info!(job_id = %id, "Job record expired before completion, discarding result");
                    self.assets.delete_for_id(id).await;
                    return;
                }
                Err(e) => {
                    let backoff = terminal_retry_backoff(attempt);
                    tracing::error!(
                        error = %e,
                        job_id = %id,
                        attempt = attempt + 1,
                        backoff_secs = backoff.as_secs(),
                        "Failed to persist terminal transition, retrying"
                    );
                    tokio::time::sleep(backoff).await;
                }
            }
        }

        tracing::error!(
            job_id = %id,
            attempts = TERMINAL_PERSIST_ATTEMPTS,
            "Giving up on persisting terminal transition"
        );
    }
}
