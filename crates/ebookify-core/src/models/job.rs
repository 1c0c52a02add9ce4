use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::path::PathBuf;
use std::str::FromStr;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::constants::{PROGRESS_COMPLETE, PROGRESS_UPLOADED};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Uploaded,
    Processing,
    Complete,
    Error,
}

impl JobStatus {
    /// Terminal states absorb every later status or progress write.
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Complete | JobStatus::Error)
    }
}

impl Display for JobStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            JobStatus::Uploaded => write!(f, "uploaded"),
            JobStatus::Processing => write!(f, "processing"),
            JobStatus::Complete => write!(f, "complete"),
            JobStatus::Error => write!(f, "error"),
        }
    }
}

impl FromStr for JobStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "uploaded" => Ok(JobStatus::Uploaded),
            "processing" => Ok(JobStatus::Processing),
            "complete" => Ok(JobStatus::Complete),
            "error" => Ok(JobStatus::Error),
            _ => Err(anyhow::anyhow!("Invalid job status: {}", s)),
        }
    }
}

/// One conversion request and its tracked lifecycle.
///
/// Records are persisted verbatim in the job snapshot, so every field must
/// stay serde-serializable.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Job {
    pub id: Uuid,
    /// User-supplied name, sanitized at ingest. Display and download-name
    /// derivation only; never used as a filesystem path.
    pub original_filename: String,
    pub input_path: PathBuf,
    /// Set exactly when `status == Complete`.
    pub output_path: Option<PathBuf>,
    /// Externally addressable download path. Set exactly when
    /// `status == Complete`.
    pub result_url: Option<String>,
    pub status: JobStatus,
    /// Coarse UI hint, 0..=100, non-decreasing. 100 exactly when complete.
    pub progress: u8,
    /// Set exactly when `status == Error`.
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    /// `created_at + TTL`, computed once at creation and never recomputed.
    pub expires_at: DateTime<Utc>,
}

impl Job {
    pub fn new(
        id: Uuid,
        original_filename: impl Into<String>,
        input_path: PathBuf,
        ttl: Duration,
    ) -> Self {
        let created_at = Utc::now();
        Self {
            id,
            original_filename: original_filename.into(),
            input_path,
            output_path: None,
            result_url: None,
            status: JobStatus::Uploaded,
            progress: PROGRESS_UPLOADED,
            error_message: None,
            created_at,
            expires_at: created_at + ttl,
        }
    }

    /// Expiry is checked on every read path; a record past its TTL must not
    /// be served even if the collector has not reclaimed it yet.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }

    /// Merge a partial update into this record.
    ///
    /// Transitions are one-directional: once a job is terminal the record is
    /// frozen and any later update (e.g. a progress tick that lost the race
    /// against the terminal write) is a no-op. Progress merges as the max of
    /// the old and new values so out-of-order ticks cannot move it backward.
    pub fn apply(&mut self, update: &JobUpdate) {
        if self.status.is_terminal() {
            return;
        }

        if let Some(progress) = update.progress {
            self.progress = self.progress.max(progress.min(PROGRESS_COMPLETE));
        }
        if let Some(status) = update.status {
            self.status = status;
        }
        if let Some(ref output_path) = update.output_path {
            self.output_path = Some(output_path.clone());
        }
        if let Some(ref result_url) = update.result_url {
            self.result_url = Some(result_url.clone());
        }
        if let Some(ref message) = update.error_message {
            self.error_message = Some(message.clone());
        }
    }
}

/// Partial-fields merge type for `JobStore::update`.
#[derive(Debug, Default, Clone)]
pub struct JobUpdate {
    pub status: Option<JobStatus>,
    pub progress: Option<u8>,
    pub output_path: Option<PathBuf>,
    pub result_url: Option<String>,
    pub error_message: Option<String>,
}

impl JobUpdate {
    /// The job was picked up by its conversion task.
    pub fn processing(progress: u8) -> Self {
        Self {
            status: Some(JobStatus::Processing),
            progress: Some(progress),
            ..Self::default()
        }
    }

    /// Advisory progress tick while the converter runs.
    pub fn progress(progress: u8) -> Self {
        Self {
            progress: Some(progress),
            ..Self::default()
        }
    }

    /// Terminal success: output recorded, progress pinned to 100.
    pub fn completed(output_path: PathBuf, result_url: String) -> Self {
        Self {
            status: Some(JobStatus::Complete),
            progress: Some(PROGRESS_COMPLETE),
            output_path: Some(output_path),
            result_url: Some(result_url),
            ..Self::default()
        }
    }

    /// Terminal failure. Progress is left at its last-known value so an
    /// errored job never reports 100.
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            status: Some(JobStatus::Error),
            error_message: Some(message.into()),
            ..Self::default()
        }
    }
}

/// Response models for API endpoints

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub job_id: Uuid,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    pub status: JobStatus,
    pub progress: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_filename: Option<String>,
}

impl From<Job> for StatusResponse {
    fn from(job: Job) -> Self {
        Self {
            status: job.status,
            progress: job.progress,
            result_url: job.result_url,
            error: job.error_message,
            original_filename: Some(job.original_filename),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CleanupResponse {
    pub files_deleted: usize,
    pub jobs_deleted: usize,
    pub jobs_remaining: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_job() -> Job {
        Job::new(
            Uuid::new_v4(),
            "scan.pdf",
            PathBuf::from("/tmp/in.pdf"),
            Duration::hours(1),
        )
    }

    #[test]
    fn test_job_status_display() {
        assert_eq!(JobStatus::Uploaded.to_string(), "uploaded");
        assert_eq!(JobStatus::Processing.to_string(), "processing");
        assert_eq!(JobStatus::Complete.to_string(), "complete");
        assert_eq!(JobStatus::Error.to_string(), "error");
    }

    #[test]
    fn test_job_status_from_str() {
        assert_eq!(
            "uploaded".parse::<JobStatus>().unwrap(),
            JobStatus::Uploaded
        );
        assert_eq!(
            "processing".parse::<JobStatus>().unwrap(),
            JobStatus::Processing
        );
        assert_eq!(
            "complete".parse::<JobStatus>().unwrap(),
            JobStatus::Complete
        );
        assert_eq!("error".parse::<JobStatus>().unwrap(), JobStatus::Error);
        assert!("invalid_status".parse::<JobStatus>().is_err());
    }

    #[test]
    fn test_job_status_serde_round_trip() {
        for status in [
            JobStatus::Uploaded,
            JobStatus::Processing,
            JobStatus::Complete,
            JobStatus::Error,
        ] {
            let json = serde_json::to_string(&status).unwrap();
            let back: JobStatus = serde_json::from_str(&json).unwrap();
            assert_eq!(status, back);
        }
        assert_eq!(
            serde_json::to_string(&JobStatus::Processing).unwrap(),
            "\"processing\""
        );
    }

    #[test]
    fn test_new_job_starts_uploaded_with_nonzero_progress() {
        let job = sample_job();
        assert_eq!(job.status, JobStatus::Uploaded);
        assert_eq!(job.progress, PROGRESS_UPLOADED);
        assert!(job.output_path.is_none());
        assert!(job.result_url.is_none());
        assert!(job.error_message.is_none());
        assert_eq!(job.expires_at, job.created_at + Duration::hours(1));
    }

    #[test]
    fn test_apply_progress_is_monotonic() {
        let mut job = sample_job();
        job.apply(&JobUpdate::processing(20));
        job.apply(&JobUpdate::progress(40));
        assert_eq!(job.progress, 40);

        // An out-of-order lower tick must not move progress backward
        job.apply(&JobUpdate::progress(30));
        assert_eq!(job.progress, 40);
    }

    #[test]
    fn test_apply_progress_is_capped() {
        let mut job = sample_job();
        job.apply(&JobUpdate::progress(250));
        assert_eq!(job.progress, PROGRESS_COMPLETE);
    }

    #[test]
    fn test_completed_sets_result_fields_and_full_progress() {
        let mut job = sample_job();
        job.apply(&JobUpdate::processing(20));
        job.apply(&JobUpdate::completed(
            PathBuf::from("/tmp/out.txt"),
            "/conversion/download/abc".to_string(),
        ));
        assert_eq!(job.status, JobStatus::Complete);
        assert_eq!(job.progress, 100);
        assert_eq!(job.output_path, Some(PathBuf::from("/tmp/out.txt")));
        assert_eq!(
            job.result_url.as_deref(),
            Some("/conversion/download/abc")
        );
        assert!(job.error_message.is_none());
    }

    #[test]
    fn test_failed_keeps_last_progress() {
        let mut job = sample_job();
        job.apply(&JobUpdate::processing(20));
        job.apply(&JobUpdate::progress(50));
        job.apply(&JobUpdate::failed("conversion blew up"));
        assert_eq!(job.status, JobStatus::Error);
        assert_eq!(job.progress, 50);
        assert_eq!(job.error_message.as_deref(), Some("conversion blew up"));
        assert!(job.output_path.is_none());
        assert!(job.result_url.is_none());
    }

    #[test]
    fn test_terminal_state_absorbs_later_updates() {
        let mut job = sample_job();
        job.apply(&JobUpdate::failed("boom"));
        let frozen = job.clone();

        // A straggler progress tick scheduled before the terminal write
        job.apply(&JobUpdate::progress(90));
        assert_eq!(job, frozen);

        // Even another terminal write cannot flip the outcome
        job.apply(&JobUpdate::completed(
            PathBuf::from("/tmp/out.txt"),
            "/conversion/download/abc".to_string(),
        ));
        assert_eq!(job, frozen);
    }

    #[test]
    fn test_is_expired_boundary() {
        let job = sample_job();
        assert!(!job.is_expired(job.created_at));
        assert!(!job.is_expired(job.expires_at));
        assert!(job.is_expired(job.expires_at + Duration::seconds(1)));
    }

    #[test]
    fn test_job_snapshot_serde_round_trip() {
        let mut job = sample_job();
        job.apply(&JobUpdate::completed(
            PathBuf::from("/tmp/out.txt"),
            format!("/conversion/download/{}", job.id),
        ));
        let json = serde_json::to_string_pretty(&job).unwrap();
        let back: Job = serde_json::from_str(&json).unwrap();
        assert_eq!(job, back);
    }

    #[test]
    fn test_status_response_from_job() {
        let mut job = sample_job();
        job.apply(&JobUpdate::processing(20));
        let response = StatusResponse::from(job.clone());
        assert_eq!(response.status, JobStatus::Processing);
        assert_eq!(response.progress, 20);
        assert_eq!(response.result_url, None);
        assert_eq!(response.error, None);
        assert_eq!(
            response.original_filename.as_deref(),
            Some("scan.pdf")
        );
    }

    #[test]
    fn test_status_response_omits_absent_fields() {
        let job = sample_job();
        let json = serde_json::to_value(StatusResponse::from(job)).unwrap();
        assert!(json.get("resultUrl").is_none());
        assert!(json.get("error").is_none());
        assert_eq!(json.get("status").and_then(|v| v.as_str()), Some("uploaded"));
        assert!(json.get("originalFilename").is_some());
    }
}
