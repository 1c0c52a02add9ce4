pub mod job;

pub use job::{
    CleanupResponse, Job, JobStatus, JobUpdate, StatusResponse, UploadResponse,
};
