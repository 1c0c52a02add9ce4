//! Shared constants.

/// File name of the on-disk job snapshot inside the work directory.
pub const SNAPSHOT_FILE_NAME: &str = "jobs.json";

/// Where an unreadable snapshot is moved at boot so its contents survive
/// for inspection.
pub const SNAPSHOT_QUARANTINE_NAME: &str = "jobs.json.corrupt";

/// Extension of produced output assets.
pub const OUTPUT_EXTENSION: &str = "txt";

/// Route prefix under which completed output is served.
pub const DOWNLOAD_PATH_PREFIX: &str = "/conversion/download";

/// Progress reported right after the input asset is durably saved.
/// Nonzero so a freshly accepted job is distinguishable from a stuck one.
pub const PROGRESS_UPLOADED: u8 = 10;

/// Progress reported when the conversion task picks the job up.
pub const PROGRESS_PROCESSING_START: u8 = 20;

/// Advisory progress increment per ticker interval while the converter runs.
pub const PROGRESS_TICK_STEP: u8 = 10;

/// Ticker progress never exceeds this; only a successful completion moves
/// a job to 100.
pub const PROGRESS_TICK_CEILING: u8 = 90;

/// Progress of a completed job. A job reports 100 exactly when complete.
pub const PROGRESS_COMPLETE: u8 = 100;
