//! eBookify Store Library
//!
//! This crate owns durable state: the job record store (a single JSON
//! snapshot file, rewritten atomically after every mutation) and the
//! temporary asset area (per-job input/output files named by job id).
//!
//! # Snapshot discipline
//!
//! Every mutating operation results in the on-disk snapshot reflecting the
//! full in-memory state before the operation returns. Writes go to a
//! sibling temp file first and are renamed into place, so a failed write
//! never corrupts the previous snapshot.

pub mod assets;
pub mod error;
pub mod jobs;

// Re-export commonly used types
pub use assets::AssetArea;
pub use error::{StoreError, StoreResult};
pub use jobs::JobStore;
