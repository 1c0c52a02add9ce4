//! Temporary asset area.
//!
//! One directory holding uploaded source files and produced output files,
//! one pair per job, named by job id plus an extension. Because names are
//! UUIDs the area is partitioned per job and concurrent jobs never contend
//! on the same path. The job snapshot lives in the same directory; every
//! scan here ignores any file whose stem is not a UUID, which keeps the
//! snapshot (and its temp/quarantine siblings) out of reach.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

use ebookify_core::constants::OUTPUT_EXTENSION;

use crate::error::StoreResult;

#[derive(Clone)]
pub struct AssetArea {
    root: PathBuf,
}

impl AssetArea {
    pub async fn new(root: impl Into<PathBuf>) -> StoreResult<Self> {
        let root = root.into();
        fs::create_dir_all(&root).await?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn input_path(&self, id: Uuid, extension: &str) -> PathBuf {
        self.root.join(format!("{}.{}", id, extension))
    }

    pub fn output_path(&self, id: Uuid) -> PathBuf {
        self.root.join(format!("{}.{}", id, OUTPUT_EXTENSION))
    }

    /// Durably save an uploaded source file. The job record is only created
    /// after this returns, so a crash in between leaves an orphan file that
    /// the orphan sweep reclaims later.
    pub async fn save_input(
        &self,
        id: Uuid,
        extension: &str,
        data: &[u8],
    ) -> StoreResult<PathBuf> {
        let path = self.input_path(id, extension);
        let start = std::time::Instant::now();

        let mut file = fs::File::create(&path).await?;
        file.write_all(data).await?;
        file.sync_all().await?;

        tracing::info!(
            path = %path.display(),
            size_bytes = data.len(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Saved input asset"
        );

        Ok(path)
    }

    /// Delete every asset belonging to a job id, tolerating files that are
    /// already gone. Returns how many files were actually removed. Deletion
    /// failures are logged and do not propagate.
    pub async fn delete_for_id(&self, id: Uuid) -> usize {
        let mut deleted = 0;

        let mut entries = match fs::read_dir(&self.root).await {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!(error = %e, root = %self.root.display(), "Failed to read asset area");
                return 0;
            }
        };

        while let Ok(Some(entry)) = entries.next_entry().await {
            let path = entry.path();
            if Self::stem_uuid(&path) != Some(id) {
                continue;
            }
            match fs::remove_file(&path).await {
                Ok(()) => {
                    tracing::debug!(path = %path.display(), "Deleted asset");
                    deleted += 1;
                }
                // Vanished mid-scan: another reclaim path got there first
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => {
                    tracing::warn!(error = %e, path = %path.display(), "Failed to delete asset, continuing");
                }
            }
        }

        deleted
    }

    /// Delete asset files older than `ttl` that no live job references.
    /// Covers files left behind by crashes between asset-write and
    /// record-creation, or by a store/asset desync. Per-file failures are
    /// logged and never abort the rest of the sweep.
    pub async fn sweep_orphans(&self, ttl: Duration, live: &HashSet<Uuid>) -> usize {
        let mut deleted = 0;
        let now = SystemTime::now();

        let mut entries = match fs::read_dir(&self.root).await {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!(error = %e, root = %self.root.display(), "Failed to read asset area for orphan sweep");
                return 0;
            }
        };

        while let Ok(Some(entry)) = entries.next_entry().await {
            let path = entry.path();
            let Some(id) = Self::stem_uuid(&path) else {
                continue;
            };
            if live.contains(&id) {
                continue;
            }

            let age = match entry.metadata().await.and_then(|m| m.modified()) {
                Ok(modified) => now.duration_since(modified).unwrap_or_default(),
                Err(e) => {
                    tracing::warn!(error = %e, path = %path.display(), "Failed to stat asset, skipping");
                    continue;
                }
            };
            if age <= ttl {
                continue;
            }

            match fs::remove_file(&path).await {
                Ok(()) => {
                    tracing::info!(path = %path.display(), age_secs = age.as_secs(), "Deleted orphan asset");
                    deleted += 1;
                }
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => {
                    tracing::warn!(error = %e, path = %path.display(), "Failed to delete orphan asset, continuing");
                }
            }
        }

        deleted
    }

    /// Asset files are named `{uuid}.{ext}`; anything else in the directory
    /// is not ours to touch.
    fn stem_uuid(path: &Path) -> Option<Uuid> {
        path.file_stem()
            .and_then(|stem| stem.to_str())
            .and_then(|stem| Uuid::parse_str(stem).ok())
    }
}
