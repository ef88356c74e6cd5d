//! Filesystem commit step for accepted rename proposals.
//!
//! Renames happen in place or into the `_Ready` subfolder (created on
//! demand). Per-file failures are collected, never rolled back: a batch
//! that renames N of M files reports exactly that.

use std::fs;
use std::path::{Path, PathBuf};

use crate::progress::StatusCallback;

use super::{file_name, WorkflowError};

/// Subfolder renamed clips are moved into when requested.
pub const READY_SUBFOLDER: &str = "_Ready";

/// One accepted rename, ready to commit.
#[derive(Debug, Clone)]
pub struct RenamePlan {
    /// Current location of the clip.
    pub original: PathBuf,
    /// Collision-free output filename (no directory component).
    pub new_name: String,
}

/// Results of a batch rename operation.
#[derive(Debug, Clone, Default)]
pub struct RenameBatchResult {
    /// Successful renames as `(from, to)` pairs.
    pub successes: Vec<(PathBuf, PathBuf)>,
    /// Failed renames with their error messages.
    pub failures: Vec<(PathBuf, String)>,
}

impl RenameBatchResult {
    /// Number of successful renames.
    #[must_use]
    pub fn success_count(&self) -> usize {
        self.successes.len()
    }

    /// Total number of attempted renames.
    #[must_use]
    pub fn total_count(&self) -> usize {
        self.successes.len() + self.failures.len()
    }

    /// Check if every rename succeeded.
    #[must_use]
    pub fn all_succeeded(&self) -> bool {
        self.failures.is_empty()
    }

    /// Human-readable summary, e.g. `renamed 3/4 files (1 failed)`.
    #[must_use]
    pub fn summary(&self) -> String {
        if self.all_succeeded() {
            format!("renamed {}/{} files", self.success_count(), self.total_count())
        } else {
            format!(
                "renamed {}/{} files ({} failed)",
                self.success_count(),
                self.total_count(),
                self.failures.len()
            )
        }
    }
}

/// Commit a batch of renames inside `video_dir`.
///
/// With `move_to_ready` set, targets land in `video_dir/_Ready` (created if
/// absent); otherwise the clip is renamed in place. Failures are per-file:
/// the batch always runs to the end.
pub fn commit_renames(
    video_dir: &Path,
    plans: &[RenamePlan],
    move_to_ready: bool,
    status: &dyn StatusCallback,
) -> Result<RenameBatchResult, WorkflowError> {
    let target_dir = if move_to_ready {
        let dir = video_dir.join(READY_SUBFOLDER);
        if !dir.exists() {
            fs::create_dir_all(&dir).map_err(|source| WorkflowError::Io {
                path: dir.clone(),
                source,
            })?;
            log::info!("created {}", dir.display());
        }
        dir
    } else {
        video_dir.to_path_buf()
    };

    let mut result = RenameBatchResult::default();
    status.on_phase_start("Renaming", plans.len());

    for (i, plan) in plans.iter().enumerate() {
        status.on_progress(i + 1, &file_name(&plan.original));
        let destination = target_dir.join(&plan.new_name);

        match fs::rename(&plan.original, &destination) {
            Ok(()) => {
                log::info!(
                    "renamed {} -> {}",
                    plan.original.display(),
                    destination.display()
                );
                result.successes.push((plan.original.clone(), destination));
            }
            Err(e) => {
                log::error!("failed to rename {}: {e}", plan.original.display());
                result.failures.push((plan.original.clone(), e.to_string()));
            }
        }
    }

    status.on_phase_end("Renaming", &result.summary());
    Ok(result)
}
