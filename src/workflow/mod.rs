//! Workflow coordination for indexing, matching, renaming, and dedup.
//!
//! # Overview
//!
//! The matching engine is pure; this module owns everything stateful around
//! it:
//!
//! - [`Coordinator`]: the one-workflow-at-a-time invariant. Front ends ask
//!   for a [`WorkflowGuard`] before starting; a second request while one is
//!   alive gets [`WorkflowError::Busy`] immediately instead of queueing.
//! - [`MediaFingerprinter`]: the per-file extraction pipeline (cache lookup,
//!   audio staging for videos, fingerprint extraction) shared by the
//!   indexing ([`index`]), matching ([`matching`]), and dedup ([`dedup`])
//!   passes.
//! - [`rename`]: the filesystem commit step.
//!
//! Per-file extraction failures are recorded and skipped; only setup-time
//! problems (missing directory, missing tool, empty reference set) abort a
//! workflow.

pub mod dedup;
pub mod index;
pub mod matching;
pub mod rename;

use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, TryLockError};

use thiserror::Error;

use crate::cache::{self, FingerprintCache};
use crate::fingerprint::Fingerprint;
use crate::media::{self, ExtractError, FingerprintSource, MediaKind};

pub use dedup::{export_unique, find_duplicates, write_unique_list, CopyStats, DedupReport};
pub use index::{index_references, IndexStats};
pub use matching::{match_videos, MatchOutcome, MatchSettings};
pub use rename::{commit_renames, RenameBatchResult, RenamePlan};

/// Errors that abort a whole workflow.
#[derive(Debug, Error)]
pub enum WorkflowError {
    /// Another scan/match/rename workflow is already running.
    #[error("another workflow is already running")]
    Busy,

    /// A configured directory does not exist.
    #[error("directory not found: {0}")]
    MissingDirectory(PathBuf),

    /// A required external tool is not installed.
    #[error("{tool} not found - {hint}")]
    MissingTool {
        /// Tool name.
        tool: &'static str,
        /// Actionable install hint.
        hint: &'static str,
    },

    /// Matching was requested against an empty reference set.
    #[error("no reference fingerprints indexed")]
    EmptyReferenceSet,

    /// I/O failure outside the per-file skip policy (e.g. listing the
    /// video directory itself).
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

/// Owner of the single-workflow advisory lock.
///
/// The lock protects the whole scan/match/rename pipeline, not individual
/// engine calls; the engine itself is reentrant.
#[derive(Debug, Default)]
pub struct Coordinator {
    busy: Mutex<()>,
}

impl Coordinator {
    /// Create a coordinator with no active workflow.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Try to begin a workflow.
    ///
    /// Returns [`WorkflowError::Busy`] without blocking when another guard
    /// is alive. The returned guard releases the slot on drop.
    pub fn begin(&self) -> Result<WorkflowGuard<'_>, WorkflowError> {
        match self.busy.try_lock() {
            Ok(guard) => Ok(WorkflowGuard { _guard: guard }),
            Err(TryLockError::WouldBlock) => Err(WorkflowError::Busy),
            // A panic mid-workflow poisons the lock; the slot is free again.
            Err(TryLockError::Poisoned(poisoned)) => Ok(WorkflowGuard {
                _guard: poisoned.into_inner(),
            }),
        }
    }
}

/// RAII token for an active workflow.
#[derive(Debug)]
pub struct WorkflowGuard<'a> {
    _guard: MutexGuard<'a, ()>,
}

/// Capability to fingerprint any supported media file.
///
/// This is the seam the workflow passes depend on: production wires in
/// [`MediaFingerprinter`]; tests implement it over synthetic fingerprints
/// and never spawn a process.
pub trait MediaSource {
    /// Fingerprint one media file (audio directly, video via staging).
    fn fingerprint_media(&self, path: &Path) -> Result<Fingerprint, ExtractError>;
}

/// Per-file extraction pipeline shared by every workflow pass.
///
/// Wraps the injected [`FingerprintSource`] with optional audio staging
/// (for video containers, via ffmpeg) and optional cache consultation keyed
/// by the original media path.
pub struct MediaFingerprinter<'a> {
    source: &'a dyn FingerprintSource,
    ffmpeg: Option<&'a Path>,
    cache: Option<&'a FingerprintCache>,
}

impl<'a> MediaFingerprinter<'a> {
    /// Create a pipeline around a fingerprint source.
    #[must_use]
    pub fn new(source: &'a dyn FingerprintSource) -> Self {
        Self {
            source,
            ffmpeg: None,
            cache: None,
        }
    }

    /// Enable video support using the given ffmpeg binary.
    #[must_use]
    pub fn with_ffmpeg(mut self, ffmpeg: &'a Path) -> Self {
        self.ffmpeg = Some(ffmpeg);
        self
    }

    /// Enable cache consultation.
    #[must_use]
    pub fn with_cache(mut self, cache: &'a FingerprintCache) -> Self {
        self.cache = Some(cache);
        self
    }
}

impl MediaSource for MediaFingerprinter<'_> {
    /// Fingerprint one media file, staging audio extraction for videos.
    ///
    /// Cache entries are keyed by the *media* path (not the temp WAV), so a
    /// video hit skips both ffmpeg and fpcalc. Empty fingerprints are
    /// normalized to [`ExtractError::EmptyFingerprint`] here so no workflow
    /// has to re-check.
    fn fingerprint_media(&self, path: &Path) -> Result<Fingerprint, ExtractError> {
        let mtime = cache::file_mtime(path);

        if let (Some(cache), Some(mtime)) = (self.cache, mtime) {
            match cache.get(path, mtime) {
                Ok(Some(fingerprint)) => {
                    log::debug!("cache hit for {}", path.display());
                    return Ok(fingerprint);
                }
                Ok(None) => {}
                Err(e) => log::debug!("cache lookup failed for {}: {e}", path.display()),
            }
        }

        let fingerprint = match media::media_kind(path) {
            Some(MediaKind::Audio) => self.source.fingerprint(path)?,
            Some(MediaKind::Video) => {
                let Some(ffmpeg) = self.ffmpeg else {
                    return Err(ExtractError::ToolFailed {
                        tool: "ffmpeg",
                        path: path.to_path_buf(),
                        message: "video support disabled (ffmpeg unavailable)".to_string(),
                    });
                };
                let wav = media::ffmpeg::extract_audio_track(ffmpeg, path)?;
                self.source.fingerprint(wav.path())?
            }
            None => {
                return Err(ExtractError::ToolFailed {
                    tool: "fpcalc",
                    path: path.to_path_buf(),
                    message: "not a recognized media file".to_string(),
                })
            }
        };

        if fingerprint.is_empty() {
            return Err(ExtractError::EmptyFingerprint(path.to_path_buf()));
        }

        if let (Some(cache), Some(mtime)) = (self.cache, mtime) {
            if let Err(e) = cache.put(path, mtime, &fingerprint) {
                log::debug!("cache store failed for {}: {e}", path.display());
            }
        }

        Ok(fingerprint)
    }
}

/// Display helper: final path component as owned string.
pub(crate) fn file_name(path: &Path) -> String {
    path.file_name()
        .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coordinator_busy_rejection() {
        let coordinator = Coordinator::new();
        let guard = coordinator.begin().unwrap();

        match coordinator.begin() {
            Err(WorkflowError::Busy) => {}
            other => panic!("expected Busy, got {other:?}"),
        }

        drop(guard);
        assert!(coordinator.begin().is_ok());
    }

    #[test]
    fn test_file_name_helper() {
        assert_eq!(file_name(Path::new("/a/b/clip.mp4")), "clip.mp4");
    }
}
