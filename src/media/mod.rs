//! Media discovery and the external extraction toolchain.
//!
//! # Overview
//!
//! Everything the matching engine cannot do itself lives here:
//!
//! - [`fpcalc`]: Chromaprint fingerprint extraction via the `fpcalc`
//!   command-line tool, behind the [`FingerprintSource`] trait so tests can
//!   inject synthetic fingerprints
//! - [`ffmpeg`]: audio-track extraction from video containers into a
//!   temporary WAV
//! - file discovery helpers shared by the indexing, matching, and dedup
//!   workflows
//!
//! Per-file failures from these tools are never fatal to a batch: callers
//! record the [`ExtractError`] and skip the file.

pub mod ffmpeg;
pub mod fpcalc;

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

pub use fpcalc::{FingerprintSource, FpcalcSource};

/// Audio container extensions accepted as reference material.
pub const AUDIO_EXTENSIONS: &[&str] = &["mp3", "wav", "m4a", "flac", "ogg"];

/// Video container extensions accepted for matching and as reference
/// material (their audio track is extracted first).
pub const VIDEO_EXTENSIONS: &[&str] = &["mp4", "mov", "mkv"];

/// What kind of media a path points at, judged by extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    /// Plain audio file, fingerprinted directly.
    Audio,
    /// Video container; the audio track must be extracted first.
    Video,
}

/// Classify a path by its extension, case-insensitively.
///
/// Returns `None` for anything that is neither a known audio nor a known
/// video container.
#[must_use]
pub fn media_kind(path: &Path) -> Option<MediaKind> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    if AUDIO_EXTENSIONS.contains(&ext.as_str()) {
        Some(MediaKind::Audio)
    } else if VIDEO_EXTENSIONS.contains(&ext.as_str()) {
        Some(MediaKind::Video)
    } else {
        None
    }
}

/// Errors from the external extraction tools.
///
/// All of these are per-file and recoverable; batch drivers log them and
/// move on. Only tool *absence* (checked before any work starts) is treated
/// as fatal, by the preflight in the application layer.
#[derive(Debug, Error)]
pub enum ExtractError {
    /// The external tool could not be spawned at all.
    #[error("failed to run {tool}: {source}")]
    Spawn {
        /// Tool name (fpcalc, ffmpeg).
        tool: &'static str,
        /// The underlying spawn error.
        #[source]
        source: io::Error,
    },

    /// The tool ran but exited unsuccessfully.
    #[error("{tool} failed for {path}: {message}")]
    ToolFailed {
        /// Tool name.
        tool: &'static str,
        /// File being processed.
        path: PathBuf,
        /// Trimmed stderr excerpt.
        message: String,
    },

    /// The tool exceeded its time budget and was killed.
    #[error("{tool} timed out after {seconds}s for {path}")]
    Timeout {
        /// Tool name.
        tool: &'static str,
        /// File being processed.
        path: PathBuf,
        /// Configured timeout.
        seconds: u64,
    },

    /// The video container has no audio stream to extract.
    #[error("no audio track in {0}")]
    NoAudioTrack(PathBuf),

    /// fpcalc produced no usable fingerprint payload.
    #[error("empty fingerprint for {0}")]
    EmptyFingerprint(PathBuf),

    /// fpcalc output did not parse.
    #[error("unparseable fpcalc output for {path}: {message}")]
    BadOutput {
        /// File being processed.
        path: PathBuf,
        /// What went wrong.
        message: String,
    },

    /// I/O error around temp-file staging.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: io::Error,
    },
}

/// Recursively collect every media file under `root`, sorted by path for
/// deterministic processing order.
///
/// Unreadable entries are logged and skipped; a missing root yields an
/// empty list (callers validate directories before starting a workflow).
#[must_use]
pub fn scan_media_tree(root: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();
    for entry in walkdir::WalkDir::new(root) {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                log::warn!("skipping unreadable entry under {}: {e}", root.display());
                continue;
            }
        };
        if entry.file_type().is_file() && media_kind(entry.path()).is_some() {
            files.push(entry.into_path());
        }
    }
    files.sort();
    files
}

/// List video files directly inside `dir` (non-recursive), sorted by path.
///
/// The match batch deliberately does not descend into subdirectories;
/// `_Ready` and other staging folders would otherwise be re-matched.
pub fn list_videos(dir: &Path) -> io::Result<Vec<PathBuf>> {
    let mut videos = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if path.is_file() && media_kind(&path) == Some(MediaKind::Video) {
            videos.push(path);
        }
    }
    videos.sort();
    Ok(videos)
}

/// Locate an executable by name on `PATH`, falling back to the Homebrew
/// prefix that macOS installs commonly land in.
#[must_use]
pub fn locate_tool(name: &str) -> Option<PathBuf> {
    if let Some(paths) = std::env::var_os("PATH") {
        for dir in std::env::split_paths(&paths) {
            let candidate = dir.join(name);
            if candidate.is_file() {
                return Some(candidate);
            }
        }
    }

    let homebrew = Path::new("/opt/homebrew/bin").join(name);
    if homebrew.is_file() {
        return Some(homebrew);
    }

    None
}
