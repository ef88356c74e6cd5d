//! Audio-track extraction from video containers via ffmpeg.
//!
//! Fingerprinting a video means staging its audio track as a temporary
//! 16-bit PCM WAV first. The temp file lives in the system temp dir and is
//! removed on drop, so a crashed batch leaves nothing behind in the media
//! folders.

use std::path::{Path, PathBuf};
use std::process::Command;

use tempfile::NamedTempFile;

use super::ExtractError;

/// Locate ffmpeg on this system (PATH, then the Homebrew prefix).
#[must_use]
pub fn locate() -> Option<PathBuf> {
    super::locate_tool("ffmpeg")
}

/// Extract the first audio stream of `video` into a temporary WAV file.
///
/// Returns the handle keeping the temp file alive; dropping it deletes the
/// file. A container without any audio stream yields
/// [`ExtractError::NoAudioTrack`], which batch drivers record as a skip.
pub fn extract_audio_track(ffmpeg: &Path, video: &Path) -> Result<NamedTempFile, ExtractError> {
    let wav = tempfile::Builder::new()
        .prefix("clipsync-audio-")
        .suffix(".wav")
        .tempfile()
        .map_err(|source| ExtractError::Io {
            path: video.to_path_buf(),
            source,
        })?;

    let output = Command::new(ffmpeg)
        .arg("-hide_banner")
        .arg("-i")
        .arg(video)
        // audio stream only, decoded to canonical PCM for fpcalc
        .args(["-map", "a:0", "-vn", "-acodec", "pcm_s16le", "-y"])
        .arg(wav.path())
        .output()
        .map_err(|source| ExtractError::Spawn {
            tool: "ffmpeg",
            source,
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        if stderr.contains("matches no streams")
            || stderr.contains("does not contain any stream")
        {
            return Err(ExtractError::NoAudioTrack(video.to_path_buf()));
        }
        return Err(ExtractError::ToolFailed {
            tool: "ffmpeg",
            path: video.to_path_buf(),
            message: stderr.trim().lines().last().unwrap_or("").to_string(),
        });
    }

    Ok(wav)
}
