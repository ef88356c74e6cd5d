//! Reference-library indexing pass.
//!
//! Walks the audio directory recursively, fingerprints every media file
//! (video references get their audio track extracted first), and builds the
//! [`ReferenceSet`] the matching pass runs against. The reference id is the
//! base filename, matching how the proposed clip names are later derived.

use std::path::{Path, PathBuf};

use crate::fingerprint::{codec, ReferenceSet};
use crate::media;
use crate::progress::StatusCallback;

use super::{file_name, MediaSource, WorkflowError};

/// Statistics from an indexing pass.
#[derive(Debug, Default)]
pub struct IndexStats {
    /// Media files discovered under the audio directory.
    pub scanned: usize,
    /// Files successfully fingerprinted and added to the set.
    pub indexed: usize,
    /// Files skipped, with the reason.
    pub skipped: Vec<(PathBuf, String)>,
}

/// Index the reference library under `audio_dir`.
///
/// Per-file extraction failures are recorded in
/// [`IndexStats::skipped`] and never abort the pass. Two files with the
/// same base filename collapse onto one entry (last one wins), mirroring
/// how the references are addressed by display name.
pub fn index_references(
    audio_dir: &Path,
    fingerprinter: &dyn MediaSource,
    status: &dyn StatusCallback,
) -> Result<(ReferenceSet, IndexStats), WorkflowError> {
    if !audio_dir.is_dir() {
        return Err(WorkflowError::MissingDirectory(audio_dir.to_path_buf()));
    }

    let files = media::scan_media_tree(audio_dir);
    let mut stats = IndexStats {
        scanned: files.len(),
        ..IndexStats::default()
    };
    let mut references = ReferenceSet::new();

    status.on_phase_start("Indexing reference audio", files.len());
    log::info!(
        "indexing {} reference files under {}",
        files.len(),
        audio_dir.display()
    );

    for (i, path) in files.iter().enumerate() {
        let name = file_name(path);
        status.on_progress(i + 1, &name);

        match fingerprinter.fingerprint_media(path) {
            Ok(fingerprint) => {
                references.insert(name, codec::encode(&fingerprint));
                stats.indexed += 1;
            }
            Err(e) => {
                log::warn!("skipping reference {}: {e}", path.display());
                stats.skipped.push((path.clone(), e.to_string()));
            }
        }
    }

    status.on_phase_end(
        "Indexing reference audio",
        &format!("Indexed {} reference tracks", references.len()),
    );
    log::info!(
        "indexed {}/{} reference tracks ({} skipped)",
        references.len(),
        stats.scanned,
        stats.skipped.len()
    );

    Ok((references, stats))
}
