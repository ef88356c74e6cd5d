//! One-to-many batch matching pass.
//!
//! For each video clip directly inside the video directory: extract its
//! audio fingerprint, select the best reference, and - for accepted matches
//! - generate a unique proposed name. Extraction failures become
//! [`MatchOutcome::Skipped`]; below-threshold bests become
//! [`MatchOutcome::NoMatch`] with the observed BER so the two are reported
//! distinctly.

use std::path::{Path, PathBuf};

use rand::Rng;

use crate::fingerprint::{codec, matcher, MatchCandidate, ReferenceSet};
use crate::media;
use crate::naming::{NameGenerator, UsedNames};
use crate::progress::StatusCallback;

use super::{file_name, MediaSource, WorkflowError};

/// Settings for a matching pass.
#[derive(Debug, Clone)]
pub struct MatchSettings {
    /// Acceptance threshold; best BER must be strictly below it.
    pub threshold: f64,
    /// Tags inserted into every tagged name.
    pub fixed_tags: String,
    /// Whitespace-separated random tag pool.
    pub pool_tags: String,
    /// Use exact reference names instead of tagged names.
    pub preserve_exact_names: bool,
}

/// Outcome for one video in the batch.
#[derive(Debug, Clone)]
pub enum MatchOutcome {
    /// Accepted match with a rename proposal.
    Matched {
        /// The video file.
        video: PathBuf,
        /// Winning candidate (accepted).
        candidate: MatchCandidate,
        /// Generated collision-free output name.
        proposed_name: String,
    },
    /// Every reference stayed at or above the threshold.
    NoMatch {
        /// The video file.
        video: PathBuf,
        /// Best BER observed across the reference set.
        best_ber: f64,
    },
    /// Fingerprint could not be obtained; reason recorded.
    Skipped {
        /// The video file.
        video: PathBuf,
        /// Why the file was skipped.
        reason: String,
    },
}

impl MatchOutcome {
    /// The video this outcome belongs to.
    #[must_use]
    pub fn video(&self) -> &Path {
        match self {
            Self::Matched { video, .. }
            | Self::NoMatch { video, .. }
            | Self::Skipped { video, .. } => video,
        }
    }

    /// Whether this outcome carries a rename proposal.
    #[must_use]
    pub fn is_matched(&self) -> bool {
        matches!(self, Self::Matched { .. })
    }
}

/// Match every video in `video_dir` against the indexed references.
///
/// Aborts upfront with [`WorkflowError::EmptyReferenceSet`] when there is
/// nothing to match against; everything after that point is per-file and
/// non-fatal. Proposed names are unique against the video directory on disk
/// and against each other within the batch (case-insensitive).
pub fn match_videos<R: Rng + ?Sized>(
    video_dir: &Path,
    references: &ReferenceSet,
    settings: &MatchSettings,
    fingerprinter: &dyn MediaSource,
    rng: &mut R,
    status: &dyn StatusCallback,
) -> Result<Vec<MatchOutcome>, WorkflowError> {
    if !video_dir.is_dir() {
        return Err(WorkflowError::MissingDirectory(video_dir.to_path_buf()));
    }
    if references.is_empty() {
        return Err(WorkflowError::EmptyReferenceSet);
    }

    let videos = media::list_videos(video_dir).map_err(|source| WorkflowError::Io {
        path: video_dir.to_path_buf(),
        source,
    })?;

    let generator = NameGenerator::new(
        &settings.fixed_tags,
        &settings.pool_tags,
        settings.preserve_exact_names,
    );
    let mut used = UsedNames::new();
    let mut outcomes = Vec::with_capacity(videos.len());

    status.on_phase_start("Matching videos", videos.len());
    log::info!(
        "matching {} videos against {} references",
        videos.len(),
        references.len()
    );

    for (i, video) in videos.iter().enumerate() {
        let name = file_name(video);
        status.on_progress(i + 1, &name);

        let fingerprint = match fingerprinter.fingerprint_media(video) {
            Ok(fp) => fp,
            Err(e) => {
                log::warn!("skipping {}: {e}", video.display());
                outcomes.push(MatchOutcome::Skipped {
                    video: video.clone(),
                    reason: e.to_string(),
                });
                continue;
            }
        };

        let query = codec::encode(&fingerprint);
        let candidate = matcher::select_best(&name, &query, references, settings.threshold);

        let winner = candidate
            .accepted
            .then(|| candidate.reference_id.clone())
            .flatten();
        if let Some(reference_id) = winner {
            let proposed_name = generator.generate(rng, &reference_id, &name, &used, |c| {
                video_dir.join(c).exists()
            });
            used.insert(&proposed_name);

            log::info!(
                "matched {} -> {} (BER {:.3})",
                name,
                reference_id,
                candidate.ber
            );
            outcomes.push(MatchOutcome::Matched {
                video: video.clone(),
                candidate,
                proposed_name,
            });
        } else {
            log::info!("no match for {} (best BER {:.3})", name, candidate.ber);
            outcomes.push(MatchOutcome::NoMatch {
                video: video.clone(),
                best_ber: candidate.ber,
            });
        }
    }

    let matched = outcomes.iter().filter(|o| o.is_matched()).count();
    status.on_phase_end(
        "Matching videos",
        &format!("Found {matched} matches in {} videos", videos.len()),
    );

    Ok(outcomes)
}
