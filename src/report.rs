//! Machine- and human-readable result rendering.
//!
//! # Overview
//!
//! The `--output json` mode emits one JSON document per workflow for
//! scripting; text mode prints the same information for terminals. Both
//! views are built from the workflow outcome types, so rendering never
//! re-derives anything.
//!
//! # JSON Schema (sync)
//!
//! ```json
//! {
//!   "generated_at": "2026-08-07T12:00:00Z",
//!   "reference_count": 12,
//!   "matches": [
//!     {"original": "clip.mp4", "new_name": "Song #shorts.mp4",
//!      "matched_ref": "Song.mp3", "ber": 0.012, "confidence": 0.988}
//!   ],
//!   "no_match": [{"original": "other.mp4", "best_ber": 0.41}],
//!   "skipped": [{"original": "silent.mp4", "reason": "no audio track"}]
//! }
//! ```

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::workflow::{file_name, DedupReport, MatchOutcome};

/// A single accepted match in JSON form.
#[derive(Debug, Serialize)]
pub struct JsonMatch {
    /// Original clip filename.
    pub original: String,
    /// Proposed output filename.
    pub new_name: String,
    /// Winning reference id.
    pub matched_ref: String,
    /// Bit error rate of the winning alignment.
    pub ber: f64,
    /// `1 - ber`.
    pub confidence: f64,
}

/// A rejected clip in JSON form.
#[derive(Debug, Serialize)]
pub struct JsonNoMatch {
    /// Original clip filename.
    pub original: String,
    /// Best BER observed across all references.
    pub best_ber: f64,
}

/// A skipped file in JSON form.
#[derive(Debug, Serialize)]
pub struct JsonSkipped {
    /// Original filename.
    pub original: String,
    /// Why extraction failed.
    pub reason: String,
}

/// Full sync-workflow report.
#[derive(Debug, Serialize)]
pub struct JsonMatchReport {
    /// When the report was generated.
    pub generated_at: DateTime<Utc>,
    /// Number of indexed references the batch ran against.
    pub reference_count: usize,
    /// Accepted matches with rename proposals.
    pub matches: Vec<JsonMatch>,
    /// Clips whose best BER stayed at or above the threshold.
    pub no_match: Vec<JsonNoMatch>,
    /// Clips skipped for extraction reasons.
    pub skipped: Vec<JsonSkipped>,
}

impl JsonMatchReport {
    /// Build a report from match outcomes.
    #[must_use]
    pub fn from_outcomes(outcomes: &[MatchOutcome], reference_count: usize) -> Self {
        let mut matches = Vec::new();
        let mut no_match = Vec::new();
        let mut skipped = Vec::new();

        for outcome in outcomes {
            match outcome {
                MatchOutcome::Matched {
                    video,
                    candidate,
                    proposed_name,
                } => matches.push(JsonMatch {
                    original: file_name(video),
                    new_name: proposed_name.clone(),
                    matched_ref: candidate.reference_id.clone().unwrap_or_default(),
                    ber: candidate.ber,
                    confidence: candidate.confidence(),
                }),
                MatchOutcome::NoMatch { video, best_ber } => no_match.push(JsonNoMatch {
                    original: file_name(video),
                    best_ber: *best_ber,
                }),
                MatchOutcome::Skipped { video, reason } => skipped.push(JsonSkipped {
                    original: file_name(video),
                    reason: reason.clone(),
                }),
            }
        }

        Self {
            generated_at: Utc::now(),
            reference_count,
            matches,
            no_match,
            skipped,
        }
    }

    /// Serialize as pretty-printed JSON.
    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// One duplicate group in JSON form.
#[derive(Debug, Serialize)]
pub struct JsonDuplicateGroup {
    /// Kept representative.
    pub keep: String,
    /// Members judged duplicates of the representative.
    pub duplicates: Vec<String>,
}

/// Full dedup-workflow report.
#[derive(Debug, Serialize)]
pub struct JsonDedupReport {
    /// When the report was generated.
    pub generated_at: DateTime<Utc>,
    /// Total media files discovered.
    pub scanned: usize,
    /// Files successfully fingerprinted.
    pub fingerprinted: usize,
    /// Groups with more than one member.
    pub duplicate_groups: Vec<JsonDuplicateGroup>,
    /// One representative per group.
    pub unique: Vec<String>,
    /// Files skipped for extraction reasons.
    pub skipped: Vec<JsonSkipped>,
}

impl JsonDedupReport {
    /// Build a report from a dedup pass.
    #[must_use]
    pub fn from_report(report: &DedupReport) -> Self {
        Self {
            generated_at: Utc::now(),
            scanned: report.scanned,
            fingerprinted: report.scanned - report.skipped.len(),
            duplicate_groups: report
                .groups
                .iter()
                .filter(|g| g.is_cluster())
                .map(|g| JsonDuplicateGroup {
                    keep: g.representative().display().to_string(),
                    duplicates: g
                        .duplicates()
                        .iter()
                        .map(|p| p.display().to_string())
                        .collect(),
                })
                .collect(),
            unique: report
                .unique_files()
                .iter()
                .map(|p| p.display().to_string())
                .collect(),
            skipped: report
                .skipped
                .iter()
                .map(|(path, reason)| JsonSkipped {
                    original: file_name(path),
                    reason: reason.clone(),
                })
                .collect(),
        }
    }

    /// Serialize as pretty-printed JSON.
    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// Print match outcomes for a terminal.
pub fn render_matches_text(outcomes: &[MatchOutcome]) {
    for outcome in outcomes {
        match outcome {
            MatchOutcome::Matched {
                video,
                candidate,
                proposed_name,
            } => {
                println!(
                    "  {} -> {} (BER {:.3})",
                    file_name(video),
                    proposed_name,
                    candidate.ber
                );
            }
            MatchOutcome::NoMatch { video, best_ber } => {
                println!(
                    "  {}: no match (best BER {best_ber:.3})",
                    file_name(video)
                );
            }
            MatchOutcome::Skipped { video, reason } => {
                println!("  {}: skipped ({reason})", file_name(video));
            }
        }
    }
}

/// Print dedup groups for a terminal.
pub fn render_dedup_text(report: &DedupReport) {
    println!(
        "{} files scanned, {} fingerprinted, {} duplicate clusters",
        report.scanned,
        report.scanned - report.skipped.len(),
        report.cluster_count()
    );

    for (i, group) in report.groups.iter().filter(|g| g.is_cluster()).enumerate() {
        println!("\nGroup {} ({} files):", i + 1, group.len());
        for (j, path) in group.members().iter().enumerate() {
            let marker = if j == 0 { "keep" } else { "dup " };
            println!("  [{marker}] {}", path.display());
        }
    }

    if !report.skipped.is_empty() {
        println!("\nSkipped:");
        for (path, reason) in &report.skipped {
            println!("  {}: {reason}", path.display());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fingerprint::MatchCandidate;
    use std::path::PathBuf;

    fn outcomes() -> Vec<MatchOutcome> {
        vec![
            MatchOutcome::Matched {
                video: PathBuf::from("/v/clip.mp4"),
                candidate: MatchCandidate {
                    query_id: "clip.mp4".to_string(),
                    reference_id: Some("Song.mp3".to_string()),
                    ber: 0.01,
                    accepted: true,
                },
                proposed_name: "Song.mp4".to_string(),
            },
            MatchOutcome::NoMatch {
                video: PathBuf::from("/v/other.mp4"),
                best_ber: 0.4,
            },
            MatchOutcome::Skipped {
                video: PathBuf::from("/v/silent.mp4"),
                reason: "no audio track".to_string(),
            },
        ]
    }

    #[test]
    fn test_match_report_buckets() {
        let report = JsonMatchReport::from_outcomes(&outcomes(), 3);

        assert_eq!(report.reference_count, 3);
        assert_eq!(report.matches.len(), 1);
        assert_eq!(report.no_match.len(), 1);
        assert_eq!(report.skipped.len(), 1);

        assert_eq!(report.matches[0].original, "clip.mp4");
        assert_eq!(report.matches[0].matched_ref, "Song.mp3");
        assert!((report.matches[0].confidence - 0.99).abs() < 1e-9);
    }

    #[test]
    fn test_match_report_serializes() {
        let report = JsonMatchReport::from_outcomes(&outcomes(), 1);
        let json = report.to_json_pretty().unwrap();
        assert!(json.contains("\"new_name\": \"Song.mp4\""));
        assert!(json.contains("\"best_ber\": 0.4"));
    }
}
