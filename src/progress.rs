//! Progress reporting utilities using indicatif.
//!
//! Workflows report progress through the [`StatusCallback`] trait after each
//! file: a message plus current/total counters. The CLI wires in
//! [`ProgressReporter`] for a terminal progress bar; tests and quiet mode
//! use [`NullStatus`]. The workflows never depend on acknowledgment.

use std::sync::Mutex;

use indicatif::{ProgressBar, ProgressStyle};

/// Receiver for workflow status updates.
///
/// One phase (indexing, matching, renaming, dedup) is active at a time;
/// `on_progress` fires once per processed file.
pub trait StatusCallback: Send + Sync {
    /// A phase is starting with `total` items to process.
    fn on_phase_start(&self, phase: &str, total: usize);

    /// One item has been processed. `current` is 1-based.
    fn on_progress(&self, current: usize, message: &str);

    /// The active phase finished; `summary` is a human-readable outcome.
    fn on_phase_end(&self, phase: &str, summary: &str);
}

/// No-op status sink for tests and embedding.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullStatus;

impl StatusCallback for NullStatus {
    fn on_phase_start(&self, _phase: &str, _total: usize) {}
    fn on_progress(&self, _current: usize, _message: &str) {}
    fn on_phase_end(&self, _phase: &str, _summary: &str) {}
}

/// Terminal progress reporter backed by a single indicatif bar per phase.
pub struct ProgressReporter {
    bar: Mutex<Option<ProgressBar>>,
    quiet: bool,
    no_color: bool,
}

impl ProgressReporter {
    /// Create a reporter. With `quiet` set, nothing is ever drawn.
    #[must_use]
    pub fn new(quiet: bool) -> Self {
        Self::with_color_choice(quiet, false)
    }

    /// Create a reporter honoring a `--no-color` request.
    #[must_use]
    pub fn with_color_choice(quiet: bool, no_color: bool) -> Self {
        Self {
            bar: Mutex::new(None),
            quiet,
            no_color,
        }
    }

    fn style(&self) -> ProgressStyle {
        if self.no_color {
            ProgressStyle::with_template(
                "[{elapsed_precise}] [{bar:40}] {pos}/{len} ({percent}%) {msg}",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-")
        } else {
            ProgressStyle::with_template(
                "[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg}",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█>-")
        }
    }
}

impl StatusCallback for ProgressReporter {
    fn on_phase_start(&self, phase: &str, total: usize) {
        if self.quiet {
            return;
        }
        let pb = ProgressBar::new(total as u64);
        pb.set_style(self.style());
        pb.set_message(phase.to_string());
        *self.bar.lock().unwrap() = Some(pb);
    }

    fn on_progress(&self, current: usize, message: &str) {
        if self.quiet {
            return;
        }
        if let Some(ref pb) = *self.bar.lock().unwrap() {
            pb.set_position(current as u64);
            pb.set_message(truncate_message(message, 40));
        }
    }

    fn on_phase_end(&self, _phase: &str, summary: &str) {
        if self.quiet {
            return;
        }
        if let Some(pb) = self.bar.lock().unwrap().take() {
            pb.finish_with_message(summary.to_string());
        }
    }
}

/// Shorten a message (usually a filename) for the progress line.
fn truncate_message(message: &str, max_len: usize) -> String {
    if message.chars().count() <= max_len {
        return message.to_string();
    }
    let tail: String = message
        .chars()
        .rev()
        .take(max_len.saturating_sub(3))
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect();
    format!("...{tail}")
}
