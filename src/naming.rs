//! Output filename generation for matched clips.
//!
//! # Overview
//!
//! A matched clip is renamed after its reference track. The generated name
//! must be unique case-insensitively against both the names already on disk
//! and the names already proposed earlier in the same batch. Two modes:
//!
//! - **exact**: `reference.ext`, then `reference_1.ext` … up to a bounded
//!   numeric suffix, falling through to tagged mode when exhausted
//! - **tagged**: `reference <fixed tags> <sampled tags>.ext`, sampling up
//!   to two distinct tags per attempt from the pool
//!
//! When every attempt collides, a random 4-digit suffix forces uniqueness
//! (best effort; not guaranteed collision-free).
//!
//! All randomness flows through an explicit `rand::Rng`, so tests seed a
//! `StdRng` and get reproducible outcomes.

use std::collections::HashSet;
use std::path::Path;

use rand::seq::SliceRandom;
use rand::Rng;

/// Highest `_N` suffix tried in exact mode before falling through to
/// tagged-mode behavior.
pub const EXACT_SUFFIX_LIMIT: u32 = 99;

/// Number of random tag combinations tried before the numeric fallback.
pub const TAGGED_ATTEMPTS: u32 = 20;

/// Tags sampled per generated name (fewer when the pool is smaller).
const TAGS_PER_NAME: usize = 2;

/// Case-insensitive set of filenames already claimed in this batch.
///
/// Callers must record every accepted name before generating the next one;
/// the generator itself never mutates the set.
#[derive(Debug, Clone, Default)]
pub struct UsedNames {
    lowered: HashSet<String>,
}

impl UsedNames {
    /// Create an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a claimed name.
    pub fn insert(&mut self, name: &str) {
        self.lowered.insert(name.to_lowercase());
    }

    /// Whether a name is already claimed, ignoring case.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.lowered.contains(&name.to_lowercase())
    }

    /// Number of claimed names.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lowered.len()
    }

    /// Whether no names are claimed yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lowered.is_empty()
    }
}

/// Filename generator configured once per batch.
#[derive(Debug, Clone)]
pub struct NameGenerator {
    fixed_tags: String,
    pool_tags: Vec<String>,
    preserve_exact: bool,
}

impl NameGenerator {
    /// Create a generator.
    ///
    /// `fixed_tags` is inserted verbatim into every tagged name;
    /// `pool_tags` is split on whitespace into the sampling pool.
    /// `preserve_exact` enables exact mode.
    #[must_use]
    pub fn new(fixed_tags: &str, pool_tags: &str, preserve_exact: bool) -> Self {
        Self {
            fixed_tags: fixed_tags.trim().to_string(),
            pool_tags: pool_tags.split_whitespace().map(str::to_string).collect(),
            preserve_exact,
        }
    }

    /// Generate a non-colliding output filename.
    ///
    /// `reference_id` supplies the base name (its own extension is
    /// stripped); `original_name` supplies the output extension (the video
    /// keeps its container). `exists_on_disk` is consulted with each full
    /// candidate filename; `used` covers names proposed earlier in the
    /// batch.
    pub fn generate<R, F>(
        &self,
        rng: &mut R,
        reference_id: &str,
        original_name: &str,
        used: &UsedNames,
        exists_on_disk: F,
    ) -> String
    where
        R: Rng + ?Sized,
        F: Fn(&str) -> bool,
    {
        let base = file_stem(reference_id);
        let ext = file_extension(original_name);
        let available = |candidate: &str| !exists_on_disk(candidate) && !used.contains(candidate);

        if self.preserve_exact {
            let candidate = format!("{base}{ext}");
            if available(&candidate) {
                return candidate;
            }
            for i in 1..=EXACT_SUFFIX_LIMIT {
                let candidate = format!("{base}_{i}{ext}");
                if available(&candidate) {
                    return candidate;
                }
            }
            log::debug!("exact-name space exhausted for {base:?}, trying tags");
        }

        for _ in 0..TAGGED_ATTEMPTS {
            let sampled: Vec<&str> = self
                .pool_tags
                .choose_multiple(rng, TAGS_PER_NAME.min(self.pool_tags.len()))
                .map(String::as_str)
                .collect();

            let mut parts: Vec<&str> = vec![base.as_str()];
            if !self.fixed_tags.is_empty() {
                parts.push(self.fixed_tags.as_str());
            }
            parts.extend(&sampled);

            let candidate = format!("{}{ext}", parts.join(" "));
            if available(&candidate) {
                return candidate;
            }
        }

        // Last resort; astronomically unlikely to collide within a batch.
        let suffix: u32 = rng.gen_range(1000..10000);
        format!("{base}_{suffix}{ext}")
    }
}

/// Base name without the final extension.
fn file_stem(name: &str) -> String {
    Path::new(name)
        .file_stem()
        .map_or_else(|| name.to_string(), |s| s.to_string_lossy().into_owned())
}

/// Final extension including the dot, empty when there is none.
fn file_extension(name: &str) -> String {
    Path::new(name)
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default()
}
