//! Many-to-many duplicate detection pass and unique-file export.
//!
//! Fingerprints every media file under a directory tree, partitions them
//! with the anchor-based grouper, and reports one representative per group.
//! Representatives can additionally be written to a list file or copied
//! into a separate directory with collision suffixing.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::fingerprint::{codec, dedup, BitVector, DuplicateGroup};
use crate::media;
use crate::progress::StatusCallback;

use super::{file_name, MediaSource, WorkflowError};

/// Results of a dedup pass over one directory tree.
#[derive(Debug)]
pub struct DedupReport {
    /// Every group, in anchor discovery order; singletons included.
    pub groups: Vec<DuplicateGroup<PathBuf>>,
    /// Files whose fingerprint could not be extracted, with the reason.
    pub skipped: Vec<(PathBuf, String)>,
    /// Total media files discovered.
    pub scanned: usize,
}

impl DedupReport {
    /// One representative path per group, in group order.
    #[must_use]
    pub fn unique_files(&self) -> Vec<&PathBuf> {
        self.groups.iter().map(DuplicateGroup::representative).collect()
    }

    /// Number of groups holding more than one file.
    #[must_use]
    pub fn cluster_count(&self) -> usize {
        self.groups.iter().filter(|g| g.is_cluster()).count()
    }

    /// Number of files that would be dropped by keeping one per group.
    #[must_use]
    pub fn duplicate_count(&self) -> usize {
        self.groups.iter().map(|g| g.len() - 1).sum()
    }
}

/// Fingerprint and group every media file under `root`.
///
/// Extraction failures are recorded in [`DedupReport::skipped`]; the
/// grouping runs over whatever was successfully fingerprinted, so the
/// groups always partition exactly that set.
pub fn find_duplicates(
    root: &Path,
    threshold: f64,
    fingerprinter: &dyn MediaSource,
    status: &dyn StatusCallback,
) -> Result<DedupReport, WorkflowError> {
    if !root.is_dir() {
        return Err(WorkflowError::MissingDirectory(root.to_path_buf()));
    }

    let files = media::scan_media_tree(root);
    let mut entries: Vec<(PathBuf, BitVector)> = Vec::with_capacity(files.len());
    let mut skipped = Vec::new();

    status.on_phase_start("Extracting fingerprints", files.len());
    log::info!("fingerprinting {} files under {}", files.len(), root.display());

    for (i, path) in files.iter().enumerate() {
        status.on_progress(i + 1, &file_name(path));
        match fingerprinter.fingerprint_media(path) {
            Ok(fingerprint) => entries.push((path.clone(), codec::encode(&fingerprint))),
            Err(e) => {
                log::warn!("skipping {}: {e}", path.display());
                skipped.push((path.clone(), e.to_string()));
            }
        }
    }
    status.on_phase_end(
        "Extracting fingerprints",
        &format!("Extracted {} fingerprints", entries.len()),
    );

    let groups = dedup::group_duplicates(&entries, threshold);

    Ok(DedupReport {
        groups,
        skipped,
        scanned: files.len(),
    })
}

/// Write the representative list to a text file, one path per line.
pub fn write_unique_list(report: &DedupReport, output: &Path) -> Result<(), WorkflowError> {
    let mut file = fs::File::create(output).map_err(|source| WorkflowError::Io {
        path: output.to_path_buf(),
        source,
    })?;
    for path in report.unique_files() {
        writeln!(file, "{}", path.display()).map_err(|source| WorkflowError::Io {
            path: output.to_path_buf(),
            source,
        })?;
    }
    log::info!("wrote unique-file list to {}", output.display());
    Ok(())
}

/// Results of copying unique representatives.
#[derive(Debug, Clone, Default)]
pub struct CopyStats {
    /// Files copied, as `(from, to)` pairs.
    pub copied: Vec<(PathBuf, PathBuf)>,
    /// Copy failures with their error messages.
    pub failures: Vec<(PathBuf, String)>,
}

/// Copy one representative per group into `dest`, creating it on demand.
///
/// Name collisions inside `dest` get `_1`, `_2`... suffixes before the
/// extension. Per-file copy failures are collected; the batch runs to the
/// end.
pub fn export_unique(
    report: &DedupReport,
    dest: &Path,
    status: &dyn StatusCallback,
) -> Result<CopyStats, WorkflowError> {
    if !dest.exists() {
        fs::create_dir_all(dest).map_err(|source| WorkflowError::Io {
            path: dest.to_path_buf(),
            source,
        })?;
        log::info!("created {}", dest.display());
    }

    let unique = report.unique_files();
    let mut stats = CopyStats::default();
    status.on_phase_start("Copying unique files", unique.len());

    for (i, source_path) in unique.iter().enumerate() {
        let name = file_name(source_path);
        status.on_progress(i + 1, &name);

        let target = disambiguate(dest, &name);
        match fs::copy(source_path, &target) {
            Ok(_) => stats.copied.push(((*source_path).clone(), target)),
            Err(e) => {
                log::error!("failed to copy {}: {e}", source_path.display());
                stats.failures.push(((*source_path).clone(), e.to_string()));
            }
        }
    }

    status.on_phase_end(
        "Copying unique files",
        &format!("copied {}/{} files", stats.copied.len(), unique.len()),
    );
    Ok(stats)
}

/// First non-colliding variant of `name` inside `dir`.
fn disambiguate(dir: &Path, name: &str) -> PathBuf {
    let candidate = dir.join(name);
    if !candidate.exists() {
        return candidate;
    }

    let stem = Path::new(name)
        .file_stem()
        .map_or_else(|| name.to_string(), |s| s.to_string_lossy().into_owned());
    let ext = Path::new(name)
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();

    let mut counter = 1;
    loop {
        let candidate = dir.join(format!("{stem}_{counter}{ext}"));
        if !candidate.exists() {
            return candidate;
        }
        counter += 1;
    }
}
