//! Integration tests for the batch workflows with a synthetic extractor.
//!
//! No process execution: fingerprints come from an in-memory map keyed by
//! file name, exactly the seam production uses for fpcalc.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use rand::rngs::StdRng;
use rand::SeedableRng;
use tempfile::TempDir;

use clipsync::cache::{self, FingerprintCache};
use clipsync::fingerprint::Fingerprint;
use clipsync::media::{ExtractError, FingerprintSource};
use clipsync::progress::NullStatus;
use clipsync::workflow::{
    self, Coordinator, MatchOutcome, MatchSettings, MediaFingerprinter, MediaSource, RenamePlan,
    WorkflowError,
};

/// Synthetic media source keyed by file name.
struct MapSource {
    by_name: HashMap<String, Vec<u32>>,
    calls: RefCell<usize>,
}

impl MapSource {
    fn new(entries: &[(&str, &[u32])]) -> Self {
        Self {
            by_name: entries
                .iter()
                .map(|(name, codes)| ((*name).to_string(), codes.to_vec()))
                .collect(),
            calls: RefCell::new(0),
        }
    }

    fn calls(&self) -> usize {
        *self.calls.borrow()
    }

    fn lookup(&self, path: &Path) -> Result<Fingerprint, ExtractError> {
        *self.calls.borrow_mut() += 1;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        self.by_name
            .get(&name)
            .map(|codes| Fingerprint::new(codes.clone()))
            .ok_or_else(|| ExtractError::EmptyFingerprint(path.to_path_buf()))
    }
}

impl MediaSource for MapSource {
    fn fingerprint_media(&self, path: &Path) -> Result<Fingerprint, ExtractError> {
        self.lookup(path)
    }
}

impl FingerprintSource for MapSource {
    fn fingerprint(&self, path: &Path) -> Result<Fingerprint, ExtractError> {
        self.lookup(path)
    }
}

fn touch(dir: &Path, name: &str) {
    fs::write(dir.join(name), b"content").unwrap();
}

fn settings() -> MatchSettings {
    MatchSettings {
        threshold: 0.15,
        fixed_tags: String::new(),
        pool_tags: String::new(),
        preserve_exact_names: true,
    }
}

#[test]
fn full_sync_pipeline_renames_matched_clips() {
    let audio = TempDir::new().unwrap();
    let video = TempDir::new().unwrap();

    fs::create_dir(audio.path().join("nested")).unwrap();
    touch(audio.path(), "Song A.mp3");
    touch(&audio.path().join("nested"), "Song B.mp3");
    touch(video.path(), "clip1.mp4");
    touch(video.path(), "clip2.mp4");
    touch(video.path(), "silent.mp4");

    let source = MapSource::new(&[
        ("Song A.mp3", &[0x10, 0x20, 0x30, 0x40]),
        ("Song B.mp3", &[0xAAAA_0000, 0xBBBB_0000, 0xCCCC_0000]),
        ("clip1.mp4", &[0x20, 0x30]),            // exact window of Song A
        ("clip2.mp4", &[0xBBBB_0000, 0xCCCC_0000]), // exact window of Song B
        // silent.mp4 missing -> extraction failure -> skipped
    ]);

    let (references, index_stats) =
        workflow::index_references(audio.path(), &source, &NullStatus).unwrap();
    assert_eq!(index_stats.indexed, 2);
    assert_eq!(references.len(), 2);

    let mut rng = StdRng::seed_from_u64(9);
    let outcomes = workflow::match_videos(
        video.path(),
        &references,
        &settings(),
        &source,
        &mut rng,
        &NullStatus,
    )
    .unwrap();

    let matched: Vec<(&Path, &str)> = outcomes
        .iter()
        .filter_map(|o| match o {
            MatchOutcome::Matched {
                video,
                proposed_name,
                ..
            } => Some((video.as_path(), proposed_name.as_str())),
            _ => None,
        })
        .collect();
    assert_eq!(matched.len(), 2);
    assert!(matched.iter().any(|(_, name)| *name == "Song A.mp4"));
    assert!(matched.iter().any(|(_, name)| *name == "Song B.mp4"));
    assert!(outcomes
        .iter()
        .any(|o| matches!(o, MatchOutcome::Skipped { video, .. } if video.ends_with("silent.mp4"))));

    let plans: Vec<RenamePlan> = matched
        .iter()
        .map(|(path, name)| RenamePlan {
            original: path.to_path_buf(),
            new_name: (*name).to_string(),
        })
        .collect();
    let result = workflow::commit_renames(video.path(), &plans, true, &NullStatus).unwrap();

    assert!(result.all_succeeded());
    assert!(video.path().join("_Ready/Song A.mp4").exists());
    assert!(video.path().join("_Ready/Song B.mp4").exists());
    assert!(!video.path().join("clip1.mp4").exists());
    assert!(video.path().join("silent.mp4").exists()); // untouched
}

#[test]
fn matching_aborts_on_empty_reference_set_before_any_work() {
    let video = TempDir::new().unwrap();
    touch(video.path(), "clip.mp4");

    let source = MapSource::new(&[("clip.mp4", &[0x1])]);
    let err = workflow::match_videos(
        video.path(),
        &clipsync::fingerprint::ReferenceSet::new(),
        &settings(),
        &source,
        &mut StdRng::seed_from_u64(1),
        &NullStatus,
    )
    .unwrap_err();

    assert!(matches!(err, WorkflowError::EmptyReferenceSet));
    assert_eq!(source.calls(), 0);
}

#[test]
fn coordinator_rejects_concurrent_workflows_across_threads() {
    let coordinator = Coordinator::new();
    let guard = coordinator.begin().unwrap();

    std::thread::scope(|scope| {
        let handle = scope.spawn(|| matches!(coordinator.begin(), Err(WorkflowError::Busy)));
        assert!(handle.join().unwrap(), "second workflow must be rejected");
    });

    drop(guard);
    assert!(coordinator.begin().is_ok());
}

#[test]
fn fingerprint_cache_short_circuits_extraction() {
    let media_dir = TempDir::new().unwrap();
    let cache_dir = TempDir::new().unwrap();
    touch(media_dir.path(), "track.mp3");

    let cache = FingerprintCache::open(&cache_dir.path().join("fp.db")).unwrap();
    let source = MapSource::new(&[("track.mp3", &[0x1, 0x2, 0x3])]);
    let fingerprinter = MediaFingerprinter::new(&source).with_cache(&cache);

    let track = media_dir.path().join("track.mp3");
    let first = fingerprinter.fingerprint_media(&track).unwrap();
    assert_eq!(source.calls(), 1);

    let second = fingerprinter.fingerprint_media(&track).unwrap();
    assert_eq!(source.calls(), 1, "second extraction must hit the cache");
    assert_eq!(first, second);
}

#[test]
fn fingerprint_cache_invalidates_on_mtime_change() {
    let media_dir = TempDir::new().unwrap();
    let cache_dir = TempDir::new().unwrap();
    touch(media_dir.path(), "track.mp3");
    let track = media_dir.path().join("track.mp3");

    let cache = FingerprintCache::open(&cache_dir.path().join("fp.db")).unwrap();
    let fp = Fingerprint::new(vec![0x9]);
    let mtime = cache::file_mtime(&track).unwrap();
    cache.put(&track, mtime - 10, &fp).unwrap(); // stored before the file changed

    let source = MapSource::new(&[("track.mp3", &[0x1])]);
    let fingerprinter = MediaFingerprinter::new(&source).with_cache(&cache);

    let fresh = fingerprinter.fingerprint_media(&track).unwrap();
    assert_eq!(source.calls(), 1, "stale entry must not be served");
    assert_eq!(fresh.codes(), &[0x1]);
}

#[test]
fn dedup_report_counts_are_consistent() {
    let dir = TempDir::new().unwrap();
    touch(dir.path(), "a.mp3");
    touch(dir.path(), "a_copy.mp3");
    touch(dir.path(), "b.mp3");
    touch(dir.path(), "broken.mp3");

    let source = MapSource::new(&[
        ("a.mp3", &[0x7, 0x8]),
        ("a_copy.mp3", &[0x7, 0x8]),
        ("b.mp3", &[0xFFFF_FFFF, 0x0]),
    ]);

    let report = workflow::find_duplicates(dir.path(), 0.15, &source, &NullStatus).unwrap();

    assert_eq!(report.scanned, 4);
    assert_eq!(report.skipped.len(), 1);
    assert_eq!(report.cluster_count(), 1);
    assert_eq!(report.duplicate_count(), 1);

    let unique: Vec<&PathBuf> = report.unique_files();
    assert_eq!(unique.len(), 2);
    assert!(unique[0].ends_with("a.mp3"));
    assert!(unique[1].ends_with("b.mp3"));
}
