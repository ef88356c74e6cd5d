//! clipsync - Audio-Fingerprint Clip Matcher
//!
//! Matches short video clips against a reference audio library using
//! Chromaprint fingerprints, renames accepted matches after their reference
//! track, and partitions audio libraries into duplicate groups.
//!
//! The matching engine ([`fingerprint`]) is pure and synchronous; external
//! tools (`fpcalc`, `ffmpeg`) are consumed through the [`media`] boundary,
//! and the [`workflow`] module owns batch orchestration and the
//! one-workflow-at-a-time invariant.

pub mod cache;
pub mod cli;
pub mod config;
pub mod error;
pub mod fingerprint;
pub mod logging;
pub mod media;
pub mod naming;
pub mod progress;
pub mod report;
pub mod workflow;

use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::cache::FingerprintCache;
use crate::cli::{Cli, Commands, DedupArgs, OutputFormat, SyncArgs};
use crate::config::Config;
use crate::error::ExitCode;
use crate::media::FpcalcSource;
use crate::progress::ProgressReporter;
use crate::report::{JsonDedupReport, JsonMatchReport};
use crate::workflow::{
    Coordinator, MatchOutcome, MatchSettings, MediaFingerprinter, RenamePlan,
};

/// Run the application with parsed CLI arguments.
///
/// Returns the exit code for normal completions; `Err` means a fatal setup
/// or workflow error that `main` reports and maps to
/// [`ExitCode::GeneralError`].
pub fn run_app(cli: Cli) -> Result<ExitCode> {
    logging::init_logging(cli.verbose, cli.quiet);

    match cli.command {
        Commands::Sync(args) => cmd_sync(args, cli.quiet, cli.no_color),
        Commands::Dedup(args) => cmd_dedup(args, cli.quiet, cli.no_color),
    }
}

/// The sync workflow: index references, match clips, confirm, rename.
fn cmd_sync(args: SyncArgs, quiet: bool, no_color: bool) -> Result<ExitCode> {
    let config = Config::load();

    let video_dir = args
        .video_dir
        .or(config.video_dir)
        .context("video directory not set (use --video-dir or save it in the config)")?;
    let audio_dir = args
        .audio_dir
        .or(config.audio_dir)
        .context("audio directory not set (use --audio-dir or save it in the config)")?;

    let settings = MatchSettings {
        threshold: args.threshold.unwrap_or(config.ber_threshold),
        fixed_tags: args.fixed_tags.unwrap_or(config.fixed_tags),
        pool_tags: args.pool_tags.unwrap_or(config.pool_tags),
        preserve_exact_names: args.exact || config.preserve_exact_names,
    };
    let move_files = args.move_files || config.move_files;

    if args.save_config {
        let saved = Config {
            video_dir: Some(video_dir.clone()),
            audio_dir: Some(audio_dir.clone()),
            fixed_tags: settings.fixed_tags.clone(),
            pool_tags: settings.pool_tags.clone(),
            move_files,
            preserve_exact_names: settings.preserve_exact_names,
            ber_threshold: settings.threshold,
            fpcalc_timeout_secs: config.fpcalc_timeout_secs,
        };
        saved.save().context("saving configuration defaults")?;
        log::info!("saved configuration defaults");
    }

    // Preflight: both tools are needed for every sync run, so fail fast
    // with an actionable message before touching any file.
    let fpcalc = FpcalcSource::locate().ok_or(workflow::WorkflowError::MissingTool {
        tool: "fpcalc",
        hint: "install chromaprint (brew install chromaprint / apt install libchromaprint-tools)",
    })?;
    let ffmpeg = media::ffmpeg::locate().ok_or(workflow::WorkflowError::MissingTool {
        tool: "ffmpeg",
        hint: "install ffmpeg (brew install ffmpeg / apt install ffmpeg)",
    })?;

    let coordinator = Coordinator::new();
    let _guard = coordinator.begin()?;

    let cache = open_cache(args.no_cache, args.cache);
    let source = FpcalcSource::new(fpcalc, Duration::from_secs(config.fpcalc_timeout_secs));
    let mut fingerprinter = MediaFingerprinter::new(&source).with_ffmpeg(&ffmpeg);
    if let Some(ref cache) = cache {
        fingerprinter = fingerprinter.with_cache(cache);
    }

    let status = ProgressReporter::with_color_choice(quiet, no_color);
    let (references, index_stats) =
        workflow::index_references(&audio_dir, &fingerprinter, &status)?;
    if references.is_empty() {
        anyhow::bail!(
            "no reference fingerprints could be extracted from {} ({} files skipped)",
            audio_dir.display(),
            index_stats.skipped.len()
        );
    }

    let mut rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let outcomes = workflow::match_videos(
        &video_dir,
        &references,
        &settings,
        &fingerprinter,
        &mut rng,
        &status,
    )?;

    if args.output == OutputFormat::Json {
        let report = JsonMatchReport::from_outcomes(&outcomes, references.len());
        println!("{}", report.to_json_pretty()?);
        if !args.yes {
            // Report-only run; nothing was renamed.
            return Ok(if report.matches.is_empty() {
                ExitCode::NothingFound
            } else {
                ExitCode::Success
            });
        }
    } else if !quiet {
        println!("\nResults:");
        report::render_matches_text(&outcomes);
    }

    let plans: Vec<RenamePlan> = outcomes
        .iter()
        .filter_map(|outcome| match outcome {
            MatchOutcome::Matched {
                video,
                proposed_name,
                ..
            } => Some(RenamePlan {
                original: video.clone(),
                new_name: proposed_name.clone(),
            }),
            _ => None,
        })
        .collect();

    if plans.is_empty() {
        if !quiet {
            println!("\nNo files to rename.");
        }
        return Ok(ExitCode::NothingFound);
    }

    if !args.yes && !confirm(&format!("\nRename {} files?", plans.len()))? {
        if !quiet {
            println!("Cancelled.");
        }
        return Ok(ExitCode::Success);
    }

    let result = workflow::commit_renames(&video_dir, &plans, move_files, &status)?;
    if !quiet {
        println!("\n{}", result.summary());
        for (path, message) in &result.failures {
            println!("  failed: {}: {message}", path.display());
        }
    }

    Ok(if result.all_succeeded() {
        ExitCode::Success
    } else {
        ExitCode::PartialSuccess
    })
}

/// The dedup workflow: fingerprint a tree, group, report, export.
fn cmd_dedup(args: DedupArgs, quiet: bool, no_color: bool) -> Result<ExitCode> {
    let config = Config::load();
    let threshold = args.threshold.unwrap_or(config.ber_threshold);

    let fpcalc = FpcalcSource::locate().ok_or(workflow::WorkflowError::MissingTool {
        tool: "fpcalc",
        hint: "install chromaprint (brew install chromaprint / apt install libchromaprint-tools)",
    })?;
    // ffmpeg is only required when the tree actually contains videos;
    // without it, video files are skipped per-file rather than aborting.
    let ffmpeg = media::ffmpeg::locate();

    let coordinator = Coordinator::new();
    let _guard = coordinator.begin()?;

    let cache = open_cache(args.no_cache, None);
    let source = FpcalcSource::new(fpcalc, Duration::from_secs(config.fpcalc_timeout_secs));
    let mut fingerprinter = MediaFingerprinter::new(&source);
    if let Some(ref ffmpeg) = ffmpeg {
        fingerprinter = fingerprinter.with_ffmpeg(ffmpeg);
    }
    if let Some(ref cache) = cache {
        fingerprinter = fingerprinter.with_cache(cache);
    }

    let status = ProgressReporter::with_color_choice(quiet, no_color);
    let report = workflow::find_duplicates(&args.directory, threshold, &fingerprinter, &status)?;

    if let Some(ref list) = args.list {
        workflow::write_unique_list(&report, list)?;
    }

    let mut copy_failures = 0;
    if let Some(ref dest) = args.copy_to {
        let stats = workflow::export_unique(&report, dest, &status)?;
        copy_failures = stats.failures.len();
        if !quiet {
            println!(
                "copied {}/{} unique files to {}",
                stats.copied.len(),
                report.groups.len(),
                dest.display()
            );
        }
    }

    match args.output {
        OutputFormat::Json => {
            println!("{}", JsonDedupReport::from_report(&report).to_json_pretty()?);
        }
        OutputFormat::Text => {
            if !quiet {
                report::render_dedup_text(&report);
            }
        }
    }

    Ok(if copy_failures > 0 {
        ExitCode::PartialSuccess
    } else if report.cluster_count() == 0 {
        ExitCode::NothingFound
    } else {
        ExitCode::Success
    })
}

/// Open the fingerprint cache, degrading to no cache on failure.
fn open_cache(no_cache: bool, path: Option<PathBuf>) -> Option<FingerprintCache> {
    if no_cache {
        return None;
    }
    let result = match path {
        Some(ref path) => FingerprintCache::open(path),
        None => FingerprintCache::open_default(),
    };
    match result {
        Ok(cache) => Some(cache),
        Err(e) => {
            log::warn!("fingerprint cache unavailable, continuing without: {e:#}");
            None
        }
    }
}

/// Ask a yes/no question on the terminal; anything but `y` declines.
fn confirm(prompt: &str) -> Result<bool> {
    print!("{prompt} [y/N]: ");
    std::io::stdout().flush()?;

    let mut line = String::new();
    std::io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim().eq_ignore_ascii_case("y"))
}
