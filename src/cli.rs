//! Command-line interface definitions.
//!
//! All CLI arguments, subcommands, and options via the clap derive API:
//! global options (verbosity, color, error format) plus the `sync` and
//! `dedup` subcommands.
//!
//! # Example
//!
//! ```bash
//! # Match and rename clips using directories from the saved config
//! clipsync sync
//!
//! # Explicit directories, exact reference names, auto-confirm
//! clipsync sync --video-dir ~/clips --audio-dir ~/music --exact --yes
//!
//! # Find duplicate audio across a library, export the unique set
//! clipsync dedup ~/music --copy-to ~/music-unique
//! ```

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

/// Audio-fingerprint clip matcher and renamer.
///
/// clipsync matches each video clip's audio against a reference library
/// using Chromaprint fingerprints, renames accepted matches after their
/// reference track, and finds duplicate audio across a library.
#[derive(Debug, Parser)]
#[command(name = "clipsync")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase verbosity level (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    pub no_color: bool,

    /// Report fatal errors as JSON on stderr
    #[arg(long, global = true)]
    pub json_errors: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Match video clips against reference audio and rename them
    Sync(SyncArgs),
    /// Find duplicate audio files within a directory tree
    Dedup(DedupArgs),
}

/// Output format for results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable terminal output
    Text,
    /// Machine-readable JSON on stdout
    Json,
}

/// Arguments for the sync subcommand.
#[derive(Debug, Args)]
pub struct SyncArgs {
    /// Video source directory (overrides the saved config)
    #[arg(long, value_name = "DIR")]
    pub video_dir: Option<PathBuf>,

    /// Reference audio directory (overrides the saved config)
    #[arg(short = 'a', long, value_name = "DIR")]
    pub audio_dir: Option<PathBuf>,

    /// Acceptance threshold: best BER must be strictly below this
    #[arg(short, long, value_name = "BER", value_parser = parse_threshold)]
    pub threshold: Option<f64>,

    /// Move renamed clips into the _Ready subfolder
    #[arg(long = "move")]
    pub move_files: bool,

    /// Use exact reference names (no tags)
    #[arg(long)]
    pub exact: bool,

    /// Tags inserted into every generated name
    #[arg(long, value_name = "TAGS")]
    pub fixed_tags: Option<String>,

    /// Whitespace-separated pool of tags sampled per name
    #[arg(long, value_name = "TAGS")]
    pub pool_tags: Option<String>,

    /// Skip the confirmation prompt before renaming
    #[arg(short = 'y', long)]
    pub yes: bool,

    /// Output format (text for terminals, json for scripting)
    ///
    /// JSON mode prints the match report and only commits renames when
    /// --yes is also given.
    #[arg(short, long, value_enum, default_value = "text")]
    pub output: OutputFormat,

    /// Disable the fingerprint cache
    #[arg(long)]
    pub no_cache: bool,

    /// Path to the fingerprint cache database
    ///
    /// If not specified, a default platform-specific path is used.
    #[arg(long, value_name = "PATH", conflicts_with = "no_cache")]
    pub cache: Option<PathBuf>,

    /// Seed for the tag sampler (reproducible name generation)
    #[arg(long, value_name = "N", hide = true)]
    pub seed: Option<u64>,

    /// Persist the resolved directories and options as future defaults
    #[arg(long)]
    pub save_config: bool,
}

/// Arguments for the dedup subcommand.
#[derive(Debug, Args)]
pub struct DedupArgs {
    /// Directory to scan for duplicate audio (recursive)
    #[arg(value_name = "DIR")]
    pub directory: PathBuf,

    /// Duplicate threshold: pairwise BER must be strictly below this
    #[arg(short, long, value_name = "BER", value_parser = parse_threshold)]
    pub threshold: Option<f64>,

    /// Write the unique-file list to this path
    #[arg(short = 'l', long = "list", value_name = "FILE")]
    pub list: Option<PathBuf>,

    /// Copy one representative per group into this directory
    #[arg(short, long, value_name = "DIR")]
    pub copy_to: Option<PathBuf>,

    /// Output format (text for terminals, json for scripting)
    #[arg(short, long, value_enum, default_value = "text")]
    pub output: OutputFormat,

    /// Disable the fingerprint cache
    #[arg(long)]
    pub no_cache: bool,
}

/// Parse and validate a BER threshold in [0, 1].
fn parse_threshold(s: &str) -> Result<f64, String> {
    let value: f64 = s.parse().map_err(|_| format!("invalid number: {s}"))?;
    if !(0.0..=1.0).contains(&value) {
        return Err(format!("threshold must be between 0 and 1, got {value}"));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_sync() {
        let cli = Cli::try_parse_from([
            "clipsync",
            "sync",
            "--video-dir",
            "/videos",
            "--audio-dir",
            "/audio",
            "--exact",
            "--yes",
        ])
        .unwrap();

        match cli.command {
            Commands::Sync(args) => {
                assert_eq!(args.video_dir, Some(PathBuf::from("/videos")));
                assert_eq!(args.audio_dir, Some(PathBuf::from("/audio")));
                assert!(args.exact);
                assert!(args.yes);
                assert!(!args.move_files);
                assert_eq!(args.output, OutputFormat::Text);
            }
            Commands::Dedup(_) => panic!("expected sync"),
        }
    }

    #[test]
    fn test_cli_parses_dedup() {
        let cli =
            Cli::try_parse_from(["clipsync", "dedup", "/music", "--threshold", "0.1"]).unwrap();

        match cli.command {
            Commands::Dedup(args) => {
                assert_eq!(args.directory, PathBuf::from("/music"));
                assert_eq!(args.threshold, Some(0.1));
            }
            Commands::Sync(_) => panic!("expected dedup"),
        }
    }

    #[test]
    fn test_threshold_range_is_validated() {
        assert!(Cli::try_parse_from(["clipsync", "dedup", "/m", "-t", "1.5"]).is_err());
        assert!(Cli::try_parse_from(["clipsync", "dedup", "/m", "-t", "-0.1"]).is_err());
        assert!(Cli::try_parse_from(["clipsync", "dedup", "/m", "-t", "0.15"]).is_ok());
    }

    #[test]
    fn test_quiet_conflicts_with_verbose() {
        assert!(Cli::try_parse_from(["clipsync", "-q", "-v", "dedup", "/m"]).is_err());
    }

    #[test]
    fn test_verbosity_counts() {
        let cli = Cli::try_parse_from(["clipsync", "-vv", "dedup", "/m"]).unwrap();
        assert_eq!(cli.verbose, 2);
    }
}
