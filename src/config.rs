//! Application configuration management.
//!
//! Persisted defaults for the sync workflow: workspace directories, tag
//! strings, rename behavior, and the matching threshold. Stored as JSON at
//! the platform config path; a missing or corrupt file silently falls back
//! to defaults (logged at debug), and CLI flags override individual fields
//! at the call sites.

use std::fs;
use std::path::PathBuf;

use anyhow::Result;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::fingerprint::DEFAULT_BER_THRESHOLD;
use crate::media::fpcalc::DEFAULT_TIMEOUT_SECS;

/// Application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directory holding the video clips to rename.
    pub video_dir: Option<PathBuf>,
    /// Directory holding the reference audio library.
    pub audio_dir: Option<PathBuf>,
    /// Tags inserted into every generated name in tagged mode.
    pub fixed_tags: String,
    /// Whitespace-separated pool sampled per generated name.
    pub pool_tags: String,
    /// Move renamed clips into the `_Ready` subfolder.
    pub move_files: bool,
    /// Use exact reference names instead of tagged names.
    pub preserve_exact_names: bool,
    /// Acceptance threshold: best BER must be strictly below this.
    pub ber_threshold: f64,
    /// Time budget in seconds for one fpcalc invocation.
    pub fpcalc_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            video_dir: None,
            audio_dir: None,
            fixed_tags: "#shorts".to_string(),
            pool_tags: "#fyp #viral #trending".to_string(),
            move_files: false,
            preserve_exact_names: false,
            ber_threshold: DEFAULT_BER_THRESHOLD,
            fpcalc_timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl Config {
    /// Load the configuration from the default platform-specific path.
    pub fn load() -> Self {
        match Self::load_internal() {
            Ok(config) => config,
            Err(e) => {
                log::debug!("failed to load config, using defaults: {e}");
                Self::default()
            }
        }
    }

    fn load_internal() -> Result<Self> {
        let path = Self::config_path()?;
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)?;
        let config = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Save the configuration to the default platform-specific path.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Get the default platform-specific configuration path.
    fn config_path() -> Result<PathBuf> {
        let project_dirs = ProjectDirs::from("com", "clipsync", "clipsync")
            .ok_or_else(|| anyhow::anyhow!("failed to determine project directories"))?;
        Ok(project_dirs.config_dir().join("config.json"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.fixed_tags, "#shorts");
        assert_eq!(config.ber_threshold, DEFAULT_BER_THRESHOLD);
        assert_eq!(config.fpcalc_timeout_secs, DEFAULT_TIMEOUT_SECS);
        assert!(!config.move_files);
        assert!(!config.preserve_exact_names);
        assert!(config.video_dir.is_none());
    }

    #[test]
    fn test_round_trip() {
        let mut config = Config::default();
        config.video_dir = Some(PathBuf::from("/videos"));
        config.ber_threshold = 0.1;

        let json = serde_json::to_string(&config).unwrap();
        let back: Config = serde_json::from_str(&json).unwrap();
        assert_eq!(back.video_dir, Some(PathBuf::from("/videos")));
        assert_eq!(back.ber_threshold, 0.1);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let back: Config = serde_json::from_str(r##"{"fixed_tags": "#dance"}"##).unwrap();
        assert_eq!(back.fixed_tags, "#dance");
        assert_eq!(back.pool_tags, "#fyp #viral #trending");
        assert_eq!(back.ber_threshold, DEFAULT_BER_THRESHOLD);
    }
}
