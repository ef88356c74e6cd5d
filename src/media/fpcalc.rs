//! Chromaprint fingerprint extraction via the `fpcalc` tool.
//!
//! # Overview
//!
//! `fpcalc -raw <file>` prints key=value lines; the `FINGERPRINT=` line
//! carries the raw fingerprint as comma-separated unsigned 32-bit codes.
//! [`FpcalcSource`] runs the tool with a hard time budget and parses that
//! line into a [`Fingerprint`].
//!
//! The [`FingerprintSource`] trait is the seam the workflows depend on:
//! production wires in `FpcalcSource`, tests wire in synthetic fingerprints
//! and never spawn a process.

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

use crate::fingerprint::Fingerprint;

use super::ExtractError;

/// Default time budget for one fpcalc invocation.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Poll interval while waiting for fpcalc to finish.
const POLL_INTERVAL: Duration = Duration::from_millis(25);

/// Capability to turn a readable audio file into a fingerprint.
///
/// Implementations must treat every failure as per-file and recoverable;
/// they never abort a batch.
pub trait FingerprintSource {
    /// Extract the fingerprint for the audio file at `path`.
    fn fingerprint(&self, path: &Path) -> Result<Fingerprint, ExtractError>;
}

/// Production [`FingerprintSource`] shelling out to `fpcalc -raw`.
#[derive(Debug, Clone)]
pub struct FpcalcSource {
    binary: PathBuf,
    timeout: Duration,
}

impl FpcalcSource {
    /// Create a source using the given fpcalc binary and time budget.
    #[must_use]
    pub fn new(binary: PathBuf, timeout: Duration) -> Self {
        Self { binary, timeout }
    }

    /// Locate fpcalc on this system (PATH, then the Homebrew prefix).
    #[must_use]
    pub fn locate() -> Option<PathBuf> {
        super::locate_tool("fpcalc")
    }
}

impl FingerprintSource for FpcalcSource {
    fn fingerprint(&self, path: &Path) -> Result<Fingerprint, ExtractError> {
        let mut child = Command::new(&self.binary)
            .arg("-raw")
            .arg(path)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .stdin(Stdio::null())
            .spawn()
            .map_err(|source| ExtractError::Spawn {
                tool: "fpcalc",
                source,
            })?;

        // std::process has no built-in wait deadline; poll try_wait and
        // kill on expiry so one stuck file cannot hang the whole batch.
        let deadline = Instant::now() + self.timeout;
        loop {
            match child.try_wait() {
                Ok(Some(_)) => break,
                Ok(None) => {
                    if Instant::now() >= deadline {
                        let _ = child.kill();
                        let _ = child.wait();
                        return Err(ExtractError::Timeout {
                            tool: "fpcalc",
                            path: path.to_path_buf(),
                            seconds: self.timeout.as_secs(),
                        });
                    }
                    std::thread::sleep(POLL_INTERVAL);
                }
                Err(source) => {
                    return Err(ExtractError::Io {
                        path: path.to_path_buf(),
                        source,
                    })
                }
            }
        }

        let output = child
            .wait_with_output()
            .map_err(|source| ExtractError::Io {
                path: path.to_path_buf(),
                source,
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ExtractError::ToolFailed {
                tool: "fpcalc",
                path: path.to_path_buf(),
                message: stderr.trim().lines().last().unwrap_or("").to_string(),
            });
        }

        parse_raw_output(&String::from_utf8_lossy(&output.stdout), path)
    }
}

/// Parse `fpcalc -raw` stdout into a fingerprint.
///
/// Only the `FINGERPRINT=` line matters; `DURATION=` and anything else is
/// ignored. An empty payload is reported as [`ExtractError::EmptyFingerprint`]
/// so callers can distinguish "tool ran, no audio content" from parse
/// failures.
fn parse_raw_output(stdout: &str, path: &Path) -> Result<Fingerprint, ExtractError> {
    for line in stdout.lines() {
        let Some(raw) = line.strip_prefix("FINGERPRINT=") else {
            continue;
        };
        if raw.trim().is_empty() {
            return Err(ExtractError::EmptyFingerprint(path.to_path_buf()));
        }

        let codes = raw
            .trim()
            .split(',')
            .map(|token| {
                token
                    .trim()
                    .parse::<u32>()
                    .map_err(|e| ExtractError::BadOutput {
                        path: path.to_path_buf(),
                        message: format!("bad code {token:?}: {e}"),
                    })
            })
            .collect::<Result<Vec<u32>, _>>()?;

        return Ok(Fingerprint::new(codes));
    }

    Err(ExtractError::EmptyFingerprint(path.to_path_buf()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(stdout: &str) -> Result<Fingerprint, ExtractError> {
        parse_raw_output(stdout, Path::new("/tmp/x.wav"))
    }

    #[test]
    fn test_parse_fingerprint_line() {
        let fp = parse("DURATION=12\nFINGERPRINT=1,2,3,4294967295\n").unwrap();
        assert_eq!(fp.codes(), &[1, 2, 3, u32::MAX]);
    }

    #[test]
    fn test_parse_ignores_other_lines() {
        let fp = parse("SOMETHING=else\nFINGERPRINT=7\nTRAILER=1\n").unwrap();
        assert_eq!(fp.codes(), &[7]);
    }

    #[test]
    fn test_parse_empty_payload() {
        let err = parse("DURATION=3\nFINGERPRINT=\n").unwrap_err();
        assert!(matches!(err, ExtractError::EmptyFingerprint(_)));
    }

    #[test]
    fn test_parse_missing_line() {
        let err = parse("DURATION=3\n").unwrap_err();
        assert!(matches!(err, ExtractError::EmptyFingerprint(_)));
    }

    #[test]
    fn test_parse_non_numeric_code() {
        let err = parse("FINGERPRINT=1,abc,3\n").unwrap_err();
        assert!(matches!(err, ExtractError::BadOutput { .. }));
    }

    #[test]
    fn test_parse_negative_code_rejected() {
        let err = parse("FINGERPRINT=1,-2\n").unwrap_err();
        assert!(matches!(err, ExtractError::BadOutput { .. }));
    }

    #[test]
    fn test_parse_tolerates_surrounding_whitespace() {
        let fp = parse("FINGERPRINT= 10 , 20 ,30\n").unwrap();
        assert_eq!(fp.codes(), &[10, 20, 30]);
    }
}
