//! Structured error handling and exit codes.

use serde::Serialize;

/// Exit codes for the clipsync application.
///
/// - 0: Success (completed normally, matches/duplicates found)
/// - 1: General error (unexpected failure)
/// - 2: Nothing found (completed normally, no matches or duplicates)
/// - 3: Partial success (completed with some per-file failures)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ExitCode {
    /// Success: the workflow completed and produced results.
    Success = 0,
    /// General error: an unexpected error occurred.
    GeneralError = 1,
    /// Nothing found: the workflow completed without matches or duplicates.
    NothingFound = 2,
    /// Partial success: completed, but some files failed along the way.
    PartialSuccess = 3,
}

impl ExitCode {
    /// Get the numeric exit code.
    #[must_use]
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// Get the machine-readable code prefix.
    #[must_use]
    pub fn code_prefix(self) -> &'static str {
        match self {
            Self::Success => "CS000",
            Self::GeneralError => "CS001",
            Self::NothingFound => "CS002",
            Self::PartialSuccess => "CS003",
        }
    }
}

/// Structured error information for JSON output.
#[derive(Debug, Serialize)]
pub struct StructuredError {
    /// The error code (e.g., "CS001")
    pub code: String,
    /// The exit code number
    pub exit_code: i32,
    /// Human-readable error message
    pub message: String,
}

impl StructuredError {
    /// Create a new structured error from an anyhow error and an exit code.
    #[must_use]
    pub fn new(err: &anyhow::Error, exit_code: ExitCode) -> Self {
        Self {
            code: exit_code.code_prefix().to_string(),
            exit_code: exit_code.as_i32(),
            message: format!("{err:#}"),
        }
    }
}
