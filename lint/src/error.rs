//! Error taxonomy for analyzer invocations.

use std::io;
use std::process::ExitStatus;
use std::time::Duration;

/// Failure of one analyzer invocation or of decoding its output.
#[derive(Debug, thiserror::Error)]
pub enum LintError {
    #[error("failed to start {program}: {source}")]
    Spawn { program: String, source: io::Error },
    #[error("I/O error while running {program}: {source}")]
    Io { program: String, source: io::Error },
    #[error("{program} reported an error: {stderr}")]
    Stderr { program: String, stderr: String },
    #[error("{program} failed with {status}")]
    ExitStatus { program: String, status: ExitStatus },
    #[error("{program} timed out after {}s", elapsed.as_secs())]
    Timeout { program: String, elapsed: Duration },
    #[error("{program} produced more than {limit} bytes of output")]
    OutputLimit { program: String, limit: usize },
    #[error("invalid diagnostic JSON: {0}")]
    Parse(#[from] serde_json::Error),
}

impl LintError {
    /// Whether this failure would repeat for every workspace root, so a
    /// project scan should stop instead of moving on to the next root.
    #[must_use]
    pub fn aborts_scan(&self) -> bool {
        matches!(self, Self::Spawn { .. })
    }
}
