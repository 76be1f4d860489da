use thiserror::Error;

/// Failure taxonomy for a capture run.
///
/// Only `Connection` and `TabNotFound` abort a run. Every other failure
/// is isolated to the step that produced it: the affected artifact is
/// degraded or skipped and the run continues.
#[derive(Debug, Error)]
pub enum ScopeError {
    #[error("Failed to connect to debugging endpoint {endpoint}: {reason}")]
    Connection { endpoint: String, reason: String },

    #[error("Tab not found: {0}")]
    TabNotFound(String),

    #[error("{step} failed: {reason}")]
    Capture { step: &'static str, reason: String },

    #[error("IO error: {0}")]
    Io(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl ScopeError {
    pub fn capture(step: &'static str, reason: impl std::fmt::Display) -> Self {
        ScopeError::Capture {
            step,
            reason: reason.to_string(),
        }
    }

    /// Fatal errors halt the run; everything else degrades one artifact.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            ScopeError::Connection { .. } | ScopeError::TabNotFound(_)
        )
    }

    /// Remediation guidance shown alongside the error message.
    pub fn remediation(&self) -> &'static str {
        match self {
            ScopeError::Connection { .. } => {
                "Start the browser with --remote-debugging-port and check the host/port (or CDP_PORT)"
            }
            ScopeError::TabNotFound(_) => {
                "Check the tab index against the startup listing, or retry with --url <keyword>"
            }
            ScopeError::Capture { .. } => "The remaining artifacts are unaffected; re-run to retry",
            ScopeError::Io(_) => "Check that the output directory exists and is writable",
            ScopeError::Serialization(_) => "Re-run; report this if it persists",
        }
    }
}

impl From<std::io::Error> for ScopeError {
    fn from(err: std::io::Error) -> Self {
        ScopeError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for ScopeError {
    fn from(err: serde_json::Error) -> Self {
        ScopeError::Serialization(err.to_string())
    }
}
