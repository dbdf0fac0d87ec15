//! Result and error types for Pilotar.

use thiserror::Error;

/// Result type for Pilotar operations
pub type PilotResult<T> = Result<T, PilotError>;

/// Errors that can occur in Pilotar
#[derive(Debug, Error)]
pub enum PilotError {
    /// Unknown platform identifier at session creation
    #[error("Unsupported platform: {name}")]
    UnsupportedPlatform {
        /// Platform identifier that was requested
        name: String,
    },

    /// Unknown browser identifier at session creation
    #[error("Unsupported browser: {name}")]
    UnsupportedBrowser {
        /// Browser identifier that was requested
        name: String,
    },

    /// Session creation or teardown failed
    #[error("Session error: {message}")]
    Session {
        /// Error message
        message: String,
    },

    /// Wait condition was not satisfied before the deadline
    #[error("Timed out after {ms}ms waiting for {condition}")]
    Timeout {
        /// Elapsed budget in milliseconds
        ms: u64,
        /// Description of the awaited condition
        condition: String,
    },

    /// Element could not be located
    #[error("No element matching {strategy} '{value}'")]
    ElementNotFound {
        /// Locator strategy name
        strategy: String,
        /// Locator value
        value: String,
    },

    /// The remote end rejected or garbled a protocol exchange
    #[error("Wire protocol error: {message}")]
    Wire {
        /// Error message
        message: String,
    },

    /// A gesture could not be composed or executed
    #[error("Gesture failed: {message}")]
    Gesture {
        /// Error message
        message: String,
    },

    /// Screen recording start/stop failed
    #[error("Screen recording failed: {message}")]
    Recording {
        /// Error message
        message: String,
    },

    /// Script evaluation in the page failed
    #[error("Script evaluation failed: {message}")]
    Script {
        /// Error message
        message: String,
    },

    /// Accumulated soft-assertion failures surfaced at verification
    #[error("Assertion failed: {message}")]
    Assertion {
        /// Aggregate failure message
        message: String,
    },

    /// HTTP transport error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// WebSocket transport error
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tungstenite::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<crate::assertion::SoftAssertionError> for PilotError {
    fn from(err: crate::assertion::SoftAssertionError) -> Self {
        Self::Assertion {
            message: err.to_string(),
        }
    }
}

impl PilotError {
    /// True for timeouts, which the lifecycle layer may retry
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }

    /// True for errors that are fatal at session creation and never retried
    #[must_use]
    pub const fn is_unsupported(&self) -> bool {
        matches!(
            self,
            Self::UnsupportedPlatform { .. } | Self::UnsupportedBrowser { .. }
        )
    }
}
