//! Shared error types for the engine.
//!
//! Configuration errors are fatal for the requested operation. Per-test
//! failures never surface here: they are captured into the test's transcript
//! by the runner.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for testup operations
#[derive(Debug, Error)]
pub enum Error {
    /// Missing or invalid configuration (root directory, reference list, command)
    #[error("Configuration error: {message}")]
    Config {
        message: String,
        path: Option<PathBuf>,
    },

    /// File system errors with path context
    #[error("File system error: {message} ({})", path.display())]
    FileSystem {
        message: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A test source could not be turned into a runnable unit
    #[error("Failed to load {}: {message}", path.display())]
    Load { path: PathBuf, message: String },

    /// Cross-process handoff errors (manifest, sentinel)
    #[error("Handoff error: {0}")]
    Handoff(String),

    /// The handoff wait exceeded its deadline
    #[error("Timed out after {secs}s waiting for {}", sentinel.display())]
    Timeout { secs: u64, sentinel: PathBuf },

    /// The handoff wait was cancelled by the caller
    #[error("Wait for {} was cancelled", sentinel.display())]
    Cancelled { sentinel: PathBuf },

    /// IO errors
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// TOML errors
    #[error(transparent)]
    Toml(#[from] toml::de::Error),

    /// JSON errors
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// Pattern errors
    #[error(transparent)]
    Pattern(#[from] glob::PatternError),
}

impl Error {
    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            path: None,
        }
    }

    /// Create a configuration error with path context
    pub fn config_with_path(message: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self::Config {
            message: message.into(),
            path: Some(path.into()),
        }
    }

    /// Wrap an io error with the path it happened on
    pub fn file_system(
        message: impl Into<String>,
        path: impl Into<PathBuf>,
        source: std::io::Error,
    ) -> Self {
        Self::FileSystem {
            message: message.into(),
            path: path.into(),
            source,
        }
    }

    /// Create a load error for a test source
    pub fn load(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Load {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Whether the error aborts the requested operation as a whole
    pub fn is_config(&self) -> bool {
        matches!(self, Self::Config { .. })
    }
}

/// Result type alias using our error type
pub type Result<T> = std::result::Result<T, Error>;

/// Extension trait for attaching a path to io results
pub trait IoResultExt<T> {
    /// Convert an io error into `Error::FileSystem` with context
    fn with_path(self, message: &str, path: &std::path::Path) -> Result<T>;
}

impl<T> IoResultExt<T> for std::result::Result<T, std::io::Error> {
    fn with_path(self, message: &str, path: &std::path::Path) -> Result<T> {
        self.map_err(|e| Error::file_system(message, path, e))
    }
}
