//! Error types for the splitter

use std::path::PathBuf;

/// Result type for splitting operations.
///
/// Convenience alias using [`SplitError`] as the error type.
pub type Result<T> = std::result::Result<T, SplitError>;

/// Errors raised while constructing or running a [`ChunkingEngine`](crate::ChunkingEngine).
///
/// Configuration and existence problems are reported at construction time,
/// before any file is opened. Everything that goes wrong during the pass
/// itself is wrapped in [`SplitError::SplitFailure`] together with the input
/// path, so callers only have one mid-pass variant to handle.
///
/// # Error Categories
///
/// - **Configuration Errors**: non-positive sizes, bad patterns, unknown encodings
/// - **Source Errors**: the input file does not exist
/// - **Runtime Errors**: I/O or decoding failures during the pass
#[derive(Debug, thiserror::Error)]
pub enum SplitError {
    /// Configuration rejected before any I/O happened
    #[error("Invalid configuration: {message}")]
    InvalidConfiguration { message: String },

    /// Input file missing at construction time
    #[error("Input file not found: {}", path.display())]
    SourceNotFound { path: PathBuf },

    /// The split pass aborted; chunks written before the failure stay on disk
    #[error("Failed to split {}: {source}", path.display())]
    SplitFailure {
        path: PathBuf,
        #[source]
        source: FailureCause,
    },
}

/// Underlying cause of a [`SplitError::SplitFailure`].
#[derive(Debug, thiserror::Error)]
pub enum FailureCause {
    /// Reading the input or writing a chunk failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A line could not be decoded with the primary or fallback encoding
    #[error("line {line_number} is not valid {encoding}")]
    DecodingFailure {
        encoding: &'static str,
        line_number: usize,
    },
}

impl SplitError {
    /// Create an invalid configuration error with a custom message.
    pub fn invalid_config<S: Into<String>>(message: S) -> Self {
        Self::InvalidConfiguration {
            message: message.into(),
        }
    }

    /// Wrap a mid-pass failure for the given input.
    pub fn split_failure<P, E>(path: P, cause: E) -> Self
    where
        P: Into<PathBuf>,
        E: Into<FailureCause>,
    {
        Self::SplitFailure {
            path: path.into(),
            source: cause.into(),
        }
    }

    /// Whether this error was raised before the input was ever read.
    pub fn is_construction_error(&self) -> bool {
        matches!(
            self,
            SplitError::InvalidConfiguration { .. } | SplitError::SourceNotFound { .. }
        )
    }
}
