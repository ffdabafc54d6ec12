/// Error types for cubitization
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Result type alias for cubitizer operations
pub type Result<T> = std::result::Result<T, CubitizeError>;

/// Fatal failures while binning or writing one point cloud.
///
/// Points that fall outside every candidate bin are not errors; they are
/// counted in [`crate::assigner::AssignmentStats`].
#[derive(Error, Debug)]
pub enum CubitizeError {
    /// Invalid grid parameters or an unusable point cloud
    #[error("configuration error: {0}")]
    Config(String),

    /// Missing or unreadable input, or unwritable output
    #[error("io error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Malformed row in a text source
    #[error("parse error in {} line {line}: {message}", .path.display())]
    Parse {
        path: PathBuf,
        line: usize,
        message: String,
    },

    /// Two sources that must pair line by line have different lengths
    #[error("{what}: {left} vs {right} entries")]
    ArityMismatch {
        what: &'static str,
        left: usize,
        right: usize,
    },

    /// Run summary could not be serialized
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl CubitizeError {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Wrap an io error with the path it happened on
    pub fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    /// Create a parse error for a 1-based line number
    pub fn parse(path: impl AsRef<Path>, line: usize, message: impl Into<String>) -> Self {
        Self::Parse {
            path: path.as_ref().to_path_buf(),
            line,
            message: message.into(),
        }
    }
}
