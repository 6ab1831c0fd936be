//! # Processing Errors
//!
//! [`ProcessError`] is the single error type surfaced by the public API.
//! Every variant is fatal for the file being processed: there is no retry and
//! no partially watermarked output.

use std::path::PathBuf;

use thiserror::Error;

use super::entity::NotFoundError;

/// Crate-wide result alias.
pub type Result<T, E = ProcessError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum ProcessError {
    /// A required option is missing or inconsistent.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The watermark position is not one of the nine anchors.
    #[error("unknown watermark position: {0:?}")]
    UnknownPosition(String),

    #[error(transparent)]
    NotFound(#[from] NotFoundError),

    /// Stream-backed sources cannot be buffered by this library.
    #[error("streaming not supported: {}", .path.display())]
    StreamingNotSupported { path: PathBuf },

    #[error("invalid options: {0}")]
    InvalidOptions(#[from] serde_json::Error),

    /// Decode, resize, composite or encode failure reported by the raster backend.
    #[error(transparent)]
    Raster(#[from] anyhow::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("worker task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl ProcessError {
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    /// Returns `true` for errors caused by user-supplied options rather than
    /// by the files being processed.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::Configuration(_) | Self::UnknownPosition(_) | Self::InvalidOptions(_)
        )
    }
}
