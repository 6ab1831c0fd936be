use std::path::{Path, PathBuf};

use thiserror::Error;

/// A file the pipeline depends on does not exist.
///
/// Raised by the file processor before any decoding happens, e.g. when the
/// configured watermark image is missing on disk.
///
/// # Example
/// ```
/// use image_process::error::entity::NotFoundError;
///
/// let err = NotFoundError::new("Watermark file", "assets/logo.png");
/// assert_eq!(err.to_string(), "Watermark file not found: assets/logo.png");
/// ```
#[derive(Debug, Error)]
#[error("{entity} not found: {}", .path.display())]
pub struct NotFoundError {
    /// Human-readable name of what was looked up (e.g. `"Watermark file"`).
    pub entity: &'static str,
    /// Path that was checked.
    pub path: PathBuf,
}

impl NotFoundError {
    /// Create a new `NotFoundError` for the given entity and path.
    pub fn new(entity: &'static str, path: impl Into<PathBuf>) -> Self {
        Self {
            entity,
            path: path.into(),
        }
    }

    /// Returns an error unless `path` exists.
    ///
    /// # Example
    /// ```
    /// use image_process::error::entity::NotFoundError;
    ///
    /// assert!(NotFoundError::ensure_exists("Watermark file", "/definitely/not/here.png").is_err());
    /// ```
    pub fn ensure_exists(entity: &'static str, path: impl AsRef<Path>) -> Result<(), Self> {
        let path = path.as_ref();
        if path.exists() {
            Ok(())
        } else {
            Err(Self::new(entity, path))
        }
    }
}
