//! # Output Destinations
//!
//! Where processed [`OutputFile`]s end up.
//!
//! - [`Destination`] — trait for output sinks (local directory, object store,
//!   in-memory collector for tests).
//! - [`LocalDestination`] — writes under a root directory, creating parent
//!   directories and refusing `..` traversal.
//!
//! # Example
//! ```rust,no_run
//! use image_process::pipeline::dest::{Destination, LocalDestination};
//! use image_process::pipeline::file::OutputFile;
//!
//! let dest = LocalDestination::new("/tmp/out").with_base("photos");
//! let written = dest.write(&OutputFile::new("photos/2024/a.webp", vec![0])).unwrap();
//! assert_eq!(written, std::path::Path::new("/tmp/out/2024/a.webp"));
//! ```

use std::{
    fs,
    path::{Component, Path, PathBuf},
};

use crate::{error::Result, pipeline::file::OutputFile};

/// A sink for processed files.
pub trait Destination: Send + Sync {
    /// Writes `file` and returns the location it was written to.
    ///
    /// # Errors
    /// Returns [`ProcessError::Io`](crate::error::ProcessError::Io) if writing fails.
    fn write(&self, file: &OutputFile) -> Result<PathBuf>;
}

/// Writes outputs to the local filesystem.
///
/// Without a base, every output lands directly under the root by file name.
/// With a base, the output's path relative to that base is kept.
#[derive(Clone, Debug)]
pub struct LocalDestination {
    root: PathBuf,
    base: Option<PathBuf>,
}

impl LocalDestination {
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self {
            root: root.into(),
            base: None,
        }
    }

    /// Keeps the directory structure of outputs below `base`.
    pub fn with_base<P: Into<PathBuf>>(mut self, base: P) -> Self {
        self.base = Some(base.into());
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolves the target path for `path` under the root.
    ///
    /// Root, prefix and `..` components are dropped so the result never
    /// escapes the root.
    pub fn target(&self, path: &Path) -> PathBuf {
        let rel = match self.base.as_deref().and_then(|b| path.strip_prefix(b).ok()) {
            Some(rel) => rel.to_path_buf(),
            None => path.file_name().map(PathBuf::from).unwrap_or_default(),
        };
        let safe: PathBuf = rel
            .components()
            .filter_map(|c| match c {
                Component::Normal(part) => Some(part),
                _ => None,
            })
            .collect();
        self.root.join(safe)
    }
}

impl Destination for LocalDestination {
    fn write(&self, file: &OutputFile) -> Result<PathBuf> {
        let full = self.target(&file.path);
        if let Some(dir) = full.parent() {
            fs::create_dir_all(dir)?;
        }
        fs::write(&full, &file.contents)?;
        Ok(full)
    }
}
