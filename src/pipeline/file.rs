//! # Pipeline Files
//!
//! The unit of work flowing through the pipeline:
//! - [`SourceFile`] — a path plus its [`FileContents`] (null, stream or buffer).
//! - [`OutputFile`] — an encoded result, named the way it will be written.
//!
//! Naming helpers derive the output path when the format is forced and the
//! `{stem}-{size}{ext}` path of each `multipleResize` derivative.

use std::{
    fmt,
    fs,
    io::Read,
    path::{Path, PathBuf},
};

/// Contents attached to a [`SourceFile`].
pub enum FileContents {
    /// Directory entries and files that carry no data; skipped silently.
    Null,
    /// Streaming input; rejected with `StreamingNotSupported`.
    Stream(Box<dyn Read + Send>),
    /// Fully buffered bytes.
    Buffer(Vec<u8>),
}

impl fmt::Debug for FileContents {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("Null"),
            Self::Stream(_) => f.write_str("Stream(..)"),
            Self::Buffer(b) => write!(f, "Buffer({} bytes)", b.len()),
        }
    }
}

/// A file entering the pipeline.
#[derive(Debug)]
pub struct SourceFile {
    pub path: PathBuf,
    pub contents: FileContents,
}

impl SourceFile {
    /// Buffered file.
    pub fn new(path: impl Into<PathBuf>, bytes: Vec<u8>) -> Self {
        Self {
            path: path.into(),
            contents: FileContents::Buffer(bytes),
        }
    }

    pub fn null(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            contents: FileContents::Null,
        }
    }

    pub fn stream(path: impl Into<PathBuf>, reader: impl Read + Send + 'static) -> Self {
        Self {
            path: path.into(),
            contents: FileContents::Stream(Box::new(reader)),
        }
    }

    /// Reads `path` into a buffered file. Directories become null files.
    pub fn read(path: impl Into<PathBuf>) -> std::io::Result<Self> {
        let path = path.into();
        if path.is_dir() {
            return Ok(Self::null(path));
        }
        let bytes = fs::read(&path)?;
        Ok(Self::new(path, bytes))
    }

    /// Lower-cased extension without the leading dot.
    pub fn extension(&self) -> Option<String> {
        extension_of(&self.path)
    }
}

/// An encoded result.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutputFile {
    pub path: PathBuf,
    pub contents: Vec<u8>,
}

impl OutputFile {
    pub fn new(path: impl Into<PathBuf>, contents: Vec<u8>) -> Self {
        Self {
            path: path.into(),
            contents,
        }
    }
}

pub fn extension_of(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
}

/// Path of a `multipleResize` derivative: `photo.jpg` at 200 → `photo-200.jpg`,
/// in the same directory.
pub fn derivative_path(path: &Path, size: u32) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = match path.extension() {
        Some(ext) => format!("{stem}-{size}.{}", ext.to_string_lossy()),
        None => format!("{stem}-{size}"),
    };
    path.with_file_name(name)
}
