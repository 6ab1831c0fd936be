//! # Pipeline Runner
//!
//! Drives a sequence of files through a [`FileProcessor`] on the blocking
//! thread pool, at most `maxConcurrency` at a time. Outputs are returned in
//! input order regardless of completion order.
//!
//! # Example
//! ```rust,no_run
//! use image_process::{config::options::ProcessOptions, pipeline::runner::Pipeline};
//!
//! # async fn run() -> image_process::error::Result<()> {
//! let settings = ProcessOptions::from_json(r#"{ "width": 1280, "output": "webp" }"#)?;
//! let outputs = Pipeline::with_image_rs(settings)
//!     .run_paths(["photos/a.jpg", "photos/b.png"])
//!     .await?;
//! for out in outputs {
//!     println!("{} ({} bytes)", out.path.display(), out.contents.len());
//! }
//! # Ok(())
//! # }
//! ```

use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use futures::{StreamExt, stream};
use tracing::{info, warn};

use crate::{
    config::options::PipelineSettings,
    error::Result,
    image::processor::ImageProcessor,
    pipeline::{
        dest::Destination,
        file::{OutputFile, SourceFile},
        processor::FileProcessor,
    },
};

/// Concurrent, order-preserving driver over a [`FileProcessor`].
#[derive(Clone)]
pub struct Pipeline {
    processor: FileProcessor,
}

impl Pipeline {
    pub fn new(image: Arc<dyn ImageProcessor>, settings: PipelineSettings) -> Self {
        Self {
            processor: FileProcessor::new(image, settings),
        }
    }

    pub fn with_image_rs(settings: PipelineSettings) -> Self {
        Self {
            processor: FileProcessor::with_image_rs(settings),
        }
    }

    pub fn processor(&self) -> &FileProcessor {
        &self.processor
    }

    /// Processes in-memory files.
    ///
    /// # Errors
    /// Returns the first failing file's error unless `skipFailed` is set, in
    /// which case failures are logged and the file produces no output.
    pub async fn run(&self, files: Vec<SourceFile>) -> Result<Vec<OutputFile>> {
        let jobs = files.into_iter().map(|file| {
            let processor = self.processor.clone();
            move || {
                let path = file.path.clone();
                (path, processor.process(file))
            }
        });
        self.drive(jobs).await
    }

    /// Reads each path on the worker pool, then processes it like [`Self::run`].
    pub async fn run_paths<I, P>(&self, paths: I) -> Result<Vec<OutputFile>>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let jobs = paths.into_iter().map(|path| {
            let path = path.as_ref().to_path_buf();
            let processor = self.processor.clone();
            move || {
                let result = SourceFile::read(&path)
                    .map_err(Into::into)
                    .and_then(|file| processor.process(file));
                (path, result)
            }
        });
        self.drive(jobs).await
    }

    /// Processes `files` and writes every output through `dest` on the
    /// blocking pool.
    ///
    /// Returns the written locations in output order.
    pub async fn run_into(
        &self,
        files: Vec<SourceFile>,
        dest: Arc<dyn Destination>,
    ) -> Result<Vec<PathBuf>> {
        let outputs = self.run(files).await?;
        let written = tokio::task::spawn_blocking(move || {
            outputs
                .iter()
                .map(|output| dest.write(output))
                .collect::<Result<Vec<_>>>()
        })
        .await??;
        info!(count = written.len(), "outputs written");
        Ok(written)
    }

    async fn drive<I, F>(&self, jobs: I) -> Result<Vec<OutputFile>>
    where
        I: IntoIterator<Item = F>,
        F: FnOnce() -> (PathBuf, Result<Vec<OutputFile>>) + Send + 'static,
    {
        let settings = self.processor.settings();
        let mut results = stream::iter(jobs)
            .map(tokio::task::spawn_blocking)
            .buffered(settings.max_concurrency.max(1));

        let mut outputs = Vec::new();
        while let Some(joined) = results.next().await {
            let (path, result) = joined?;
            match result {
                Ok(files) => outputs.extend(files),
                Err(err) if settings.skip_failed => {
                    warn!(path = %path.display(), error = %err, "skipping failed file");
                }
                Err(err) => return Err(err),
            }
        }
        Ok(outputs)
    }
}
