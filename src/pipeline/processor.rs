//! # File Processor
//!
//! Applies the configured transformations to one [`SourceFile`]: watermark,
//! base resize, optional JPEG flattening, encoding, metadata retention,
//! renaming and `multipleResize` derivatives.
//!
//! Every step for a file runs on the image produced by the previous step.
//! Any failure aborts the file; nothing partially processed is emitted.
//!
//! Metadata is stripped from every output by default. With `keepMetadata`
//! the source EXIF block is copied into JPEG output only; WebP, PNG, GIF and
//! BMP outputs, and all `multipleResize` derivatives, stay stripped.

use std::{path::Path, sync::Arc};

use tracing::warn;

use crate::{
    config::options::{OutputFormat, PipelineSettings},
    error::{NotFoundError, ProcessError, Result},
    image::{
        image_rs_processor::ImageRsProcessor,
        metadata::{insert_jpeg_exif, read_exif},
        processor::{
            CropAnchor, EncodeFormat, EncodeOpts, Fit, ImageProcessor, RasterImage, ResizeOpts,
        },
        watermark::apply_watermark,
    },
    pipeline::file::{FileContents, OutputFile, SourceFile, derivative_path, extension_of},
    verbose,
};

/// Background used when flattening transparent images into JPEG.
pub const FLATTEN_BACKGROUND: [u8; 3] = [255, 255, 255];

/// Processes single files against shared, read-only settings.
///
/// Cheap to clone; clones share the raster backend and the settings.
#[derive(Clone)]
pub struct FileProcessor {
    image: Arc<dyn ImageProcessor>,
    settings: Arc<PipelineSettings>,
}

impl FileProcessor {
    pub fn new(image: Arc<dyn ImageProcessor>, settings: PipelineSettings) -> Self {
        Self {
            image,
            settings: Arc::new(settings),
        }
    }

    /// Processor backed by [`ImageRsProcessor`].
    pub fn with_image_rs(settings: PipelineSettings) -> Self {
        Self::new(Arc::new(ImageRsProcessor::default()), settings)
    }

    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    /// Processes one file.
    ///
    /// Returns the derivatives (in `multipleResize` order) followed by the
    /// main output. Null files and unsupported extensions yield no output.
    ///
    /// # Errors
    /// - [`ProcessError::StreamingNotSupported`] for stream-backed contents.
    /// - [`ProcessError::NotFound`] when the watermark file does not exist.
    /// - [`ProcessError::Configuration`] / [`ProcessError::UnknownPosition`]
    ///   for invalid watermark settings.
    /// - [`ProcessError::Raster`] for decode, transform or encode failures.
    pub fn process(&self, file: SourceFile) -> Result<Vec<OutputFile>> {
        let logger = self.settings.logger;
        let SourceFile { path, contents } = file;

        let source = match contents {
            FileContents::Null => {
                verbose!(logger, path = %path.display(), "null file, skipping");
                return Ok(Vec::new());
            }
            FileContents::Stream(_) => return Err(ProcessError::StreamingNotSupported { path }),
            FileContents::Buffer(bytes) => bytes,
        };

        let ext = extension_of(&path);
        if !ext.as_deref().is_some_and(|e| self.image.is_supported(e)) {
            verbose!(logger, path = %path.display(), "unsupported extension, skipping");
            return Ok(Vec::new());
        }

        let mut image = self.image.decode(&source)?;

        if let Some(watermark) = &self.settings.watermark {
            NotFoundError::ensure_exists("Watermark file", &watermark.file_path)?;
            verbose!(logger, path = %path.display(), "applying watermark");
            image = apply_watermark(self.image.as_ref(), image, watermark, logger)?;
        }

        if let Some(opts) = self.base_resize() {
            image = self.image.resize(&image, opts)?;
            let dim = image.metadata();
            verbose!(logger, width = dim.width, height = dim.height, "resized");
        }

        let format = self.output_format(&image, ext.as_deref());
        if self.settings.output == Some(OutputFormat::Jpeg) {
            image = self.image.flatten(image, FLATTEN_BACKGROUND)?;
        }

        let opts = self.encode_opts(format);
        let mut contents = self.image.encode(&image, opts)?;
        if self.settings.keep_metadata {
            contents = self.retain_metadata(&source, contents, format);
        }

        let path = match self.settings.output {
            Some(output) => path.with_extension(output.extension()),
            None => path,
        };

        let mut outputs = Vec::with_capacity(self.settings.multiple_resize.len() + 1);
        for &size in &self.settings.multiple_resize {
            outputs.push(self.derivative(&path, &contents, size, opts)?);
        }
        verbose!(logger, path = %path.display(), bytes = contents.len(), "processed");
        outputs.push(OutputFile::new(path, contents));
        Ok(outputs)
    }

    /// The single base resize derived from `width`, `height` and `ignoreRatio`.
    ///
    /// With `ignoreRatio` and both sides given, the image is scaled to cover
    /// the box and the overflow is cropped around the center; with one side
    /// it is scaled proportionally. Otherwise it is fitted inside the box and
    /// never enlarged.
    pub fn base_resize(&self) -> Option<ResizeOpts> {
        let s = &self.settings;
        let opts = if s.ignore_ratio {
            ResizeOpts::new(s.width, s.height, Fit::Cover).anchored(CropAnchor::Center)
        } else {
            ResizeOpts::new(s.width, s.height, Fit::Inside)
                .without_enlargement()
        };
        (!opts.is_noop()).then_some(opts)
    }

    fn output_format(&self, image: &RasterImage, ext: Option<&str>) -> EncodeFormat {
        self.settings
            .output
            .map(|o| o.encode_format())
            .or_else(|| image.format().and_then(EncodeFormat::from_image_format))
            .or_else(|| ext.and_then(EncodeFormat::from_extension))
            .unwrap_or(EncodeFormat::Png)
    }

    fn encode_opts(&self, format: EncodeFormat) -> EncodeOpts {
        if self.settings.progressive && format == EncodeFormat::Jpeg {
            verbose!(self.settings.logger, "progressive requested, writing baseline JPEG");
        }
        EncodeOpts::new(format)
            .with_quality(self.settings.quality)
            .with_progressive(self.settings.progressive)
            .with_png_compression(self.settings.png_compression())
    }

    fn retain_metadata(&self, source: &[u8], encoded: Vec<u8>, format: EncodeFormat) -> Vec<u8> {
        if format != EncodeFormat::Jpeg {
            verbose!(self.settings.logger, ?format, "metadata is only kept for JPEG output");
            return encoded;
        }
        let Some(tiff) = read_exif(source) else {
            return encoded;
        };
        match insert_jpeg_exif(&encoded, &tiff) {
            Ok(with_exif) => with_exif,
            Err(err) => {
                warn!(error = %err, "could not keep metadata");
                encoded
            }
        }
    }

    /// Re-reads the encoded main output and fits it inside `size`×`size`.
    fn derivative(
        &self,
        main: &Path,
        encoded: &[u8],
        size: u32,
        opts: EncodeOpts,
    ) -> Result<OutputFile> {
        let image = self.image.decode(encoded)?;
        let resized = self.image.resize(&image, ResizeOpts::inside(size, size))?;
        let contents = self.image.encode(&resized, opts)?;
        let path = derivative_path(main, size);
        verbose!(self.settings.logger, path = %path.display(), size, "derivative");
        Ok(OutputFile::new(path, contents))
    }
}
