//! # Process Options
//!
//! User-supplied options for the whole pipeline, merged over documented
//! defaults, and their validated form ([`PipelineSettings`]).
//!
//! | Option | Default | Notes |
//! |--------|---------|-------|
//! | `watermark` | *none* | applied only when `watermark.filePath` is set |
//! | `width` / `height` | *none* | target box for the base image |
//! | `ignoreRatio` | `false` | `false` fits inside the box without enlargement |
//! | `progressive` | `false` | |
//! | `keepMetadata` | `false` | metadata is stripped unless set |
//! | `quality` | `100` | clamped to `1..=100` |
//! | `multipleResize` | *none* | list of derivative sizes |
//! | `output` | *none* | `"jpeg"`, `"jpg"`, `"webp"` or `"png"` |
//! | `verboseLogging` | `false` | |
//! | `maxConcurrency` | `8` | files processed at once |
//! | `skipFailed` | `false` | keep going when a file fails |
//!
//! `output` and `multipleResize` also accept `false` for "not set".
//!
//! # Example
//! ```rust
//! use image_process::config::options::{OutputFormat, ProcessOptions};
//!
//! let settings = ProcessOptions::from_json(r#"{ "quality": 250, "output": "jpg" }"#).unwrap();
//! assert_eq!(settings.quality, 100);
//! assert_eq!(settings.output, Some(OutputFormat::Jpeg));
//! ```

use serde::{Deserialize, Deserializer};

use crate::{
    config::{
        app::RuntimeConfig,
        watermark::{WatermarkConfig, WatermarkOptions},
    },
    error::Result,
    image::processor::EncodeFormat,
    log::VerboseLogger,
};

pub const DEFAULT_QUALITY: i32 = 100;
pub const DEFAULT_MAX_CONCURRENCY: usize = 8;

/// Forced output format.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[serde(alias = "jpg")]
    Jpeg,
    Webp,
    Png,
}

impl OutputFormat {
    pub fn encode_format(&self) -> EncodeFormat {
        match self {
            OutputFormat::Jpeg => EncodeFormat::Jpeg,
            OutputFormat::Webp => EncodeFormat::WebP,
            OutputFormat::Png => EncodeFormat::Png,
        }
    }

    /// Extension given to renamed outputs.
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Jpeg => "jpeg",
            OutputFormat::Webp => "webp",
            OutputFormat::Png => "png",
        }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct ProcessOptions {
    pub watermark: Option<WatermarkOptions>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub ignore_ratio: bool,
    pub progressive: bool,
    pub keep_metadata: bool,
    pub quality: i32,
    #[serde(deserialize_with = "false_as_none")]
    pub multiple_resize: Option<Vec<u32>>,
    #[serde(deserialize_with = "false_as_none")]
    pub output: Option<OutputFormat>,
    pub verbose_logging: bool,
    pub max_concurrency: usize,
    pub skip_failed: bool,
}

impl Default for ProcessOptions {
    fn default() -> Self {
        Self {
            watermark: None,
            width: None,
            height: None,
            ignore_ratio: false,
            progressive: false,
            keep_metadata: false,
            quality: DEFAULT_QUALITY,
            multiple_resize: None,
            output: None,
            verbose_logging: false,
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
            skip_failed: false,
        }
    }
}

impl ProcessOptions {
    /// Parses options from JSON and validates them.
    ///
    /// # Errors
    /// [`ProcessError::InvalidOptions`](crate::error::ProcessError::InvalidOptions)
    /// for malformed JSON, otherwise whatever [`Self::normalize`] reports.
    pub fn from_json(json: &str) -> Result<PipelineSettings> {
        let opts: ProcessOptions = serde_json::from_str(json)?;
        opts.normalize()
    }

    /// Applies `IMG_PROCESS_*` variables from the process environment
    /// (after loading `.env`). See [`RuntimeConfig`].
    pub fn with_env_overrides(self) -> Self {
        self.with_runtime(&RuntimeConfig::from_env())
    }

    /// Applies values that are set in `runtime`, keeping the rest.
    pub fn with_runtime(mut self, runtime: &RuntimeConfig) -> Self {
        if let Some(verbose) = runtime.verbose_logging {
            self.verbose_logging = verbose;
        }
        if let Some(n) = runtime.max_concurrency {
            self.max_concurrency = n as usize;
        }
        self
    }

    /// Clamps numeric options and validates the watermark block.
    ///
    /// The watermark is only normalized when a `filePath` is given; without
    /// one no watermark is applied.
    pub fn normalize(self) -> Result<PipelineSettings> {
        let watermark = match self.watermark {
            Some(w) if w.file_path.is_some() => Some(w.normalize()?),
            _ => None,
        };

        Ok(PipelineSettings {
            watermark,
            width: self.width,
            height: self.height,
            ignore_ratio: self.ignore_ratio,
            progressive: self.progressive,
            keep_metadata: self.keep_metadata,
            quality: self.quality.clamp(1, 100) as u8,
            multiple_resize: self.multiple_resize.unwrap_or_default(),
            output: self.output,
            logger: VerboseLogger::new(self.verbose_logging),
            max_concurrency: self.max_concurrency.max(1),
            skip_failed: self.skip_failed,
        })
    }
}

/// Validated pipeline settings, shared read-only by every file.
#[derive(Clone, Debug, PartialEq)]
pub struct PipelineSettings {
    pub watermark: Option<WatermarkConfig>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub ignore_ratio: bool,
    pub progressive: bool,
    pub keep_metadata: bool,
    /// Always within `1..=100`.
    pub quality: u8,
    pub multiple_resize: Vec<u32>,
    pub output: Option<OutputFormat>,
    pub logger: VerboseLogger,
    /// Always at least 1.
    pub max_concurrency: usize,
    pub skip_failed: bool,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            watermark: None,
            width: None,
            height: None,
            ignore_ratio: false,
            progressive: false,
            keep_metadata: false,
            quality: DEFAULT_QUALITY as u8,
            multiple_resize: Vec::new(),
            output: None,
            logger: VerboseLogger::default(),
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
            skip_failed: false,
        }
    }
}

impl PipelineSettings {
    /// PNG compression level derived from quality: `round(quality / 10)`, at most 9.
    pub fn png_compression(&self) -> u8 {
        (f64::from(self.quality) / 10.0).round().min(9.0) as u8
    }
}

fn false_as_none<'de, D, T>(deserializer: D) -> std::result::Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OrFlag<T> {
        #[allow(dead_code)]
        Flag(bool),
        Value(T),
    }

    Ok(match Option::<OrFlag<T>>::deserialize(deserializer)? {
        Some(OrFlag::Value(v)) => Some(v),
        Some(OrFlag::Flag(_)) | None => None,
    })
}
