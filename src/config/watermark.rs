//! # Watermark Configuration
//!
//! User-facing watermark options ([`WatermarkOptions`]) and their validated
//! form ([`WatermarkConfig`]).
//!
//! [`WatermarkOptions::normalize`] is the only way options become a config:
//! it clamps `maxSize`, parses the position anchor and requires a
//! `sizePattern` in cover mode. It performs no I/O.
//!
//! # Example
//! ```rust
//! use image_process::config::watermark::{MaxSize, Position, WatermarkOptions};
//!
//! let opts: WatermarkOptions = serde_json::from_str(
//!     r#"{ "filePath": "logo.png", "position": "southeast", "margin": 8, "maxSize": 150 }"#,
//! ).unwrap();
//!
//! let cfg = opts.normalize().unwrap();
//! assert_eq!(cfg.position, Some(Position::SouthEast));
//! assert_eq!(cfg.max_size, MaxSize::Percent(100));
//! ```

use std::{fmt, path::PathBuf, str::FromStr};

use serde::Deserialize;

use crate::error::{ProcessError, Result};

/// Raw `maxSize` value meaning "no percentage cap".
pub const MAX_SIZE_UNSET: i32 = -1;

/// One of the nine anchors an overlay can be placed at.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Position {
    Center,
    North,
    South,
    East,
    West,
    NorthEast,
    NorthWest,
    SouthEast,
    SouthWest,
}

impl Position {
    pub const ALL: [Position; 9] = [
        Position::Center,
        Position::North,
        Position::South,
        Position::East,
        Position::West,
        Position::NorthEast,
        Position::NorthWest,
        Position::SouthEast,
        Position::SouthWest,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Position::Center => "center",
            Position::North => "north",
            Position::South => "south",
            Position::East => "east",
            Position::West => "west",
            Position::NorthEast => "northeast",
            Position::NorthWest => "northwest",
            Position::SouthEast => "southeast",
            Position::SouthWest => "southwest",
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Position {
    type Err = ProcessError;

    fn from_str(s: &str) -> Result<Self> {
        let name = s.trim().to_ascii_lowercase();
        Position::ALL
            .into_iter()
            .find(|p| p.as_str() == name)
            .ok_or_else(|| ProcessError::UnknownPosition(s.to_string()))
    }
}

/// Percentage of the base image an overlay may occupy.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum MaxSize {
    /// No percentage cap: the overlay only shrinks when it is larger than the base.
    #[default]
    Unset,
    /// Cap in percent of the base dimension, always within `0..=100`.
    /// `Percent(0)` shrinks the overlay to nothing.
    Percent(u8),
}

impl MaxSize {
    /// Maps a raw option value, preserving the `-1` sentinel and clamping
    /// everything else into `0..=100`.
    ///
    /// ```rust
    /// use image_process::config::watermark::MaxSize;
    ///
    /// assert_eq!(MaxSize::from_raw(-1), MaxSize::Unset);
    /// assert_eq!(MaxSize::from_raw(-5), MaxSize::Percent(0));
    /// assert_eq!(MaxSize::from_raw(150), MaxSize::Percent(100));
    /// ```
    pub fn from_raw(raw: i32) -> Self {
        match raw {
            MAX_SIZE_UNSET => MaxSize::Unset,
            r if r < 0 => MaxSize::Percent(0),
            r if r > 100 => MaxSize::Percent(100),
            r => MaxSize::Percent(r as u8),
        }
    }

    pub fn is_set(&self) -> bool {
        matches!(self, MaxSize::Percent(_))
    }

    /// Effective percentage: the configured cap, or 100 when unset.
    pub fn percent(&self) -> u8 {
        match self {
            MaxSize::Unset => 100,
            MaxSize::Percent(p) => *p,
        }
    }
}

/// Watermark options as supplied by the user, before validation.
///
/// Defaults: `margin = 0`, `maxSize = -1`, `isCover = false`, no
/// `sizePattern`, no `position`.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct WatermarkOptions {
    pub file_path: Option<PathBuf>,
    pub position: Option<String>,
    pub margin: u32,
    pub max_size: i32,
    pub is_cover: bool,
    pub size_pattern: Option<u32>,
}

impl Default for WatermarkOptions {
    fn default() -> Self {
        Self {
            file_path: None,
            position: None,
            margin: 0,
            max_size: MAX_SIZE_UNSET,
            is_cover: false,
            size_pattern: None,
        }
    }
}

impl WatermarkOptions {
    /// Validates the options and produces a [`WatermarkConfig`].
    ///
    /// # Errors
    /// - [`ProcessError::Configuration`] when `filePath` is missing, or when
    ///   `isCover` is set without a non-zero `sizePattern`.
    /// - [`ProcessError::UnknownPosition`] when `position` names no anchor.
    pub fn normalize(self) -> Result<WatermarkConfig> {
        let file_path = self
            .file_path
            .ok_or_else(|| ProcessError::configuration("watermark filePath required"))?;

        let size_pattern = self.size_pattern.filter(|s| *s > 0);
        if self.is_cover && size_pattern.is_none() {
            return Err(ProcessError::configuration(
                "watermark sizePattern required in cover mode",
            ));
        }

        let position = self.position.as_deref().map(str::parse::<Position>).transpose()?;

        Ok(WatermarkConfig {
            file_path,
            position,
            margin: self.margin,
            max_size: MaxSize::from_raw(self.max_size),
            is_cover: self.is_cover,
            size_pattern,
        })
    }
}

/// Validated watermark configuration. Built once per pipeline and shared
/// read-only by every file.
#[derive(Clone, Debug, PartialEq)]
pub struct WatermarkConfig {
    /// Overlay image location. Existence is checked by the file processor.
    pub file_path: PathBuf,
    /// Anchor; `None` is rejected when the watermark is applied.
    pub position: Option<Position>,
    /// Inward offset from the edges for non-centered anchors.
    pub margin: u32,
    pub max_size: MaxSize,
    /// Resize to a `size_pattern` square and tile it over the whole canvas.
    pub is_cover: bool,
    pub size_pattern: Option<u32>,
}

impl WatermarkConfig {
    /// Single-placement config with default sizing.
    pub fn new(file_path: impl Into<PathBuf>, position: Position) -> Self {
        Self {
            file_path: file_path.into(),
            position: Some(position),
            margin: 0,
            max_size: MaxSize::Unset,
            is_cover: false,
            size_pattern: None,
        }
    }

    pub fn with_margin(mut self, margin: u32) -> Self {
        self.margin = margin;
        self
    }

    pub fn with_max_size(mut self, max_size: MaxSize) -> Self {
        self.max_size = max_size;
        self
    }

    /// Switches to cover mode with the given tile size.
    pub fn with_cover(mut self, size_pattern: u32) -> Self {
        self.is_cover = true;
        self.size_pattern = Some(size_pattern);
        self
    }
}
