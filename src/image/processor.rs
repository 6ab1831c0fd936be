//! # Raster Capability
//!
//! Backend-agnostic interface for the raster operations the pipeline needs:
//! decode, resize, composite, flatten and encode.
//!
//! This module provides:
//! - [`Dimensions`] — pixel size of a decoded image.
//! - [`RasterImage`] — an owned, decoded image buffer.
//! - [`ResizeOpts`] / [`Fit`] — a resize request and the pure arithmetic that
//!   resolves it into output dimensions.
//! - [`CompositeOpts`] / [`EncodeOpts`] — composite and encode requests.
//! - [`ImageProcessor`] — the trait a raster backend implements.
//!
//! Every operation returns a new value instead of mutating its input, so the
//! dimensions used after a resize are always read from the resized image.
//!
//! # Example
//! ```rust
//! use image_process::image::processor::{Dimensions, ResizeOpts};
//!
//! let src = Dimensions::new(800, 200);
//! assert_eq!(ResizeOpts::width(500).target_dimensions(src), Dimensions::new(500, 125));
//! ```

use std::path::Path;

use anyhow::{Context, Result};
use image::{DynamicImage, ImageFormat, RgbaImage};

/// Width and height of an image in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Returns `true` if `self` is no larger than `other` on both axes.
    pub fn fits_within(&self, other: Dimensions) -> bool {
        self.width <= other.width && self.height <= other.height
    }
}

/// A decoded image, plus the container format it was decoded from (if known).
#[derive(Clone, Debug)]
pub struct RasterImage {
    image: DynamicImage,
    format: Option<ImageFormat>,
}

impl RasterImage {
    pub fn new(image: DynamicImage) -> Self {
        Self {
            image,
            format: None,
        }
    }

    pub fn with_format(mut self, format: Option<ImageFormat>) -> Self {
        self.format = format;
        self
    }

    /// Fully transparent RGBA image of the given size.
    pub fn blank(width: u32, height: u32) -> Self {
        Self::new(DynamicImage::ImageRgba8(RgbaImage::new(width, height)))
    }

    /// Pixel dimensions of the buffer.
    pub fn metadata(&self) -> Dimensions {
        Dimensions::new(self.image.width(), self.image.height())
    }

    /// Container format the image was decoded from.
    pub fn format(&self) -> Option<ImageFormat> {
        self.format
    }

    pub fn as_dynamic(&self) -> &DynamicImage {
        &self.image
    }

    pub fn into_dynamic(self) -> DynamicImage {
        self.image
    }
}

/// How a resize fits the source into a requested box when both sides are given.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Fit {
    /// Stretch to the exact box, ignoring aspect ratio.
    #[default]
    Fill,
    /// Preserve aspect ratio; the result fits inside the box.
    Inside,
    /// Preserve aspect ratio, fill the box and crop the overflow at `anchor`.
    Cover,
}

/// Which part of the scaled image a [`Fit::Cover`] resize keeps.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CropAnchor {
    #[default]
    TopLeft,
    Center,
}

/// A resize request.
///
/// When only one side is given the other is derived proportionally from the
/// source aspect ratio and `fit` is irrelevant. When neither is given the
/// request is a no-op.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ResizeOpts {
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub fit: Fit,
    /// Crop origin for [`Fit::Cover`]; ignored by the other fits.
    pub anchor: CropAnchor,
    /// Never produce an image larger than the source on either axis.
    pub without_enlargement: bool,
}

impl ResizeOpts {
    pub fn new(width: Option<u32>, height: Option<u32>, fit: Fit) -> Self {
        Self {
            width,
            height,
            fit,
            anchor: CropAnchor::TopLeft,
            without_enlargement: false,
        }
    }

    /// Proportional resize to the given width.
    pub fn width(width: u32) -> Self {
        Self::new(Some(width), None, Fit::Fill)
    }

    /// Proportional resize to the given height.
    pub fn height(height: u32) -> Self {
        Self::new(None, Some(height), Fit::Fill)
    }

    pub fn inside(width: u32, height: u32) -> Self {
        Self::new(Some(width), Some(height), Fit::Inside)
    }

    pub fn cover(width: u32, height: u32) -> Self {
        Self::new(Some(width), Some(height), Fit::Cover)
    }

    pub fn anchored(mut self, anchor: CropAnchor) -> Self {
        self.anchor = anchor;
        self
    }

    pub fn without_enlargement(mut self) -> Self {
        self.without_enlargement = true;
        self
    }

    /// Returns `true` if the request leaves every image untouched.
    pub fn is_noop(&self) -> bool {
        self.width.is_none() && self.height.is_none()
    }

    /// Resolves the request against a source size.
    ///
    /// Every resulting side is rounded to the nearest pixel and is at least 1.
    pub fn target_dimensions(&self, src: Dimensions) -> Dimensions {
        let sw = f64::from(src.width.max(1));
        let sh = f64::from(src.height.max(1));

        let (tw, th) = match (self.width, self.height) {
            (None, None) => return src,
            (Some(w), None) => {
                let scale = f64::from(w) / sw;
                if self.without_enlargement && scale > 1.0 {
                    return src;
                }
                (f64::from(w), sh * scale)
            }
            (None, Some(h)) => {
                let scale = f64::from(h) / sh;
                if self.without_enlargement && scale > 1.0 {
                    return src;
                }
                (sw * scale, f64::from(h))
            }
            (Some(w), Some(h)) => match self.fit {
                Fit::Inside => {
                    let scale = (f64::from(w) / sw).min(f64::from(h) / sh);
                    if self.without_enlargement && scale > 1.0 {
                        return src;
                    }
                    (sw * scale, sh * scale)
                }
                Fit::Fill | Fit::Cover => {
                    if self.without_enlargement {
                        (f64::from(w).min(sw), f64::from(h).min(sh))
                    } else {
                        (f64::from(w), f64::from(h))
                    }
                }
            },
        };

        Dimensions::new(to_px(tw), to_px(th))
    }
}

pub(crate) fn to_px(v: f64) -> u32 {
    v.round().clamp(1.0, f64::from(u32::MAX)) as u32
}

/// Where to place an overlay on a base image.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CompositeOpts {
    pub left: u32,
    pub top: u32,
    /// Repeat the overlay across the whole canvas, the grid aligned to `(left, top)`.
    pub tile: bool,
}

impl CompositeOpts {
    pub fn at(left: u32, top: u32) -> Self {
        Self {
            left,
            top,
            tile: false,
        }
    }

    pub fn tiled(mut self, tile: bool) -> Self {
        self.tile = tile;
        self
    }
}

/// Encoded output formats.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EncodeFormat {
    Jpeg,
    Png,
    WebP,
    Gif,
    Bmp,
}

impl EncodeFormat {
    /// Maps a decoder-reported format to an encodable one.
    pub fn from_image_format(format: ImageFormat) -> Option<Self> {
        match format {
            ImageFormat::Jpeg => Some(Self::Jpeg),
            ImageFormat::Png => Some(Self::Png),
            ImageFormat::WebP => Some(Self::WebP),
            ImageFormat::Gif => Some(Self::Gif),
            ImageFormat::Bmp => Some(Self::Bmp),
            _ => None,
        }
    }

    /// Maps a lower- or upper-case file extension, with or without a leading dot.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.trim_start_matches('.').to_ascii_lowercase().as_str() {
            "jpg" | "jpeg" => Some(Self::Jpeg),
            "png" => Some(Self::Png),
            "webp" => Some(Self::WebP),
            "gif" => Some(Self::Gif),
            "bmp" => Some(Self::Bmp),
            _ => None,
        }
    }

}

/// An encode request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EncodeOpts {
    pub format: EncodeFormat,
    /// JPEG / WebP quality in `1..=100`.
    pub quality: u8,
    pub progressive: bool,
    /// PNG compression level in `0..=9`.
    pub png_compression: u8,
}

impl EncodeOpts {
    pub fn new(format: EncodeFormat) -> Self {
        Self {
            format,
            quality: 100,
            progressive: false,
            png_compression: 9,
        }
    }

    pub fn with_quality(mut self, quality: u8) -> Self {
        self.quality = quality.clamp(1, 100);
        self
    }

    pub fn with_progressive(mut self, progressive: bool) -> Self {
        self.progressive = progressive;
        self
    }

    pub fn with_png_compression(mut self, level: u8) -> Self {
        self.png_compression = level.min(9);
        self
    }
}

/// Trait defining the raster operations used by the pipeline.
///
/// Implementors must be shareable across the worker threads of the pipeline
/// runner. Errors are reported as [`anyhow::Error`] and surface as
/// [`ProcessError::Raster`](crate::error::ProcessError::Raster).
pub trait ImageProcessor: Send + Sync {
    /// Returns `true` if files with this extension (e.g. `"jpg"`, `".PNG"`)
    /// are accepted as input.
    fn is_supported(&self, extension: &str) -> bool;

    /// Decodes an in-memory encoded image.
    fn decode(&self, bytes: &[u8]) -> Result<RasterImage>;

    /// Reads and decodes an image file.
    fn open(&self, path: &Path) -> Result<RasterImage> {
        let bytes = std::fs::read(path).with_context(|| format!("read {}", path.display()))?;
        self.decode(&bytes)
            .with_context(|| format!("decode {}", path.display()))
    }

    /// Returns a resized copy of `image`.
    fn resize(&self, image: &RasterImage, opts: ResizeOpts) -> Result<RasterImage>;

    /// Draws `overlay` onto `base` and returns the result.
    fn composite(
        &self,
        base: RasterImage,
        overlay: &RasterImage,
        opts: CompositeOpts,
    ) -> Result<RasterImage>;

    /// Removes the alpha channel by blending onto a solid RGB background.
    fn flatten(&self, image: RasterImage, background: [u8; 3]) -> Result<RasterImage>;

    /// Encodes `image` into bytes.
    fn encode(&self, image: &RasterImage, opts: EncodeOpts) -> Result<Vec<u8>>;
}
