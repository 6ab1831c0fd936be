//! # Watermark Compositing
//!
//! Scales an overlay image relative to a base image, anchors it at one of
//! nine positions and composites it, optionally tiled.
//!
//! The work is split into pure steps that can be tested without pixels:
//! - [`plan_overlay_resize`] decides which single resize (if any) the
//!   overlay needs.
//! - [`placement`] computes the top-left corner for an anchor and margin.
//!
//! [`apply_watermark`] drives them against an [`ImageProcessor`].
//!
//! # Example
//! ```rust
//! use image_process::config::watermark::{MaxSize, Position, WatermarkConfig};
//! use image_process::image::processor::Dimensions;
//! use image_process::image::watermark::{OverlayResize, placement, plan_overlay_resize};
//!
//! let base = Dimensions::new(500, 500);
//! let overlay = Dimensions::new(800, 200);
//! let cfg = WatermarkConfig::new("wm.png", Position::SouthEast).with_margin(5);
//!
//! assert_eq!(plan_overlay_resize(base, overlay, &cfg).unwrap(), OverlayResize::Width(500));
//! assert_eq!(placement(Position::SouthEast, base, Dimensions::new(500, 125), 5), (0, 370));
//! ```

use crate::{
    config::watermark::{MaxSize, Position, WatermarkConfig},
    error::{ProcessError, Result},
    log::VerboseLogger,
    verbose,
};

use super::processor::{CompositeOpts, Dimensions, ImageProcessor, RasterImage, ResizeOpts};

/// The single resize applied to an overlay before placement.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OverlayResize {
    /// Overlay is used as decoded.
    None,
    /// Crop-to-fill into a `size × size` square, anchored top-left, no enlargement.
    Cover { size: u32 },
    /// Proportional resize to this width.
    Width(u32),
    /// Proportional resize to this height.
    Height(u32),
}

impl OverlayResize {
    /// The raster request for this plan, or `None` when nothing is resized.
    pub fn to_opts(self) -> Option<ResizeOpts> {
        match self {
            OverlayResize::None => None,
            OverlayResize::Cover { size } => {
                Some(ResizeOpts::cover(size, size).without_enlargement())
            }
            OverlayResize::Width(w) => Some(ResizeOpts::width(w)),
            OverlayResize::Height(h) => Some(ResizeOpts::height(h)),
        }
    }
}

/// Largest box the overlay may occupy: `round(dim * percent / 100)` per axis.
///
/// Either side may be zero when the percentage is zero.
pub fn max_box(image: Dimensions, max_size: MaxSize) -> Dimensions {
    let percent = f64::from(max_size.percent());
    let scale = |v: u32| (f64::from(v) * percent / 100.0).round() as u32;
    Dimensions::new(scale(image.width), scale(image.height))
}

/// Decides how the overlay is resized.
///
/// A resize is considered when the overlay is larger than the base on either
/// axis or when a percentage cap is configured. In cover mode the overlay is
/// always cropped to the clamped `size_pattern` square. Otherwise the axis
/// that overflows the base the most is scaled down to its max, and nothing
/// happens when that axis is already within bounds (overlays are never
/// enlarged).
///
/// # Errors
/// [`ProcessError::Configuration`] when cover mode is set without a
/// `size_pattern`.
pub fn plan_overlay_resize(
    image: Dimensions,
    overlay: Dimensions,
    config: &WatermarkConfig,
) -> Result<OverlayResize> {
    let needs_resize = !overlay.fits_within(image);
    if !needs_resize && !config.max_size.is_set() {
        return Ok(OverlayResize::None);
    }

    let max = max_box(image, config.max_size);

    if config.is_cover {
        let pattern = config.size_pattern.ok_or_else(size_pattern_required)?;
        let size = pattern.min(max.width).min(max.height);
        return Ok(OverlayResize::Cover { size });
    }

    let width_diff = i64::from(overlay.width) - i64::from(image.width);
    let height_diff = i64::from(overlay.height) - i64::from(image.height);

    let plan = if width_diff > height_diff {
        if overlay.width > max.width {
            OverlayResize::Width(max.width)
        } else {
            OverlayResize::None
        }
    } else if overlay.height > max.height {
        OverlayResize::Height(max.height)
    } else {
        OverlayResize::None
    };
    Ok(plan)
}

/// Top-left corner of the overlay for `position`.
///
/// Centered axes ignore `margin`. Coordinates are rounded to the nearest
/// pixel and never negative, so an overlay wider than the base is pinned to
/// the left/top edge.
pub fn placement(
    position: Position,
    image: Dimensions,
    overlay: Dimensions,
    margin: u32,
) -> (u32, u32) {
    let (iw, ih) = (f64::from(image.width), f64::from(image.height));
    let (ow, oh) = (f64::from(overlay.width), f64::from(overlay.height));
    let m = f64::from(margin);

    let center_x = (iw - ow) / 2.0;
    let center_y = (ih - oh) / 2.0;
    let east = iw - ow - m;
    let south = ih - oh - m;

    let (x, y) = match position {
        Position::North => (center_x, m),
        Position::South => (center_x, south),
        Position::Center => (center_x, center_y),
        Position::West => (m, center_y),
        Position::East => (east, center_y),
        Position::NorthWest => (m, m),
        Position::NorthEast => (east, m),
        Position::SouthWest => (m, south),
        Position::SouthEast => (east, south),
    };

    (clamp_px(x), clamp_px(y))
}

fn clamp_px(v: f64) -> u32 {
    v.round().clamp(0.0, f64::from(u32::MAX)) as u32
}

fn size_pattern_required() -> ProcessError {
    ProcessError::configuration("watermark sizePattern required in cover mode")
}

/// Composites the configured overlay onto `base`.
///
/// Steps: read both sizes, resize the overlay per [`plan_overlay_resize`],
/// read the size of the resized overlay, compute [`placement`], then issue
/// one composite request (tiled in cover mode).
///
/// Configuration problems are reported before the overlay is opened.
///
/// # Errors
/// - [`ProcessError::Configuration`] when `position` is missing or cover mode
///   lacks a `size_pattern`.
/// - [`ProcessError::Raster`] when the overlay cannot be decoded or any
///   raster operation fails.
pub fn apply_watermark(
    processor: &dyn ImageProcessor,
    base: RasterImage,
    config: &WatermarkConfig,
    logger: VerboseLogger,
) -> Result<RasterImage> {
    let position = config
        .position
        .ok_or_else(|| ProcessError::configuration("watermark position required"))?;
    if config.is_cover && config.size_pattern.is_none() {
        return Err(size_pattern_required());
    }

    let image_dim = base.metadata();
    let overlay = processor.open(&config.file_path)?;
    let overlay_dim = overlay.metadata();

    let plan = plan_overlay_resize(image_dim, overlay_dim, config)?;
    let max = max_box(image_dim, config.max_size);
    verbose!(
        logger,
        image_width = image_dim.width,
        image_height = image_dim.height,
        overlay_width = overlay_dim.width,
        overlay_height = overlay_dim.height,
        max_percent = config.max_size.percent(),
        max_width = max.width,
        max_height = max.height,
        ?plan,
        "watermark size"
    );

    let overlay = match plan.to_opts() {
        Some(opts) => processor.resize(&overlay, opts)?,
        None => overlay,
    };
    let overlay_dim = overlay.metadata();

    let (left, top) = placement(position, image_dim, overlay_dim, config.margin);
    verbose!(
        logger,
        %position,
        left,
        top,
        width = overlay_dim.width,
        height = overlay_dim.height,
        tile = config.is_cover,
        "watermark composite"
    );

    Ok(processor.composite(
        base,
        &overlay,
        CompositeOpts::at(left, top).tiled(config.is_cover),
    )?)
}
