//! Raster capability and the operations built on it.
//!
//! - [`processor`] — the [`ImageProcessor`](processor::ImageProcessor) trait and its request types.
//! - [`image_rs_processor`] — the `image`-crate backend.
//! - [`watermark`] — overlay sizing, placement and compositing.
//! - [`metadata`] — EXIF retention for JPEG output.

pub mod image_rs_processor;
pub mod metadata;
pub mod processor;
pub mod watermark;
