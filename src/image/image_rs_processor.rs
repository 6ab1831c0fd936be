//! # Image Processor Implementation (image-rs)
//!
//! Provides an [`ImageProcessor`] implementation using the [`image`] crate,
//! with lossy WebP output through the [`webp`] crate.
//!
//! Accepted inputs are **JPEG**, **PNG**, **GIF** (first frame) and **BMP**.
//! Outputs are JPEG, PNG, WebP, GIF and BMP.
//!
//! # Example
//! ```rust,no_run
//! use image_process::image::image_rs_processor::ImageRsProcessor;
//! use image_process::image::processor::{EncodeFormat, EncodeOpts, ImageProcessor, ResizeOpts};
//!
//! let processor = ImageRsProcessor::default();
//! let img = processor.open("input.png".as_ref()).unwrap();
//! let resized = processor
//!     .resize(&img, ResizeOpts::inside(800, 600).without_enlargement())
//!     .unwrap();
//! let bytes = processor
//!     .encode(&resized, EncodeOpts::new(EncodeFormat::Jpeg).with_quality(80))
//!     .unwrap();
//! std::fs::write("resized.jpg", bytes).unwrap();
//! ```

use std::io::Cursor;

use anyhow::{Context, Result, anyhow};
use image::{
    DynamicImage, ExtendedColorType, ImageEncoder, ImageFormat, ImageReader, RgbImage,
    codecs::{
        jpeg::JpegEncoder,
        png::{CompressionType, FilterType as PngFilterType, PngEncoder},
    },
    imageops::{self, FilterType},
};
use tracing::debug;

use super::processor::{
    CompositeOpts, CropAnchor, Dimensions, EncodeFormat, EncodeOpts, Fit, ImageProcessor, RasterImage,
    ResizeOpts, to_px,
};

/// Extensions accepted as pipeline input.
pub const SUPPORTED_EXTENSIONS: [&str; 5] = ["jpg", "jpeg", "png", "gif", "bmp"];

/// A concrete implementation of [`ImageProcessor`] using the `image` crate.
#[derive(Clone, Debug)]
pub struct ImageRsProcessor {
    filter: FilterType,
}

impl Default for ImageRsProcessor {
    fn default() -> Self {
        Self {
            filter: FilterType::Triangle,
        }
    }
}

impl ImageRsProcessor {
    fn resize_cover(&self, img: &DynamicImage, opts: ResizeOpts) -> DynamicImage {
        let src = Dimensions::new(img.width(), img.height());
        let target = opts.target_dimensions(src);
        let (box_w, box_h) = (
            f64::from(opts.width.unwrap_or(target.width)),
            f64::from(opts.height.unwrap_or(target.height)),
        );

        let mut scale = (box_w / f64::from(src.width.max(1))).max(box_h / f64::from(src.height.max(1)));
        if opts.without_enlargement {
            scale = scale.min(1.0);
        }

        let scaled_w = to_px(f64::from(src.width) * scale).max(target.width);
        let scaled_h = to_px(f64::from(src.height) * scale).max(target.height);
        let scaled = if (scaled_w, scaled_h) == (src.width, src.height) {
            img.clone()
        } else {
            img.resize_exact(scaled_w, scaled_h, self.filter)
        };

        let (x, y) = match opts.anchor {
            CropAnchor::TopLeft => (0, 0),
            CropAnchor::Center => (
                (scaled_w - target.width) / 2,
                (scaled_h - target.height) / 2,
            ),
        };
        scaled.crop_imm(x, y, target.width, target.height)
    }
}

impl ImageProcessor for ImageRsProcessor {
    fn is_supported(&self, extension: &str) -> bool {
        let ext = extension.trim_start_matches('.').to_ascii_lowercase();
        SUPPORTED_EXTENSIONS.contains(&ext.as_str())
    }

    fn decode(&self, bytes: &[u8]) -> Result<RasterImage> {
        let reader = ImageReader::new(Cursor::new(bytes))
            .with_guessed_format()
            .context("guess format")?;
        let format = reader.format();
        let image = reader.decode().context("decode image")?;
        Ok(RasterImage::new(image).with_format(format))
    }

    fn resize(&self, image: &RasterImage, opts: ResizeOpts) -> Result<RasterImage> {
        let src = image.metadata();
        if opts.is_noop() {
            return Ok(image.clone());
        }

        let resized = if opts.fit == Fit::Cover && opts.width.is_some() && opts.height.is_some() {
            self.resize_cover(image.as_dynamic(), opts)
        } else {
            let target = opts.target_dimensions(src);
            if target == src {
                return Ok(image.clone());
            }
            image
                .as_dynamic()
                .resize_exact(target.width, target.height, self.filter)
        };

        Ok(RasterImage::new(resized).with_format(image.format()))
    }

    fn composite(
        &self,
        base: RasterImage,
        overlay: &RasterImage,
        opts: CompositeOpts,
    ) -> Result<RasterImage> {
        let format = base.format();
        let mut canvas = base.into_dynamic().to_rgba8();
        let top = overlay.as_dynamic().to_rgba8();
        let (ow, oh) = top.dimensions();

        if ow == 0 || oh == 0 {
            return Ok(RasterImage::new(DynamicImage::ImageRgba8(canvas)).with_format(format));
        }

        if opts.tile {
            let (cw, ch) = (i64::from(canvas.width()), i64::from(canvas.height()));
            let mut y = grid_start(opts.top, oh);
            while y < ch {
                let mut x = grid_start(opts.left, ow);
                while x < cw {
                    imageops::overlay(&mut canvas, &top, x, y);
                    x += i64::from(ow);
                }
                y += i64::from(oh);
            }
        } else {
            imageops::overlay(&mut canvas, &top, i64::from(opts.left), i64::from(opts.top));
        }

        Ok(RasterImage::new(DynamicImage::ImageRgba8(canvas)).with_format(format))
    }

    fn flatten(&self, image: RasterImage, background: [u8; 3]) -> Result<RasterImage> {
        let format = image.format();
        let rgba = image.into_dynamic().to_rgba8();
        let flat = RgbImage::from_fn(rgba.width(), rgba.height(), |x, y| {
            let [r, g, b, a] = rgba.get_pixel(x, y).0;
            let blend = |c: u8, bg: u8| -> u8 {
                let a = u32::from(a);
                ((u32::from(c) * a + u32::from(bg) * (255 - a) + 127) / 255) as u8
            };
            image::Rgb([
                blend(r, background[0]),
                blend(g, background[1]),
                blend(b, background[2]),
            ])
        });
        Ok(RasterImage::new(DynamicImage::ImageRgb8(flat)).with_format(format))
    }

    fn encode(&self, image: &RasterImage, opts: EncodeOpts) -> Result<Vec<u8>> {
        let img = image.as_dynamic();
        let (w, h) = (img.width(), img.height());
        let mut out = Cursor::new(Vec::new());

        match opts.format {
            EncodeFormat::Jpeg => {
                if opts.progressive {
                    debug!("progressive JPEG requested; encoder writes baseline");
                }
                let rgb = img.to_rgb8();
                JpegEncoder::new_with_quality(&mut out, opts.quality)
                    .encode_image(&rgb)
                    .context("encode jpeg")?;
            }
            EncodeFormat::Png => {
                let rgba = img.to_rgba8();
                PngEncoder::new_with_quality(
                    &mut out,
                    png_compression(opts.png_compression),
                    PngFilterType::Adaptive,
                )
                .write_image(rgba.as_raw(), w, h, ExtendedColorType::Rgba8)
                .context("encode png")?;
            }
            EncodeFormat::WebP => {
                let rgba = img.to_rgba8();
                let encoded = webp::Encoder::from_rgba(rgba.as_raw(), w, h)
                    .encode_simple(false, f32::from(opts.quality))
                    .map_err(|e| anyhow!("encode webp: {e:?}"))?;
                return Ok(encoded.to_vec());
            }
            EncodeFormat::Gif => {
                DynamicImage::ImageRgba8(img.to_rgba8())
                    .write_to(&mut out, ImageFormat::Gif)
                    .context("encode gif")?;
            }
            EncodeFormat::Bmp => {
                DynamicImage::ImageRgba8(img.to_rgba8())
                    .write_to(&mut out, ImageFormat::Bmp)
                    .context("encode bmp")?;
            }
        }

        Ok(out.into_inner())
    }
}

/// First grid coordinate `<= 0` such that the grid passes through `offset`.
fn grid_start(offset: u32, step: u32) -> i64 {
    let rem = i64::from(offset % step);
    if rem == 0 { 0 } else { rem - i64::from(step) }
}

fn png_compression(level: u8) -> CompressionType {
    match level {
        0..=3 => CompressionType::Fast,
        4..=6 => CompressionType::Default,
        _ => CompressionType::Best,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GenericImageView, ImageBuffer, Rgba};

    fn make_png(w: u32, h: u32) -> Vec<u8> {
        let img: ImageBuffer<Rgba<u8>, _> = ImageBuffer::from_fn(w, h, |x, y| {
            if (x + y) % 2 == 0 {
                Rgba([255, 0, 0, 255])
            } else {
                Rgba([0, 255, 0, 255])
            }
        });
        let mut cur = Cursor::new(Vec::new());
        image::write_buffer_with_format(
            &mut cur,
            img.as_raw(),
            w,
            h,
            image::ColorType::Rgba8,
            image::ImageFormat::Png,
        )
        .expect("encode png");
        cur.into_inner()
    }

    fn solid(w: u32, h: u32, px: [u8; 4]) -> RasterImage {
        RasterImage::new(DynamicImage::ImageRgba8(ImageBuffer::from_pixel(
            w,
            h,
            Rgba(px),
        )))
    }

    #[test]
    fn supports_expected_extensions() {
        let p = ImageRsProcessor::default();
        for ext in ["jpg", ".jpeg", "PNG", "gif", "bmp"] {
            assert!(p.is_supported(ext), "{ext}");
        }
        assert!(!p.is_supported("webp"));
        assert!(!p.is_supported("txt"));
        assert!(!p.is_supported(""));
    }

    #[test]
    fn decode_reports_format_and_dimensions() {
        let p = ImageRsProcessor::default();
        let img = p.decode(&make_png(30, 20)).expect("decode");
        assert_eq!(img.metadata(), Dimensions::new(30, 20));
        assert_eq!(img.format(), Some(ImageFormat::Png));
    }

    #[test]
    fn decode_rejects_garbage() {
        let p = ImageRsProcessor::default();
        assert!(p.decode(b"not an image").is_err());
    }

    #[test]
    fn proportional_resize_returns_new_value() {
        let p = ImageRsProcessor::default();
        let src = solid(800, 200, [0, 0, 0, 255]);
        let out = p.resize(&src, ResizeOpts::width(500)).unwrap();
        assert_eq!(out.metadata(), Dimensions::new(500, 125));
        assert_eq!(src.metadata(), Dimensions::new(800, 200));
    }

    #[test]
    fn cover_resize_crops_to_square() {
        let p = ImageRsProcessor::default();
        let src = solid(1000, 800, [0, 0, 0, 255]);
        let out = p
            .resize(&src, ResizeOpts::cover(500, 500).without_enlargement())
            .unwrap();
        assert_eq!(out.metadata(), Dimensions::new(500, 500));
    }

    #[test]
    fn cover_resize_does_not_enlarge() {
        let p = ImageRsProcessor::default();
        let src = solid(100, 60, [0, 0, 0, 255]);
        let out = p
            .resize(&src, ResizeOpts::cover(120, 120).without_enlargement())
            .unwrap();
        assert_eq!(out.metadata(), Dimensions::new(100, 60));
    }

    #[test]
    fn cover_resize_anchors_top_left() {
        let p = ImageRsProcessor::default();
        let mut buf = ImageBuffer::from_pixel(20, 10, Rgba([0, 0, 255, 255]));
        for y in 0..10 {
            for x in 0..10 {
                buf.put_pixel(x, y, Rgba([255, 0, 0, 255]));
            }
        }
        let src = RasterImage::new(DynamicImage::ImageRgba8(buf));
        let out = p
            .resize(&src, ResizeOpts::cover(10, 10).without_enlargement())
            .unwrap();
        assert_eq!(out.metadata(), Dimensions::new(10, 10));
        assert_eq!(out.as_dynamic().get_pixel(0, 0), Rgba([255, 0, 0, 255]));
    }

    fn stripes(w: u32, h: u32) -> RasterImage {
        let third = w / 3;
        RasterImage::new(DynamicImage::ImageRgba8(ImageBuffer::from_fn(w, h, |x, _| {
            match x / third {
                0 => Rgba([255, 0, 0, 255]),
                1 => Rgba([0, 255, 0, 255]),
                _ => Rgba([0, 0, 255, 255]),
            }
        })))
    }

    #[test]
    fn centered_cover_keeps_the_middle() {
        let p = ImageRsProcessor::default();
        let out = p
            .resize(
                &stripes(300, 100),
                ResizeOpts::cover(100, 100).anchored(CropAnchor::Center),
            )
            .unwrap();
        assert_eq!(out.metadata(), Dimensions::new(100, 100));
        let img = out.as_dynamic();
        for x in [0, 2, 50, 97, 99] {
            assert_eq!(img.get_pixel(x, 50), Rgba([0, 255, 0, 255]), "x={x}");
        }
    }

    #[test]
    fn centered_cover_enlarges_when_allowed() {
        let p = ImageRsProcessor::default();
        let out = p
            .resize(
                &solid(20, 10, [1, 2, 3, 255]),
                ResizeOpts::cover(40, 40).anchored(CropAnchor::Center),
            )
            .unwrap();
        assert_eq!(out.metadata(), Dimensions::new(40, 40));
    }

    #[test]
    fn composite_places_overlay_at_offset() {
        let p = ImageRsProcessor::default();
        let base = solid(10, 10, [255, 255, 255, 255]);
        let overlay = solid(2, 2, [0, 0, 0, 255]);
        let out = p
            .composite(base, &overlay, CompositeOpts::at(3, 4))
            .unwrap();
        let img = out.as_dynamic();
        assert_eq!(img.get_pixel(3, 4), Rgba([0, 0, 0, 255]));
        assert_eq!(img.get_pixel(4, 5), Rgba([0, 0, 0, 255]));
        assert_eq!(img.get_pixel(2, 4), Rgba([255, 255, 255, 255]));
        assert_eq!(img.get_pixel(5, 6), Rgba([255, 255, 255, 255]));
    }

    #[test]
    fn tiled_composite_covers_whole_canvas() {
        let p = ImageRsProcessor::default();
        let base = solid(9, 7, [255, 255, 255, 255]);
        let overlay = solid(2, 2, [0, 0, 0, 255]);
        let out = p
            .composite(base, &overlay, CompositeOpts::at(1, 1).tiled(true))
            .unwrap();
        let img = out.as_dynamic();
        for (_, _, px) in img.pixels() {
            assert_eq!(px, Rgba([0, 0, 0, 255]));
        }
    }

    #[test]
    fn grid_start_aligns_to_offset() {
        assert_eq!(grid_start(0, 5), 0);
        assert_eq!(grid_start(7, 5), -3);
        assert_eq!(grid_start(10, 5), 0);
        assert_eq!(grid_start(3, 5), -2);
    }

    #[test]
    fn flatten_blends_onto_background() {
        let p = ImageRsProcessor::default();
        let img = solid(1, 1, [0, 0, 0, 0]);
        let out = p.flatten(img, [255, 255, 255]).unwrap();
        assert_eq!(out.as_dynamic().get_pixel(0, 0), Rgba([255, 255, 255, 255]));

        let img = solid(1, 1, [10, 20, 30, 255]);
        let out = p.flatten(img, [255, 255, 255]).unwrap();
        assert_eq!(out.as_dynamic().get_pixel(0, 0), Rgba([10, 20, 30, 255]));
    }

    #[test]
    fn encodes_every_output_format() {
        let p = ImageRsProcessor::default();
        let img = solid(16, 8, [10, 200, 30, 255]);
        for (format, expected) in [
            (EncodeFormat::Jpeg, ImageFormat::Jpeg),
            (EncodeFormat::Png, ImageFormat::Png),
            (EncodeFormat::WebP, ImageFormat::WebP),
            (EncodeFormat::Gif, ImageFormat::Gif),
            (EncodeFormat::Bmp, ImageFormat::Bmp),
        ] {
            let bytes = p
                .encode(&img, EncodeOpts::new(format).with_quality(80))
                .expect("encode");
            assert_eq!(image::guess_format(&bytes).unwrap(), expected);
            let decoded = image::load_from_memory(&bytes).expect("decode back");
            assert_eq!(decoded.dimensions(), (16, 8));
        }
    }

    #[test]
    fn jpeg_starts_with_soi_marker() {
        let p = ImageRsProcessor::default();
        let out = p
            .encode(&solid(4, 4, [0, 0, 0, 255]), EncodeOpts::new(EncodeFormat::Jpeg))
            .unwrap();
        assert_eq!(&out[..3], &[0xFF, 0xD8, 0xFF]);
    }

    #[test]
    fn png_compression_mapping() {
        assert!(matches!(png_compression(0), CompressionType::Fast));
        assert!(matches!(png_compression(5), CompressionType::Default));
        assert!(matches!(png_compression(9), CompressionType::Best));
    }
}
