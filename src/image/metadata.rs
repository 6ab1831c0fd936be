//! # EXIF Retention
//!
//! Encoding through [`ImageProcessor::encode`](super::processor::ImageProcessor::encode)
//! always strips metadata. When `keepMetadata` is enabled the pipeline reads
//! the source EXIF block with `kamadak-exif` and splices it back into JPEG
//! output as an `APP1` segment.

use std::io::Cursor;

use anyhow::{Result, bail};

const SOI: [u8; 2] = [0xFF, 0xD8];
const APP0: [u8; 2] = [0xFF, 0xE0];
const APP1: [u8; 2] = [0xFF, 0xE1];
const EXIF_HEADER: &[u8; 6] = b"Exif\0\0";

/// Extracts the raw TIFF-structured EXIF payload from an encoded image.
///
/// Returns `None` when the container has no EXIF data or cannot be parsed.
pub fn read_exif(bytes: &[u8]) -> Option<Vec<u8>> {
    let mut cursor = Cursor::new(bytes);
    exif::Reader::new()
        .read_from_container(&mut cursor)
        .ok()
        .map(|exif| exif.buf().to_vec())
}

/// Inserts `tiff` as an EXIF `APP1` segment into a baseline JPEG stream,
/// directly after the JFIF `APP0` segment when present.
///
/// # Errors
/// Fails if `jpeg` does not start with an SOI marker or if the payload does
/// not fit in a single segment.
pub fn insert_jpeg_exif(jpeg: &[u8], tiff: &[u8]) -> Result<Vec<u8>> {
    if jpeg.len() < 2 || jpeg[..2] != SOI {
        bail!("not a JPEG stream");
    }

    let seg_len = 2 + EXIF_HEADER.len() + tiff.len();
    let Ok(seg_len) = u16::try_from(seg_len) else {
        bail!("EXIF payload too large for one APP1 segment ({} bytes)", tiff.len());
    };

    let mut at = 2;
    if jpeg.len() >= 6 && jpeg[2..4] == APP0 {
        let app0_len = usize::from(u16::from_be_bytes([jpeg[4], jpeg[5]]));
        if 4 + app0_len <= jpeg.len() {
            at = 4 + app0_len;
        }
    }

    let mut out = Vec::with_capacity(jpeg.len() + usize::from(seg_len) + 2);
    out.extend_from_slice(&jpeg[..at]);
    out.extend_from_slice(&APP1);
    out.extend_from_slice(&seg_len.to_be_bytes());
    out.extend_from_slice(EXIF_HEADER);
    out.extend_from_slice(tiff);
    out.extend_from_slice(&jpeg[at..]);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::{
        image_rs_processor::ImageRsProcessor,
        processor::{EncodeFormat, EncodeOpts, ImageProcessor, RasterImage},
    };

    /// Little-endian TIFF header with one IFD holding `Orientation = 6`.
    fn orientation_tiff() -> Vec<u8> {
        let mut t = Vec::new();
        t.extend_from_slice(b"II");
        t.extend_from_slice(&42u16.to_le_bytes());
        t.extend_from_slice(&8u32.to_le_bytes());
        t.extend_from_slice(&1u16.to_le_bytes());
        t.extend_from_slice(&0x0112u16.to_le_bytes());
        t.extend_from_slice(&3u16.to_le_bytes());
        t.extend_from_slice(&1u32.to_le_bytes());
        t.extend_from_slice(&6u16.to_le_bytes());
        t.extend_from_slice(&[0, 0]);
        t.extend_from_slice(&0u32.to_le_bytes());
        t
    }

    fn jpeg() -> Vec<u8> {
        ImageRsProcessor::default()
            .encode(&RasterImage::blank(8, 8), EncodeOpts::new(EncodeFormat::Jpeg))
            .unwrap()
    }

    #[test]
    fn plain_jpeg_has_no_exif() {
        assert_eq!(read_exif(&jpeg()), None);
    }

    #[test]
    fn inserted_exif_can_be_read_back() {
        let tiff = orientation_tiff();
        let out = insert_jpeg_exif(&jpeg(), &tiff).unwrap();
        assert_eq!(read_exif(&out), Some(tiff));

        let exif = exif::Reader::new()
            .read_from_container(&mut Cursor::new(&out))
            .unwrap();
        let field = exif
            .get_field(exif::Tag::Orientation, exif::In::PRIMARY)
            .expect("orientation");
        assert_eq!(field.value.get_uint(0), Some(6));
    }

    #[test]
    fn result_still_decodes() {
        let out = insert_jpeg_exif(&jpeg(), &orientation_tiff()).unwrap();
        let decoded = image::load_from_memory(&out).expect("decode");
        assert_eq!((decoded.width(), decoded.height()), (8, 8));
    }

    #[test]
    fn rejects_non_jpeg() {
        assert!(insert_jpeg_exif(b"\x89PNG", &orientation_tiff()).is_err());
        assert!(insert_jpeg_exif(b"", &orientation_tiff()).is_err());
    }

    #[test]
    fn rejects_oversized_payload() {
        let tiff = vec![0u8; 70_000];
        let err = insert_jpeg_exif(&jpeg(), &tiff).unwrap_err();
        assert!(err.to_string().contains("too large"));
    }
}
