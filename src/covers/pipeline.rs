//! Pure image derivation: canonical-format encoding and thumbnail resizing.
//!
//! Both transforms are deterministic functions of their input bytes and hold
//! no state; all filesystem concerns live in
//! [`storage`](super::storage) and [`lifecycle`](super::lifecycle).

use std::io::Cursor;

use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat};

use crate::error::{Error, Result};

/// Decode bytes in any supported input format.
///
/// Unrecognized data fails with [`Error::UnsupportedImageFormat`];
/// recognized-but-undecodable data fails with [`Error::CorruptImageData`].
fn decode(bytes: &[u8]) -> Result<DynamicImage> {
    image::load_from_memory(bytes).map_err(|e| match e {
        image::ImageError::Unsupported(err) => Error::UnsupportedImageFormat(err.to_string()),
        other => Error::CorruptImageData(other.to_string()),
    })
}

/// Encode as the canonical on-disk format (JPEG).
fn encode_jpeg(img: &DynamicImage) -> Result<Vec<u8>> {
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, ImageFormat::Jpeg)
        .map_err(|e| Error::Io(std::io::Error::other(e)))?;
    Ok(buf.into_inner())
}

/// Re-encode `bytes` into the canonical format, preserving dimensions.
pub fn to_canonical(bytes: &[u8]) -> Result<Vec<u8>> {
    let img = decode(bytes)?;
    encode_jpeg(&img)
}

/// Produce a variant no wider than `target_width`, preserving aspect ratio.
///
/// Inputs already narrower than the target are re-encoded unchanged; the
/// pipeline never upscales.
pub fn resize(bytes: &[u8], target_width: u32) -> Result<Vec<u8>> {
    let img = decode(bytes)?;
    if img.width() > target_width {
        let resized = img.resize(target_width, u32::MAX, FilterType::Lanczos3);
        encode_jpeg(&resized)
    } else {
        encode_jpeg(&img)
    }
}
