//! Pure Rust image processing backend.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Format detection | `ImageReader::with_guessed_format` (magic bytes) |
//! | Identify | `ImageReader::into_dimensions` (header only, no pixel decode) |
//! | Decode (JPEG, PNG, TIFF, WebP, GIF, BMP) | `image` crate decoders |
//! | Resize | `DynamicImage::resize_exact` with the configured filter |
//! | Encode | same format as the source; JPEG when unknown or not writable |

use super::backend::{BackendError, Dimensions, ImageBackend};
use super::calculations::TargetSize;
use super::params::{Filter, Quality};
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ImageFormat, ImageReader, Limits};
use std::io::Cursor;

/// Decoder allocation ceiling (1 GiB).
const MAX_ALLOC: u64 = 1024 * 1024 * 1024;

/// Pure Rust backend using the `image` crate ecosystem.
///
/// See the [module docs](self) for the crate-to-operation mapping.
#[derive(Debug, Clone, Copy, Default)]
pub struct RustBackend {
    filter: Filter,
    quality: Quality,
}

impl RustBackend {
    pub fn new(filter: Filter, quality: Quality) -> Self {
        Self { filter, quality }
    }
}

fn reader(data: &[u8]) -> Result<ImageReader<Cursor<&[u8]>>, BackendError> {
    let mut reader = ImageReader::new(Cursor::new(data)).with_guessed_format()?;
    let mut limits = Limits::default();
    limits.max_alloc = Some(MAX_ALLOC);
    reader.limits(limits);
    Ok(reader)
}

/// Encode `img` as `format`, falling back to JPEG when the format is unknown
/// or has no encoder compiled in.
fn encode(
    img: &DynamicImage,
    format: Option<ImageFormat>,
    quality: Quality,
) -> Result<Vec<u8>, BackendError> {
    let format = format
        .filter(|f| f.writing_enabled())
        .unwrap_or(ImageFormat::Jpeg);

    let mut out = Cursor::new(Vec::new());
    if format == ImageFormat::Jpeg {
        // JPEG has no alpha channel and no 16-bit mode.
        let rgb = DynamicImage::ImageRgb8(img.to_rgb8());
        let encoder = JpegEncoder::new_with_quality(&mut out, quality.value() as u8);
        rgb.write_with_encoder(encoder)
            .map_err(|e| BackendError::ProcessingFailed(format!("JPEG encode failed: {e}")))?;
    } else {
        img.write_to(&mut out, format).map_err(|e| {
            BackendError::ProcessingFailed(format!("{format:?} encode failed: {e}"))
        })?;
    }
    Ok(out.into_inner())
}

impl ImageBackend for RustBackend {
    fn identify(&self, data: &[u8]) -> Result<Dimensions, BackendError> {
        let (width, height) = reader(data)?
            .into_dimensions()
            .map_err(|e| BackendError::Decode(e.to_string()))?;
        Ok(Dimensions { width, height })
    }

    fn resize(&self, data: &[u8], target: TargetSize) -> Result<Vec<u8>, BackendError> {
        let reader = reader(data)?;
        let format = reader.format();
        let img = reader
            .decode()
            .map_err(|e| BackendError::Decode(e.to_string()))?;
        let resized = img.resize_exact(target.width, target.height, self.filter.filter_type());
        encode(&resized, format, self.quality)
    }
}
