//! Pure calculation functions for image dimensions.
//!
//! All functions here are pure and testable without any I/O or images.

use super::backend::Dimensions;
use crate::params::ResizeRequest;

/// Fully resolved output size handed to the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TargetSize {
    pub width: u32,
    pub height: u32,
}

/// Resolve the output size for a request, preserving the original aspect ratio.
///
/// The missing dimension is derived with real division and then truncated,
/// never rounded: a 1000x500 original at width 230 gives height 115, at
/// width 235 gives 117.
///
/// - width only → `(w, floor(w / aspect))`
/// - height only → `(floor(h * aspect), h)`
/// - both → returned unchanged (no aspect preservation)
/// - neither → `None`; validated requests never get here
///
/// A derived dimension is never below 1 pixel.
///
/// # Examples
/// ```
/// # use image_resizer::imaging::{Dimensions, TargetSize, resolve_target_size};
/// # use image_resizer::params::ResizeRequest;
/// let original = Dimensions { width: 1000, height: 500 };
/// assert_eq!(
///     resolve_target_size(original, &ResizeRequest::with_width(200)),
///     Some(TargetSize { width: 200, height: 100 })
/// );
/// ```
pub fn resolve_target_size(original: Dimensions, request: &ResizeRequest) -> Option<TargetSize> {
    if let (Some(width), Some(height)) = (request.width(), request.height()) {
        return Some(TargetSize { width, height });
    }

    let aspect = original.width as f64 / original.height as f64;

    if let Some(width) = request.width() {
        let height = truncate(width as f64 / aspect);
        Some(TargetSize { width, height })
    } else {
        request.height().map(|height| {
            let width = truncate(height as f64 * aspect);
            TargetSize { width, height }
        })
    }
}

/// Truncate toward zero, floored at one pixel.
fn truncate(value: f64) -> u32 {
    // `as` saturates: NaN → 0, ∞ → u32::MAX.
    (value as u32).max(1)
}
