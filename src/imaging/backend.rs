//! Image processing backend trait and shared types.
//!
//! The [`ImageBackend`] trait is the pixel side of the service: read the
//! dimensions of an encoded image, and produce a resized encoding of it.
//! Everything else (naming, validation, caching) is backend-agnostic.
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend), pure Rust and built on
//! the `image` crate.

use super::calculations::TargetSize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to decode image: {0}")]
    Decode(String),
    #[error("Processing failed: {0}")]
    ProcessingFailed(String),
}

/// Result of an identify operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

/// Trait for image processing backends.
///
/// Both operations take encoded bytes: the service never holds decoded
/// pixels beyond a single call.
pub trait ImageBackend: Send + Sync {
    /// Get image dimensions.
    fn identify(&self, data: &[u8]) -> Result<Dimensions, BackendError>;

    /// Resize to exactly `target`, keeping the source encoding when possible.
    fn resize(&self, data: &[u8], target: TargetSize) -> Result<Vec<u8>, BackendError>;
}
