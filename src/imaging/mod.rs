//! Image processing, pure Rust.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Identify** | `ImageReader::into_dimensions` |
//! | **Resize** | `resize_exact` (bilinear by default) |
//! | **Encode** | source format, JPEG fallback |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for dimension math (unit testable)
//! - **Parameters**: Encoding quality and resampling filter
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`]

pub mod backend;
mod calculations;
mod params;
pub mod rust_backend;

pub use backend::{BackendError, Dimensions, ImageBackend};
pub use calculations::{TargetSize, resolve_target_size};
pub use params::{Filter, Quality};
pub use rust_backend::RustBackend;
