//! # Image Resizer
//!
//! An on-demand image resizing proxy. Clients ask for an image in a storage
//! container with a target width *or* height; the service returns a resized
//! copy, generating and persisting it on first request and serving the
//! persisted copy afterwards.
//!
//! ```text
//! GET /images/photo.jpg?w=300
//!     → cache key  photo-w=300.jpg
//!     → hit?       serve it
//!     → miss       fetch photo.jpg, resize to 300×…, store photo-w=300.jpg, serve it
//! ```
//!
//! # Request Pipeline
//!
//! | Step | Module |
//! |------|--------|
//! | Validate and quantize `w`/`h` (nearest 10, ties to even) | [`params`] |
//! | Split the name, build the cache key, map the MIME type | [`naming`] |
//! | Cache lookup, original fetch, bounds check, persist | [`resize`] |
//! | Aspect-preserving target size | [`imaging`] |
//! | Resample and encode | [`imaging`] |
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`params`] | Query parameter validation and quantization |
//! | [`naming`] | `stem.ext` parsing, `{stem}-w={n}.{ext}` cache keys, MIME types |
//! | [`imaging`] | Dimension math and the [`ImageBackend`](imaging::ImageBackend) trait with its pure-Rust implementation |
//! | [`store`] | [`ImageStore`](store::ImageStore) trait, filesystem and in-memory stores |
//! | [`resize`] | The orchestrator tying validation, cache, store and backend together |
//! | [`server`] | axum router and listener |
//! | [`config`] | `config.toml` loading, environment overrides, validation |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Quantized Dimensions
//!
//! Requested sizes are rounded to multiples of 10 before anything else
//! happens. `w=297`, `w=300` and `w=303` all map to `photo-w=300.jpg`, which
//! bounds the number of variants a client can make the service generate and
//! store.
//!
//! ## Never Upscale
//!
//! A request larger than the original in the requested dimension returns the
//! original bytes unchanged. Nothing is stored for it.
//!
//! ## Blocking Core, Async Edge
//!
//! The store and backend traits are synchronous. Decoding and resampling are
//! CPU-bound, so the HTTP handler hands each request to tokio's blocking pool.
//! The CLI drives the same [`resize::Resizer`] directly with no runtime at all.

pub mod config;
pub mod imaging;
pub mod naming;
pub mod output;
pub mod params;
pub mod resize;
pub mod server;
pub mod store;

#[cfg(test)]
pub(crate) mod test_helpers;
