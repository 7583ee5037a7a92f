//! Resize orchestration: the request state machine.
//!
//! ```text
//! validate ─▶ derive names ─▶ variant in store? ──yes──▶ Cached
//!                                   │ no
//!                                   ▼
//!                             fetch original ──absent──▶ NotFound
//!                                   │
//!                                   ▼
//!                        larger than original? ──yes──▶ Passthrough
//!                                   │ no
//!                                   ▼
//!                        resolve size ─▶ resize ─▶ put ─▶ Generated
//! ```
//!
//! A cache hit ends the request before the original is touched. The variant
//! is written only after a successful resize, so a failure never leaves a
//! partial entry behind.
//!
//! There is no locking around "miss, resize, put". Two concurrent requests
//! for the same variant both do the work and both write it; resizing is a
//! pure function of its inputs, so the last write is as good as the first.

use crate::imaging::{BackendError, ImageBackend, resolve_target_size};
use crate::naming::{NameError, split_image_name};
use crate::params::{ParamError, ResizeQuery, ResizeRequest, validate};
use crate::store::{ImageStore, StoreError};
use axum::http::StatusCode;
use thiserror::Error;
use tracing::{error, info, warn};

#[derive(Error, Debug)]
pub enum ResizeError {
    #[error(transparent)]
    Params(#[from] ParamError),
    #[error("Error processing image: {0}")]
    Name(#[from] NameError),
    #[error("Image not found")]
    NotFound,
    #[error("Error processing image: {0}")]
    Imaging(#[from] BackendError),
    #[error("Error processing image: {0}")]
    Store(#[from] StoreError),
    #[error("Error processing image: {0}")]
    Invariant(String),
}

impl ResizeError {
    /// HTTP status for this error.
    ///
    /// Only parameter problems are the client's to fix; a malformed name is
    /// reported as a server-side failure.
    pub fn status(&self) -> StatusCode {
        match self {
            ResizeError::Params(_) => StatusCode::BAD_REQUEST,
            ResizeError::NotFound => StatusCode::NOT_FOUND,
            ResizeError::Name(_)
            | ResizeError::Imaging(_)
            | ResizeError::Store(_)
            | ResizeError::Invariant(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// How a response was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Variant already in the store.
    Cached,
    /// Request exceeded the original; original bytes returned as is.
    Passthrough,
    /// Variant computed and stored by this request.
    Generated,
}

impl Outcome {
    pub fn as_str(self) -> &'static str {
        match self {
            Outcome::Cached => "cached",
            Outcome::Passthrough => "passthrough",
            Outcome::Generated => "generated",
        }
    }
}

/// Bytes to send back, with their content type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResizedImage {
    pub data: Vec<u8>,
    pub mime_type: String,
    /// Storage name of the variant this request addressed.
    pub variant_name: String,
    pub outcome: Outcome,
}

/// Ties validation and naming to a store and a backend.
///
/// Holds no per-request state; share one instance (e.g. behind an `Arc`)
/// across all requests.
pub struct Resizer<S, B> {
    store: S,
    backend: B,
}

impl<S: ImageStore, B: ImageBackend> Resizer<S, B> {
    pub fn new(store: S, backend: B) -> Self {
        Self { store, backend }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Handle a raw request: validate the query, then [`resize`](Self::resize).
    pub fn handle(
        &self,
        container: &str,
        image_name: &str,
        query: &ResizeQuery,
    ) -> Result<ResizedImage, ResizeError> {
        let request = validate(query).inspect_err(|e| {
            warn!(w = ?query.w, h = ?query.h, "parameter validation failed: {e}");
        })?;
        self.resize(container, image_name, &request)
    }

    /// Serve `image_name` from `container` at the requested size.
    pub fn resize(
        &self,
        container: &str,
        image_name: &str,
        request: &ResizeRequest,
    ) -> Result<ResizedImage, ResizeError> {
        let derived = split_image_name(image_name).and_then(|name| {
            let variant_name = name.cache_key(request)?;
            Ok((variant_name, name.mime_type()))
        });
        let (variant_name, mime_type) = derived.inspect_err(|e| {
            error!(image = image_name, "error deriving image metadata: {e}");
        })?;

        match self.store.get(container, &variant_name) {
            Ok(Some(data)) => {
                info!(variant = %variant_name, "variant found in store, returning without processing");
                return Ok(ResizedImage {
                    data,
                    mime_type,
                    variant_name,
                    outcome: Outcome::Cached,
                });
            }
            Ok(None) => {}
            Err(e) => {
                warn!(variant = %variant_name, "variant lookup failed, treating as miss: {e}");
            }
        }

        let original = match self.store.get(container, image_name) {
            Ok(Some(data)) => data,
            Ok(None) => {
                warn!(image = image_name, "original image not found");
                return Err(ResizeError::NotFound);
            }
            Err(e) => {
                warn!(image = image_name, "original image could not be read: {e}");
                return Err(ResizeError::NotFound);
            }
        };

        self.generate(container, original, request, variant_name, mime_type)
            .inspect_err(|e| error!(image = image_name, "error during image processing: {e}"))
    }

    /// Bounds check, resize, store. Runs only on a cache miss.
    fn generate(
        &self,
        container: &str,
        original: Vec<u8>,
        request: &ResizeRequest,
        variant_name: String,
        mime_type: String,
    ) -> Result<ResizedImage, ResizeError> {
        let dims = self.backend.identify(&original)?;

        let exceeds_width = request.width().is_some_and(|w| w > dims.width);
        let exceeds_height = request.height().is_some_and(|h| h > dims.height);
        if exceeds_width || exceeds_height {
            warn!(
                requested_width = ?request.width(),
                requested_height = ?request.height(),
                original_width = dims.width,
                original_height = dims.height,
                "request exceeds original size, returning original image"
            );
            return Ok(ResizedImage {
                data: original,
                mime_type,
                variant_name,
                outcome: Outcome::Passthrough,
            });
        }

        let target = resolve_target_size(dims, request).ok_or_else(|| {
            ResizeError::Invariant("request carries neither width nor height".to_string())
        })?;
        let data = self.backend.resize(&original, target)?;

        info!(
            variant = %variant_name,
            width = target.width,
            height = target.height,
            "uploading resized image to store"
        );
        self.store.put(container, &variant_name, &data)?;

        Ok(ResizedImage {
            data,
            mime_type,
            variant_name,
            outcome: Outcome::Generated,
        })
    }
}
