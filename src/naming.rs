//! Image names and the variant naming convention.
//!
//! A client addresses an original by its stored name (`photo.jpg`). Resized
//! variants live in the same container under a derived name that encodes the
//! requested dimension:
//!
//! - `photo.jpg` at `w=300` → `photo-w=300.jpg`
//! - `photo.jpg` at `h=200` → `photo-h=200.jpg`
//!
//! ## Splitting
//!
//! The name is split on every `.`; the first segment is the stem and the
//! second the extension. Anything after a second dot is not part of the
//! variant name: `archive.tar.gz` has stem `archive` and extension `tar`.
//! Existing stores are keyed this way, so the rule is kept as is.

use crate::params::ResizeRequest;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NameError {
    #[error("Invalid image name: {0}")]
    InvalidName(String),
    #[error("Cannot specify both width and height in the image name")]
    AmbiguousDimensions,
    #[error("Must specify either width or height to generate a resize image name")]
    NoDimension,
}

/// Result of splitting an image name like `photo.jpg`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageName {
    /// First dot-separated segment (`photo`).
    pub stem: String,
    /// Second dot-separated segment (`jpg`).
    pub extension: String,
}

impl ImageName {
    /// Variant name for this image at the requested size.
    pub fn cache_key(&self, request: &ResizeRequest) -> Result<String, NameError> {
        cache_key(&self.stem, &self.extension, request)
    }

    /// MIME type derived from the extension.
    pub fn mime_type(&self) -> String {
        mime_type(&self.extension)
    }
}

/// Split an image name into stem and extension.
///
/// - `"photo.jpg"` → stem=`photo`, extension=`jpg`
/// - `"a.b.c"` → stem=`a`, extension=`b`
/// - `".jpg"` → stem=``, extension=`jpg`
/// - `"noext"` → [`NameError::InvalidName`]
pub fn split_image_name(name: &str) -> Result<ImageName, NameError> {
    let mut parts = name.split('.');
    match (parts.next(), parts.next()) {
        (Some(stem), Some(extension)) => Ok(ImageName {
            stem: stem.to_string(),
            extension: extension.to_string(),
        }),
        _ => Err(NameError::InvalidName(name.to_string())),
    }
}

/// Derive the storage name of a resized variant.
pub fn cache_key(
    stem: &str,
    extension: &str,
    request: &ResizeRequest,
) -> Result<String, NameError> {
    match (request.width(), request.height()) {
        (Some(_), Some(_)) => Err(NameError::AmbiguousDimensions),
        (Some(w), None) => Ok(format!("{stem}-w={w}.{extension}")),
        (None, Some(h)) => Ok(format!("{stem}-h={h}.{extension}")),
        (None, None) => Err(NameError::NoDimension),
    }
}

/// Standard MIME type for an extension, `application/octet-stream` when unknown.
pub fn mime_type(extension: &str) -> String {
    mime_guess::from_ext(extension)
        .first_or_octet_stream()
        .essence_str()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_simple_name() {
        let n = split_image_name("photo.jpg").unwrap();
        assert_eq!(n.stem, "photo");
        assert_eq!(n.extension, "jpg");
    }

    #[test]
    fn split_without_dot_is_invalid() {
        assert_eq!(
            split_image_name("noext"),
            Err(NameError::InvalidName("noext".to_string()))
        );
    }

    #[test]
    fn split_keeps_only_first_two_segments() {
        let n = split_image_name("a.b.c").unwrap();
        assert_eq!(n.stem, "a");
        assert_eq!(n.extension, "b");
    }

    #[test]
    fn split_leading_dot() {
        let n = split_image_name(".jpg").unwrap();
        assert_eq!(n.stem, "");
        assert_eq!(n.extension, "jpg");
    }

    #[test]
    fn split_trailing_dot() {
        let n = split_image_name("photo.").unwrap();
        assert_eq!(n.stem, "photo");
        assert_eq!(n.extension, "");
    }

    #[test]
    fn split_keeps_dashes_and_equals() {
        let n = split_image_name("001-dawn-w=300.png").unwrap();
        assert_eq!(n.stem, "001-dawn-w=300");
        assert_eq!(n.extension, "png");
    }

    #[test]
    fn cache_key_width() {
        assert_eq!(
            cache_key("photo", "jpg", &ResizeRequest::with_width(300)).unwrap(),
            "photo-w=300.jpg"
        );
    }

    #[test]
    fn cache_key_height() {
        assert_eq!(
            cache_key("photo", "jpg", &ResizeRequest::with_height(200)).unwrap(),
            "photo-h=200.jpg"
        );
    }

    #[test]
    fn cache_key_both_is_ambiguous() {
        let req = ResizeRequest::new(Some(100), Some(200));
        assert_eq!(
            cache_key("photo", "jpg", &req),
            Err(NameError::AmbiguousDimensions)
        );
    }

    #[test]
    fn cache_key_neither_is_error() {
        let req = ResizeRequest::new(None, None);
        assert_eq!(cache_key("photo", "jpg", &req), Err(NameError::NoDimension));
    }

    #[test]
    fn cache_key_is_deterministic() {
        let name = split_image_name("sunset.webp").unwrap();
        let req = ResizeRequest::with_width(640);
        assert_eq!(name.cache_key(&req), name.cache_key(&req));
        assert_ne!(
            name.cache_key(&req).unwrap(),
            name.cache_key(&ResizeRequest::with_height(640)).unwrap()
        );
    }

    #[test]
    fn mime_known_extensions() {
        assert_eq!(mime_type("jpg"), "image/jpeg");
        assert_eq!(mime_type("jpeg"), "image/jpeg");
        assert_eq!(mime_type("png"), "image/png");
        assert_eq!(mime_type("gif"), "image/gif");
        assert_eq!(mime_type("webp"), "image/webp");
    }

    #[test]
    fn mime_ignores_case() {
        assert_eq!(mime_type("JPG"), "image/jpeg");
    }

    #[test]
    fn mime_unknown_falls_back_to_octet_stream() {
        assert_eq!(mime_type("notanext"), "application/octet-stream");
        assert_eq!(mime_type(""), "application/octet-stream");
    }
}
