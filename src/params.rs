//! Query parameter validation.
//!
//! Clients ask for a variant with exactly one of `w` or `h`. Both are raw
//! strings straight from the query and go through [`validate`] before anything
//! touches the store:
//!
//! - the value must be plain ASCII digits (no sign, no decimal point, no whitespace)
//! - the number is quantized to the nearest multiple of 10, ties to even
//!   (`94 → 90`, `95 → 100`, `85 → 80`, `97 → 100`)
//! - a value that quantizes to `0` counts as absent
//! - exactly one dimension must remain
//!
//! Quantization bounds the number of distinct variants per image: `w=301`
//! and `w=298` share the `300` variant.

use serde::Deserialize;
use thiserror::Error;

/// Granularity of requested dimensions.
pub const QUANTUM: u32 = 10;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParamError {
    #[error("{} parameter must be a positive integer", .0.label())]
    InvalidParameter(Axis),
    #[error("Must specify width or height")]
    MissingParameter,
    #[error("Cannot specify both width and height")]
    ConflictingParameters,
}

/// Which dimension a parameter refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Width,
    Height,
}

impl Axis {
    fn label(self) -> &'static str {
        match self {
            Axis::Width => "Width",
            Axis::Height => "Height",
        }
    }
}

/// Raw `?w=..&h=..` query as received by the transport.
///
/// Empty values (`?w=`) are treated the same as a missing key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ResizeQuery {
    #[serde(default)]
    pub w: Option<String>,
    #[serde(default)]
    pub h: Option<String>,
}

impl ResizeQuery {
    pub fn width(w: impl Into<String>) -> Self {
        Self {
            w: Some(w.into()),
            h: None,
        }
    }

    pub fn height(h: impl Into<String>) -> Self {
        Self {
            w: None,
            h: Some(h.into()),
        }
    }
}

/// Requested dimensions of a variant.
///
/// [`validate`] only ever produces requests with exactly one dimension set.
/// [`ResizeRequest::new`] accepts any combination for callers that resolve
/// sizes directly, which is why downstream code still checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ResizeRequest {
    width: Option<u32>,
    height: Option<u32>,
}

impl ResizeRequest {
    pub fn new(width: Option<u32>, height: Option<u32>) -> Self {
        Self { width, height }
    }

    pub fn with_width(width: u32) -> Self {
        Self::new(Some(width), None)
    }

    pub fn with_height(height: u32) -> Self {
        Self::new(None, Some(height))
    }

    pub fn width(&self) -> Option<u32> {
        self.width
    }

    pub fn height(&self) -> Option<u32> {
        self.height
    }
}

/// Validate the raw query into a [`ResizeRequest`].
pub fn validate(query: &ResizeQuery) -> Result<ResizeRequest, ParamError> {
    let width = parse_dimension(query.w.as_deref(), Axis::Width)?;
    let height = parse_dimension(query.h.as_deref(), Axis::Height)?;

    match (width, height) {
        (None, None) => Err(ParamError::MissingParameter),
        (Some(_), Some(_)) => Err(ParamError::ConflictingParameters),
        _ => Ok(ResizeRequest::new(width, height)),
    }
}

/// Parse and quantize one raw value. `Ok(None)` means "not requested".
fn parse_dimension(raw: Option<&str>, axis: Axis) -> Result<Option<u32>, ParamError> {
    let raw = match raw {
        Some(r) if !r.is_empty() => r,
        _ => return Ok(None),
    };
    if !raw.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ParamError::InvalidParameter(axis));
    }
    // All digits, so the only possible parse failure is overflow.
    let value: u64 = raw
        .parse()
        .map_err(|_| ParamError::InvalidParameter(axis))?;
    let quantized = quantize(value);
    if quantized == 0 {
        return Ok(None);
    }
    u32::try_from(quantized)
        .map(Some)
        .map_err(|_| ParamError::InvalidParameter(axis))
}

/// Round to the nearest multiple of [`QUANTUM`], ties to the even multiple.
///
/// Integer form of `round(value / 10) * 10` with round-half-to-even.
pub fn quantize(value: u64) -> u64 {
    let q = u64::from(QUANTUM);
    let (quot, rem) = (value / q, value % q);
    let half = q / 2;
    let rounded = if rem > half || (rem == half && quot % 2 == 1) {
        quot + 1
    } else {
        quot
    };
    rounded.saturating_mul(q)
}
