//! CLI output formatting.
//!
//! Each command has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure.
//!
//! ## Resize
//!
//! ```text
//! images/photo.jpg → photo-w=300.jpg
//!     Outcome: generated
//!     Type: image/jpeg
//!     Size: 18.2 KB
//!     Written: thumb.jpg
//! ```
//!
//! ## List
//!
//! Originals lead; each is followed by the variants derived from it.
//!
//! ```text
//! images (2 originals, 3 variants)
//! 001 photo.jpg
//!     photo-h=200.jpg
//!     photo-w=300.jpg
//! 002 logo.png
//!     logo-w=50.png
//! ```

use crate::resize::ResizedImage;
use std::collections::BTreeMap;
use std::path::Path;

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Human-readable byte count.
fn format_size(bytes: usize) -> String {
    const KB: f64 = 1024.0;
    let b = bytes as f64;
    if b < KB {
        format!("{bytes} B")
    } else if b < KB * KB {
        format!("{:.1} KB", b / KB)
    } else {
        format!("{:.1} MB", b / (KB * KB))
    }
}

/// Split `photo-w=300.jpg` into (`photo.jpg`, variant name).
///
/// Returns `None` for names that don't carry a `-w=N`/`-h=N` suffix.
fn variant_source(name: &str) -> Option<String> {
    let (stem, ext) = name.rsplit_once('.')?;
    let (base, dim) = stem.rsplit_once('-')?;
    let digits = dim.strip_prefix("w=").or_else(|| dim.strip_prefix("h="))?;
    if base.is_empty() || digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    Some(format!("{base}.{ext}"))
}

// ============================================================================
// resize
// ============================================================================

pub fn format_resize_output(
    container: &str,
    image_name: &str,
    image: &ResizedImage,
    written: Option<&Path>,
) -> Vec<String> {
    let mut lines = vec![
        format!("{container}/{image_name} → {}", image.variant_name),
        format!("    Outcome: {}", image.outcome.as_str()),
        format!("    Type: {}", image.mime_type),
        format!("    Size: {}", format_size(image.data.len())),
    ];
    if let Some(path) = written {
        lines.push(format!("    Written: {}", path.display()));
    }
    lines
}

pub fn print_resize_output(
    container: &str,
    image_name: &str,
    image: &ResizedImage,
    written: Option<&Path>,
) {
    for line in format_resize_output(container, image_name, image, written) {
        println!("{}", line);
    }
}

// ============================================================================
// list
// ============================================================================

pub fn format_listing(container: &str, names: &[String]) -> Vec<String> {
    let mut originals: Vec<&str> = Vec::new();
    let mut variants: BTreeMap<String, Vec<&str>> = BTreeMap::new();
    let mut orphans: Vec<&str> = Vec::new();

    for name in names {
        match variant_source(name) {
            Some(source) => variants.entry(source).or_default().push(name),
            None => originals.push(name),
        }
    }

    let variant_count: usize = variants.values().map(Vec::len).sum();
    let mut lines = vec![format!(
        "{container} ({} originals, {variant_count} variants)",
        originals.len()
    )];

    for (i, original) in originals.iter().enumerate() {
        lines.push(format!("{} {}", format_index(i + 1), original));
        if let Some(derived) = variants.remove(*original) {
            for v in derived {
                lines.push(format!("    {v}"));
            }
        }
    }

    // Variants whose original is gone.
    for derived in variants.into_values() {
        orphans.extend(derived);
    }
    if !orphans.is_empty() {
        lines.push(String::new());
        lines.push("Orphaned variants".to_string());
        for v in orphans {
            lines.push(format!("    {v}"));
        }
    }

    lines
}

pub fn print_listing(container: &str, names: &[String]) {
    for line in format_listing(container, names) {
        println!("{}", line);
    }
}
