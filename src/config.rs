//! Service configuration.
//!
//! Handles loading, validating, and merging `config.toml`. Stock defaults are
//! overridden by the user's file, which is overridden by environment
//! variables.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! debug = false                  # Verbose logging
//!
//! [server]
//! bind = "127.0.0.1:8080"        # Listen address
//!
//! [storage]
//! root = "storage"               # One directory per container below this
//! default_container = "images"   # Used by CLI commands without --container
//!
//! [images]
//! quality = 90                   # JPEG quality when a variant falls back to JPEG
//! filter = "triangle"            # nearest | triangle | catmull-rom | gaussian | lanczos3
//! ```
//!
//! ## Environment
//!
//! | Variable | Overrides |
//! |---|---|
//! | `RESIZER_STORAGE_ROOT` | `storage.root` |
//! | `RESIZER_CONTAINER` | `storage.default_container` |
//! | `RESIZER_BIND` | `server.bind` |
//! | `DEBUG` | `debug` (`True`/`true` enables) |
//!
//! Unknown keys are rejected to catch typos early.

use crate::imaging::{Filter, Quality};
use serde::{Deserialize, Serialize};
use std::fs;
use std::net::SocketAddr;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Service configuration loaded from `config.toml`.
///
/// All fields have sensible defaults. User config files need only specify
/// the values they want to override. Unknown keys are rejected.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServiceConfig {
    /// Verbose logging.
    pub debug: bool,
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub images: ImagesConfig,
}

impl ServiceConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=100).contains(&self.images.quality) {
            return Err(ConfigError::Validation(
                "images.quality must be 1-100".into(),
            ));
        }
        if self.storage.root.trim().is_empty() {
            return Err(ConfigError::Validation(
                "storage.root must not be empty".into(),
            ));
        }
        if self.storage.default_container.trim().is_empty() {
            return Err(ConfigError::Validation(
                "storage.default_container must not be empty".into(),
            ));
        }
        self.server.bind_addr()?;
        Ok(())
    }

    /// Encoding quality for the backend.
    pub fn quality(&self) -> Quality {
        Quality::new(self.images.quality)
    }
}

/// HTTP listener settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:8080".to_string(),
        }
    }
}

impl ServerConfig {
    pub fn bind_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.bind.parse().map_err(|_| {
            ConfigError::Validation(format!("server.bind is not a socket address: {}", self.bind))
        })
    }
}

/// Object store settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StorageConfig {
    /// Filesystem root; each container is a directory below it.
    pub root: String,
    /// Container used by CLI commands when none is given.
    pub default_container: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            root: "storage".to_string(),
            default_container: "images".to_string(),
        }
    }
}

/// Resize/encode settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ImagesConfig {
    /// JPEG quality for variants whose source format cannot be re-encoded.
    pub quality: u32,
    /// Resampling filter.
    pub filter: Filter,
}

impl Default for ImagesConfig {
    fn default() -> Self {
        Self {
            quality: Quality::default().value(),
            filter: Filter::default(),
        }
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(ServiceConfig::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load a config file as a raw TOML value.
///
/// Returns `Ok(None)` if the file does not exist.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Build a TOML overlay from environment variables.
///
/// `lookup` is `std::env::var(..).ok()` in production; tests pass a map.
pub fn env_overlay(lookup: impl Fn(&str) -> Option<String>) -> toml::Value {
    let mut root = toml::Table::new();
    let mut storage = toml::Table::new();
    let mut server = toml::Table::new();

    if let Some(v) = lookup("RESIZER_STORAGE_ROOT") {
        storage.insert("root".into(), toml::Value::String(v));
    }
    if let Some(v) = lookup("RESIZER_CONTAINER") {
        storage.insert("default_container".into(), toml::Value::String(v));
    }
    if let Some(v) = lookup("RESIZER_BIND") {
        server.insert("bind".into(), toml::Value::String(v));
    }
    if let Some(v) = lookup("DEBUG") {
        root.insert(
            "debug".into(),
            toml::Value::Boolean(v == "True" || v == "true"),
        );
    }

    if !storage.is_empty() {
        root.insert("storage".into(), toml::Value::Table(storage));
    }
    if !server.is_empty() {
        root.insert("server".into(), toml::Value::Table(server));
    }
    toml::Value::Table(root)
}

/// Merge the overlays onto stock defaults, then deserialize and validate.
pub fn resolve_config(overlays: Vec<toml::Value>) -> Result<ServiceConfig, ConfigError> {
    let merged = overlays
        .into_iter()
        .fold(stock_defaults_value(), merge_toml);
    let config: ServiceConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from `path` (if present) plus the process environment.
pub fn load_config(path: &Path) -> Result<ServiceConfig, ConfigError> {
    let mut overlays = Vec::new();
    if let Some(file) = load_raw_config(path)? {
        overlays.push(file);
    }
    overlays.push(env_overlay(|key| std::env::var(key).ok()));
    resolve_config(overlays)
}

/// Returns a fully-commented stock `config.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# Image Resizer Configuration
# ===========================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
#
# Environment variables override this file:
#   RESIZER_STORAGE_ROOT, RESIZER_CONTAINER, RESIZER_BIND, DEBUG
#
# Unknown keys will cause an error.

# Verbose (debug-level) logging. RUST_LOG takes precedence when set.
debug = false

# ---------------------------------------------------------------------------
# HTTP server
# ---------------------------------------------------------------------------
[server]
# Listen address for `image-resizer serve`.
bind = "127.0.0.1:8080"

# ---------------------------------------------------------------------------
# Storage
# ---------------------------------------------------------------------------
[storage]
# Root directory of the object store. Every container is a directory below
# it; originals and resized variants live side by side.
root = "storage"

# Container used by `resize` and `list` when --container is not given.
default_container = "images"

# ---------------------------------------------------------------------------
# Images
# ---------------------------------------------------------------------------
[images]
# Variants keep the format of their original. When that format cannot be
# written, they are encoded as JPEG at this quality (1 = worst, 100 = best).
quality = 90

# Resampling filter: nearest, triangle (bilinear), catmull-rom, gaussian, lanczos3.
filter = "triangle"
"##
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn default_config_values() {
        let config = ServiceConfig::default();
        assert!(!config.debug);
        assert_eq!(config.server.bind, "127.0.0.1:8080");
        assert_eq!(config.storage.root, "storage");
        assert_eq!(config.storage.default_container, "images");
        assert_eq!(config.images.quality, 90);
        assert_eq!(config.images.filter, Filter::Triangle);
        config.validate().unwrap();
    }

    #[test]
    fn parse_partial_config() {
        let toml = r#"
[storage]
root = "/srv/blobs"
"#;
        let config: ServiceConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.storage.root, "/srv/blobs");
        // Default values preserved
        assert_eq!(config.storage.default_container, "images");
        assert_eq!(config.server.bind, "127.0.0.1:8080");
    }

    #[test]
    fn parse_filter_name() {
        let config: ServiceConfig = toml::from_str("[images]\nfilter = \"lanczos3\"").unwrap();
        assert_eq!(config.images.filter, Filter::Lanczos3);
    }

    #[test]
    fn unknown_keys_rejected() {
        let result: Result<ServiceConfig, _> = toml::from_str("[storage]\nbucket = \"x\"");
        assert!(result.is_err());
    }

    #[test]
    fn stock_config_parses_to_defaults() {
        let config: ServiceConfig = toml::from_str(stock_config_toml()).unwrap();
        let defaults = ServiceConfig::default();
        assert_eq!(config.server.bind, defaults.server.bind);
        assert_eq!(config.storage.root, defaults.storage.root);
        assert_eq!(config.images.quality, defaults.images.quality);
        assert_eq!(config.images.filter, defaults.images.filter);
    }

    // =========================================================================
    // Merging and environment
    // =========================================================================

    #[test]
    fn merge_overlay_keeps_base_keys() {
        let base: toml::Value = toml::from_str("[a]\nx = 1\ny = 2").unwrap();
        let overlay: toml::Value = toml::from_str("[a]\ny = 3").unwrap();
        let merged = merge_toml(base, overlay);
        assert_eq!(merged["a"]["x"].as_integer(), Some(1));
        assert_eq!(merged["a"]["y"].as_integer(), Some(3));
    }

    #[test]
    fn env_overrides_file() {
        let file: toml::Value = toml::from_str("[storage]\nroot = \"from-file\"").unwrap();
        let overlay = env_overlay(env(&[("RESIZER_STORAGE_ROOT", "from-env")]));
        let config = resolve_config(vec![file, overlay]).unwrap();
        assert_eq!(config.storage.root, "from-env");
    }

    #[test]
    fn env_overlay_all_keys() {
        let overlay = env_overlay(env(&[
            ("RESIZER_CONTAINER", "avatars"),
            ("RESIZER_BIND", "0.0.0.0:9000"),
            ("DEBUG", "True"),
        ]));
        let config = resolve_config(vec![overlay]).unwrap();
        assert_eq!(config.storage.default_container, "avatars");
        assert_eq!(config.server.bind, "0.0.0.0:9000");
        assert!(config.debug);
    }

    #[test]
    fn debug_env_other_values_disable() {
        let config = resolve_config(vec![env_overlay(env(&[("DEBUG", "False")]))]).unwrap();
        assert!(!config.debug);
        let config = resolve_config(vec![env_overlay(env(&[("DEBUG", "1")]))]).unwrap();
        assert!(!config.debug);
        let config = resolve_config(vec![env_overlay(env(&[("DEBUG", "true")]))]).unwrap();
        assert!(config.debug);
    }

    #[test]
    fn empty_env_overlay_is_noop() {
        let config = resolve_config(vec![env_overlay(no_env)]).unwrap();
        assert_eq!(config.storage.root, "storage");
    }

    // =========================================================================
    // Validation
    // =========================================================================

    #[test]
    fn validate_rejects_quality_out_of_range() {
        let overlay: toml::Value = toml::from_str("[images]\nquality = 0").unwrap();
        assert!(matches!(
            resolve_config(vec![overlay]),
            Err(ConfigError::Validation(_))
        ));
        let overlay: toml::Value = toml::from_str("[images]\nquality = 101").unwrap();
        assert!(matches!(
            resolve_config(vec![overlay]),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn validate_rejects_bad_bind() {
        let overlay = env_overlay(env(&[("RESIZER_BIND", "not-an-address")]));
        assert!(matches!(
            resolve_config(vec![overlay]),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn validate_rejects_empty_container() {
        let overlay = env_overlay(env(&[("RESIZER_CONTAINER", "  ")]));
        assert!(matches!(
            resolve_config(vec![overlay]),
            Err(ConfigError::Validation(_))
        ));
    }

    // =========================================================================
    // load_raw_config
    // =========================================================================

    #[test]
    fn load_raw_config_missing_file_is_none() {
        let tmp = TempDir::new().unwrap();
        assert!(
            load_raw_config(&tmp.path().join("config.toml"))
                .unwrap()
                .is_none()
        );
    }

    #[test]
    fn load_raw_config_reads_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        fs::write(&path, "[server]\nbind = \"0.0.0.0:80\"").unwrap();

        let raw = load_raw_config(&path).unwrap().unwrap();
        let config = resolve_config(vec![raw]).unwrap();
        assert_eq!(config.server.bind, "0.0.0.0:80");
        assert_eq!(config.storage.root, "storage");
    }

    #[test]
    fn load_raw_config_invalid_toml_is_error() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        fs::write(&path, "this is not valid toml [[[").unwrap();

        assert!(matches!(load_raw_config(&path), Err(ConfigError::Toml(_))));
    }
}
