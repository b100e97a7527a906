//! Site configuration module.
//!
//! Handles loading, validating, and merging the `config.toml` at the source
//! root. Stock defaults are serialized to a TOML value, the user file is laid
//! over it table by table, and the merged value is deserialized and checked.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [site]
//! # title = "My Site"      # Appended to page titles when set
//! language = "en"
//!
//! [content]
//! base_names = ["index"]    # Files that represent their directory, in order
//! phantom_extension = "md"  # Nominal extension of synthesized index pages
//! opaque_fallback = true    # Copy files no other mummifier claims
//!
//! [filters]
//! ignore = ['^\.']          # File names never planned
//! veil = ['^_']             # Planned, but hidden from navigation
//!
//! [images]
//! scale_threshold = 1000000 # Re-encode only sources larger than this (bytes)
//! max_length = 1920         # Longest edge after scaling (pixels)
//! quality = 85              # Encoding quality (1-100)
//!
//! [images.aspects.thumb]
//! max_length = 400
//! quality = 75
//!
//! [processing]
//! max_processes = 4         # Max parallel workers (omit for auto = CPU cores)
//! ```
//!
//! ## Partial Configuration
//!
//! Config files are sparse: override just the values you want:
//!
//! ```toml
//! [images]
//! max_length = 2400
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::mummifier::page;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use thiserror::Error;

/// File name of the site configuration, looked up at the source root.
pub const CONFIG_FILE: &str = "config.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("TOML serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Site configuration loaded from `config.toml`.
///
/// All fields have sensible defaults. User config files need only specify
/// the values they want to override. Unknown keys are rejected.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteConfig {
    /// Site-wide presentation values.
    pub site: SiteInfo,
    /// How directory content pages are found or synthesized.
    pub content: ContentConfig,
    /// File-name filters.
    pub filters: FiltersConfig,
    /// Image scaling settings.
    pub images: ImagesConfig,
    /// Parallel processing settings.
    pub processing: ProcessingConfig,
}

impl SiteConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_quality("images.quality", self.images.quality)?;
        if self.images.max_length == 0 {
            return Err(ConfigError::Validation(
                "images.max_length must be non-zero".into(),
            ));
        }
        for (name, aspect) in &self.images.aspects {
            if aspect.max_length == 0 {
                return Err(ConfigError::Validation(format!(
                    "images.aspects.{name}.max_length must be non-zero"
                )));
            }
            if let Some(q) = aspect.quality {
                validate_quality(&format!("images.aspects.{name}.quality"), q)?;
            }
            if name.is_empty() || name.contains(['/', '\\', '.']) {
                return Err(ConfigError::Validation(format!(
                    "images.aspects: invalid aspect name {name:?}"
                )));
            }
        }
        for base in &self.content.base_names {
            if base.is_empty() || base.contains(['/', '\\', '.']) {
                return Err(ConfigError::Validation(format!(
                    "content.base_names: invalid base name {base:?}"
                )));
            }
        }
        if !page::EXTENSIONS.contains(&self.content.phantom_extension.as_str()) {
            return Err(ConfigError::Validation(format!(
                "content.phantom_extension must be a page extension ({}), got {:?}",
                page::EXTENSIONS.join(", "),
                self.content.phantom_extension
            )));
        }
        self.filters.compile()?;
        Ok(())
    }
}

fn validate_quality(key: &str, quality: u32) -> Result<(), ConfigError> {
    if !(1..=100).contains(&quality) {
        return Err(ConfigError::Validation(format!("{key} must be 1-100")));
    }
    Ok(())
}

/// Site-wide presentation values.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteInfo {
    /// Site title, appended to rendered page titles.
    pub title: Option<String>,
    /// Document language for rendered pages.
    pub language: String,
}

impl Default for SiteInfo {
    fn default() -> Self {
        Self {
            title: None,
            language: "en".to_string(),
        }
    }
}

/// Content page settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ContentConfig {
    /// Base names that make a file its directory's content, tried in order.
    /// Empty disables both content detection and phantom synthesis.
    pub base_names: Vec<String>,
    /// Extension given to the nominal source path of a phantom page.
    pub phantom_extension: String,
    /// Whether files no mummifier claims are copied as opaque files.
    /// When false they are a planning error.
    pub opaque_fallback: bool,
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self {
            base_names: vec!["index".to_string()],
            phantom_extension: "md".to_string(),
            opaque_fallback: true,
        }
    }
}

/// File-name filters, as regular expressions.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FiltersConfig {
    /// Entries whose file name matches any of these are never planned.
    pub ignore: Vec<String>,
    /// Entries whose file name matches any of these are planned but not
    /// navigable; veiled directories get no synthesized content page.
    pub veil: Vec<String>,
}

impl Default for FiltersConfig {
    fn default() -> Self {
        Self {
            ignore: vec![r"^\.".to_string()],
            veil: vec![r"^_".to_string()],
        }
    }
}

/// Compiled filter expressions.
#[derive(Debug, Clone)]
pub struct CompiledFilters {
    pub ignore: Vec<Regex>,
    pub veil: Vec<Regex>,
}

impl FiltersConfig {
    /// Compile both filter lists. A bad pattern is a validation error.
    pub fn compile(&self) -> Result<CompiledFilters, ConfigError> {
        Ok(CompiledFilters {
            ignore: compile_patterns("filters.ignore", &self.ignore)?,
            veil: compile_patterns("filters.veil", &self.veil)?,
        })
    }
}

fn compile_patterns(key: &str, patterns: &[String]) -> Result<Vec<Regex>, ConfigError> {
    patterns
        .iter()
        .map(|p| {
            Regex::new(p)
                .map_err(|e| ConfigError::Validation(format!("{key}: invalid pattern {p:?}: {e}")))
        })
        .collect()
}

/// Image scaling settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ImagesConfig {
    /// Sources at or below this many bytes are copied verbatim.
    pub scale_threshold: u64,
    /// Longest edge, in pixels, of re-encoded images.
    pub max_length: u32,
    /// Encoding quality (1 = worst, 100 = best).
    pub quality: u32,
    /// Named variants written beside each image as `<stem>-<name>.<ext>`.
    pub aspects: BTreeMap<String, AspectConfig>,
}

impl Default for ImagesConfig {
    fn default() -> Self {
        Self {
            scale_threshold: 1_000_000,
            max_length: 1920,
            quality: 85,
            aspects: BTreeMap::new(),
        }
    }
}

/// One named image variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AspectConfig {
    /// Longest edge of the variant, in pixels.
    pub max_length: u32,
    /// Encoding quality; falls back to `images.quality`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quality: Option<u32>,
}

/// Parallel processing settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of parallel workers.
    /// When absent, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    pub max_processes: Option<usize>,
}

/// Resolve the effective thread count from config.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)` (user can constrain down, not up)
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config.max_processes.map(|n| n.min(cores)).unwrap_or(cores)
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    Ok(toml::Value::try_from(SiteConfig::default())?)
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

/// Load `config.toml` from a directory as a raw TOML value.
///
/// Returns `Ok(None)` if the directory has no `config.toml`.
pub fn load_raw_config(dir: &Path) -> Result<Option<toml::Value>, ConfigError> {
    let config_path = dir.join(CONFIG_FILE);
    if !config_path.is_file() {
        return Ok(None);
    }
    let content = fs::read_to_string(&config_path)?;
    Ok(Some(toml::from_str(&content)?))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<SiteConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: SiteConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from `config.toml` in the given source root.
///
/// Merges user values on top of stock defaults, rejects unknown keys,
/// and validates the result.
pub fn load_config(root: &Path) -> Result<SiteConfig, ConfigError> {
    resolve_config(stock_defaults_value()?, load_raw_config(root)?)
}

/// Returns a fully-commented stock `config.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# mummy configuration
# ===================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
#
# This file lives at the root of the source tree and is never itself
# copied to the target. Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Site
# ---------------------------------------------------------------------------
[site]
# Site title, appended to every rendered page title ("Post - My Site").
# title = "My Site"

# Document language of rendered pages.
language = "en"

# ---------------------------------------------------------------------------
# Content pages
# ---------------------------------------------------------------------------
[content]
# File stems that make a page its directory's content, tried in order.
# A directory with none of them gets a synthesized listing page named after
# the first entry. An empty list disables both.
base_names = ["index"]

# Nominal source extension of synthesized pages. Must be a page extension
# (md, markdown, html, htm, xhtml).
phantom_extension = "md"

# Copy files no other handler claims. When false, such files are an error.
opaque_fallback = true

# ---------------------------------------------------------------------------
# Filters (regular expressions matched against file names)
# ---------------------------------------------------------------------------
[filters]
# Never planned or copied.
ignore = ['^\.']

# Planned and copied, but hidden from navigation. Veiled directories get no
# synthesized listing page.
veil = ['^_']

# ---------------------------------------------------------------------------
# Images
# ---------------------------------------------------------------------------
[images]
# Sources larger than this many bytes are scaled and re-encoded; smaller
# ones are copied as they are.
scale_threshold = 1000000

# Longest edge in pixels after scaling. Images are never upscaled.
max_length = 1920

# Encoding quality (1 = worst, 100 = best).
quality = 85

# Named variants, written next to the image as <stem>-<name>.<ext>.
# [images.aspects.thumb]
# max_length = 400
# quality = 75

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Maximum parallel workers.
# Omit or comment out to auto-detect (= number of CPU cores).
# max_processes = 4
"##
}
