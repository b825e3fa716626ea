//! Picture configuration module.
//!
//! Handles loading, validating, and merging `lazy-picture.toml`. The file is
//! sparse: it is layered over the stock defaults, so it only needs the keys
//! it wants to override.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! # Breakpoints in source-group order. A name that matches a stock rule
//! # (see `lazy-picture stock-rules`) needs no bounds.
//! [[breakpoints]]
//! name = "mobile"
//!
//! [[breakpoints]]
//! name = "noMobile"
//!
//! # Explicit bounds or a raw query also work:
//! # [[breakpoints]]
//! # name = "wide"
//! # min = 1500
//! #
//! # [[breakpoints]]
//! # name = "print"
//! # query = "print"
//!
//! [lazy]
//! recheck_delay_ms = 100    # Re-inspect a lazy image this long after mount
//!
//! [spinner]
//! size = 100                # Outer size in pixels
//! thickness = 4             # Ring thickness in pixels
//! # color = "white"
//!
//! [placeholder]
//! # color = "#eeeeee"       # Background while loading
//! ```
//!
//! Arrays are replaced, not merged: a config that lists `breakpoints`
//! replaces the stock list entirely. Unknown keys are rejected to catch
//! typos early.

use crate::media::{BuildMode, MediaError, MediaQueryBinding, WidthRule, dedupe_bindings, stock_rules};
use crate::spinner::{Spinner, is_css_value};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

pub const CONFIG_FILE: &str = "lazy-picture.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
    #[error(transparent)]
    Media(#[from] MediaError),
}

/// Configuration loaded from `lazy-picture.toml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PictureConfig {
    /// Breakpoints, in the order pictures emit their source groups.
    pub breakpoints: Vec<BreakpointConfig>,
    pub lazy: LazyConfig,
    /// Defaults for the spinner of status-aware pictures.
    pub spinner: Spinner,
    pub placeholder: PlaceholderConfig,
}

impl Default for PictureConfig {
    fn default() -> Self {
        Self {
            breakpoints: vec![
                BreakpointConfig::named("mobile"),
                BreakpointConfig::named("noMobile"),
            ],
            lazy: LazyConfig::default(),
            spinner: Spinner::default(),
            placeholder: PlaceholderConfig::default(),
        }
    }
}

impl PictureConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for bp in &self.breakpoints {
            if bp.name.trim().is_empty() {
                return Err(ConfigError::Validation(
                    "breakpoints.name must not be empty".into(),
                ));
            }
            if bp.query.is_some() && (bp.min.is_some() || bp.max.is_some()) {
                return Err(ConfigError::Validation(format!(
                    "breakpoint {:?}: use either query or min/max, not both",
                    bp.name
                )));
            }
            // Zero bounds count as absent, as in the rendered query.
            if let (Some(min), Some(max)) = (bp.min.filter(|&v| v > 0), bp.max.filter(|&v| v > 0)) {
                if min >= max {
                    return Err(ConfigError::Validation(format!(
                        "breakpoint {:?}: min must be less than max",
                        bp.name
                    )));
                }
            }
        }
        if self.spinner.size == 0 {
            return Err(ConfigError::Validation(
                "spinner.size must be non-zero".into(),
            ));
        }
        if self.spinner.thickness == 0 {
            return Err(ConfigError::Validation(
                "spinner.thickness must be non-zero".into(),
            ));
        }
        self.spinner.validate().map_err(ConfigError::Validation)?;
        if let Some(color) = self.placeholder.color.as_deref() {
            if !is_css_value(color) {
                return Err(ConfigError::Validation(format!(
                    "placeholder.color {color:?} is not a single CSS value"
                )));
            }
        }
        Ok(())
    }

    /// Resolve breakpoints into deduplicated media-query bindings.
    ///
    /// In production mode an unbounded breakpoint is logged and left out.
    pub fn bindings(&self, mode: BuildMode) -> Result<Vec<MediaQueryBinding>, ConfigError> {
        let mut bindings = Vec::with_capacity(self.breakpoints.len());
        for bp in &self.breakpoints {
            if let Some(query) = bp.query(mode)? {
                bindings.push(MediaQueryBinding::new(&bp.name, query));
            }
        }
        Ok(dedupe_bindings(bindings))
    }

    pub fn recheck_delay(&self) -> Duration {
        Duration::from_millis(self.lazy.recheck_delay_ms)
    }

    /// Base layer for status-aware picture props files: the configured
    /// spinner and placeholder color under `[options]`.
    pub fn smart_props_base(&self) -> toml::Value {
        let mut options = toml::Table::new();
        options.insert(
            "spinner_defaults".to_string(),
            toml::Value::try_from(&self.spinner).expect("spinner must serialize"),
        );
        if let Some(color) = &self.placeholder.color {
            options.insert(
                "placeholder_color".to_string(),
                toml::Value::String(color.clone()),
            );
        }
        let mut base = toml::Table::new();
        base.insert("options".to_string(), toml::Value::Table(options));
        toml::Value::Table(base)
    }
}

/// One `[[breakpoints]]` entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BreakpointConfig {
    pub name: String,
    /// Raw media query, used verbatim.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<u32>,
}

impl BreakpointConfig {
    pub fn named(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Default::default()
        }
    }

    /// The width rule: explicit bounds, else the stock rule of the same name.
    pub fn rule(&self) -> WidthRule {
        if self.min.is_some() || self.max.is_some() {
            return WidthRule {
                min: self.min,
                max: self.max,
            };
        }
        stock_rules()
            .into_iter()
            .find(|(name, _)| *name == self.name)
            .map(|(_, rule)| rule)
            .unwrap_or_default()
    }

    pub fn query(&self, mode: BuildMode) -> Result<Option<String>, MediaError> {
        match &self.query {
            Some(query) => Ok(Some(query.clone())),
            None => self.rule().to_query(&self.name, mode),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LazyConfig {
    /// Delay before a lazy image is re-inspected, in milliseconds.
    pub recheck_delay_ms: u64,
}

impl Default for LazyConfig {
    fn default() -> Self {
        Self {
            recheck_delay_ms: 100,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PlaceholderConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Stock defaults as a TOML value, the base layer for merging.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(PictureConfig::default()).expect("default config must serialize")
}

/// Deep-merge two TOML values. Tables merge recursively; everything else
/// (arrays included) is replaced by the overlay.
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

/// Read `lazy-picture.toml` from `dir` without deserializing it.
pub fn load_raw_config(dir: &Path) -> Result<Option<toml::Value>, ConfigError> {
    let config_path = dir.join(CONFIG_FILE);
    if !config_path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(&config_path)?;
    let value: toml::Value = toml::from_str(&content)?;
    tracing::debug!(path = %config_path.display(), "loaded config");
    Ok(Some(value))
}

pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<PictureConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: PictureConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Stock defaults overlaid with `dir/lazy-picture.toml`, if present.
pub fn load_config(dir: &Path) -> Result<PictureConfig, ConfigError> {
    let base = stock_defaults_value();
    let overlay = load_raw_config(dir)?;
    resolve_config(base, overlay)
}

pub fn stock_config_toml() -> &'static str {
    r##"# lazy-picture Configuration
# ===========================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
# Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Breakpoints
# ---------------------------------------------------------------------------
# Pictures emit one <source> group per breakpoint, in this order. Browsers
# pick the first matching <source>, so list narrow ranges first.
#
# A name that matches a stock rule needs nothing else; run
# `lazy-picture stock-rules` for the list. Otherwise give min/max widths
# in CSS pixels, or a raw media query:
#
#   [[breakpoints]]
#   name = "wide"
#   min = 1500
#
#   [[breakpoints]]
#   name = "print"
#   query = "print"
#
# Listing breakpoints replaces this list entirely.
[[breakpoints]]
name = "mobile"

[[breakpoints]]
name = "noMobile"

# ---------------------------------------------------------------------------
# Lazy loading
# ---------------------------------------------------------------------------
[lazy]
# Re-inspect a lazy image this long after mount, in case the lazy-load
# agent promoted it before the attribute observer was attached.
recheck_delay_ms = 100

# ---------------------------------------------------------------------------
# Spinner (status-aware pictures)
# ---------------------------------------------------------------------------
[spinner]
show = true
size = 100
thickness = 4
# color = "white"

# ---------------------------------------------------------------------------
# Placeholder (status-aware pictures)
# ---------------------------------------------------------------------------
[placeholder]
# Background color of the picture container while the image loads.
# color = "#eeeeee"
"##
}
