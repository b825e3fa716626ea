//! Breakpoints and media queries.
//!
//! A breakpoint is a named media condition. Pictures take an ordered list of
//! [`MediaQueryBinding`]s and emit one source group per binding, so the order
//! here is the order browsers evaluate `<source media>` candidates.
//!
//! ## Width Rules
//!
//! Rules are written desktop-first: a bare `max` means "this width or
//! smaller". Upper bounds are emitted with a `.98` fraction so fractional
//! viewport widths on high-dpi screens never fall between two ranges:
//!
//! ```text
//! { min: 768, max: 1260 }  →  (min-width: 768px) and (max-width: 1259.98px)
//! { min: 768 }             →  (min-width: 768px)
//! { max: 768 }             →  (max-width: 767.98px)
//! ```
//!
//! A rule with neither bound is a configuration mistake. Development builds
//! reject it; production builds log a warning and skip it.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum MediaError {
    #[error("media rule {0:?} has neither \"min\" nor \"max\" width")]
    MissingBounds(String),
}

/// Whether configuration warnings fail fast or are logged and skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum BuildMode {
    Development,
    Production,
}

impl BuildMode {
    /// Development for debug builds, production for release builds.
    pub fn current() -> Self {
        if cfg!(debug_assertions) {
            BuildMode::Development
        } else {
            BuildMode::Production
        }
    }
}

impl Default for BuildMode {
    fn default() -> Self {
        Self::current()
    }
}

/// A named media query. Names are unique after [`dedupe_bindings`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaQueryBinding {
    pub name: String,
    pub query: String,
}

impl MediaQueryBinding {
    pub fn new(name: impl Into<String>, query: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            query: query.into(),
        }
    }
}

/// Collapse duplicate names: the last binding wins, at the position the name
/// was first seen.
pub fn dedupe_bindings(list: impl IntoIterator<Item = MediaQueryBinding>) -> Vec<MediaQueryBinding> {
    let mut result: Vec<MediaQueryBinding> = Vec::new();
    for binding in list {
        match result.iter_mut().find(|b| b.name == binding.name) {
            Some(existing) => existing.query = binding.query,
            None => result.push(binding),
        }
    }
    result
}

/// A min/max viewport width range in CSS pixels. Zero counts as unset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WidthRule {
    pub min: Option<u32>,
    pub max: Option<u32>,
}

impl WidthRule {
    pub fn up(min: u32) -> Self {
        Self {
            min: Some(min),
            max: None,
        }
    }

    pub fn down(max: u32) -> Self {
        Self {
            min: None,
            max: Some(max),
        }
    }

    pub fn between(min: u32, max: u32) -> Self {
        Self {
            min: Some(min),
            max: Some(max),
        }
    }

    /// The media condition for this rule, without the `@media` prefix.
    ///
    /// `name` only labels the error or warning. Returns `Ok(None)` for an
    /// unbounded rule in production mode.
    pub fn to_query(&self, name: &str, mode: BuildMode) -> Result<Option<String>, MediaError> {
        let min = self.min.filter(|&v| v > 0);
        let max = self.max.filter(|&v| v > 0);
        let query = match (min, max) {
            (Some(min), Some(max)) => {
                format!("(min-width: {min}px) and (max-width: {}.98px)", max - 1)
            }
            (Some(min), None) => format!("(min-width: {min}px)"),
            (None, Some(max)) => format!("(max-width: {}.98px)", max - 1),
            (None, None) => {
                return match mode {
                    BuildMode::Development => Err(MediaError::MissingBounds(name.to_string())),
                    BuildMode::Production => {
                        tracing::warn!(rule = name, "media rule has no min or max width, skipping");
                        Ok(None)
                    }
                };
            }
        };
        Ok(Some(query))
    }

    /// The rule as a stylesheet at-rule header, e.g. `@media (min-width: 768px)`.
    pub fn at_rule(&self, name: &str, mode: BuildMode) -> Result<Option<String>, MediaError> {
        Ok(self.to_query(name, mode)?.map(|q| format!("@media {q}")))
    }
}

/// Reference device widths, narrowest first.
///
/// Laptop and desktop are rounded down from 1280 and 1536 to leave room for
/// a 16px scrollbar, which some browsers exclude from media widths.
pub fn stock_breakpoints() -> &'static [(&'static str, u32)] {
    &[
        ("mobileSmall", 320),
        ("mobileMedium", 375),
        ("mobileLarge", 414),
        ("tabletSmall", 768),
        ("tabletLarge", 1024),
        ("laptop", 1260),
        ("desktop", 1500),
    ]
}

fn width(name: &str) -> u32 {
    stock_breakpoints()
        .iter()
        .find(|(n, _)| *n == name)
        .map(|(_, w)| *w)
        .unwrap_or_default()
}

/// Named rules built on [`stock_breakpoints`].
///
/// Naming follows `{breakpoint}{modifier}`: no modifier means "this size or
/// smaller", `Only` bounds both ends, `Up`-style rules are spelled out
/// (`noMobile`, `desktopOnly`).
pub fn stock_rules() -> Vec<(&'static str, WidthRule)> {
    vec![
        ("mobileSmall", WidthRule::down(width("mobileMedium"))),
        ("mobileMedium", WidthRule::down(width("mobileLarge"))),
        (
            "mobileMediumOnly",
            WidthRule::between(width("mobileSmall"), width("mobileLarge")),
        ),
        ("mobileLarge", WidthRule::down(width("tabletSmall"))),
        (
            "mobileLargeOnly",
            WidthRule::between(width("mobileLarge"), width("tabletSmall")),
        ),
        ("mobile", WidthRule::down(width("tabletSmall"))),
        ("noMobile", WidthRule::up(width("tabletSmall"))),
        ("tabletSmall", WidthRule::down(width("tabletLarge"))),
        (
            "tabletSmallOnly",
            WidthRule::between(width("tabletSmall"), width("tabletLarge")),
        ),
        ("tabletLarge", WidthRule::down(width("laptop"))),
        (
            "tabletLargeOnly",
            WidthRule::between(width("tabletLarge"), width("laptop")),
        ),
        ("tablet", WidthRule::down(width("laptop"))),
        (
            "tabletOnly",
            WidthRule::between(width("tabletSmall"), width("laptop")),
        ),
        ("laptop", WidthRule::down(width("desktop"))),
        (
            "laptopOnly",
            WidthRule::between(width("laptop"), width("desktop")),
        ),
        ("desktopOnly", WidthRule::up(width("desktop"))),
    ]
}
