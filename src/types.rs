//! Shared types used across the picture layers.
//!
//! These are the values callers hand to the resolver, the composer and the
//! status-aware wrapper. They deserialize from the props files the CLI reads,
//! so every field is optional and unknown keys are rejected.

use serde::{Deserialize, Serialize};
use std::fmt;

/// One breakpoint's candidate image variants.
///
/// A set renders only when `plain` or `webp` is present. The 2x variants are
/// ignored without their 1x counterpart. Empty strings count as absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PictureImageSet {
    pub plain: Option<String>,
    pub plain2x: Option<String>,
    pub webp: Option<String>,
    pub webp2x: Option<String>,
}

impl PictureImageSet {
    /// Shorthand for a set with only a plain 1x URL.
    pub fn plain(url: impl Into<String>) -> Self {
        Self {
            plain: Some(url.into()),
            ..Self::default()
        }
    }

    /// Shorthand for a set with only a webp 1x URL.
    pub fn webp(url: impl Into<String>) -> Self {
        Self {
            webp: Some(url.into()),
            ..Self::default()
        }
    }

    pub fn with_plain2x(mut self, url: impl Into<String>) -> Self {
        self.plain2x = Some(url.into());
        self
    }

    pub fn with_webp(mut self, url: impl Into<String>) -> Self {
        self.webp = Some(url.into());
        self
    }

    pub fn with_webp2x(mut self, url: impl Into<String>) -> Self {
        self.webp2x = Some(url.into());
        self
    }

    pub fn plain_url(&self) -> Option<&str> {
        present(&self.plain)
    }

    pub fn plain2x_url(&self) -> Option<&str> {
        present(&self.plain2x)
    }

    pub fn webp_url(&self) -> Option<&str> {
        present(&self.webp)
    }

    pub fn webp2x_url(&self) -> Option<&str> {
        present(&self.webp2x)
    }

    /// Whether this set produces any `<source>` markup.
    pub fn is_renderable(&self) -> bool {
        self.plain_url().is_some() || self.webp_url().is_some()
    }
}

/// Treat `None` and `Some("")` alike.
pub(crate) fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

/// Normalized image load status.
///
/// `Idle → Loading → {Success | Failure}` within one tracking cycle. A new
/// source value starts a new cycle from `Idle`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoadStatus {
    #[default]
    Idle,
    Loading,
    Success,
    Failure,
}

impl LoadStatus {
    /// Lowercase name used in `data-*-status` attributes.
    pub fn as_str(self) -> &'static str {
        match self {
            LoadStatus::Idle => "idle",
            LoadStatus::Loading => "loading",
            LoadStatus::Success => "success",
            LoadStatus::Failure => "failure",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, LoadStatus::Success | LoadStatus::Failure)
    }
}

impl fmt::Display for LoadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The `loading` prop: eager renders live sources, lazy defers them to the
/// lazy-load agent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Loading {
    #[default]
    Eager,
    Lazy,
}

impl Loading {
    pub fn is_lazy(self) -> bool {
        self == Loading::Lazy
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Loading::Eager => "eager",
            Loading::Lazy => "lazy",
        }
    }
}
