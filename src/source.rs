//! Source-group resolution.
//!
//! Turns one breakpoint's [`PictureImageSet`] into the `<source>` elements
//! of a `<picture>`. Browsers take the first `<source>` whose media and type
//! they support, so webp is always emitted before the plain format.
//!
//! Lazy pictures put their candidates in `data-srcset` instead of `srcset`;
//! the lazy-load agent promotes them once the picture nears the viewport.

use crate::types::PictureImageSet;
use maud::{Markup, Render, html};
use serde::Serialize;

/// Join candidates with density descriptors: `a 1x, b 2x`.
pub fn convert_src_set(list: &[&str]) -> String {
    list.iter()
        .enumerate()
        .map(|(i, url)| format!("{} {}x", url, i + 1))
        .collect::<Vec<_>>()
        .join(", ")
}

/// 1x then 2x. The 2x candidate is dropped without a 1x.
pub fn src_list<'a>(x1: Option<&'a str>, x2: Option<&'a str>) -> Vec<&'a str> {
    match (x1, x2) {
        (Some(a), Some(b)) => vec![a, b],
        (Some(a), None) => vec![a],
        (None, _) => Vec::new(),
    }
}

/// MIME type from the URL's file extension, ignoring query and fragment.
pub fn image_type_from_url(url: &str) -> Option<&'static str> {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    let file = path.rsplit('/').next().unwrap_or(path);
    let (_, ext) = file.rsplit_once('.')?;
    match ext.to_ascii_lowercase().as_str() {
        "jpg" | "jpeg" => Some("image/jpeg"),
        "png" => Some("image/png"),
        "gif" => Some("image/gif"),
        "webp" => Some("image/webp"),
        "avif" => Some("image/avif"),
        "svg" => Some("image/svg+xml"),
        _ => None,
    }
}

/// One `<source>` element.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceDecl {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub media: Option<String>,
    pub srcset: String,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub mime: Option<String>,
    /// Candidates sit in `data-srcset` until the lazy-load agent promotes them.
    pub deferred: bool,
}

impl SourceDecl {
    /// `None` for an empty candidate list.
    pub fn new(
        list: &[&str],
        media: Option<&str>,
        is_lazy: bool,
        type_override: Option<&str>,
    ) -> Option<Self> {
        let first = list.first()?;
        let mime = match type_override {
            Some(t) => Some(t.to_string()),
            None => image_type_from_url(first).map(str::to_string),
        };
        Some(Self {
            media: media.map(str::to_string),
            srcset: convert_src_set(list),
            mime,
            deferred: is_lazy,
        })
    }
}

impl Render for SourceDecl {
    fn render(&self) -> Markup {
        let live = (!self.deferred).then_some(self.srcset.as_str());
        let deferred = self.deferred.then_some(self.srcset.as_str());
        html! {
            source media=[self.media.as_deref()] srcset=[live] data-srcset=[deferred] type=[self.mime.as_deref()];
        }
    }
}

/// Resolve one breakpoint's sources: webp first, then plain.
///
/// Emits nothing when the set has neither `plain` nor `webp`.
pub fn resolve_group(media: Option<&str>, set: &PictureImageSet, is_lazy: bool) -> Vec<SourceDecl> {
    if !set.is_renderable() {
        return Vec::new();
    }
    let webp = src_list(set.webp_url(), set.webp2x_url());
    let plain = src_list(set.plain_url(), set.plain2x_url());
    [webp, plain]
        .iter()
        .filter_map(|list| SourceDecl::new(list, media, is_lazy, None))
        .collect()
}
