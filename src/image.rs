//! The fallback `<img>` element.
//!
//! ## Placeholder Swap
//!
//! A lazy image keeps the placeholder sentinel in `src` and its real URL in
//! `data-src`. With an empty `src` the browser shows the image while it
//! streams in after the swap; with a placeholder it keeps the placeholder
//! until the new image has fully loaded, and no broken-image icon appears
//! before the lazy-load agent runs.

use crate::types::{LoadStatus, Loading};
use maud::{Markup, Render, html};
use serde::Serialize;

/// Inert 1×1 transparent GIF used as the live `src` of lazy images.
pub const IMAGE_PLACEHOLDER: &str =
    "data:image/gif;base64,R0lGODlhAQABAAAAACH5BAEKAAEALAAAAAABAAEAAAICTAEAOw==";

/// Class the lazy-load agent scans for.
pub const LAZY_CLASS: &str = "lazyload";

/// Class the lazy-load agent adds after promoting `data-src`.
pub const LAZY_LOADED_CLASS: &str = "lazyloaded";

/// Props for the fallback image.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImageProps {
    pub src: Option<String>,
    pub srcset: Option<String>,
    pub alt: String,
    pub class: Option<String>,
    pub style: Option<String>,
    pub loading: Loading,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<LoadStatus>,
}

impl ImageProps {
    /// The value the browser sees in `src` right after rendering.
    pub fn live_src(&self) -> Option<&str> {
        if self.loading.is_lazy() {
            Some(IMAGE_PLACEHOLDER)
        } else {
            self.src.as_deref()
        }
    }

    fn class_list(&self) -> Option<String> {
        let lazy = self.loading.is_lazy().then_some(LAZY_CLASS);
        let classes: Vec<&str> = [self.class.as_deref(), lazy]
            .into_iter()
            .flatten()
            .filter(|c| !c.is_empty())
            .collect();
        (!classes.is_empty()).then(|| classes.join(" "))
    }
}

impl Render for ImageProps {
    fn render(&self) -> Markup {
        let lazy = self.loading.is_lazy();
        let live_srcset = (!lazy).then_some(self.srcset.as_deref()).flatten();
        let data_src = lazy.then_some(self.src.as_deref()).flatten();
        let data_srcset = lazy.then_some(self.srcset.as_deref()).flatten();
        html! {
            img class=[self.class_list()]
                src=[self.live_src()]
                srcset=[live_srcset]
                data-src=[data_src]
                data-srcset=[data_srcset]
                alt=(self.alt)
                style=[self.style.as_deref()]
                data-image-status=[self.status.map(LoadStatus::as_str)];
        }
    }
}
