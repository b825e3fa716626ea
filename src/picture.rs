//! The plain picture composer.
//!
//! A [`PlainPicture`] is built once per set of breakpoints and renders any
//! number of pictures against them:
//!
//! ```text
//! <picture>
//!   <source media=mobile  type=webp>   ┐ one group per breakpoint,
//!   <source media=mobile  type=jpeg>   │ in binding order
//!   <source media=desktop type=jpeg>   ┘
//!   <source type=webp>                 ← default group (no media)
//!   <img src=…>                        ← fallback image
//! </picture>
//! ```
//!
//! Mounting a picture yields a [`PictureInstance`], which pairs the markup
//! with a [`StatusTracker`] for the fallback image.

use crate::image::ImageProps;
use crate::media::{MediaQueryBinding, dedupe_bindings};
use crate::source::{SourceDecl, resolve_group};
use crate::status::{
    Command, Cycle, ElementEvent, ImageElement, OnStatusChange, StatusHandler, StatusTracker,
};
use crate::types::{LoadStatus, Loading, PictureImageSet, present};
use maud::{Markup, html};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::rc::Rc;
use std::time::Duration;

/// Props for one picture.
///
/// `images` is keyed by breakpoint name; names without a binding are
/// ignored. The status callback is never read from files.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PictureProps {
    pub src: Option<String>,
    pub src2x: Option<String>,
    pub src_webp: Option<String>,
    pub src_webp2x: Option<String>,
    pub alt: Option<String>,
    pub class: Option<String>,
    pub image_style: Option<String>,
    pub loading: Loading,
    pub images: BTreeMap<String, PictureImageSet>,
    #[serde(skip)]
    pub on_status_change: Option<OnStatusChange>,
}

impl PictureProps {
    pub fn with_image(mut self, breakpoint: &str, set: PictureImageSet) -> Self {
        self.images.insert(breakpoint.to_string(), set);
        self
    }

    pub fn lazy(mut self) -> Self {
        self.loading = Loading::Lazy;
        self
    }
}

/// Everything a picture renders, before it becomes markup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedPicture {
    pub sources: Vec<SourceDecl>,
    pub image: ImageProps,
}

/// Picture factory bound to an ordered, deduplicated list of breakpoints.
#[derive(Debug, Clone)]
pub struct PlainPicture {
    bindings: Rc<[MediaQueryBinding]>,
}

impl PlainPicture {
    pub fn new(bindings: impl IntoIterator<Item = MediaQueryBinding>) -> Self {
        Self {
            bindings: dedupe_bindings(bindings).into(),
        }
    }

    pub fn bindings(&self) -> &[MediaQueryBinding] {
        &self.bindings
    }

    /// The fallback image source: explicit `src`, else the first `plain`
    /// URL in binding order.
    pub fn default_source<'a>(&self, props: &'a PictureProps) -> Option<&'a str> {
        present(&props.src).or_else(|| {
            self.bindings
                .iter()
                .filter_map(|b| props.images.get(&b.name))
                .find_map(PictureImageSet::plain_url)
        })
    }

    pub fn resolve(&self, props: &PictureProps) -> ResolvedPicture {
        let is_lazy = props.loading.is_lazy();
        let src = self.default_source(props);

        let mut sources: Vec<SourceDecl> = self
            .bindings
            .iter()
            .filter_map(|b| props.images.get(&b.name).map(|set| (b, set)))
            .flat_map(|(b, set)| resolve_group(Some(&b.query), set, is_lazy))
            .collect();

        let src2x = present(&props.src2x);
        let has_default_group =
            src2x.is_some() || present(&props.src_webp).is_some() || present(&props.src_webp2x).is_some();
        if has_default_group {
            let defaults = PictureImageSet {
                plain: src.map(str::to_string),
                plain2x: props.src2x.clone(),
                webp: props.src_webp.clone(),
                webp2x: props.src_webp2x.clone(),
            };
            sources.extend(resolve_group(None, &defaults, is_lazy));
        }

        let image = ImageProps {
            src: src.map(str::to_string),
            srcset: src2x.map(|url| format!("{url} 2x")),
            alt: props.alt.clone().unwrap_or_default(),
            class: None,
            style: props.image_style.clone(),
            loading: props.loading,
            status: None,
        };

        ResolvedPicture { sources, image }
    }

    /// Render markup; `status` becomes the image's `data-image-status`.
    pub fn render(&self, props: &PictureProps, status: Option<LoadStatus>) -> Markup {
        let mut resolved = self.resolve(props);
        resolved.image.status = status;
        html! {
            picture class=[props.class.as_deref()] {
                @for source in &resolved.sources {
                    (source)
                }
                (resolved.image)
            }
        }
    }

    pub fn mount(&self, recheck_delay: Duration) -> PictureInstance {
        PictureInstance {
            picture: self.clone(),
            tracker: StatusTracker::new(recheck_delay),
        }
    }
}

/// A mounted picture: markup plus load-status tracking for its image.
#[derive(Debug)]
pub struct PictureInstance {
    picture: PlainPicture,
    tracker: StatusTracker,
}

impl PictureInstance {
    /// Rebinds the status callback, then renders with the current status.
    pub fn render(&mut self, props: &PictureProps) -> Markup {
        self.tracker.handler().bind(props.on_status_change.clone());
        self.picture.render(props, Some(self.tracker.status()))
    }

    /// Run after the rendered markup is live in the document.
    pub fn commit(&mut self, props: &PictureProps, element: &impl ImageElement) -> Vec<Command> {
        let source = self.picture.default_source(props);
        self.tracker.sync(source, props.loading.is_lazy(), element)
    }

    pub fn dispatch(
        &mut self,
        cycle: Cycle,
        event: ElementEvent,
        element: &impl ImageElement,
    ) -> Vec<Command> {
        self.tracker.dispatch(cycle, event, element)
    }

    pub fn unmount(&mut self) -> Vec<Command> {
        self.tracker.unmount()
    }

    pub fn status(&self) -> LoadStatus {
        self.tracker.status()
    }

    pub fn cycle(&self) -> Cycle {
        self.tracker.cycle()
    }

    pub fn handler(&self) -> &StatusHandler {
        self.tracker.handler()
    }

    pub fn picture(&self) -> &PlainPicture {
        &self.picture
    }
}
