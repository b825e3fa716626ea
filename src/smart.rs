//! Status-aware picture wrapper.
//!
//! Wraps a [`PlainPicture`] in a container that reacts to the load status:
//! while the image is loading it can show a spinner, paint a placeholder
//! background, and hide the half-loaded image. The container only reserves
//! space when both `width` and `height` are given; the spinner is absolutely
//! positioned and never pushes the image around.

use crate::content::Content;
use crate::picture::{PictureInstance, PictureProps, PlainPicture};
use crate::spinner::{Spinner, is_css_value};
use crate::status::{Command, Cycle, ElementEvent, ImageElement, OnStatusChange};
use crate::types::LoadStatus;
use maud::{Markup, Render, html};
use thiserror::Error;
use serde::Deserialize;
use std::cell::Cell;
use std::rc::Rc;
use std::time::Duration;

#[derive(Error, Debug)]
pub enum SmartError {
    #[error("invalid options: {0}")]
    InvalidOptions(String),
}

/// Overlay options for a status-aware picture.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SmartOptions {
    pub class: Option<String>,
    pub use_spinner: bool,
    pub use_placeholder: bool,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub placeholder_color: Option<String>,
    /// Replaces the default spinner; receives `spinner_defaults`.
    #[serde(skip)]
    pub spinner: Option<Content<Spinner>>,
    pub spinner_defaults: Spinner,
}

impl SmartOptions {
    /// Reject colors that would break out of the inline styles they land in.
    pub fn validate(&self) -> Result<(), SmartError> {
        if let Some(color) = self.placeholder_color.as_deref() {
            if !is_css_value(color) {
                return Err(SmartError::InvalidOptions(format!(
                    "placeholder_color {color:?} is not a single CSS value"
                )));
            }
        }
        self.spinner_defaults.validate().map_err(SmartError::InvalidOptions)
    }
}

/// Props for a status-aware picture, as read from a props file:
///
/// ```toml
/// [picture]
/// alt = "Dunes"
/// loading = "lazy"
///
/// [picture.images.mobile]
/// plain = "dunes-640.jpg"
///
/// [options]
/// use_spinner = true
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SmartProps {
    pub picture: PictureProps,
    pub options: SmartOptions,
}

/// Factory for status-aware pictures.
#[derive(Debug, Clone)]
pub struct SmartPicture {
    plain: PlainPicture,
}

impl SmartPicture {
    pub fn new(plain: PlainPicture) -> Self {
        Self { plain }
    }

    pub fn mount(&self, recheck_delay: Duration) -> SmartInstance {
        SmartInstance {
            inner: self.plain.mount(recheck_delay),
            status: Rc::new(Cell::new(LoadStatus::Idle)),
        }
    }
}

/// A mounted status-aware picture.
#[derive(Debug)]
pub struct SmartInstance {
    inner: PictureInstance,
    status: Rc<Cell<LoadStatus>>,
}

impl SmartInstance {
    pub fn render(&mut self, props: &SmartProps) -> Markup {
        let status = self.status.get();
        let is_loading = status == LoadStatus::Loading;
        let options = &props.options;

        let local = Rc::clone(&self.status);
        let forward = props.picture.on_status_change.clone();
        let merged = OnStatusChange::new(move |status| {
            local.set(status);
            if let Some(forward) = &forward {
                forward.call(status);
            }
        });

        let mut picture = props.picture.clone();
        picture.on_status_change = Some(merged);
        if is_loading && (options.use_spinner || options.use_placeholder) {
            picture.image_style = Some(append_declaration(
                picture.image_style.as_deref().unwrap_or(""),
                "opacity: 0;",
            ));
        }

        let background = if is_loading && options.use_placeholder {
            options
                .placeholder_color
                .as_deref()
                .filter(|c| is_css_value(c))
                .unwrap_or("transparent")
        } else {
            "transparent"
        };
        let mut style = format!(
            "position: relative; display: flex; align-items: center; justify-content: center; \
             transition: background-color 0.3s; background-color: {background};"
        );
        if let (Some(width), Some(height)) = (options.width, options.height) {
            style.push_str(&format!(" width: {width}px; height: {height}px;"));
        }

        let class = match options.class.as_deref() {
            Some(extra) if !extra.is_empty() => format!("picture-container {extra}"),
            _ => "picture-container".to_string(),
        };

        let spinner = (is_loading && options.use_spinner).then(|| match &options.spinner {
            Some(content) => content.render(&options.spinner_defaults),
            None => options.spinner_defaults.render(),
        });

        html! {
            div class=(class)
                style=(style)
                data-picture-loading=(is_loading.to_string())
                data-picture-status=(status.as_str()) {
                @if let Some(spinner) = spinner {
                    (spinner)
                }
                (self.inner.render(&picture))
            }
        }
    }

    pub fn commit(&mut self, props: &SmartProps, element: &impl ImageElement) -> Vec<Command> {
        self.inner.commit(&props.picture, element)
    }

    pub fn dispatch(
        &mut self,
        cycle: Cycle,
        event: ElementEvent,
        element: &impl ImageElement,
    ) -> Vec<Command> {
        self.inner.dispatch(cycle, event, element)
    }

    pub fn unmount(&mut self) -> Vec<Command> {
        self.inner.unmount()
    }

    /// Status as last reported to this wrapper.
    pub fn status(&self) -> LoadStatus {
        self.status.get()
    }

    pub fn is_loading(&self) -> bool {
        self.status.get() == LoadStatus::Loading
    }

    pub fn cycle(&self) -> Cycle {
        self.inner.cycle()
    }
}

/// Append `declaration` to an inline style, closing the last declaration of
/// `style` first when it lacks a `;`.
fn append_declaration(style: &str, declaration: &str) -> String {
    let style = style.trim();
    if style.is_empty() {
        declaration.to_string()
    } else if style.ends_with(';') {
        format!("{style} {declaration}")
    } else {
        format!("{style}; {declaration}")
    }
}
