//! Default loading spinner.
//!
//! A ring centered over its positioned parent. It never takes pointer events
//! and never affects layout, so it can sit on top of an image that is still
//! loading.

use maud::{Markup, Render, html};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Spinner {
    pub show: bool,
    /// Outer size in pixels.
    pub size: u32,
    /// Ring thickness in pixels.
    pub thickness: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

impl Spinner {
    pub fn validate(&self) -> Result<(), String> {
        match self.color.as_deref() {
            Some(color) if !is_css_value(color) => {
                Err(format!("spinner color {color:?} is not a single CSS value"))
            }
            _ => Ok(()),
        }
    }
}

impl Default for Spinner {
    fn default() -> Self {
        Self {
            show: true,
            size: 100,
            thickness: 4,
            color: None,
        }
    }
}

impl Render for Spinner {
    fn render(&self) -> Markup {
        let container = format!(
            "opacity: {}; position: absolute; top: 50%; left: 50%; \
             transform: translate(-50%, -50%); pointer-events: none; transition: opacity 0.3s;",
            u8::from(self.show)
        );
        let inner = format!(
            "display: inline-block; position: relative; width: {size}px; height: {size}px;",
            size = self.size
        );
        let circle = format!(
            "position: absolute; border: {}px solid {}; border-radius: 50%;",
            self.thickness,
            self.color.as_deref().filter(|c| is_css_value(c)).unwrap_or("white")
        );
        html! {
            div.spinner style=(container) aria-hidden="true" {
                div.spinner-inner style=(inner) {
                    div.spinner-circle style=(circle) {}
                }
            }
        }
    }
}

/// Whether `value` fits inside one inline `style` declaration without
/// ending it or opening a block.
pub fn is_css_value(value: &str) -> bool {
    !value.trim().is_empty()
        && !value.contains([';', '{', '}'])
        && !value.chars().any(char::is_control)
}
