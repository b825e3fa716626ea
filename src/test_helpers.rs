//! Shared test utilities.
//!
//! Provides a fixed-state [`ImageElement`], a status recorder that binds
//! itself to a [`StatusHandler`], and the two-breakpoint fixture most picture
//! tests start from.
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let picture = mobile_desktop_picture();
//! let mut instance = picture.mount(DELAY);
//! let seen = record_statuses(instance.handler());
//! ```

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use crate::media::MediaQueryBinding;
use crate::picture::PlainPicture;
use crate::status::{ImageElement, OnStatusChange, StatusHandler};
use crate::types::LoadStatus;

pub const DELAY: Duration = Duration::from_millis(100);

// =========================================================================
// Elements
// =========================================================================

/// An element whose state never changes on its own.
#[derive(Debug, Clone, Default)]
pub struct StaticElement {
    pub src: Option<String>,
    pub complete: bool,
}

impl StaticElement {
    pub fn complete(src: &str) -> Self {
        Self {
            src: Some(src.to_string()),
            complete: true,
        }
    }

    pub fn pending(src: &str) -> Self {
        Self {
            src: Some(src.to_string()),
            complete: false,
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }
}

impl ImageElement for StaticElement {
    fn current_src(&self) -> Option<&str> {
        self.src.as_deref()
    }

    fn is_complete(&self) -> bool {
        self.complete
    }
}

// =========================================================================
// Status recording
// =========================================================================

/// A callback that appends every status it receives.
pub fn recorder() -> (OnStatusChange, Rc<RefCell<Vec<LoadStatus>>>) {
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    let callback = OnStatusChange::new(move |status| sink.borrow_mut().push(status));
    (callback, seen)
}

/// Bind a fresh recorder to `handler` and return what it records.
pub fn record_statuses(handler: &StatusHandler) -> Rc<RefCell<Vec<LoadStatus>>> {
    let (callback, seen) = recorder();
    handler.bind(Some(callback));
    seen
}

// =========================================================================
// Fixtures
// =========================================================================

pub fn mobile_desktop_bindings() -> Vec<MediaQueryBinding> {
    vec![
        MediaQueryBinding::new("mobile", "(max-width:600px)"),
        MediaQueryBinding::new("desktop", "(min-width:601px)"),
    ]
}

pub fn mobile_desktop_picture() -> PlainPicture {
    PlainPicture::new(mobile_desktop_bindings())
}
