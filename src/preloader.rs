//! Splash-screen preloader.
//!
//! The preloader covers the page until the document has loaded, fades out,
//! and is then gone for the rest of the session. Client-side navigations
//! remount it, so "already hidden once" has to outlive any single preloader:
//! that flag lives on [`AppRoot`], which the application creates on first
//! mount and threads through to every preloader.
//!
//! ```text
//! Visible ──content loaded / hidden=true──▶ FadingOut ──animation end──▶ Hidden
//!    ▲                                          │
//!    └──────────────── hidden=false ────────────┘
//! ```

use maud::{Markup, html};
use std::cell::OnceCell;

/// `true` (any case) or `1` enables the preloader.
pub fn is_enabled_flag(value: &str) -> bool {
    value.eq_ignore_ascii_case("true") || value == "1"
}

/// Application-wide state owned by the root component.
#[derive(Debug, Default)]
pub struct AppRoot {
    preloader_hidden: OnceCell<()>,
}

impl AppRoot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a preloader has already faded out in this session.
    pub fn is_preloader_hidden(&self) -> bool {
        self.preloader_hidden.get().is_some()
    }

    /// Record that the preloader has been hidden. Later calls are no-ops.
    pub fn mark_preloader_hidden(&self) {
        let _ = self.preloader_hidden.set(());
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreloaderStatus {
    Visible,
    FadingOut,
    Hidden,
}

/// The document's `readyState`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentState {
    Loading,
    Interactive,
    Complete,
}

/// What the host must do after mounting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MountAction {
    Nothing,
    /// Call [`Preloader::on_content_loaded`] once `DOMContentLoaded` fires.
    AwaitContentLoaded,
}

#[derive(Debug)]
pub struct Preloader {
    status: PreloaderStatus,
    controlled: bool,
    debug: bool,
}

impl Preloader {
    /// `hidden` makes the preloader controlled: its visibility then follows
    /// [`Preloader::set_hidden`] instead of document loading.
    pub fn new(root: &AppRoot, enabled: bool, hidden: Option<bool>) -> Self {
        let visible = match hidden {
            Some(hidden) => !hidden,
            None => enabled && !root.is_preloader_hidden(),
        };
        let status = if visible {
            PreloaderStatus::Visible
        } else {
            PreloaderStatus::Hidden
        };
        Self {
            status,
            controlled: hidden.is_some(),
            debug: false,
        }
    }

    /// Trace status changes.
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        if debug {
            tracing::debug!(controlled = self.controlled, status = ?self.status, "preloader created");
        }
        self
    }

    pub fn status(&self) -> PreloaderStatus {
        self.status
    }

    pub fn is_controlled(&self) -> bool {
        self.controlled
    }

    pub fn mount(&mut self, root: &AppRoot, document: DocumentState) -> MountAction {
        if self.controlled || self.status != PreloaderStatus::Visible {
            return MountAction::Nothing;
        }
        if document == DocumentState::Loading {
            return MountAction::AwaitContentLoaded;
        }
        self.hide(root);
        MountAction::Nothing
    }

    pub fn on_content_loaded(&mut self, root: &AppRoot) {
        if !self.controlled && self.status == PreloaderStatus::Visible {
            self.hide(root);
        }
    }

    /// Controlled update.
    pub fn set_hidden(&mut self, hidden: bool) {
        if !self.controlled {
            return;
        }
        self.set_status(if hidden {
            PreloaderStatus::FadingOut
        } else {
            PreloaderStatus::Visible
        });
    }

    pub fn on_animation_end(&mut self) {
        if self.status == PreloaderStatus::FadingOut {
            self.set_status(PreloaderStatus::Hidden);
        }
    }

    /// `None` once hidden.
    pub fn render(&self, class: Option<&str>) -> Option<Markup> {
        let fade = (self.status == PreloaderStatus::FadingOut).then_some("fade-out");
        let classes: Vec<&str> = [fade, class].into_iter().flatten().collect();
        let class = (!classes.is_empty()).then(|| classes.join(" "));
        match self.status {
            PreloaderStatus::Hidden => None,
            _ => Some(html! {
                div class=[class] data-preloader-overlay {
                    div data-preloader {
                        div data-preloader-item {}
                        div data-preloader-item {}
                    }
                }
            }),
        }
    }

    fn hide(&mut self, root: &AppRoot) {
        self.set_status(PreloaderStatus::FadingOut);
        root.mark_preloader_hidden();
    }

    fn set_status(&mut self, status: PreloaderStatus) {
        if self.debug && status != self.status {
            tracing::debug!(from = ?self.status, to = ?status, "preloader status");
        }
        self.status = status;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enabled_flag_values() {
        assert!(is_enabled_flag("true"));
        assert!(is_enabled_flag("TRUE"));
        assert!(is_enabled_flag("1"));
        assert!(!is_enabled_flag("yes"));
        assert!(!is_enabled_flag(""));
    }

    #[test]
    fn disabled_preloader_starts_hidden() {
        let root = AppRoot::new();
        let preloader = Preloader::new(&root, false, None);
        assert_eq!(preloader.status(), PreloaderStatus::Hidden);
        assert!(preloader.render(None).is_none());
    }

    #[test]
    fn waits_for_content_loaded_while_document_loads() {
        let root = AppRoot::new();
        let mut preloader = Preloader::new(&root, true, None);
        assert_eq!(
            preloader.mount(&root, DocumentState::Loading),
            MountAction::AwaitContentLoaded
        );
        assert_eq!(preloader.status(), PreloaderStatus::Visible);
        assert!(!root.is_preloader_hidden());

        preloader.on_content_loaded(&root);
        assert_eq!(preloader.status(), PreloaderStatus::FadingOut);
        assert!(root.is_preloader_hidden());

        preloader.on_animation_end();
        assert_eq!(preloader.status(), PreloaderStatus::Hidden);
    }

    #[test]
    fn hides_immediately_when_document_ready() {
        let root = AppRoot::new();
        let mut preloader = Preloader::new(&root, true, None);
        assert_eq!(preloader.mount(&root, DocumentState::Interactive), MountAction::Nothing);
        assert_eq!(preloader.status(), PreloaderStatus::FadingOut);
        let html = preloader.render(Some("brand")).unwrap().into_string();
        assert!(html.contains(r#"class="fade-out brand""#));
    }

    #[test]
    fn remount_after_hide_stays_hidden() {
        let root = AppRoot::new();
        let mut first = Preloader::new(&root, true, None);
        first.mount(&root, DocumentState::Complete);

        let second = Preloader::new(&root, true, None);
        assert_eq!(second.status(), PreloaderStatus::Hidden);
    }

    #[test]
    fn controlled_preloader_follows_prop() {
        let root = AppRoot::new();
        let mut preloader = Preloader::new(&root, false, Some(false));
        assert_eq!(preloader.status(), PreloaderStatus::Visible);
        assert_eq!(preloader.mount(&root, DocumentState::Complete), MountAction::Nothing);
        assert_eq!(preloader.status(), PreloaderStatus::Visible);

        preloader.set_hidden(true);
        assert_eq!(preloader.status(), PreloaderStatus::FadingOut);
        preloader.set_hidden(false);
        assert_eq!(preloader.status(), PreloaderStatus::Visible);
        assert!(!root.is_preloader_hidden());
    }

    #[test]
    fn root_flag_is_one_shot() {
        let root = AppRoot::new();
        root.mark_preloader_hidden();
        root.mark_preloader_hidden();
        assert!(root.is_preloader_hidden());
    }

    #[test]
    fn visible_overlay_markup() {
        let root = AppRoot::new();
        let preloader = Preloader::new(&root, true, None).with_debug(true);
        let html = preloader.render(None).unwrap().into_string();
        assert!(html.starts_with("<div data-preloader-overlay>"));
        assert_eq!(html.matches("data-preloader-item").count(), 2);
    }
}
