//! # lazy-picture
//!
//! Responsive `<picture>` rendering with load-status tracking for lazily
//! loaded images. Callers describe one image set per breakpoint (plain, 2x,
//! webp, webp 2x); the library emits the `<source>` groups in breakpoint
//! order, renders a fallback `<img>`, and reports whether that image is
//! idle, loading, loaded or broken, even when an external lazy-load script
//! is the one swapping its sources in.
//!
//! # Architecture: Render, Commit, Dispatch
//!
//! Nothing here touches a live document. A mounted picture runs a three-step
//! loop driven by its host:
//!
//! ```text
//! 1. Render    props          →  markup            (pure, rebinds the status callback)
//! 2. Commit    live element   →  commands          (start or keep a tracking cycle)
//! 3. Dispatch  browser event  →  commands, status  (observer, load, error, recheck)
//! ```
//!
//! The host executes the commands and feeds browser callbacks back into
//! step 3. The [`simulate`] module is such a host, scripted from a TOML
//! scenario.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`types`] | Shared data model: per-breakpoint image sets, `LoadStatus`, `Loading` |
//! | [`media`] | Breakpoint bindings, dedup, width rules and the stock rule set |
//! | [`source`] | Resolves one breakpoint's image set into `<source>` elements |
//! | [`image`] | The fallback `<img>` and the lazy placeholder sentinel |
//! | [`status`] | The load-status state machine and its host command protocol |
//! | [`picture`] | Plain picture composer and mounted picture instances |
//! | [`smart`] | Status-aware wrapper: spinner, placeholder, size reservation |
//! | [`spinner`] | Default loading spinner |
//! | [`content`] | Caller content: ready markup or a render function |
//! | [`preloader`] | Splash preloader with a session-wide one-shot flag |
//! | [`link`] | Dynamic route matching, link conversion, active links |
//! | [`simulate`] | Scripted browser host for load-status scenarios |
//! | [`config`] | `lazy-picture.toml` loading, validation and merging |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Cycles Instead of Cleanup Closures
//!
//! Every source value gets a numbered tracking cycle. Commands and events
//! carry that number, so a load event that arrives after the picture moved
//! on (or unmounted) is recognized and dropped. There is no shared "is this
//! still mounted" flag for the host to forget to clear.
//!
//! ## Single-Threaded by Construction
//!
//! Pictures live on the UI thread. Shared state uses `Rc`, `RefCell` and
//! `Cell`, which makes the mounted types `!Send`: moving one across threads
//! is a compile error rather than a race.
//!
//! ## Maud for Markup
//!
//! HTML is generated with [Maud](https://maud.lambda.xyz/). Malformed markup
//! is a build error, and every interpolated URL and alt text is escaped.

pub mod config;
pub mod content;
pub mod image;
pub mod link;
pub mod media;
pub mod output;
pub mod picture;
pub mod preloader;
pub mod simulate;
pub mod smart;
pub mod source;
pub mod spinner;
pub mod status;
pub mod types;

#[cfg(test)]
pub(crate) mod test_helpers;
