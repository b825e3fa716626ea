//! CLI output formatting.
//!
//! Each command has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure: no I/O, no side effects.
//!
//! # Output Format
//!
//! ## Breakpoints
//!
//! ```text
//! Breakpoints
//! 001 mobile
//!     (max-width: 767.98px)
//! 002 noMobile
//!     (min-width: 768px)
//! ```
//!
//! ## Render (resolved)
//!
//! ```text
//! Sources
//! 001 image/webp (max-width: 767.98px)
//!     a.webp 1x, a@2x.webp 2x
//! 002 image/jpeg (max-width: 767.98px)
//!     a.jpg 1x
//! Image
//!     src: a.jpg
//!     alt: Dunes
//!     loading: lazy
//! ```
//!
//! ## Simulate
//!
//! ```text
//! 001 render → loading (cycle #1, 1 command)
//! 002 finish → success (cycle #1, 1 command)
//! Statuses: loading → success
//! Delivered 1 event, dropped 0
//! ```

use crate::media::{BuildMode, MediaQueryBinding, WidthRule};
use crate::picture::ResolvedPicture;
use crate::simulate::SimulationReport;

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

fn plural(n: usize, word: &str) -> String {
    if n == 1 {
        format!("{n} {word}")
    } else {
        format!("{n} {word}s")
    }
}

// ============================================================================
// Breakpoints
// ============================================================================

pub fn format_bindings(bindings: &[MediaQueryBinding]) -> Vec<String> {
    let mut lines = vec!["Breakpoints".to_string()];
    if bindings.is_empty() {
        lines.push(format!("{}(none)", indent(1)));
    }
    for (i, binding) in bindings.iter().enumerate() {
        lines.push(format!("{} {}", format_index(i + 1), binding.name));
        lines.push(format!("{}{}", indent(1), binding.query));
    }
    lines
}

pub fn print_bindings(bindings: &[MediaQueryBinding]) {
    for line in format_bindings(bindings) {
        println!("{}", line);
    }
}

/// Stock rules with their queries. Unbounded rules (never stock) print as
/// `(unbounded)` instead of failing.
pub fn format_stock_rules(rules: &[(&str, WidthRule)]) -> Vec<String> {
    let width = rules.iter().map(|(name, _)| name.len()).max().unwrap_or(0);
    rules
        .iter()
        .map(|(name, rule)| {
            let query = rule
                .to_query(name, BuildMode::Production)
                .ok()
                .flatten()
                .unwrap_or_else(|| "(unbounded)".to_string());
            format!("{name:<width$}  {query}")
        })
        .collect()
}

pub fn print_stock_rules(rules: &[(&str, WidthRule)]) {
    for line in format_stock_rules(rules) {
        println!("{}", line);
    }
}

// ============================================================================
// Render
// ============================================================================

pub fn format_resolved(resolved: &ResolvedPicture) -> Vec<String> {
    let mut lines = vec!["Sources".to_string()];
    if resolved.sources.is_empty() {
        lines.push(format!("{}(none)", indent(1)));
    }
    for (i, source) in resolved.sources.iter().enumerate() {
        let mime = source.mime.as_deref().unwrap_or("(unknown type)");
        let header = match &source.media {
            Some(media) => format!("{} {} {}", format_index(i + 1), mime, media),
            None => format!("{} {} (default)", format_index(i + 1), mime),
        };
        lines.push(header);
        lines.push(format!("{}{}", indent(1), source.srcset));
    }

    let image = &resolved.image;
    lines.push("Image".to_string());
    lines.push(format!(
        "{}src: {}",
        indent(1),
        image.src.as_deref().unwrap_or("(none)")
    ));
    if let Some(srcset) = &image.srcset {
        lines.push(format!("{}srcset: {}", indent(1), srcset));
    }
    lines.push(format!("{}alt: {}", indent(1), image.alt));
    lines.push(format!("{}loading: {}", indent(1), image.loading.as_str()));
    lines
}

pub fn print_resolved(resolved: &ResolvedPicture) {
    for line in format_resolved(resolved) {
        println!("{}", line);
    }
}

// ============================================================================
// Simulate
// ============================================================================

pub fn format_simulation(report: &SimulationReport) -> Vec<String> {
    let mut lines: Vec<String> = report
        .steps
        .iter()
        .enumerate()
        .map(|(i, step)| {
            format!(
                "{} {} \u{2192} {} (cycle #{}, {})",
                format_index(i + 1),
                step.action,
                step.status,
                step.cycle,
                plural(step.commands, "command")
            )
        })
        .collect();

    let statuses = if report.statuses.is_empty() {
        "(none)".to_string()
    } else {
        report
            .statuses
            .iter()
            .map(|s| s.as_str())
            .collect::<Vec<_>>()
            .join(" \u{2192} ")
    };
    lines.push(format!("Statuses: {statuses}"));
    lines.push(format!(
        "Delivered {}, dropped {}",
        plural(report.delivered, "event"),
        report.dropped
    ));
    lines
}

pub fn print_simulation(report: &SimulationReport) {
    for line in format_simulation(report) {
        println!("{}", line);
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::ImageProps;
    use crate::simulate::StepReport;
    use crate::source::SourceDecl;
    use crate::types::{LoadStatus, Loading};

    #[test]
    fn format_index_pads() {
        assert_eq!(format_index(1), "001");
        assert_eq!(format_index(42), "042");
        assert_eq!(format_index(100), "100");
    }

    #[test]
    fn plural_forms() {
        assert_eq!(plural(1, "event"), "1 event");
        assert_eq!(plural(0, "event"), "0 events");
    }

    #[test]
    fn bindings_listing() {
        let lines = format_bindings(&[
            MediaQueryBinding::new("mobile", "(max-width: 767.98px)"),
            MediaQueryBinding::new("noMobile", "(min-width: 768px)"),
        ]);
        assert_eq!(
            lines,
            vec![
                "Breakpoints",
                "001 mobile",
                "    (max-width: 767.98px)",
                "002 noMobile",
                "    (min-width: 768px)",
            ]
        );
    }

    #[test]
    fn empty_bindings_listing() {
        assert_eq!(format_bindings(&[]), vec!["Breakpoints", "    (none)"]);
    }

    #[test]
    fn stock_rules_are_aligned() {
        let lines = format_stock_rules(&[
            ("mobile", WidthRule::down(768)),
            ("desktopOnly", WidthRule::up(1500)),
            ("broken", WidthRule::default()),
        ]);
        assert_eq!(lines[0], "mobile       (max-width: 767.98px)");
        assert_eq!(lines[1], "desktopOnly  (min-width: 1500px)");
        assert_eq!(lines[2], "broken       (unbounded)");
    }

    #[test]
    fn resolved_listing() {
        let resolved = ResolvedPicture {
            sources: vec![
                SourceDecl::new(&["a.webp"], Some("(max-width:600px)"), false, None).unwrap(),
                SourceDecl::new(&["d.webp"], None, false, None).unwrap(),
            ],
            image: ImageProps {
                src: Some("a.jpg".into()),
                srcset: Some("a@2x.jpg 2x".into()),
                alt: "Dunes".into(),
                loading: Loading::Lazy,
                ..Default::default()
            },
        };
        assert_eq!(
            format_resolved(&resolved),
            vec![
                "Sources",
                "001 image/webp (max-width:600px)",
                "    a.webp 1x",
                "002 image/webp (default)",
                "    d.webp 1x",
                "Image",
                "    src: a.jpg",
                "    srcset: a@2x.jpg 2x",
                "    alt: Dunes",
                "    loading: lazy",
            ]
        );
    }

    #[test]
    fn resolved_without_sources() {
        let resolved = ResolvedPicture {
            sources: vec![],
            image: ImageProps::default(),
        };
        let lines = format_resolved(&resolved);
        assert_eq!(lines[1], "    (none)");
        assert!(lines.contains(&"    src: (none)".to_string()));
    }

    #[test]
    fn simulation_listing() {
        let report = SimulationReport {
            statuses: vec![LoadStatus::Loading, LoadStatus::Success],
            steps: vec![
                StepReport {
                    action: "render",
                    cycle: 1,
                    status: LoadStatus::Loading,
                    commands: 1,
                },
                StepReport {
                    action: "finish",
                    cycle: 1,
                    status: LoadStatus::Success,
                    commands: 1,
                },
            ],
            delivered: 1,
            dropped: 0,
        };
        assert_eq!(
            format_simulation(&report),
            vec![
                "001 render \u{2192} loading (cycle #1, 1 command)",
                "002 finish \u{2192} success (cycle #1, 1 command)",
                "Statuses: loading \u{2192} success",
                "Delivered 1 event, dropped 0",
            ]
        );
    }

    #[test]
    fn simulation_without_statuses() {
        let lines = format_simulation(&SimulationReport::default());
        assert_eq!(lines, vec!["Statuses: (none)", "Delivered 0 events, dropped 0"]);
    }
}
