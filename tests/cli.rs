//! End-to-end tests for the `lazy-picture` binary.
//!
//! Every test works in its own temp directory: config, props and scenario
//! files are written there and passed by path.

use std::fs;
use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;

const PROPS: &str = r#"
alt = "Dunes"

[images.mobile]
plain = "a.jpg"
webp = "a.webp"

[images.noMobile]
plain = "b.jpg"
"#;

fn run(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_lazy-picture"))
        .arg("--config-dir")
        .arg(dir)
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .expect("failed to run lazy-picture")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn write(dir: &Path, name: &str, content: &str) -> String {
    let path = dir.join(name);
    fs::write(&path, content).unwrap();
    path.to_str().unwrap().to_string()
}

// ---------------------------------------------------------------------------
// Config commands
// ---------------------------------------------------------------------------

#[test]
fn gen_config_prints_stock_file() {
    let tmp = TempDir::new().unwrap();
    let output = run(tmp.path(), &["gen-config"]);
    assert!(output.status.success());
    let out = stdout(&output);
    assert!(out.contains("[[breakpoints]]"));
    assert!(out.contains("recheck_delay_ms = 100"));
}

#[test]
fn gen_config_output_is_a_valid_config() {
    let tmp = TempDir::new().unwrap();
    let generated = stdout(&run(tmp.path(), &["gen-config"]));
    write(tmp.path(), "lazy-picture.toml", &generated);
    let output = run(tmp.path(), &["check"]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    assert!(stdout(&output).contains("==> Config is valid"));
}

#[test]
fn stock_rules_lists_queries() {
    let tmp = TempDir::new().unwrap();
    let out = stdout(&run(tmp.path(), &["stock-rules"]));
    let mobile = out
        .lines()
        .find(|l| l.starts_with("mobile "))
        .expect("mobile rule listed");
    assert!(mobile.ends_with("(max-width: 767.98px)"));
    assert!(out.contains("desktopOnly"));
}

#[test]
fn breakpoints_use_config_file() {
    let tmp = TempDir::new().unwrap();
    write(
        tmp.path(),
        "lazy-picture.toml",
        "[[breakpoints]]\nname = \"narrow\"\nmax = 600\n\n[[breakpoints]]\nname = \"print\"\nquery = \"print\"\n",
    );
    let out = stdout(&run(tmp.path(), &["breakpoints"]));
    assert_eq!(
        out.lines().collect::<Vec<_>>(),
        vec![
            "Breakpoints",
            "001 narrow",
            "    (max-width: 599.98px)",
            "002 print",
            "    print",
        ]
    );
}

#[test]
fn unbounded_breakpoint_depends_on_mode() {
    let tmp = TempDir::new().unwrap();
    write(tmp.path(), "lazy-picture.toml", "[[breakpoints]]\nname = \"mystery\"\n");

    let dev = run(tmp.path(), &["--mode", "development", "check"]);
    assert!(!dev.status.success());
    assert!(String::from_utf8_lossy(&dev.stderr).contains("mystery"));

    let prod = run(tmp.path(), &["--mode", "production", "check"]);
    assert!(prod.status.success());
    assert!(stdout(&prod).contains("(none)"));
}

#[test]
fn unknown_config_key_fails() {
    let tmp = TempDir::new().unwrap();
    write(tmp.path(), "lazy-picture.toml", "[lazy]\ndelay = 5\n");
    assert!(!run(tmp.path(), &["check"]).status.success());
}

// ---------------------------------------------------------------------------
// Render
// ---------------------------------------------------------------------------

#[test]
fn render_prints_picture_markup() {
    let tmp = TempDir::new().unwrap();
    let props = write(tmp.path(), "props.toml", PROPS);
    let output = run(tmp.path(), &["render", &props]);
    assert!(output.status.success());
    let html = stdout(&output);
    assert!(html.starts_with("<picture>"));
    assert!(html.contains(
        r#"<source media="(max-width: 767.98px)" srcset="a.webp 1x" type="image/webp">"#
    ));
    assert!(html.contains(r#"<img src="a.jpg" alt="Dunes">"#));
}

#[test]
fn render_json_resolves_fallback_from_first_breakpoint() {
    let tmp = TempDir::new().unwrap();
    let props = write(tmp.path(), "props.toml", PROPS);
    let output = run(tmp.path(), &["render", &props, "--json"]);
    assert!(output.status.success());
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["image"]["src"], "a.jpg");
    assert_eq!(json["sources"].as_array().unwrap().len(), 3);
    assert_eq!(json["sources"][0]["type"], "image/webp");
}

#[test]
fn render_summary_lists_sources() {
    let tmp = TempDir::new().unwrap();
    let props = write(tmp.path(), "props.toml", PROPS);
    let out = stdout(&run(tmp.path(), &["render", &props, "--summary"]));
    assert!(out.starts_with("Sources\n001 image/webp (max-width: 767.98px)"));
    assert!(out.contains("    src: a.jpg"));
}

#[test]
fn render_smart_wraps_in_container() {
    let tmp = TempDir::new().unwrap();
    write(tmp.path(), "lazy-picture.toml", "[placeholder]\ncolor = \"#eee\"\n");
    let props = write(
        tmp.path(),
        "props.toml",
        "[picture]\nsrc = \"a.jpg\"\n\n[options]\nuse_placeholder = true\nwidth = 320\nheight = 200\n",
    );
    let output = run(tmp.path(), &["render", &props, "--smart"]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    let html = stdout(&output);
    assert!(html.starts_with(r#"<div class="picture-container""#));
    assert!(html.contains("width: 320px; height: 200px;"));
    assert!(html.contains(r#"data-picture-status="idle""#));
}

#[test]
fn render_smart_rejects_color_that_breaks_style() {
    let tmp = TempDir::new().unwrap();
    let props = write(
        tmp.path(),
        "props.toml",
        "[picture]\nsrc = \"a.jpg\"\n\n[options]\nplaceholder_color = \"red; position: fixed\"\n",
    );
    let output = run(tmp.path(), &["render", &props, "--smart"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("placeholder_color"));
}

#[test]
fn render_rejects_unknown_props() {
    let tmp = TempDir::new().unwrap();
    let props = write(tmp.path(), "props.toml", "source = \"a.jpg\"\n");
    assert!(!run(tmp.path(), &["render", &props]).status.success());
}

// ---------------------------------------------------------------------------
// Simulate
// ---------------------------------------------------------------------------

#[test]
fn simulate_prints_transitions() {
    let tmp = TempDir::new().unwrap();
    let scenario = write(
        tmp.path(),
        "scenario.toml",
        "[[step]]\naction = \"render\"\nsrc = \"a.jpg\"\nlazy = true\n\n\
         [[step]]\naction = \"promote\"\n\n\
         [[step]]\naction = \"finish\"\n",
    );
    let output = run(tmp.path(), &["simulate", &scenario]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    let out = stdout(&output);
    assert!(out.contains("Statuses: loading \u{2192} success"));
    assert!(out.contains("003 finish \u{2192} success"));
}

#[test]
fn simulate_json_reports_dropped_events() {
    let tmp = TempDir::new().unwrap();
    let scenario = write(
        tmp.path(),
        "scenario.toml",
        "[[step]]\naction = \"render\"\nsrc = \"a.jpg\"\n\n\
         [[step]]\naction = \"finish\"\ndefer = true\n\n\
         [[step]]\naction = \"unmount\"\n",
    );
    let output = run(tmp.path(), &["simulate", &scenario, "--json"]);
    assert!(output.status.success());
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["statuses"], serde_json::json!(["loading"]));
    assert_eq!(json["dropped"], 1);
}

#[test]
fn simulate_missing_file_fails() {
    let tmp = TempDir::new().unwrap();
    let missing = tmp.path().join("nope.toml");
    let output = run(tmp.path(), &["simulate", missing.to_str().unwrap()]);
    assert!(!output.status.success());
}
