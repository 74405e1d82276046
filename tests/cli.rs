use assert_cmd::prelude::*;
use predicates::str::contains;
use std::io::Write;
use std::process::Command;
use tempfile::{NamedTempFile, TempDir};

fn backdrop(store: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("backdrop-scene").expect("binary exists");
    cmd.env_remove("RUST_LOG")
        .arg("--store")
        .arg(store.path().join("preferences.json"));
    cmd
}

fn config_file(contents: &str) -> NamedTempFile {
    let mut tmp = NamedTempFile::new().expect("temp config");
    tmp.write_all(contents.as_bytes()).expect("write config");
    tmp
}

#[test]
fn summary_reports_the_simulated_run() {
    let store = TempDir::new().expect("temp dir");
    let config = config_file("()");
    backdrop(&store)
        .arg("--config")
        .arg(config.path())
        .args(["--summary-only", "--theme", "dark", "--seed", "42", "--frames", "60"])
        .assert()
        .success()
        .stdout(contains("Backdrop summary"))
        .stdout(contains(" - theme: dark"))
        .stdout(contains(" - seed: 42"))
        .stdout(contains(" - frames: 60"))
        .stdout(contains(" - plane: 2091 vertices, 4000 triangles"))
        .stdout(contains(" - directional intensity: 1.000"))
        .stdout(contains(" - rotation z: 0.0300"));
}

#[test]
fn config_file_shapes_the_plane() {
    let store = TempDir::new().expect("temp dir");
    let config = config_file("(plane: (width_segments: 4, height_segments: 2), seed: Some(5))");
    backdrop(&store)
        .arg("--config")
        .arg(config.path())
        .args(["--summary-only", "--theme", "light", "--frames", "1"])
        .assert()
        .success()
        .stdout(contains(" - seed: 5"))
        .stdout(contains(" - plane: 15 vertices, 16 triangles"))
        .stdout(contains(" - directional intensity: 2.000"));
}

#[test]
fn toggle_starts_a_fade() {
    let store = TempDir::new().expect("temp dir");
    let config = config_file("()");
    backdrop(&store)
        .arg("--config")
        .arg(config.path())
        .args(["--summary-only", "--theme", "dark", "--seed", "1"])
        .args(["--frames", "2", "--toggle-at", "1"])
        .assert()
        .success()
        .stdout(contains(" - theme: light"))
        .stdout(contains(" - directional intensity: 1.050"));
}

#[test]
fn stored_theme_is_used_without_override() {
    let store = TempDir::new().expect("temp dir");
    std::fs::write(
        store.path().join("preferences.json"),
        r#"{ "theme": "dark" }"#,
    )
    .expect("write preferences");
    let config = config_file("()");
    backdrop(&store)
        .arg("--config")
        .arg(config.path())
        .args(["--summary-only", "--seed", "1", "--frames", "1"])
        .assert()
        .success()
        .stdout(contains(" - theme: dark"));
}

#[test]
fn invalid_config_fails() {
    let store = TempDir::new().expect("temp dir");
    let config = config_file("(theme: (smoothing: 0.0))");
    backdrop(&store)
        .arg("--config")
        .arg(config.path())
        .arg("--summary-only")
        .assert()
        .failure()
        .stderr(contains("theme.smoothing"));
}

#[test]
fn unknown_theme_is_rejected() {
    let store = TempDir::new().expect("temp dir");
    backdrop(&store)
        .args(["--summary-only", "--theme", "sepia"])
        .assert()
        .failure()
        .stderr(contains("unknown theme"));
}

#[cfg(target_os = "linux")]
#[test]
fn theme_flag_is_not_saved_without_a_display() {
    let store = TempDir::new().expect("temp dir");
    let config = config_file("()");
    backdrop(&store)
        .env_remove("DISPLAY")
        .env_remove("WAYLAND_DISPLAY")
        .arg("--config")
        .arg(config.path())
        .args(["--theme", "dark", "--seed", "1", "--frames", "1"])
        .assert()
        .success()
        .stderr(contains("No display available"))
        .stdout(contains(" - theme: dark"));
    assert!(!store.path().join("preferences.json").exists());
}
