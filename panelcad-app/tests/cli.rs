use std::fs;
use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;

fn panelcad(workdir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("panelcad").expect("binary built");
    cmd.current_dir(workdir)
        .env_remove("PANELCAD_CONFIG")
        .env_remove("RUST_LOG");
    cmd
}

#[test]
fn default_preset_writes_preview_and_document() {
    let dir = tempfile::tempdir().expect("create temp dir");
    panelcad(dir.path())
        .args(["--out", "drawings"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Panel 1200x800 mm"))
        .stdout(predicate::str::contains("Weight: 14.4 kg"))
        .stdout(predicate::str::contains("X 100 from left"));

    let preview = fs::read_to_string(dir.path().join("drawings/preview.svg")).expect("preview");
    assert!(preview.contains("<svg"));
    let document = fs::read_to_string(dir.path().join("drawings/document.svg")).expect("document");
    assert!(document.contains("STANDARD DRAWING"));
}

#[test]
fn spec_file_with_out_of_range_hole_still_renders() {
    let dir = tempfile::tempdir().expect("create temp dir");
    fs::write(
        dir.path().join("panel.toml"),
        "width_mm = 500\nheight_mm = 500\nthickness_mm = 6\n\n[[perforations]]\nx_mm = 600\ny_mm = 250\ndiameter_mm = 50\n",
    )
    .expect("write spec");

    panelcad(dir.path())
        .args(["--spec", "panel.toml", "--out", "out", "--format", "dxf"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Warnings: 1"))
        .stdout(predicate::str::contains("outside the panel"));

    let dxf = fs::read_to_string(dir.path().join("out/document.dxf")).expect("dxf");
    assert!(dxf.contains("CIRCLE"));
    assert!(!dir.path().join("out/preview.svg").exists());
}

#[test]
fn invalid_dimensions_fail_without_output() {
    let dir = tempfile::tempdir().expect("create temp dir");
    fs::write(
        dir.path().join("panel.json"),
        r#"{"width_mm": -10, "height_mm": 800, "thickness_mm": 6}"#,
    )
    .expect("write spec");

    panelcad(dir.path())
        .args(["--spec", "panel.json", "--out", "out"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("width_mm"));
    assert!(!dir.path().join("out").exists());
}

#[test]
fn unknown_preset_is_rejected() {
    let dir = tempfile::tempdir().expect("create temp dir");
    panelcad(dir.path())
        .args(["--preset", "skylight"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("skylight"));
}

#[test]
fn spec_and_preset_conflict() {
    let dir = tempfile::tempdir().expect("create temp dir");
    panelcad(dir.path())
        .args(["--spec", "panel.toml", "--preset", "custom"])
        .assert()
        .failure();
}

#[test]
fn config_file_limits_dimensions() {
    let dir = tempfile::tempdir().expect("create temp dir");
    fs::write(dir.path().join("strict.toml"), "[panel]\nmax_mm = 1000\n").expect("write config");

    panelcad(dir.path())
        .args(["--config", "strict.toml", "--preset", "standard-door", "--out", "out"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("height_mm"));
}

#[test]
fn discovered_config_sets_output_formats() {
    let dir = tempfile::tempdir().expect("create temp dir");
    fs::create_dir(dir.path().join("config")).expect("create config dir");
    fs::write(
        dir.path().join("config/default.toml"),
        "[output]\ndirectory = \"plans\"\nformats = [\"json\"]\n\n[document]\ntitle = \"SHOP DRAWING\"\n",
    )
    .expect("write config");

    panelcad(dir.path())
        .args(["--preset", "window-leaf", "--perforations", "3"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Perforations: 3"));

    let json = fs::read_to_string(dir.path().join("plans/scene.json")).expect("scene json");
    assert!(json.contains("SHOP DRAWING"));
    assert!(json.contains("1200x1200"));
}

#[test]
fn malformed_discovered_config_warns_and_uses_defaults() {
    let dir = tempfile::tempdir().expect("create temp dir");
    let config = dir.path().join("bad.toml");
    fs::write(&config, "[panel]\nmax_mm = \"wide\"\n").expect("write config");

    panelcad(dir.path())
        .env("PANELCAD_CONFIG", &config)
        .args(["--out", "o"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Panel 1200x800 mm"))
        .stderr(predicate::str::contains("使用内建默认值"))
        .stderr(predicate::str::contains("bad.toml"));

    assert!(dir.path().join("o/document.svg").exists());
}

#[test]
fn list_presets_prints_keys() {
    let dir = tempfile::tempdir().expect("create temp dir");
    panelcad(dir.path())
        .arg("--list-presets")
        .assert()
        .success()
        .stdout(predicate::str::contains("standard-door"))
        .stdout(predicate::str::contains("jumbo-sheet"));
}
