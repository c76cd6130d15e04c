use std::fs;

use panelcad_core::panel::{PanelStyle, RawPanel, Rgb};
use panelcad_io::{IoError, PanelFileFacade, PanelLoader};

#[test]
fn loads_toml_panel_with_defaults() {
    let dir = tempfile::tempdir().expect("create temp dir");
    let path = dir.path().join("door.toml");
    fs::write(
        &path,
        r##"
width_mm = 900
height_mm = 2100
thickness_mm = 8
style = "solid"
color = "#336699"

[metadata]
client = "ACME"

[[perforations]]
x_mm = 100
y_mm = 1050
diameter_mm = 35

[[perforations]]
id = 7
x_mm = 800.5
y_mm = 1050
diameter_mm = 35
"##,
    )
    .expect("write panel file");

    let panel = PanelFileFacade::new().load(&path).expect("load toml");
    assert_eq!(panel.width_mm, 900.0);
    assert_eq!(panel.style, PanelStyle::Solid);
    assert_eq!(panel.color, Rgb::new(0x33, 0x66, 0x99));
    assert_eq!(panel.perforations.len(), 2);
    assert_eq!(panel.perforations[0].id, None);
    assert_eq!(panel.perforations[1].id, Some(7));
    assert_eq!(panel.perforations[1].x_mm, 800.5);
    assert_eq!(panel.metadata.client.as_deref(), Some("ACME"));
    assert_eq!(panel.metadata.title, None);
}

#[test]
fn loads_json_panel() {
    let dir = tempfile::tempdir().expect("create temp dir");
    let path = dir.path().join("panel.json");
    fs::write(
        &path,
        r#"{"width_mm": 1200, "height_mm": 800, "thickness_mm": 6,
            "perforations": [{"x_mm": 100, "y_mm": 100, "diameter_mm": 50}]}"#,
    )
    .expect("write panel file");

    let panel = PanelFileFacade::new().load(&path).expect("load json");
    assert_eq!(panel.style, PanelStyle::Outline);
    assert_eq!(panel.perforations.len(), 1);
}

#[test]
fn save_then_load_keeps_panel() {
    let dir = tempfile::tempdir().expect("create temp dir");
    let panel = RawPanel::new(1500.0, 700.0, 10.0)
        .with_style(PanelStyle::Solid)
        .with_perforation(200.0, 350.0, 60.0);
    let facade = PanelFileFacade::new();
    for name in ["nested/panel.toml", "panel.json"] {
        let path = dir.path().join(name);
        facade.save(&panel, &path).expect("save panel");
        assert_eq!(facade.load(&path).expect("reload panel"), panel);
    }
}

#[test]
fn malformed_and_missing_files_are_reported() {
    let dir = tempfile::tempdir().expect("create temp dir");
    let facade = PanelFileFacade::new();

    let bad = dir.path().join("bad.toml");
    fs::write(&bad, "width_mm = \"wide\"").expect("write file");
    assert!(matches!(
        facade.load(&bad),
        Err(IoError::InvalidPanel { .. })
    ));

    let bad_colour = dir.path().join("colour.json");
    fs::write(
        &bad_colour,
        r#"{"width_mm": 1, "height_mm": 1, "thickness_mm": 1, "color": "blue"}"#,
    )
    .expect("write file");
    assert!(matches!(
        facade.load(&bad_colour),
        Err(IoError::InvalidPanel { .. })
    ));

    assert!(matches!(
        facade.load(&dir.path().join("absent.json")),
        Err(IoError::ReadError { .. })
    ));
    assert!(matches!(
        facade.load(&dir.path().join("panel.yaml")),
        Err(IoError::UnsupportedFeature(_))
    ));
}
