use std::fs;

use panelcad_core::panel::{DrawingMetadata, PanelStyle, RawPanel};
use panelcad_engine::pipeline::{PanelRender, Pipeline};
use panelcad_io::{DxfWriter, JsonSceneWriter, SceneWriter, SvgWriter, TitleBlock};

fn render(raw: &RawPanel) -> PanelRender {
    Pipeline::default().render(raw).expect("render panel")
}

fn sheet(render: &PanelRender, metadata: &DrawingMetadata) -> TitleBlock {
    TitleBlock::new("STANDARD DRAWING", metadata, &render.spec, &render.metrics)
}

#[test]
fn title_block_prefers_metadata_title() {
    let render = render(&RawPanel::new(1200.0, 800.0, 6.0));
    let plain = sheet(&render, &DrawingMetadata::default());
    assert_eq!(plain.title, "STANDARD DRAWING");
    assert_eq!(plain.footer_lines().len(), 1);
    assert!(plain.footer_lines()[0].contains("PANEL 1200x800 mm"));
    assert!(plain.footer_lines()[0].contains("WEIGHT 14.4 kg"));

    let metadata = DrawingMetadata {
        title: Some("Shower <A>".to_string()),
        client: Some("ACME".to_string()),
        reference: Some("R-7".to_string()),
    };
    let titled = sheet(&render, &metadata);
    assert_eq!(titled.title, "Shower <A>");
    assert_eq!(titled.footer_lines()[1], "CLIENT: ACME  |  REF: R-7");
}

#[test]
fn preview_svg_contains_scene_elements() {
    let raw = RawPanel::new(1200.0, 800.0, 6.0)
        .with_style(PanelStyle::Solid)
        .with_perforation(100.0, 100.0, 50.0);
    let render = render(&raw);
    let svg = SvgWriter::new()
        .render(&render.preview, &sheet(&render, &DrawingMetadata::default()))
        .expect("render svg");

    assert!(svg.starts_with("<?xml"));
    assert!(svg.trim_end().ends_with("</svg>"));
    assert!(svg.contains(r##"fill="#1e3a8a""##));
    assert!(svg.contains(r#"data-id="1""#));
    assert!(svg.contains(">1200 mm</text>"));
    assert!(svg.contains(">800 mm</text>"));
    assert!(svg.contains("rotate(-90"));
    assert!(svg.contains(">100</text>"));
    assert!(!svg.contains("STANDARD DRAWING"));
}

#[test]
fn document_svg_has_sheet_and_escaped_title() {
    let raw = RawPanel::new(1200.0, 800.0, 6.0).with_perforation(100.0, 100.0, 50.0);
    let render = render(&raw);
    let metadata = DrawingMetadata {
        title: Some("Shower <A>".to_string()),
        ..DrawingMetadata::default()
    };
    let svg = SvgWriter::new()
        .render(&render.document, &sheet(&render, &metadata))
        .expect("render svg");

    assert!(svg.contains(r#"<g id="sheet">"#));
    assert!(svg.contains("Shower &lt;A&gt;"));
    assert!(svg.contains(r#"stroke-dasharray="2 2""#));
    assert!(svg.contains(r#"width="595.276""#));
}

#[test]
fn dxf_output_is_a_complete_r12_file() {
    let raw = RawPanel::new(500.0, 500.0, 6.0)
        .with_perforation(100.0, 100.0, 40.0)
        .with_perforation(400.0, 250.0, 40.0);
    let render = render(&raw);
    let dxf = DxfWriter::new()
        .render(&render.document, &sheet(&render, &DrawingMetadata::default()))
        .expect("render dxf");

    assert!(dxf.starts_with("0\nSECTION\n2\nHEADER\n"));
    assert!(dxf.contains("AC1009"));
    assert_eq!(dxf.matches("\nCIRCLE\n").count(), 2);
    assert!(dxf.contains("\nSTANDARD DRAWING\n"));
    assert!(dxf.contains("\nDIMENSIONS\n"));
    assert!(dxf.trim_end().ends_with("0\nEOF"));
}

#[test]
fn writers_save_to_disk() {
    let dir = tempfile::tempdir().expect("create temp dir");
    let render = render(&RawPanel::new(900.0, 2100.0, 8.0).with_perforation(100.0, 1050.0, 35.0));
    let sheet = sheet(&render, &DrawingMetadata::default());
    let writers: Vec<Box<dyn SceneWriter>> = vec![
        Box::new(SvgWriter::new()),
        Box::new(DxfWriter::new()),
        Box::new(JsonSceneWriter),
    ];
    for writer in &writers {
        let path = dir
            .path()
            .join("out")
            .join(format!("document.{}", writer.extension()));
        writer
            .save(&render.document, &sheet, &path)
            .expect("save scene");
        let content = fs::read_to_string(&path).expect("read output");
        assert!(!content.is_empty());
    }

    let json = fs::read_to_string(dir.path().join("out/document.json")).expect("read json");
    let value: serde_json::Value = serde_json::from_str(&json).expect("valid json");
    assert_eq!(value["sheet"]["panel"], "900x2100");
    assert_eq!(value["scene"]["space"], "DocumentPoints");
    assert_eq!(value["scene"]["perforations"][0]["id"], 1);
}
