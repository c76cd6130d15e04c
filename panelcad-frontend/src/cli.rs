use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use panelcad_config::{AppConfig, OutputFormat};
use panelcad_core::geometry::Axis;
use panelcad_core::panel::RawPanel;
use panelcad_engine::pipeline::PanelRender;
use panelcad_engine::scene::Scene;
use panelcad_io::{DxfWriter, JsonSceneWriter, SceneWriter, SvgWriter, TitleBlock};
use tracing::{info, warn};

use crate::errors::FrontendError;
use crate::loader::{PanelSource, PresetOverrides, load_panel};
use crate::settings::pipeline_from_config;

/// 一次 CLI 运行的输入。
#[derive(Debug, Clone)]
pub struct CliRequest {
    pub source: PanelSource,
    pub overrides: PresetOverrides,
    pub output_dir: PathBuf,
    pub formats: Vec<OutputFormat>,
}

/// 运行结果：计算产物、写出的文件与概览文本。
#[derive(Debug)]
pub struct CliReport {
    pub raw: RawPanel,
    pub render: PanelRender,
    pub written: Vec<PathBuf>,
    pub summary: String,
}

/// 加载输入、计算两种场景并写出请求的格式。
pub fn run(config: &AppConfig, request: &CliRequest) -> Result<CliReport, FrontendError> {
    info!(source = %request.source.describe(), "开始生成图纸");
    let raw = load_panel(&request.source, &config.frontend, request.overrides)?;
    let pipeline = pipeline_from_config(config)?;
    let render = pipeline.render(&raw)?;
    for warning in &render.warnings {
        warn!(%warning, "孔位超出面板范围");
    }

    let sheet = TitleBlock::new(
        &config.document.title,
        &raw.metadata,
        &render.spec,
        &render.metrics,
    );
    let written = write_outputs(&render, &sheet, &request.output_dir, &request.formats)?;
    let summary = format_summary(&request.source, &render, &written);

    Ok(CliReport {
        raw,
        render,
        written,
        summary,
    })
}

fn write_outputs(
    render: &PanelRender,
    sheet: &TitleBlock,
    output_dir: &Path,
    formats: &[OutputFormat],
) -> Result<Vec<PathBuf>, FrontendError> {
    let mut written = Vec::new();
    let mut save =
        |writer: &dyn SceneWriter, stem: &str, scene: &Scene| -> Result<(), FrontendError> {
            let path = output_dir.join(format!("{stem}.{}", writer.extension()));
            writer.save(scene, sheet, &path)?;
            info!(path = %path.display(), "已写出");
            written.push(path);
            Ok(())
        };

    let mut seen = Vec::new();
    for format in formats {
        if seen.contains(format) {
            continue;
        }
        seen.push(*format);
        match format {
            OutputFormat::Svg => {
                let writer = SvgWriter::new();
                save(&writer, "preview", &render.preview)?;
                save(&writer, "document", &render.document)?;
            }
            OutputFormat::Dxf => save(&DxfWriter::new(), "document", &render.document)?,
            OutputFormat::Json => save(&JsonSceneWriter, "scene", &render.document)?,
        }
    }
    Ok(written)
}

/// 技术概览：尺寸、面积、重量、告警与每个孔位的标注方向。
pub fn format_summary(source: &PanelSource, render: &PanelRender, written: &[PathBuf]) -> String {
    let mut out = String::new();
    let spec = &render.spec;
    let _ = writeln!(out, "Panel {} mm ({})", spec.summary_label(), source.describe());
    let _ = writeln!(out, "  Thickness: {} mm", spec.thickness_mm());
    let _ = writeln!(out, "  Area: {:.2} m2", render.metrics.rounded_area_m2());
    let _ = writeln!(out, "  Weight: {:.1} kg", render.metrics.weight_kg);
    let _ = writeln!(out, "  Perforations: {}", render.perforations.len());
    for perforation in &render.perforations {
        let sides: Vec<String> = render
            .layout
            .callouts_for(perforation.id())
            .map(|callout| {
                format!(
                    "{} {} from {}",
                    callout.axis,
                    callout.label_text,
                    callout.side.describe(callout.axis)
                )
            })
            .collect();
        let _ = writeln!(
            out,
            "    {} at ({}, {}) dia {}: {}",
            perforation.id(),
            perforation.center().component(Axis::X),
            perforation.center().component(Axis::Y),
            perforation.diameter_mm(),
            sides.join(", ")
        );
    }
    if render.warnings.is_empty() {
        let _ = writeln!(out, "  Warnings: none");
    } else {
        let _ = writeln!(out, "  Warnings: {}", render.warnings.len());
        for warning in &render.warnings {
            let _ = writeln!(out, "    - {warning}");
        }
    }
    for path in written {
        let _ = writeln!(out, "  Wrote {}", path.display());
    }
    out
}
