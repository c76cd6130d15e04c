use std::fmt::{self, Write};

use panelcad_core::geometry::{Rect, Segment};
use panelcad_core::panel::{PanelStyle, Rgb};
use panelcad_engine::scene::{CoordinateSpace, LabelBox, PageFurniture, Scene};

use crate::{IoError, SceneWriter, TitleBlock};

/// 一组描边/填充颜色与线宽。颜色为 SVG 颜色字符串。
#[derive(Debug, Clone, PartialEq)]
pub struct SvgTheme {
    pub background: String,
    /// `None` 表示实心面板使用面板自身颜色。
    pub solid_fill: Option<String>,
    /// `None` 表示面板描边使用面板自身颜色。
    pub outline_stroke: Option<String>,
    pub solid_stroke: String,
    pub outline_width: f64,
    pub solid_width: f64,
    pub hole_fill: String,
    pub hole_stroke: String,
    pub hole_width: f64,
    pub crosshair_width: f64,
    pub crosshair_opacity: f64,
    pub leader_stroke: String,
    pub leader_width: f64,
    pub leader_dash: String,
    pub badge_fill: String,
    pub badge_stroke: String,
    pub badge_text: String,
    pub badge_radius: f64,
    pub overall_fill: String,
    pub overall_stroke: String,
    pub overall_text: String,
    pub overall_radius: f64,
    pub dimension_stroke: String,
}

impl SvgTheme {
    pub fn preview() -> Self {
        Self {
            background: "#ffffff".to_string(),
            solid_fill: None,
            outline_stroke: None,
            solid_stroke: "#0f172a".to_string(),
            outline_width: 3.0,
            solid_width: 2.0,
            hole_fill: "#ffffff".to_string(),
            hole_stroke: "#ef4444".to_string(),
            hole_width: 2.0,
            crosshair_width: 1.0,
            crosshair_opacity: 0.5,
            leader_stroke: "#ef4444".to_string(),
            leader_width: 1.0,
            leader_dash: "4 3".to_string(),
            badge_fill: "#ffffff".to_string(),
            badge_stroke: "#ef4444".to_string(),
            badge_text: "#ef4444".to_string(),
            badge_radius: 4.0,
            overall_fill: "#f8f9fa".to_string(),
            overall_stroke: "#1e293b".to_string(),
            overall_text: "#1e293b".to_string(),
            overall_radius: 6.0,
            dimension_stroke: "#94a3b8".to_string(),
        }
    }

    pub fn document() -> Self {
        Self {
            background: "#ffffff".to_string(),
            solid_fill: Some("#d3d3d3".to_string()),
            outline_stroke: Some("#000000".to_string()),
            solid_stroke: "#000000".to_string(),
            outline_width: 3.0,
            solid_width: 2.0,
            hole_fill: "#ffffff".to_string(),
            hole_stroke: "#000000".to_string(),
            hole_width: 1.5,
            crosshair_width: 0.5,
            crosshair_opacity: 1.0,
            leader_stroke: "#000000".to_string(),
            leader_width: 0.8,
            leader_dash: "2 2".to_string(),
            badge_fill: "#ffffff".to_string(),
            badge_stroke: "#000000".to_string(),
            badge_text: "#000000".to_string(),
            badge_radius: 0.0,
            overall_fill: "#ffffff".to_string(),
            overall_stroke: "#000000".to_string(),
            overall_text: "#000000".to_string(),
            overall_radius: 4.0,
            dimension_stroke: "#000000".to_string(),
        }
    }
}

/// 按场景坐标空间自动选择主题：预览为彩色徽标，图纸为黑白技术制图。
#[derive(Debug, Clone, PartialEq)]
pub struct SvgWriter {
    pub preview: SvgTheme,
    pub document: SvgTheme,
}

impl Default for SvgWriter {
    fn default() -> Self {
        Self {
            preview: SvgTheme::preview(),
            document: SvgTheme::document(),
        }
    }
}

impl SvgWriter {
    pub fn new() -> Self {
        Self::default()
    }

    fn theme_for(&self, space: CoordinateSpace) -> &SvgTheme {
        match space {
            CoordinateSpace::PreviewPixels => &self.preview,
            CoordinateSpace::DocumentPoints => &self.document,
        }
    }
}

impl SceneWriter for SvgWriter {
    fn extension(&self) -> &'static str {
        "svg"
    }

    fn render(&self, scene: &Scene, sheet: &TitleBlock) -> Result<String, IoError> {
        let mut out = String::new();
        write_svg(&mut out, scene, sheet, self.theme_for(scene.space)).map_err(|err| {
            IoError::Encode {
                format: "svg",
                message: err.to_string(),
            }
        })?;
        Ok(out)
    }
}

fn write_svg(
    out: &mut String,
    scene: &Scene,
    sheet: &TitleBlock,
    theme: &SvgTheme,
) -> fmt::Result {
    let canvas = scene.canvas;
    writeln!(out, r#"<?xml version="1.0" encoding="UTF-8"?>"#)?;
    writeln!(
        out,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}" font-family="Helvetica, Arial, sans-serif">"#,
        w = num(canvas.width),
        h = num(canvas.height)
    )?;
    writeln!(
        out,
        r#"  <rect x="0" y="0" width="{}" height="{}" fill="{}"/>"#,
        num(canvas.width),
        num(canvas.height),
        theme.background
    )?;

    if let Some(page) = &scene.page {
        write_page(out, page, sheet)?;
    }

    write_panel(out, scene, theme)?;

    writeln!(out, r#"  <g id="perforations">"#)?;
    for perforation in &scene.perforations {
        let circle = perforation.circle;
        writeln!(
            out,
            r#"    <circle data-id="{}" cx="{}" cy="{}" r="{}" fill="{}" stroke="{}" stroke-width="{}"/>"#,
            perforation.id.get(),
            num(circle.center.x()),
            num(circle.center.y()),
            num(circle.radius),
            theme.hole_fill,
            theme.hole_stroke,
            num(theme.hole_width)
        )?;
        for segment in &perforation.crosshair {
            write_line(
                out,
                segment,
                &format!(
                    r#"stroke="{}" stroke-width="{}" stroke-opacity="{}""#,
                    theme.hole_stroke,
                    num(theme.crosshair_width),
                    num(theme.crosshair_opacity)
                ),
            )?;
        }
    }
    writeln!(out, "  </g>")?;

    writeln!(out, r#"  <g id="callouts">"#)?;
    let leader_attrs = format!(
        r#"stroke="{}" stroke-width="{}" stroke-dasharray="{}""#,
        theme.leader_stroke,
        num(theme.leader_width),
        theme.leader_dash
    );
    for callout in &scene.callouts {
        write_line(out, &callout.full_leader(), &leader_attrs)?;
    }
    // 标签最后绘制，覆盖在引线之上。
    for callout in &scene.callouts {
        write_label(
            out,
            &callout.label,
            &theme.badge_fill,
            &theme.badge_stroke,
            &theme.badge_text,
            theme.badge_radius,
        )?;
    }
    writeln!(out, "  </g>")?;

    writeln!(out, r#"  <g id="dimensions">"#)?;
    for dimension in &scene.dimensions {
        write_line(
            out,
            &dimension.line,
            &format!(r#"stroke="{}" stroke-width="0.5""#, theme.dimension_stroke),
        )?;
        write_label(
            out,
            &dimension.label,
            &theme.overall_fill,
            &theme.overall_stroke,
            &theme.overall_text,
            theme.overall_radius,
        )?;
    }
    writeln!(out, "  </g>")?;
    writeln!(out, "</svg>")
}

fn write_page(out: &mut String, page: &PageFurniture, sheet: &TitleBlock) -> fmt::Result {
    writeln!(out, r#"  <g id="sheet">"#)?;
    write_rect(out, &page.frame, r##"fill="none" stroke="#000000" stroke-width="3""##)?;
    writeln!(
        out,
        r##"    <text x="{}" y="{}" text-anchor="middle" font-size="22" font-weight="bold" fill="#000000">{}</text>"##,
        num(page.title_anchor.x()),
        num(page.title_anchor.y()),
        escape(&sheet.title)
    )?;
    write_line(out, &page.title_rule, r##"stroke="#000000" stroke-width="1""##)?;

    let lines = sheet.footer_lines();
    let line_height = 14.0;
    let last_baseline = page.frame.bottom() - 20.0;
    for (index, line) in lines.iter().enumerate() {
        let y = last_baseline - (lines.len() - 1 - index) as f64 * line_height;
        writeln!(
            out,
            r##"    <text x="{}" y="{}" text-anchor="middle" font-size="9" fill="#000000">{}</text>"##,
            num(page.title_anchor.x()),
            num(y),
            escape(line)
        )?;
    }
    writeln!(out, "  </g>")
}

fn write_panel(out: &mut String, scene: &Scene, theme: &SvgTheme) -> fmt::Result {
    let color = scene.panel.color;
    let attrs = match scene.panel.style {
        PanelStyle::Solid => format!(
            r#"fill="{}" stroke="{}" stroke-width="{}""#,
            theme.solid_fill.clone().unwrap_or_else(|| css_color(color)),
            theme.solid_stroke,
            num(theme.solid_width)
        ),
        PanelStyle::Outline => format!(
            r#"fill="none" stroke="{}" stroke-width="{}""#,
            theme
                .outline_stroke
                .clone()
                .unwrap_or_else(|| css_color(color)),
            num(theme.outline_width)
        ),
    };
    write_rect(out, &scene.panel.rect, &attrs)
}

fn write_label(
    out: &mut String,
    label: &LabelBox,
    fill: &str,
    stroke: &str,
    text_color: &str,
    radius: f64,
) -> fmt::Result {
    let cx = num(label.center.x());
    let cy = num(label.center.y());
    if label.rotation_deg == 0.0 {
        writeln!(out, "    <g>")?;
    } else {
        writeln!(
            out,
            r#"    <g transform="rotate({} {cx} {cy})">"#,
            num(label.rotation_deg)
        )?;
    }
    // 旋转在外层 g 上完成，这里使用未旋转的宽高。
    let rect = Rect::centered(label.center, label.width, label.height);
    writeln!(
        out,
        r#"      <rect x="{}" y="{}" width="{}" height="{}" rx="{}" fill="{fill}" stroke="{stroke}" stroke-width="1"/>"#,
        num(rect.left()),
        num(rect.top()),
        num(rect.width),
        num(rect.height),
        num(radius)
    )?;
    writeln!(
        out,
        r#"      <text x="{cx}" y="{cy}" text-anchor="middle" dominant-baseline="central" font-size="{}" font-weight="bold" fill="{text_color}">{}</text>"#,
        num(label.font_size),
        escape(&label.text)
    )?;
    writeln!(out, "    </g>")
}

fn write_rect(out: &mut String, rect: &Rect, attrs: &str) -> fmt::Result {
    writeln!(
        out,
        r#"    <rect x="{}" y="{}" width="{}" height="{}" {attrs}/>"#,
        num(rect.left()),
        num(rect.top()),
        num(rect.width),
        num(rect.height)
    )
}

fn write_line(out: &mut String, segment: &Segment, attrs: &str) -> fmt::Result {
    writeln!(
        out,
        r#"    <line x1="{}" y1="{}" x2="{}" y2="{}" {attrs}/>"#,
        num(segment.start.x()),
        num(segment.start.y()),
        num(segment.end.x()),
        num(segment.end.y())
    )
}

fn css_color(color: Rgb) -> String {
    color.to_string().to_ascii_lowercase()
}

/// 保留三位小数并去掉多余的零。
fn num(value: f64) -> String {
    let text = format!("{value:.3}");
    let text = text.trim_end_matches('0').trim_end_matches('.');
    if text == "-0" {
        "0".to_string()
    } else {
        text.to_string()
    }
}

fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}
