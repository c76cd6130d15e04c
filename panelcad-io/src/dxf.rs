use std::fmt::{self, Write};

use panelcad_core::geometry::{Point2, Rect, Segment};
use panelcad_engine::scene::{LabelBox, Scene};

use crate::{IoError, SceneWriter, TitleBlock};

pub const LAYER_PANEL: &str = "PANEL";
pub const LAYER_HOLES: &str = "HOLES";
pub const LAYER_DIMENSIONS: &str = "DIMENSIONS";
pub const LAYER_TEXT: &str = "TEXT";
pub const LAYER_FRAME: &str = "FRAME";

/// DXF R12 输出。场景为 y 向下坐标，写出时以画布高度翻转为 y 向上。
#[derive(Debug, Default, Clone, Copy)]
pub struct DxfWriter;

impl DxfWriter {
    pub fn new() -> Self {
        Self
    }
}

impl SceneWriter for DxfWriter {
    fn extension(&self) -> &'static str {
        "dxf"
    }

    fn render(&self, scene: &Scene, sheet: &TitleBlock) -> Result<String, IoError> {
        let mut out = DxfOut {
            buffer: String::new(),
            height: scene.canvas.height,
        };
        out.document(scene, sheet).map_err(|err| IoError::Encode {
            format: "dxf",
            message: err.to_string(),
        })?;
        Ok(out.buffer)
    }
}

struct DxfOut {
    buffer: String,
    /// 画布高度，用于翻转 y。
    height: f64,
}

impl DxfOut {
    fn pair(&mut self, code: u16, value: impl fmt::Display) -> fmt::Result {
        writeln!(self.buffer, "{code}")?;
        writeln!(self.buffer, "{value}")
    }

    fn point(&mut self, x_code: u16, point: Point2) -> fmt::Result {
        let flipped = self.height - point.y();
        self.pair(x_code, format_args!("{:.6}", point.x()))?;
        self.pair(x_code + 10, format_args!("{flipped:.6}"))
    }

    fn document(&mut self, scene: &Scene, sheet: &TitleBlock) -> fmt::Result {
        self.pair(0, "SECTION")?;
        self.pair(2, "HEADER")?;
        self.pair(9, "$ACADVER")?;
        self.pair(1, "AC1009")?;
        self.pair(0, "ENDSEC")?;

        self.pair(0, "SECTION")?;
        self.pair(2, "ENTITIES")?;

        if let Some(page) = &scene.page {
            self.rect(LAYER_FRAME, &page.frame)?;
            self.line(LAYER_FRAME, &page.title_rule)?;
            self.text(LAYER_TEXT, page.title_anchor, 22.0, 0.0, &sheet.title)?;
            let lines = sheet.footer_lines();
            for (index, line) in lines.iter().enumerate() {
                let offset = (lines.len() - 1 - index) as f64 * 14.0;
                let baseline = page.frame.bottom() - 20.0 - offset;
                let anchor = Point2::new(page.title_anchor.x(), baseline);
                self.text(LAYER_TEXT, anchor, 9.0, 0.0, line)?;
            }
        }

        self.rect(LAYER_PANEL, &scene.panel.rect)?;

        for perforation in &scene.perforations {
            self.pair(0, "CIRCLE")?;
            self.pair(8, LAYER_HOLES)?;
            self.point(10, perforation.circle.center)?;
            self.pair(40, format_args!("{:.6}", perforation.circle.radius))?;
            for segment in &perforation.crosshair {
                self.line(LAYER_HOLES, segment)?;
            }
        }

        for callout in &scene.callouts {
            self.line(LAYER_DIMENSIONS, &callout.full_leader())?;
            self.label(&callout.label)?;
        }

        for dimension in &scene.dimensions {
            self.line(LAYER_DIMENSIONS, &dimension.line)?;
            self.label(&dimension.label)?;
        }

        self.pair(0, "ENDSEC")?;
        self.pair(0, "EOF")
    }

    fn line(&mut self, layer: &str, segment: &Segment) -> fmt::Result {
        self.pair(0, "LINE")?;
        self.pair(8, layer)?;
        self.point(10, segment.start)?;
        self.point(11, segment.end)
    }

    fn rect(&mut self, layer: &str, rect: &Rect) -> fmt::Result {
        let corners = [
            Point2::new(rect.left(), rect.top()),
            Point2::new(rect.right(), rect.top()),
            Point2::new(rect.right(), rect.bottom()),
            Point2::new(rect.left(), rect.bottom()),
        ];
        for (index, corner) in corners.iter().enumerate() {
            let next = corners[(index + 1) % corners.len()];
            self.line(layer, &Segment::new(*corner, next))?;
        }
        Ok(())
    }

    fn label(&mut self, label: &LabelBox) -> fmt::Result {
        // y 翻转后旋转方向取反。
        self.text(
            LAYER_TEXT,
            label.center,
            label.font_size,
            -label.rotation_deg,
            &label.text,
        )
    }

    /// 居中对齐的单行文字（72=1 水平居中，73=2 垂直居中）。
    fn text(
        &mut self,
        layer: &str,
        anchor: Point2,
        height: f64,
        rotation: f64,
        content: &str,
    ) -> fmt::Result {
        self.pair(0, "TEXT")?;
        self.pair(8, layer)?;
        self.point(10, anchor)?;
        self.pair(40, format_args!("{height:.6}"))?;
        self.pair(1, content)?;
        if rotation != 0.0 {
            self.pair(50, format_args!("{rotation:.6}"))?;
        }
        self.pair(72, 1)?;
        self.point(11, anchor)?;
        self.pair(73, 2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn points_are_flipped_against_canvas_height() {
        let mut out = DxfOut {
            buffer: String::new(),
            height: 100.0,
        };
        out.point(10, Point2::new(5.0, 30.0)).unwrap();
        assert_eq!(out.buffer, "10\n5.000000\n20\n70.000000\n");
    }

    #[test]
    fn rectangles_become_four_lines() {
        let mut out = DxfOut {
            buffer: String::new(),
            height: 50.0,
        };
        out.rect(LAYER_PANEL, &Rect::new(Point2::new(0.0, 0.0), 10.0, 20.0))
            .unwrap();
        assert_eq!(out.buffer.matches("LINE\n").count(), 4);
        assert_eq!(out.buffer.matches("PANEL\n").count(), 4);
    }
}
