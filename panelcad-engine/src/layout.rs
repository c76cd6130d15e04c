use panelcad_core::geometry::{Axis, Point2, Segment, Vector2};
use panelcad_core::panel::{PanelSpec, Perforation, PerforationId, format_measure};
use serde::Serialize;
use tracing::debug;

pub const DEFAULT_BASE_GAP: f64 = 30.0;
pub const DEFAULT_GAP_INCREMENT: f64 = 22.0;
pub const DEFAULT_PERPENDICULAR_CLEARANCE: f64 = 40.0;
pub const DEFAULT_LABEL_GAP: f64 = 10.0;
pub const DEFAULT_OVERALL_OUTSET: f64 = 40.0;

/// 标注指向的面板边：`Start` 为左/上边，`End` 为右/下边。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum EdgeSide {
    Start,
    End,
}

impl EdgeSide {
    /// 坐标恰好位于中线时归入 `Start`。
    #[inline]
    pub fn for_coordinate(coordinate: f64, extent: f64) -> Self {
        if coordinate <= extent / 2.0 {
            EdgeSide::Start
        } else {
            EdgeSide::End
        }
    }

    #[inline]
    pub fn edge_coordinate(self, extent: f64) -> f64 {
        match self {
            EdgeSide::Start => 0.0,
            EdgeSide::End => extent,
        }
    }

    /// 离开面板内部的方向符号。
    #[inline]
    pub fn outward_sign(self) -> f64 {
        match self {
            EdgeSide::Start => -1.0,
            EdgeSide::End => 1.0,
        }
    }

    pub fn describe(self, axis: Axis) -> &'static str {
        match (axis, self) {
            (Axis::X, EdgeSide::Start) => "left",
            (Axis::X, EdgeSide::End) => "right",
            (Axis::Y, EdgeSide::Start) => "top",
            (Axis::Y, EdgeSide::End) => "bottom",
        }
    }
}

/// 布局常量。`base_gap`/`gap_increment`/`perpendicular_clearance`/`label_gap`/`overall_outset`
/// 都是标注长度，由场景构建器按视口的标注比例换算，不随面板几何缩放。
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LayoutParams {
    pub base_gap: f64,
    pub gap_increment: f64,
    pub perpendicular_clearance: f64,
    pub label_gap: f64,
    pub overall_outset: f64,
}

impl LayoutParams {
    /// 第 `index` 个孔位的堆叠外伸量，随输入顺序严格递增（要求 `gap_increment > 0`）。
    #[inline]
    pub fn stacking_outset(&self, index: usize) -> f64 {
        self.base_gap + index as f64 * self.gap_increment
    }

    fn callout_outset(&self, axis: Axis, index: usize) -> f64 {
        let outset = self.stacking_outset(index);
        match axis {
            Axis::X => outset + self.perpendicular_clearance,
            Axis::Y => outset,
        }
    }
}

impl Default for LayoutParams {
    fn default() -> Self {
        Self {
            base_gap: DEFAULT_BASE_GAP,
            gap_increment: DEFAULT_GAP_INCREMENT,
            perpendicular_clearance: DEFAULT_PERPENDICULAR_CLEARANCE,
            label_gap: DEFAULT_LABEL_GAP,
            overall_outset: DEFAULT_OVERALL_OUTSET,
        }
    }
}

/// 单个孔位在单根轴上的坐标标注。
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DimensionCallout {
    pub perforation_id: PerforationId,
    /// 孔位在输入列表中的序号。
    pub index: usize,
    pub axis: Axis,
    pub side: EdgeSide,
    /// 孔边界上朝向目标边的点（毫米）。
    pub anchor: Point2,
    /// 目标边上的点（毫米）。
    pub target: Point2,
    /// 引线越过目标边后的外伸长度（标注单位）。
    pub outset: f64,
    /// 引线末端到标签近端的间距（标注单位）。
    pub label_gap: f64,
    pub label_text: String,
}

impl DimensionCallout {
    /// 孔边界到面板边的引线段（毫米）。
    #[inline]
    pub fn leader(&self) -> Segment {
        Segment::new(self.anchor, self.target)
    }

    /// 指向面板外侧的单位向量。
    #[inline]
    pub fn outward(&self) -> Vector2 {
        Vector2::along(self.axis, self.side.outward_sign())
    }

    /// 标签近端距目标边的总距离（标注单位）。
    #[inline]
    pub fn label_offset(&self) -> f64 {
        self.outset + self.label_gap
    }
}

/// 面板整体尺寸标注：宽度位于下边外侧，高度位于左边外侧并旋转 90°。
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PanelOverallDimension {
    /// 被测量的轴。
    pub axis: Axis,
    pub value_mm: f64,
    /// 标注所依附的面板边（毫米）。
    pub edge: Segment,
    /// 外侧方向的单位向量。
    pub outward: Vector2,
    /// 标注单位。
    pub outset: f64,
    pub rotated: bool,
    pub label_text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DimensionLayout {
    pub width_mm: f64,
    pub height_mm: f64,
    pub callouts: Vec<DimensionCallout>,
    pub overall: [PanelOverallDimension; 2],
}

impl DimensionLayout {
    pub fn callout(&self, id: PerforationId, axis: Axis) -> Option<&DimensionCallout> {
        self.callouts
            .iter()
            .find(|callout| callout.perforation_id == id && callout.axis == axis)
    }

    pub fn callouts_for(&self, id: PerforationId) -> impl Iterator<Item = &DimensionCallout> + '_ {
        self.callouts
            .iter()
            .filter(move |callout| callout.perforation_id == id)
    }
}

/// 在面板空间（毫米）内为每个孔位计算 X/Y 标注。输入已通过校验，本函数不会失败。
///
/// 预览与图纸共用同一结果，只在场景构建时换算坐标，因此同一孔位的标注
/// 在两种输出中总是指向同一条边。
pub fn layout_dimensions(
    spec: &PanelSpec,
    perforations: &[Perforation],
    params: &LayoutParams,
) -> DimensionLayout {
    let mut callouts = Vec::with_capacity(perforations.len() * 2);
    for (index, perforation) in perforations.iter().enumerate() {
        for axis in Axis::ALL {
            callouts.push(callout_for(spec, perforation, index, axis, params));
        }
    }

    let overall = overall_dimensions(spec, params);
    debug!(
        callouts = callouts.len(),
        width_mm = spec.width_mm(),
        height_mm = spec.height_mm(),
        "已完成尺寸标注布局"
    );

    DimensionLayout {
        width_mm: spec.width_mm(),
        height_mm: spec.height_mm(),
        callouts,
        overall,
    }
}

fn callout_for(
    spec: &PanelSpec,
    perforation: &Perforation,
    index: usize,
    axis: Axis,
    params: &LayoutParams,
) -> DimensionCallout {
    let center = perforation.center();
    let coordinate = center.component(axis);
    let extent = spec.extent(axis);
    let side = EdgeSide::for_coordinate(coordinate, extent);
    let edge = side.edge_coordinate(extent);

    // 锚点取孔边界上面向目标边的一侧；圆心位于面板外时方向会反转。
    let toward = if edge < coordinate {
        -1.0
    } else if edge > coordinate {
        1.0
    } else {
        side.outward_sign()
    };
    let anchor = center.translate(Vector2::along(axis, toward * perforation.radius_mm()));
    let target = center.with_component(axis, edge);

    DimensionCallout {
        perforation_id: perforation.id(),
        index,
        axis,
        side,
        anchor,
        target,
        outset: params.callout_outset(axis, index),
        label_gap: params.label_gap,
        label_text: format_measure(coordinate),
    }
}

fn overall_dimensions(spec: &PanelSpec, params: &LayoutParams) -> [PanelOverallDimension; 2] {
    let width = spec.width_mm();
    let height = spec.height_mm();
    let width_dimension = PanelOverallDimension {
        axis: Axis::X,
        value_mm: width,
        edge: Segment::new(Point2::new(0.0, height), Point2::new(width, height)),
        outward: Vector2::new(0.0, 1.0),
        outset: params.overall_outset,
        rotated: false,
        label_text: format!("{} mm", format_measure(width)),
    };
    let height_dimension = PanelOverallDimension {
        axis: Axis::Y,
        value_mm: height,
        edge: Segment::new(Point2::new(0.0, 0.0), Point2::new(0.0, height)),
        outward: Vector2::new(-1.0, 0.0),
        outset: params.overall_outset,
        rotated: true,
        label_text: format!("{} mm", format_measure(height)),
    };
    [width_dimension, height_dimension]
}

#[cfg(test)]
mod tests {
    use panelcad_core::panel::RawPanel;
    use panelcad_core::validation::{DimensionBounds, ValidatedPanel, validate};

    use super::*;

    fn validated(raw: RawPanel) -> ValidatedPanel {
        validate(&raw, &DimensionBounds::default()).expect("valid test panel")
    }

    fn layout_of(raw: RawPanel) -> DimensionLayout {
        let panel = validated(raw);
        layout_dimensions(&panel.spec, &panel.perforations, &LayoutParams::default())
    }

    #[test]
    fn centerline_ties_resolve_to_start() {
        let layout =
            layout_of(RawPanel::new(1000.0, 600.0, 6.0).with_perforation(500.0, 300.0, 20.0));
        let id = PerforationId::new(1);
        assert_eq!(layout.callout(id, Axis::X).unwrap().side, EdgeSide::Start);
        assert_eq!(layout.callout(id, Axis::Y).unwrap().side, EdgeSide::Start);

        assert_eq!(EdgeSide::for_coordinate(499.9, 1000.0), EdgeSide::Start);
        assert_eq!(EdgeSide::for_coordinate(500.1, 1000.0), EdgeSide::End);
    }

    #[test]
    fn callouts_point_to_the_nearer_edge() {
        let layout = layout_of(
            RawPanel::new(1200.0, 800.0, 6.0)
                .with_perforation(100.0, 100.0, 50.0)
                .with_perforation(1000.0, 700.0, 40.0),
        );

        let first_x = layout.callout(PerforationId::new(1), Axis::X).unwrap();
        assert_eq!(first_x.side, EdgeSide::Start);
        assert_eq!(first_x.side.describe(Axis::X), "left");
        assert_eq!(first_x.anchor, Point2::new(75.0, 100.0));
        assert_eq!(first_x.target, Point2::new(0.0, 100.0));
        assert_eq!(first_x.label_text, "100");

        let first_y = layout.callout(PerforationId::new(1), Axis::Y).unwrap();
        assert_eq!(first_y.side.describe(Axis::Y), "top");
        assert_eq!(first_y.anchor, Point2::new(100.0, 75.0));
        assert_eq!(first_y.target, Point2::new(100.0, 0.0));

        let second_x = layout.callout(PerforationId::new(2), Axis::X).unwrap();
        assert_eq!(second_x.side, EdgeSide::End);
        assert_eq!(second_x.anchor, Point2::new(1020.0, 700.0));
        assert_eq!(second_x.target, Point2::new(1200.0, 700.0));
        assert_eq!(second_x.outward(), Vector2::new(1.0, 0.0));

        let second_y = layout.callout(PerforationId::new(2), Axis::Y).unwrap();
        assert_eq!(second_y.side, EdgeSide::End);
        assert_eq!(second_y.target, Point2::new(1000.0, 800.0));
        assert!((second_y.leader().length() - 80.0).abs() < 1e-9);
    }

    #[test]
    fn stacking_outsets_increase_with_input_order() {
        let layout = layout_of(
            RawPanel::new(1200.0, 800.0, 6.0)
                .with_perforation(300.0, 100.0, 20.0)
                .with_perforation(100.0, 300.0, 20.0)
                .with_perforation(200.0, 200.0, 20.0),
        );
        for axis in Axis::ALL {
            let outsets: Vec<f64> = layout
                .callouts
                .iter()
                .filter(|callout| callout.axis == axis)
                .map(|callout| callout.outset)
                .collect();
            assert_eq!(outsets.len(), 3);
            assert!(outsets.windows(2).all(|pair| pair[1] > pair[0]), "{outsets:?}");
        }

        let params = LayoutParams::default();
        assert_eq!(params.stacking_outset(0), 30.0);
        assert_eq!(params.stacking_outset(1), 52.0);
        let first_x = layout.callout(PerforationId::new(1), Axis::X).unwrap();
        let first_y = layout.callout(PerforationId::new(1), Axis::Y).unwrap();
        assert_eq!(first_x.outset - first_y.outset, params.perpendicular_clearance);
    }

    #[test]
    fn empty_panel_has_only_overall_dimensions() {
        let layout = layout_of(RawPanel::new(1200.0, 800.0, 6.0));
        assert!(layout.callouts.is_empty());
        let [width, height] = &layout.overall;
        assert_eq!(width.label_text, "1200 mm");
        assert!(!width.rotated);
        assert_eq!(width.edge.start, Point2::new(0.0, 800.0));
        assert_eq!(height.label_text, "800 mm");
        assert!(height.rotated);
        assert_eq!(height.outward, Vector2::new(-1.0, 0.0));
    }

    #[test]
    fn center_outside_panel_still_produces_geometry() {
        let layout =
            layout_of(RawPanel::new(500.0, 500.0, 6.0).with_perforation(600.0, 250.0, 50.0));
        let x = layout.callout(PerforationId::new(1), Axis::X).unwrap();
        assert_eq!(x.side, EdgeSide::End);
        assert_eq!(x.target, Point2::new(500.0, 250.0));
        // 锚点位于面向右边缘的一侧（圆心左侧）
        assert_eq!(x.anchor, Point2::new(575.0, 250.0));
        assert_eq!(x.label_text, "600");

        let y = layout.callout(PerforationId::new(1), Axis::Y).unwrap();
        assert_eq!(y.side, EdgeSide::Start);
        assert_eq!(layout.callouts_for(PerforationId::new(1)).count(), 2);
    }
}
