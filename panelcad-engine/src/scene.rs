use panelcad_core::geometry::{
    Axis, Bounds2D, Circle, Point2, Rect, ScaleTransform, Segment, Vector2,
};
use panelcad_core::panel::{PanelSpec, PanelStyle, Perforation, PerforationId, Rgb};
use serde::Serialize;
use tracing::debug;

use crate::errors::EngineError;
use crate::layout::{DimensionCallout, DimensionLayout, EdgeSide, PanelOverallDimension};

/// 十字中心线两端相对孔边界的内缩量（标注单位）。
const CROSSHAIR_INSET: f64 = 2.0;

/// 标注与图框之间保留的最小距离（点）。
const ANNOTATION_FRAME_INSET: f64 = 8.0;

/// 为标注预留空间后，面板至少还要占可绘制区域的这一比例，否则缩小标注比例。
const MIN_PANEL_SHARE: f64 = 0.5;

/// 标注比例最多减半的次数。
const MAX_ANNOTATION_SHRINK_STEPS: usize = 4;

/// 标签尺寸测量接口。文档渲染器可以接入真实字体度量。
pub trait TextMeasure {
    fn text_width(&self, text: &str, font_size: f64) -> f64;
}

/// 按平均字宽估算文本宽度。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ApproxTextMeasure {
    /// 平均字宽占字号的比例。
    pub average_char_width: f64,
}

impl Default for ApproxTextMeasure {
    fn default() -> Self {
        Self {
            average_char_width: 0.6,
        }
    }
}

impl TextMeasure for ApproxTextMeasure {
    fn text_width(&self, text: &str, font_size: f64) -> f64 {
        text.chars().count() as f64 * font_size * self.average_char_width
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CoordinateSpace {
    PreviewPixels,
    DocumentPoints,
}

/// 标签字号、内边距以及标注长度的换算比例。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnnotationStyle {
    pub callout_font_size: f64,
    pub callout_padding: Vector2,
    pub overall_font_size: f64,
    pub overall_padding: Vector2,
    /// 标注单位到输出单位的比例。
    pub annotation_scale: f64,
}

impl AnnotationStyle {
    /// 预览：10px 坐标徽标，14px 整体尺寸徽标。
    pub fn preview() -> Self {
        Self {
            callout_font_size: 10.0,
            callout_padding: Vector2::new(6.0, 2.0),
            overall_font_size: 14.0,
            overall_padding: Vector2::new(15.0, 5.0),
            annotation_scale: 1.0,
        }
    }

    /// 图纸：8pt 坐标标签，12pt 整体尺寸框。
    pub fn document() -> Self {
        Self {
            callout_font_size: 8.0,
            callout_padding: Vector2::new(2.0, 0.0),
            overall_font_size: 12.0,
            overall_padding: Vector2::new(10.0, 4.0),
            annotation_scale: 0.5,
        }
    }
}

/// 固定比例视口：交互预览，画布随面板尺寸伸缩。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedRatioViewport {
    pub scale: f64,
    /// 内容包围盒四周留白（像素）。
    pub padding: f64,
    pub style: AnnotationStyle,
}

impl Default for FixedRatioViewport {
    fn default() -> Self {
        Self {
            scale: 0.20,
            padding: 80.0,
            style: AnnotationStyle::preview(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageSize {
    A4,
    A3,
    Letter,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Orientation {
    #[default]
    Portrait,
    Landscape,
}

impl PageSize {
    /// 纸张尺寸（点，1pt = 1/72 in）。
    pub fn dimensions(self, orientation: Orientation) -> (f64, f64) {
        let (short, long) = match self {
            PageSize::A4 => (595.2756, 841.8898),
            PageSize::A3 => (841.8898, 1190.5512),
            PageSize::Letter => (612.0, 792.0),
        };
        match orientation {
            Orientation::Portrait => (short, long),
            Orientation::Landscape => (long, short),
        }
    }
}

/// 适配页面视口：打印图纸，按可绘制区域等比缩放并居中。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageViewport {
    pub page_width: f64,
    pub page_height: f64,
    /// 左右留白。
    pub side_margin: f64,
    /// 顶部保留带（标题栏）。
    pub header_band: f64,
    /// 底部保留带。
    pub footer_band: f64,
    /// 图框距页面边缘的距离。
    pub frame_margin: f64,
    /// 标题基线距页顶的距离。
    pub title_offset: f64,
    /// 标题分隔线距页顶的距离。
    pub rule_offset: f64,
    pub style: AnnotationStyle,
}

impl PageViewport {
    pub fn new(size: PageSize, orientation: Orientation) -> Self {
        let (page_width, page_height) = size.dimensions(orientation);
        Self {
            page_width,
            page_height,
            side_margin: 100.0,
            header_band: 200.0,
            footer_band: 150.0,
            frame_margin: 20.0,
            title_offset: 70.0,
            rule_offset: 90.0,
            style: AnnotationStyle::document(),
        }
    }

    pub fn a4() -> Self {
        Self::new(PageSize::A4, Orientation::Portrait)
    }

    /// 扣除留白与保留带后的可绘制区域。
    pub fn drawable(&self) -> Rect {
        Rect::new(
            Point2::new(self.side_margin, self.header_band),
            self.page_width - 2.0 * self.side_margin,
            self.page_height - self.header_band - self.footer_band,
        )
    }

    /// `min(可绘制宽 / 面板宽, 可绘制高 / 面板高)`。
    pub fn fit_scale(&self, width_mm: f64, height_mm: f64) -> f64 {
        let drawable = self.drawable();
        (drawable.width / width_mm).min(drawable.height / height_mm)
    }

    /// 标注允许到达的区域：左右到图框内侧，上到标题分隔线下方，
    /// 下到页脚保留带的上半部分（下半部分留给页脚文字）。总是包含可绘制区域。
    pub fn annotation_limit(&self) -> Rect {
        let drawable = self.drawable();
        let left = (self.frame_margin + ANNOTATION_FRAME_INSET).min(drawable.left());
        let right = (self.page_width - self.frame_margin - ANNOTATION_FRAME_INSET)
            .max(drawable.right());
        let top = (self.rule_offset + ANNOTATION_FRAME_INSET).min(drawable.top());
        let bottom = (self.page_height - self.footer_band / 2.0).max(drawable.bottom());
        Rect::new(Point2::new(left, top), right - left, bottom - top)
    }
}

impl Default for PageViewport {
    fn default() -> Self {
        Self::a4()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Viewport {
    FixedRatio(FixedRatioViewport),
    FitToPage(PageViewport),
}

impl Viewport {
    pub fn style(&self) -> &AnnotationStyle {
        match self {
            Viewport::FixedRatio(viewport) => &viewport.style,
            Viewport::FitToPage(viewport) => &viewport.style,
        }
    }

    pub fn space(&self) -> CoordinateSpace {
        match self {
            Viewport::FixedRatio(_) => CoordinateSpace::PreviewPixels,
            Viewport::FitToPage(_) => CoordinateSpace::DocumentPoints,
        }
    }

    fn check(&self) -> Result<(), EngineError> {
        let style = self.style();
        let sizes = [
            style.callout_font_size,
            style.overall_font_size,
            style.annotation_scale,
        ];
        if sizes.iter().any(|value| !(value.is_finite() && *value > 0.0)) {
            return Err(EngineError::InvalidViewport(
                "font sizes and annotation scale must be positive".to_string(),
            ));
        }
        match self {
            Viewport::FixedRatio(viewport) => {
                if !(viewport.scale.is_finite() && viewport.scale > 0.0) {
                    return Err(EngineError::InvalidViewport(format!(
                        "scale must be positive, got {}",
                        viewport.scale
                    )));
                }
                if !(viewport.padding.is_finite() && viewport.padding >= 0.0) {
                    return Err(EngineError::InvalidViewport(format!(
                        "padding must not be negative, got {}",
                        viewport.padding
                    )));
                }
            }
            Viewport::FitToPage(viewport) => {
                let drawable = viewport.drawable();
                if !(drawable.width > 0.0 && drawable.height > 0.0) {
                    return Err(EngineError::InvalidViewport(format!(
                        "page {}x{} leaves no drawable area",
                        viewport.page_width, viewport.page_height
                    )));
                }
            }
        }
        Ok(())
    }
}

/// 带文字的标签框。`center` 为框中心，`rotation_deg` 为绕中心的旋转角（y 向下坐标系，负值为逆时针）。
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LabelBox {
    pub text: String,
    pub center: Point2,
    pub width: f64,
    pub height: f64,
    pub font_size: f64,
    pub rotation_deg: f64,
}

impl LabelBox {
    /// 旋转后的轴对齐占用区域。
    pub fn footprint(&self) -> Rect {
        if self.is_quarter_turn() {
            Rect::centered(self.center, self.height, self.width)
        } else {
            Rect::centered(self.center, self.width, self.height)
        }
    }

    fn is_quarter_turn(&self) -> bool {
        (self.rotation_deg.abs() - 90.0).abs() < 1e-9
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PanelShape {
    pub rect: Rect,
    pub style: PanelStyle,
    pub color: Rgb,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PerforationShape {
    pub id: PerforationId,
    pub circle: Circle,
    pub crosshair: [Segment; 2],
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SceneCallout {
    pub perforation_id: PerforationId,
    pub axis: Axis,
    pub side: EdgeSide,
    /// 孔边界到面板边。
    pub leader: Segment,
    /// 面板边到外伸末端。
    pub extension: Segment,
    pub label: LabelBox,
}

impl SceneCallout {
    /// 完整引线：孔边界到外伸末端。
    pub fn full_leader(&self) -> Segment {
        Segment::new(self.leader.start, self.extension.end)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SceneDimension {
    pub axis: Axis,
    pub line: Segment,
    pub label: LabelBox,
}

/// 图纸页面装饰：页面、图框、标题锚点与分隔线。
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageFurniture {
    pub page: Rect,
    pub frame: Rect,
    pub drawable: Rect,
    pub title_anchor: Point2,
    pub title_rule: Segment,
}

/// 完全解析、与渲染器无关的几何输出。
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Scene {
    pub space: CoordinateSpace,
    /// 面板毫米到输出单位的几何比例。
    pub scale: f64,
    pub annotation_scale: f64,
    pub canvas: Rect,
    pub panel: PanelShape,
    pub perforations: Vec<PerforationShape>,
    pub callouts: Vec<SceneCallout>,
    pub dimensions: Vec<SceneDimension>,
    pub page: Option<PageFurniture>,
}

impl Scene {
    pub fn callout(&self, id: PerforationId, axis: Axis) -> Option<&SceneCallout> {
        self.callouts
            .iter()
            .find(|callout| callout.perforation_id == id && callout.axis == axis)
    }

    /// 全部可见内容（不含页面装饰）的包围盒。
    pub fn content_bounds(&self) -> Bounds2D {
        let mut bounds = self.panel.rect.bounds();
        for perforation in &self.perforations {
            bounds.include_bounds(&perforation.circle.bounds());
        }
        for callout in &self.callouts {
            bounds.include_point(callout.leader.start);
            bounds.include_point(callout.extension.end);
            bounds.include_bounds(&callout.label.footprint().bounds());
        }
        for dimension in &self.dimensions {
            bounds.include_point(dimension.line.start);
            bounds.include_point(dimension.line.end);
            bounds.include_bounds(&dimension.label.footprint().bounds());
        }
        bounds
    }
}

/// 按视口把布局映射到具体坐标。
///
/// 固定比例视口先以零偏移构建，再把内容包围盒平移到留白处；适配页面视口
/// 在可绘制区域内等比缩放并水平居中，同时保证所有标注留在图框以内。
pub fn build_scene(
    spec: &PanelSpec,
    perforations: &[Perforation],
    layout: &DimensionLayout,
    viewport: &Viewport,
    measure: &dyn TextMeasure,
) -> Result<Scene, EngineError> {
    viewport.check()?;
    let space = viewport.space();
    let assemble_with = |transform: &ScaleTransform, style: &AnnotationStyle| {
        assemble(spec, perforations, layout, transform, style, measure, space)
    };

    let scene = match viewport {
        Viewport::FixedRatio(fixed) => {
            let probe_transform = ScaleTransform::new(fixed.scale, Vector2::ZERO);
            let probe = assemble_with(&probe_transform, &fixed.style);
            let bounds = probe.content_bounds();
            let offset = Vector2::new(
                fixed.padding - bounds.min().x(),
                fixed.padding - bounds.min().y(),
            );
            let transform = ScaleTransform::new(fixed.scale, offset);
            let mut scene = assemble_with(&transform, &fixed.style);
            scene.canvas = Rect::new(
                Point2::new(0.0, 0.0),
                bounds.width() + 2.0 * fixed.padding,
                bounds.height() + 2.0 * fixed.padding,
            );
            scene
        }
        Viewport::FitToPage(page) => {
            let (transform, style) = place_on_page(spec, page, &assemble_with);
            let mut scene = assemble_with(&transform, &style);
            let page_rect = Rect::new(Point2::new(0.0, 0.0), page.page_width, page.page_height);
            scene.canvas = page_rect;
            scene.page = Some(PageFurniture {
                page: page_rect,
                frame: Rect::new(
                    Point2::new(page.frame_margin, page.frame_margin),
                    page.page_width - 2.0 * page.frame_margin,
                    page.page_height - 2.0 * page.frame_margin,
                ),
                drawable: page.drawable(),
                title_anchor: Point2::new(page.page_width / 2.0, page.title_offset),
                title_rule: Segment::new(
                    Point2::new(page.frame_margin, page.rule_offset),
                    Point2::new(page.page_width - page.frame_margin, page.rule_offset),
                ),
            });
            scene
        }
    };

    debug!(
        space = ?scene.space,
        scale = scene.scale,
        annotation_scale = scene.annotation_scale,
        perforations = scene.perforations.len(),
        callouts = scene.callouts.len(),
        "场景构建完成"
    );
    Ok(scene)
}

/// 面板矩形四周被标注（以及伸出面板的孔）占用的距离。
#[derive(Debug, Clone, Copy, PartialEq)]
struct Reach {
    left: f64,
    right: f64,
    top: f64,
    bottom: f64,
}

impl Reach {
    fn of(scene: &Scene) -> Self {
        let bounds = scene.content_bounds();
        let panel = scene.panel.rect;
        Self {
            left: (panel.left() - bounds.min().x()).max(0.0),
            right: (bounds.max().x() - panel.right()).max(0.0),
            top: (panel.top() - bounds.min().y()).max(0.0),
            bottom: (bounds.max().y() - panel.bottom()).max(0.0),
        }
    }

    /// 面板水平居中于可绘制区域、且四周标注不越过 `limit` 时可用的宽度与高度。
    fn room(&self, limit: &Rect, drawable: &Rect) -> (f64, f64) {
        let center_x = drawable.center().x();
        let half_width = (center_x - limit.left() - self.left)
            .min(limit.right() - center_x - self.right);
        (2.0 * half_width, limit.height - self.top - self.bottom)
    }
}

/// 计算适配页面的变换与实际使用的标注样式。
///
/// 标注外伸以标注单位计，与几何比例无关；按当前比例测得的外伸只会随比例
/// 缩小而减小，因此一次测量即可得到保守的比例。面板剩余空间不足时把标注
/// 比例逐次减半。
fn place_on_page(
    spec: &PanelSpec,
    page: &PageViewport,
    assemble_with: &dyn Fn(&ScaleTransform, &AnnotationStyle) -> Scene,
) -> (ScaleTransform, AnnotationStyle) {
    let (width, height) = (spec.width_mm(), spec.height_mm());
    let drawable = page.drawable();
    let limit = page.annotation_limit();
    let fit_scale = page.fit_scale(width, height);
    let probe_transform = ScaleTransform::new(fit_scale, Vector2::ZERO);

    let mut style = page.style;
    let mut reach = Reach::of(&assemble_with(&probe_transform, &style));
    let mut room = reach.room(&limit, &drawable);
    let mut shrink_steps = 0;
    let cramped = |(room_width, room_height): (f64, f64)| {
        room_width < MIN_PANEL_SHARE * drawable.width
            || room_height < MIN_PANEL_SHARE * drawable.height
    };
    while cramped(room) && shrink_steps < MAX_ANNOTATION_SHRINK_STEPS {
        style.annotation_scale *= 0.5;
        reach = Reach::of(&assemble_with(&probe_transform, &style));
        room = reach.room(&limit, &drawable);
        shrink_steps += 1;
    }
    if shrink_steps > 0 {
        debug!(
            annotation_scale = style.annotation_scale,
            "标注超出图框，已缩小标注比例"
        );
    }

    let room_width = room.0.max(MIN_PANEL_SHARE * drawable.width);
    let room_height = room.1.max(MIN_PANEL_SHARE * drawable.height);
    let scale = fit_scale.min(room_width / width).min(room_height / height);

    let start_x = drawable.left() + (drawable.width - width * scale) / 2.0;
    // 优先在可绘制区域内垂直居中，标注放不下时在允许区域内上下挪动。
    let centered_y = drawable.top() + (drawable.height - height * scale) / 2.0;
    let start_y = centered_y
        .min(limit.bottom() - reach.bottom - height * scale)
        .max(limit.top() + reach.top);

    (ScaleTransform::new(scale, Vector2::new(start_x, start_y)), style)
}

fn assemble(
    spec: &PanelSpec,
    perforations: &[Perforation],
    layout: &DimensionLayout,
    transform: &ScaleTransform,
    style: &AnnotationStyle,
    measure: &dyn TextMeasure,
    space: CoordinateSpace,
) -> Scene {
    let panel = PanelShape {
        rect: transform.apply_rect(&spec.outline()),
        style: spec.style(),
        color: spec.color(),
    };

    let perforations = perforations
        .iter()
        .map(|perforation| perforation_shape(perforation, transform, style))
        .collect();

    let callouts = layout
        .callouts
        .iter()
        .map(|callout| scene_callout(callout, transform, style, measure))
        .collect();

    let dimensions = layout
        .overall
        .iter()
        .map(|dimension| scene_dimension(dimension, transform, style, measure))
        .collect();

    Scene {
        space,
        scale: transform.scale,
        annotation_scale: style.annotation_scale,
        canvas: Rect::new(Point2::new(0.0, 0.0), 0.0, 0.0),
        panel,
        perforations,
        callouts,
        dimensions,
        page: None,
    }
}

fn perforation_shape(
    perforation: &Perforation,
    transform: &ScaleTransform,
    style: &AnnotationStyle,
) -> PerforationShape {
    let circle = transform.apply_circle(&perforation.circle());
    let inset = (CROSSHAIR_INSET * style.annotation_scale).min(circle.radius * 0.5);
    let reach = circle.radius - inset;
    let center = circle.center;
    PerforationShape {
        id: perforation.id(),
        circle,
        crosshair: [
            Segment::new(
                center.translate(Vector2::new(-reach, 0.0)),
                center.translate(Vector2::new(reach, 0.0)),
            ),
            Segment::new(
                center.translate(Vector2::new(0.0, -reach)),
                center.translate(Vector2::new(0.0, reach)),
            ),
        ],
    }
}

fn scene_callout(
    callout: &DimensionCallout,
    transform: &ScaleTransform,
    style: &AnnotationStyle,
    measure: &dyn TextMeasure,
) -> SceneCallout {
    let outward = callout.outward();
    let anchor = transform.apply(callout.anchor);
    let target = transform.apply(callout.target);
    let outer = target.translate(outward.scaled(callout.outset * style.annotation_scale));

    let (width, height) = label_size(
        &callout.label_text,
        style.callout_font_size,
        style.callout_padding,
        measure,
    );
    // 标签中心沿引线方向再外移：间距 + 半个标签尺寸。
    let half_extent = match callout.axis {
        Axis::X => width / 2.0,
        Axis::Y => height / 2.0,
    };
    let label_distance = callout.label_gap * style.annotation_scale + half_extent;
    let center = outer.translate(outward.scaled(label_distance));

    SceneCallout {
        perforation_id: callout.perforation_id,
        axis: callout.axis,
        side: callout.side,
        leader: Segment::new(anchor, target),
        extension: Segment::new(target, outer),
        label: LabelBox {
            text: callout.label_text.clone(),
            center,
            width,
            height,
            font_size: style.callout_font_size,
            rotation_deg: 0.0,
        },
    }
}

fn scene_dimension(
    dimension: &PanelOverallDimension,
    transform: &ScaleTransform,
    style: &AnnotationStyle,
    measure: &dyn TextMeasure,
) -> SceneDimension {
    let shift = dimension.outward.scaled(dimension.outset * style.annotation_scale);
    let edge = transform.apply_segment(&dimension.edge);
    let line = Segment::new(edge.start.translate(shift), edge.end.translate(shift));
    let (width, height) = label_size(
        &dimension.label_text,
        style.overall_font_size,
        style.overall_padding,
        measure,
    );
    SceneDimension {
        axis: dimension.axis,
        line,
        label: LabelBox {
            text: dimension.label_text.clone(),
            center: line.midpoint(),
            width,
            height,
            font_size: style.overall_font_size,
            rotation_deg: if dimension.rotated { -90.0 } else { 0.0 },
        },
    }
}

fn label_size(
    text: &str,
    font_size: f64,
    padding: Vector2,
    measure: &dyn TextMeasure,
) -> (f64, f64) {
    (
        measure.text_width(text, font_size) + 2.0 * padding.x(),
        font_size + 2.0 * padding.y(),
    )
}
