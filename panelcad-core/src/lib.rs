pub mod geometry {
    use glam::DVec2;
    use serde::{Deserialize, Serialize};

    /// 二维点，内部以 `glam::DVec2` 表示。面板空间单位为毫米，原点位于面板左上角，y 轴向下。
    #[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
    pub struct Point2(pub DVec2);

    impl Point2 {
        #[inline]
        pub fn new(x: f64, y: f64) -> Self {
            Self(DVec2::new(x, y))
        }

        #[inline]
        pub fn from_vec(vec: DVec2) -> Self {
            Self(vec)
        }

        #[inline]
        pub fn x(self) -> f64 {
            self.0.x
        }

        #[inline]
        pub fn y(self) -> f64 {
            self.0.y
        }

        /// 按轴取分量。
        #[inline]
        pub fn component(self, axis: Axis) -> f64 {
            match axis {
                Axis::X => self.0.x,
                Axis::Y => self.0.y,
            }
        }

        /// 返回仅替换指定轴分量后的新点。
        #[inline]
        pub fn with_component(self, axis: Axis, value: f64) -> Self {
            match axis {
                Axis::X => Self::new(value, self.0.y),
                Axis::Y => Self::new(self.0.x, value),
            }
        }

        #[inline]
        pub fn translate(self, offset: Vector2) -> Self {
            Self(self.0 + offset.0)
        }

        #[inline]
        pub fn vector_to(self, other: Point2) -> Vector2 {
            Vector2(other.0 - self.0)
        }

        #[inline]
        pub fn midpoint(self, other: Point2) -> Point2 {
            Self((self.0 + other.0) * 0.5)
        }

        #[inline]
        pub fn as_vec2(self) -> DVec2 {
            self.0
        }
    }

    impl From<DVec2> for Point2 {
        fn from(value: DVec2) -> Self {
            Self::from_vec(value)
        }
    }

    /// 二维向量。
    #[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
    pub struct Vector2(pub DVec2);

    impl Vector2 {
        pub const ZERO: Vector2 = Vector2(DVec2::ZERO);

        #[inline]
        pub fn new(x: f64, y: f64) -> Self {
            Self(DVec2::new(x, y))
        }

        /// 沿指定轴的单轴向量。
        #[inline]
        pub fn along(axis: Axis, length: f64) -> Self {
            match axis {
                Axis::X => Self::new(length, 0.0),
                Axis::Y => Self::new(0.0, length),
            }
        }

        #[inline]
        pub fn from_points(start: Point2, end: Point2) -> Self {
            Self(end.0 - start.0)
        }

        #[inline]
        pub fn length(self) -> f64 {
            self.0.length()
        }

        #[inline]
        pub fn length_squared(self) -> f64 {
            self.0.length_squared()
        }

        #[inline]
        pub fn scaled(self, factor: f64) -> Self {
            Self(self.0 * factor)
        }

        #[inline]
        pub fn as_vec2(self) -> DVec2 {
            self.0
        }

        #[inline]
        pub fn x(self) -> f64 {
            self.0.x
        }

        #[inline]
        pub fn y(self) -> f64 {
            self.0.y
        }
    }

    impl From<DVec2> for Vector2 {
        fn from(value: DVec2) -> Self {
            Self(value)
        }
    }

    /// 坐标轴。标注、范围告警都以轴为单位描述。
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub enum Axis {
        X,
        Y,
    }

    impl Axis {
        pub const ALL: [Axis; 2] = [Axis::X, Axis::Y];

        #[inline]
        pub fn other(self) -> Axis {
            match self {
                Axis::X => Axis::Y,
                Axis::Y => Axis::X,
            }
        }

        pub fn label(self) -> &'static str {
            match self {
                Axis::X => "X",
                Axis::Y => "Y",
            }
        }
    }

    impl std::fmt::Display for Axis {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.write_str(self.label())
        }
    }

    /// 轴对齐边界框，用于估算场景范围。
    #[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
    pub struct Bounds2D {
        min: Point2,
        max: Point2,
    }

    impl Bounds2D {
        #[inline]
        pub fn new(min: Point2, max: Point2) -> Self {
            Self { min, max }
        }

        #[inline]
        pub fn empty() -> Self {
            Self {
                min: Point2::new(f64::INFINITY, f64::INFINITY),
                max: Point2::new(f64::NEG_INFINITY, f64::NEG_INFINITY),
            }
        }

        #[inline]
        pub fn is_empty(&self) -> bool {
            self.min.x() > self.max.x() || self.min.y() > self.max.y()
        }

        #[inline]
        pub fn min(&self) -> Point2 {
            self.min
        }

        #[inline]
        pub fn max(&self) -> Point2 {
            self.max
        }

        #[inline]
        pub fn width(&self) -> f64 {
            if self.is_empty() {
                0.0
            } else {
                self.max.x() - self.min.x()
            }
        }

        #[inline]
        pub fn height(&self) -> f64 {
            if self.is_empty() {
                0.0
            } else {
                self.max.y() - self.min.y()
            }
        }

        pub fn include_point(&mut self, point: Point2) {
            if self.is_empty() {
                self.min = point;
                self.max = point;
                return;
            }
            let min_vec = self.min.as_vec2().min(point.as_vec2());
            let max_vec = self.max.as_vec2().max(point.as_vec2());
            self.min = Point2::from_vec(min_vec);
            self.max = Point2::from_vec(max_vec);
        }

        pub fn include_bounds(&mut self, other: &Bounds2D) {
            if other.is_empty() {
                return;
            }
            self.include_point(other.min);
            self.include_point(other.max);
        }

        #[inline]
        pub fn center(&self) -> Point2 {
            debug_assert!(!self.is_empty());
            self.min.midpoint(self.max)
        }
    }

    /// 轴对齐矩形，`origin` 为左上角。
    #[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
    pub struct Rect {
        pub origin: Point2,
        pub width: f64,
        pub height: f64,
    }

    impl Rect {
        #[inline]
        pub fn new(origin: Point2, width: f64, height: f64) -> Self {
            Self {
                origin,
                width,
                height,
            }
        }

        /// 以中心点和尺寸构造矩形。
        #[inline]
        pub fn centered(center: Point2, width: f64, height: f64) -> Self {
            Self::new(
                Point2::new(center.x() - width * 0.5, center.y() - height * 0.5),
                width,
                height,
            )
        }

        #[inline]
        pub fn left(&self) -> f64 {
            self.origin.x()
        }

        #[inline]
        pub fn top(&self) -> f64 {
            self.origin.y()
        }

        #[inline]
        pub fn right(&self) -> f64 {
            self.origin.x() + self.width
        }

        #[inline]
        pub fn bottom(&self) -> f64 {
            self.origin.y() + self.height
        }

        #[inline]
        pub fn center(&self) -> Point2 {
            Point2::new(
                self.origin.x() + self.width * 0.5,
                self.origin.y() + self.height * 0.5,
            )
        }

        /// 边界上的点也算包含。
        pub fn contains(&self, point: Point2) -> bool {
            point.x() >= self.left()
                && point.x() <= self.right()
                && point.y() >= self.top()
                && point.y() <= self.bottom()
        }

        /// 判定两矩形内部是否相交，仅接触边界不算重叠。
        pub fn overlaps(&self, other: &Rect) -> bool {
            self.left() < other.right()
                && other.left() < self.right()
                && self.top() < other.bottom()
                && other.top() < self.bottom()
        }

        pub fn bounds(&self) -> Bounds2D {
            Bounds2D::new(
                self.origin,
                Point2::new(self.right(), self.bottom()),
            )
        }
    }

    #[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
    pub struct Circle {
        pub center: Point2,
        pub radius: f64,
    }

    impl Circle {
        #[inline]
        pub fn new(center: Point2, radius: f64) -> Self {
            Self { center, radius }
        }

        pub fn bounds(&self) -> Bounds2D {
            let radius = self.radius.abs();
            Bounds2D::new(
                Point2::new(self.center.x() - radius, self.center.y() - radius),
                Point2::new(self.center.x() + radius, self.center.y() + radius),
            )
        }
    }

    #[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
    pub struct Segment {
        pub start: Point2,
        pub end: Point2,
    }

    impl Segment {
        #[inline]
        pub fn new(start: Point2, end: Point2) -> Self {
            Self { start, end }
        }

        #[inline]
        pub fn length(&self) -> f64 {
            self.start.vector_to(self.end).length()
        }

        #[inline]
        pub fn midpoint(&self) -> Point2 {
            self.start.midpoint(self.end)
        }
    }

    /// 均匀缩放 + 平移：`p' = p * scale + offset`。
    #[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
    pub struct ScaleTransform {
        pub scale: f64,
        pub offset: Vector2,
    }

    impl ScaleTransform {
        #[inline]
        pub fn new(scale: f64, offset: Vector2) -> Self {
            Self { scale, offset }
        }

        #[inline]
        pub fn identity() -> Self {
            Self::new(1.0, Vector2::ZERO)
        }

        #[inline]
        pub fn apply(&self, point: Point2) -> Point2 {
            Point2::from_vec(point.as_vec2() * self.scale + self.offset.as_vec2())
        }

        #[inline]
        pub fn apply_length(&self, length: f64) -> f64 {
            length * self.scale
        }

        pub fn apply_rect(&self, rect: &Rect) -> Rect {
            Rect::new(
                self.apply(rect.origin),
                self.apply_length(rect.width),
                self.apply_length(rect.height),
            )
        }

        pub fn apply_circle(&self, circle: &Circle) -> Circle {
            Circle::new(self.apply(circle.center), self.apply_length(circle.radius))
        }

        pub fn apply_segment(&self, segment: &Segment) -> Segment {
            Segment::new(self.apply(segment.start), self.apply(segment.end))
        }
    }

    impl Default for ScaleTransform {
        fn default() -> Self {
            Self::identity()
        }
    }

}

pub mod panel {
    use std::fmt;
    use std::str::FromStr;

    use serde::{Deserialize, Serialize};

    use crate::geometry::{Axis, Circle, Point2, Rect};

    /// 玻璃重量经验系数：每平方米每毫米厚度 2.5 kg。
    pub const GLASS_WEIGHT_FACTOR: f64 = 2.5;

    /// 默认面板颜色（深蓝）。
    pub const DEFAULT_PANEL_COLOR: Rgb = Rgb::new(0x1E, 0x3A, 0x8A);

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
    #[serde(rename_all = "lowercase")]
    pub enum PanelStyle {
        #[default]
        Outline,
        Solid,
    }

    /// 8 位 RGB 颜色，序列化为 `#RRGGBB`。
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(try_from = "String", into = "String")]
    pub struct Rgb {
        pub r: u8,
        pub g: u8,
        pub b: u8,
    }

    impl Rgb {
        pub const BLACK: Rgb = Rgb::new(0, 0, 0);
        pub const WHITE: Rgb = Rgb::new(0xFF, 0xFF, 0xFF);

        pub const fn new(r: u8, g: u8, b: u8) -> Self {
            Self { r, g, b }
        }
    }

    impl Default for Rgb {
        fn default() -> Self {
            DEFAULT_PANEL_COLOR
        }
    }

    impl fmt::Display for Rgb {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
        }
    }

    impl FromStr for Rgb {
        type Err = String;

        fn from_str(s: &str) -> Result<Self, Self::Err> {
            let hex = s.trim().trim_start_matches('#');
            if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
                return Err(format!("invalid colour `{s}`, expected #RRGGBB"));
            }
            let channel = |range: std::ops::Range<usize>| {
                u8::from_str_radix(&hex[range], 16).map_err(|err| err.to_string())
            };
            Ok(Self::new(channel(0..2)?, channel(2..4)?, channel(4..6)?))
        }
    }

    impl TryFrom<String> for Rgb {
        type Error = String;

        fn try_from(value: String) -> Result<Self, Self::Error> {
            value.parse()
        }
    }

    impl From<Rgb> for String {
        fn from(value: Rgb) -> Self {
            value.to_string()
        }
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
    pub struct PerforationId(u32);

    impl PerforationId {
        #[inline]
        pub fn new(raw: u32) -> Self {
            Self(raw)
        }

        #[inline]
        pub fn get(self) -> u32 {
            self.0
        }
    }

    impl fmt::Display for PerforationId {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "#{}", self.0)
        }
    }

    /// 图框标题栏中的附加信息。
    #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
    pub struct DrawingMetadata {
        #[serde(default)]
        pub title: Option<String>,
        #[serde(default)]
        pub client: Option<String>,
        #[serde(default)]
        pub reference: Option<String>,
    }

    /// 未校验的原始输入，来自 UI 层或规格文件。
    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct RawPanel {
        pub width_mm: f64,
        pub height_mm: f64,
        pub thickness_mm: f64,
        #[serde(default)]
        pub style: PanelStyle,
        #[serde(default)]
        pub color: Rgb,
        #[serde(default)]
        pub perforations: Vec<RawPerforation>,
        #[serde(default)]
        pub metadata: DrawingMetadata,
    }

    impl RawPanel {
        pub fn new(width_mm: f64, height_mm: f64, thickness_mm: f64) -> Self {
            Self {
                width_mm,
                height_mm,
                thickness_mm,
                style: PanelStyle::default(),
                color: Rgb::default(),
                perforations: Vec::new(),
                metadata: DrawingMetadata::default(),
            }
        }

        pub fn with_perforation(mut self, x_mm: f64, y_mm: f64, diameter_mm: f64) -> Self {
            self.perforations.push(RawPerforation {
                id: None,
                x_mm,
                y_mm,
                diameter_mm,
            });
            self
        }

        pub fn with_style(mut self, style: PanelStyle) -> Self {
            self.style = style;
            self
        }
    }

    /// 原始孔位输入。`id` 缺省时按列表顺序从 1 开始编号。
    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct RawPerforation {
        #[serde(default)]
        pub id: Option<u32>,
        pub x_mm: f64,
        pub y_mm: f64,
        pub diameter_mm: f64,
    }

    /// 已校验的面板规格。字段私有，仅能通过 `validation::validate` 构造。
    #[derive(Debug, Clone, PartialEq, Serialize)]
    pub struct PanelSpec {
        width_mm: f64,
        height_mm: f64,
        thickness_mm: f64,
        style: PanelStyle,
        color: Rgb,
    }

    impl PanelSpec {
        pub(crate) fn new(
            width_mm: f64,
            height_mm: f64,
            thickness_mm: f64,
            style: PanelStyle,
            color: Rgb,
        ) -> Self {
            Self {
                width_mm,
                height_mm,
                thickness_mm,
                style,
                color,
            }
        }

        #[inline]
        pub fn width_mm(&self) -> f64 {
            self.width_mm
        }

        #[inline]
        pub fn height_mm(&self) -> f64 {
            self.height_mm
        }

        #[inline]
        pub fn thickness_mm(&self) -> f64 {
            self.thickness_mm
        }

        #[inline]
        pub fn style(&self) -> PanelStyle {
            self.style
        }

        #[inline]
        pub fn color(&self) -> Rgb {
            self.color
        }

        /// 面板沿某轴的尺寸。
        #[inline]
        pub fn extent(&self, axis: Axis) -> f64 {
            match axis {
                Axis::X => self.width_mm,
                Axis::Y => self.height_mm,
            }
        }

        /// 面板在面板空间中的矩形。
        pub fn outline(&self) -> Rect {
            Rect::new(Point2::new(0.0, 0.0), self.width_mm, self.height_mm)
        }

        pub fn metrics(&self) -> PanelMetrics {
            PanelMetrics::compute(self.width_mm, self.height_mm, self.thickness_mm)
        }

        /// 概要卡片中的尺寸，例如 `1200x800`。
        pub fn summary_label(&self) -> String {
            format!(
                "{}x{}",
                format_measure(self.width_mm),
                format_measure(self.height_mm)
            )
        }
    }

    #[derive(Debug, Clone, PartialEq, Serialize)]
    pub struct Perforation {
        id: PerforationId,
        center: Point2,
        diameter_mm: f64,
    }

    impl Perforation {
        pub(crate) fn new(id: PerforationId, center: Point2, diameter_mm: f64) -> Self {
            Self {
                id,
                center,
                diameter_mm,
            }
        }

        #[inline]
        pub fn id(&self) -> PerforationId {
            self.id
        }

        #[inline]
        pub fn center(&self) -> Point2 {
            self.center
        }

        #[inline]
        pub fn diameter_mm(&self) -> f64 {
            self.diameter_mm
        }

        #[inline]
        pub fn radius_mm(&self) -> f64 {
            self.diameter_mm * 0.5
        }

        pub fn circle(&self) -> Circle {
            Circle::new(self.center, self.radius_mm())
        }
    }

    /// 面积与估算重量。
    #[derive(Debug, Clone, Copy, PartialEq, Serialize)]
    pub struct PanelMetrics {
        pub area_m2: f64,
        pub weight_kg: f64,
    }

    impl PanelMetrics {
        pub fn compute(width_mm: f64, height_mm: f64, thickness_mm: f64) -> Self {
            let area_m2 = width_mm * height_mm / 1_000_000.0;
            Self {
                area_m2,
                weight_kg: area_m2 * thickness_mm * GLASS_WEIGHT_FACTOR,
            }
        }

        /// 面积保留两位小数，用于概要显示。
        pub fn rounded_area_m2(&self) -> f64 {
            (self.area_m2 * 100.0).round() / 100.0
        }
    }

    /// 常用尺寸预设。
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "kebab-case")]
    pub enum Preset {
        Custom,
        StandardDoor,
        WindowLeaf,
        ShowerScreen,
        JumboSheet,
    }

    impl Preset {
        pub const ALL: [Preset; 5] = [
            Preset::Custom,
            Preset::StandardDoor,
            Preset::WindowLeaf,
            Preset::ShowerScreen,
            Preset::JumboSheet,
        ];

        /// 预设的 (宽, 高)，单位毫米。
        pub fn dimensions(self) -> (f64, f64) {
            match self {
                Preset::Custom => (1200.0, 800.0),
                Preset::StandardDoor => (900.0, 2100.0),
                Preset::WindowLeaf => (1200.0, 1200.0),
                Preset::ShowerScreen => (800.0, 1800.0),
                Preset::JumboSheet => (3600.0, 2500.0),
            }
        }

        pub fn key(self) -> &'static str {
            match self {
                Preset::Custom => "custom",
                Preset::StandardDoor => "standard-door",
                Preset::WindowLeaf => "window-leaf",
                Preset::ShowerScreen => "shower-screen",
                Preset::JumboSheet => "jumbo-sheet",
            }
        }

        pub fn display_name(self) -> &'static str {
            match self {
                Preset::Custom => "Custom",
                Preset::StandardDoor => "Standard door (2100x900)",
                Preset::WindowLeaf => "Window leaf (1200x1200)",
                Preset::ShowerScreen => "Shower screen (1800x800)",
                Preset::JumboSheet => "Jumbo sheet (2500x3600)",
            }
        }

        /// 以预设尺寸构造原始输入，并按默认排布生成 `perforations` 个孔。
        pub fn raw_panel(self, thickness_mm: f64, perforations: usize) -> RawPanel {
            let (width_mm, height_mm) = self.dimensions();
            let mut raw = RawPanel::new(width_mm, height_mm, thickness_mm);
            raw.perforations = default_perforations(perforations);
            raw
        }
    }

    impl FromStr for Preset {
        type Err = String;

        fn from_str(s: &str) -> Result<Self, Self::Err> {
            let normalized = s.trim().to_ascii_lowercase().replace('_', "-");
            Preset::ALL
                .into_iter()
                .find(|preset| preset.key() == normalized)
                .ok_or_else(|| {
                    let known: Vec<&str> = Preset::ALL.iter().map(|p| p.key()).collect();
                    format!("unknown preset `{s}` (known: {})", known.join(", "))
                })
        }
    }

    /// 默认孔位排布：第 i 个孔位于 (100 + 150i, 100 + 150i)，直径 50。
    pub fn default_perforations(count: usize) -> Vec<RawPerforation> {
        (0..count)
            .map(|index| {
                let offset = 100.0 + 150.0 * index as f64;
                RawPerforation {
                    id: Some(index as u32 + 1),
                    x_mm: offset,
                    y_mm: offset,
                    diameter_mm: 50.0,
                }
            })
            .collect()
    }

    /// 以原始精度输出数值，整数不带小数点。
    pub fn format_measure(value: f64) -> String {
        // `-0.0 + 0.0` 归一为 `0.0`
        let value = value + 0.0;
        format!("{value}")
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn metrics_for_reference_panel() {
            let metrics = PanelMetrics::compute(1200.0, 800.0, 6.0);
            assert!((metrics.area_m2 - 0.96).abs() < 1e-9);
            assert!((metrics.weight_kg - 14.4).abs() < 1e-9);
            assert!((metrics.rounded_area_m2() - 0.96).abs() < 1e-12);
        }

        #[test]
        fn metrics_scale_linearly() {
            let base = PanelMetrics::compute(1000.0, 500.0, 4.0);
            let wider = PanelMetrics::compute(2000.0, 500.0, 4.0);
            let thicker = PanelMetrics::compute(1000.0, 500.0, 8.0);
            assert!((wider.area_m2 - 2.0 * base.area_m2).abs() < 1e-12);
            assert!((thicker.weight_kg - 2.0 * base.weight_kg).abs() < 1e-12);
            assert!((thicker.area_m2 - base.area_m2).abs() < 1e-12);
            assert!(base.area_m2 >= 0.0 && base.weight_kg >= 0.0);
        }

        #[test]
        fn rgb_parses_and_formats_hex() {
            let color: Rgb = "#1e3a8a".parse().expect("parse colour");
            assert_eq!(color, DEFAULT_PANEL_COLOR);
            assert_eq!(color.to_string(), "#1E3A8A");
            assert!("#12345".parse::<Rgb>().is_err());
            assert!("zzzzzz".parse::<Rgb>().is_err());
        }

        #[test]
        fn raw_panel_deserializes_with_defaults() {
            let raw: RawPanel = serde_json::from_str(
                r##"{
                    "width_mm": 500,
                    "height_mm": 400,
                    "thickness_mm": 8,
                    "color": "#FF0000",
                    "perforations": [{ "x_mm": 10, "y_mm": 20, "diameter_mm": 5 }]
                }"##,
            )
            .expect("deserialize raw panel");
            assert_eq!(raw.style, PanelStyle::Outline);
            assert_eq!(raw.color, Rgb::new(0xFF, 0, 0));
            assert_eq!(raw.perforations.len(), 1);
            assert!(raw.perforations[0].id.is_none());
            assert!(raw.metadata.client.is_none());
        }

        #[test]
        fn presets_resolve_by_key() {
            assert_eq!("standard-door".parse::<Preset>(), Ok(Preset::StandardDoor));
            assert_eq!("JUMBO_SHEET".parse::<Preset>(), Ok(Preset::JumboSheet));
            assert!("bathtub".parse::<Preset>().is_err());
            assert_eq!(Preset::StandardDoor.dimensions(), (900.0, 2100.0));

            let raw = Preset::Custom.raw_panel(6.0, 3);
            assert_eq!(raw.width_mm, 1200.0);
            assert_eq!(raw.perforations.len(), 3);
            assert_eq!(raw.perforations[2].x_mm, 400.0);
            assert_eq!(raw.perforations[2].id, Some(3));
        }

        #[test]
        fn measures_print_at_source_precision() {
            assert_eq!(format_measure(1200.0), "1200");
            assert_eq!(format_measure(100.5), "100.5");
            assert_eq!(format_measure(-0.0), "0");
        }
    }
}

pub mod validation {
    use std::collections::HashSet;
    use std::fmt;

    use serde::{Deserialize, Serialize};
    use thiserror::Error;
    use tracing::{debug, warn};

    use crate::geometry::{Axis, Point2};
    use crate::panel::{PanelSpec, Perforation, PerforationId, RawPanel};

    /// 超出尺寸范围时的处理策略。
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
    #[serde(rename_all = "lowercase")]
    pub enum BoundsPolicy {
        #[default]
        Reject,
        Clamp,
    }

    /// 主尺寸允许范围。不同部署使用不同上限（2300 / 5000 / 6000 mm），由调用方提供。
    #[derive(Debug, Clone, Copy, PartialEq)]
    pub struct DimensionBounds {
        pub min_mm: f64,
        pub max_mm: f64,
        pub policy: BoundsPolicy,
        pub max_perforations: usize,
    }

    impl DimensionBounds {
        pub fn new(min_mm: f64, max_mm: f64) -> Self {
            Self {
                min_mm,
                max_mm,
                ..Self::default()
            }
        }

        pub fn with_policy(mut self, policy: BoundsPolicy) -> Self {
            self.policy = policy;
            self
        }

        pub fn with_max_perforations(mut self, max_perforations: usize) -> Self {
            self.max_perforations = max_perforations;
            self
        }
    }

    impl Default for DimensionBounds {
        fn default() -> Self {
            Self {
                min_mm: 1.0,
                max_mm: 6000.0,
                policy: BoundsPolicy::Reject,
                max_perforations: 50,
            }
        }
    }

    #[derive(Debug, Clone, PartialEq, Error)]
    pub enum ValidationError {
        #[error("{field} must be a positive finite number, got {value}")]
        NonPositive { field: &'static str, value: f64 },
        #[error("{field} = {value} mm is outside the allowed range {min}..={max} mm")]
        OutOfBounds {
            field: &'static str,
            value: f64,
            min: f64,
            max: f64,
        },
        #[error("invalid dimension bounds {min}..={max}")]
        InvalidBounds { min: f64, max: f64 },
        #[error("perforation {id} has non-positive diameter {value}")]
        NonPositiveDiameter { id: PerforationId, value: f64 },
        #[error("perforation {id} has a non-finite {axis} coordinate")]
        NonFiniteCoordinate { id: PerforationId, axis: Axis },
        #[error("perforation id {0} is used more than once")]
        DuplicatePerforationId(PerforationId),
        #[error("{count} perforations exceed the maximum of {max}")]
        TooManyPerforations { count: usize, max: usize },
    }

    /// 孔位越界的具体情形。
    #[derive(Debug, Clone, Copy, PartialEq, Serialize)]
    #[serde(tag = "kind", rename_all = "snake_case")]
    pub enum RangeViolation {
        /// 圆心坐标小于 0。
        CenterBeforeStart { value: f64 },
        /// 圆心坐标超出面板尺寸。
        CenterBeyondEnd { value: f64, limit: f64 },
        /// 圆心在面板内，但圆越过起始边。
        CircleCrossesStart { reach: f64 },
        /// 圆心在面板内，但圆越过终止边。
        CircleCrossesEnd { reach: f64, limit: f64 },
        /// 直径大于面板较短边。
        DiameterExceedsPanel { diameter: f64, limit: f64 },
    }

    /// 非致命的范围告警，作为数据返回给调用方显示。
    #[derive(Debug, Clone, Copy, PartialEq, Serialize)]
    pub struct RangeWarning {
        pub perforation_id: PerforationId,
        pub axis: Axis,
        pub violation: RangeViolation,
    }

    impl fmt::Display for RangeWarning {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            let id = self.perforation_id;
            let axis = self.axis;
            match self.violation {
                RangeViolation::CenterBeforeStart { value } => {
                    write!(f, "perforation {id}: {axis} = {value} is below 0")
                }
                RangeViolation::CenterBeyondEnd { value, limit } => write!(
                    f,
                    "perforation {id}: {axis} = {value} is outside the panel (max {limit})"
                ),
                RangeViolation::CircleCrossesStart { reach } => write!(
                    f,
                    "perforation {id}: hole extends past the start edge on {axis} (reaches {reach})"
                ),
                RangeViolation::CircleCrossesEnd { reach, limit } => write!(
                    f,
                    "perforation {id}: hole extends past the end edge on {axis} (reaches {reach}, max {limit})"
                ),
                RangeViolation::DiameterExceedsPanel { diameter, limit } => write!(
                    f,
                    "perforation {id}: diameter {diameter} exceeds the panel {axis} extent {limit}"
                ),
            }
        }
    }

    /// 校验结果：不可变规格、孔位列表（保持输入顺序）与告警。
    #[derive(Debug, Clone, PartialEq)]
    pub struct ValidatedPanel {
        pub spec: PanelSpec,
        pub perforations: Vec<Perforation>,
        pub warnings: Vec<RangeWarning>,
    }

    /// 校验并规范化原始输入。纯函数，除日志外无副作用。
    pub fn validate(
        raw: &RawPanel,
        bounds: &DimensionBounds,
    ) -> Result<ValidatedPanel, ValidationError> {
        if !(bounds.min_mm.is_finite() && bounds.max_mm.is_finite())
            || bounds.min_mm <= 0.0
            || bounds.min_mm > bounds.max_mm
        {
            return Err(ValidationError::InvalidBounds {
                min: bounds.min_mm,
                max: bounds.max_mm,
            });
        }

        let width_mm = checked_dimension("width_mm", raw.width_mm, bounds)?;
        let height_mm = checked_dimension("height_mm", raw.height_mm, bounds)?;
        let thickness_mm = positive("thickness_mm", raw.thickness_mm)?;

        if raw.perforations.len() > bounds.max_perforations {
            return Err(ValidationError::TooManyPerforations {
                count: raw.perforations.len(),
                max: bounds.max_perforations,
            });
        }

        let spec = PanelSpec::new(width_mm, height_mm, thickness_mm, raw.style, raw.color);

        let mut seen = HashSet::new();
        let mut perforations = Vec::with_capacity(raw.perforations.len());
        let mut warnings = Vec::new();
        for (index, input) in raw.perforations.iter().enumerate() {
            let id = PerforationId::new(input.id.unwrap_or(index as u32 + 1));
            if !seen.insert(id) {
                return Err(ValidationError::DuplicatePerforationId(id));
            }
            for (axis, value) in [(Axis::X, input.x_mm), (Axis::Y, input.y_mm)] {
                if !value.is_finite() {
                    return Err(ValidationError::NonFiniteCoordinate { id, axis });
                }
            }
            if !(input.diameter_mm.is_finite() && input.diameter_mm > 0.0) {
                return Err(ValidationError::NonPositiveDiameter {
                    id,
                    value: input.diameter_mm,
                });
            }

            let perforation =
                Perforation::new(id, Point2::new(input.x_mm, input.y_mm), input.diameter_mm);
            collect_range_warnings(&spec, &perforation, &mut warnings);
            perforations.push(perforation);
        }

        for warning in &warnings {
            warn!(
                perforation = warning.perforation_id.get(),
                axis = %warning.axis,
                "{warning}"
            );
        }
        debug!(
            width_mm,
            height_mm,
            thickness_mm,
            perforations = perforations.len(),
            warnings = warnings.len(),
            "面板规格校验完成"
        );

        Ok(ValidatedPanel {
            spec,
            perforations,
            warnings,
        })
    }

    fn positive(field: &'static str, value: f64) -> Result<f64, ValidationError> {
        if value.is_finite() && value > 0.0 {
            Ok(value)
        } else {
            Err(ValidationError::NonPositive { field, value })
        }
    }

    fn checked_dimension(
        field: &'static str,
        value: f64,
        bounds: &DimensionBounds,
    ) -> Result<f64, ValidationError> {
        let value = positive(field, value)?;
        if (bounds.min_mm..=bounds.max_mm).contains(&value) {
            return Ok(value);
        }
        match bounds.policy {
            BoundsPolicy::Reject => Err(ValidationError::OutOfBounds {
                field,
                value,
                min: bounds.min_mm,
                max: bounds.max_mm,
            }),
            BoundsPolicy::Clamp => {
                let clamped = value.clamp(bounds.min_mm, bounds.max_mm);
                warn!(field, value, clamped, "尺寸超出范围，已截断");
                Ok(clamped)
            }
        }
    }

    /// 每根轴最多一条告警：圆心越界优先于圆越过边缘。
    fn collect_range_warnings(
        spec: &PanelSpec,
        perforation: &Perforation,
        warnings: &mut Vec<RangeWarning>,
    ) {
        let id = perforation.id();
        let radius = perforation.radius_mm();
        for axis in Axis::ALL {
            let value = perforation.center().component(axis);
            let limit = spec.extent(axis);
            let violation = if value < 0.0 {
                Some(RangeViolation::CenterBeforeStart { value })
            } else if value > limit {
                Some(RangeViolation::CenterBeyondEnd { value, limit })
            } else if value - radius < 0.0 {
                Some(RangeViolation::CircleCrossesStart {
                    reach: value - radius,
                })
            } else if value + radius > limit {
                Some(RangeViolation::CircleCrossesEnd {
                    reach: value + radius,
                    limit,
                })
            } else {
                None
            };
            if let Some(violation) = violation {
                warnings.push(RangeWarning {
                    perforation_id: id,
                    axis,
                    violation,
                });
            }
        }

        let (short_axis, short_extent) = if spec.height_mm() < spec.width_mm() {
            (Axis::Y, spec.height_mm())
        } else {
            (Axis::X, spec.width_mm())
        };
        if perforation.diameter_mm() > short_extent {
            warnings.push(RangeWarning {
                perforation_id: id,
                axis: short_axis,
                violation: RangeViolation::DiameterExceedsPanel {
                    diameter: perforation.diameter_mm(),
                    limit: short_extent,
                },
            });
        }
    }

}
