use panelcad_core::panel::{PanelMetrics, PanelSpec, Perforation, RawPanel};
use panelcad_core::validation::{DimensionBounds, RangeWarning, validate};
use tracing::{debug, info};

use crate::errors::EngineError;
use crate::layout::{DimensionLayout, LayoutParams, layout_dimensions};
use crate::scene::{
    ApproxTextMeasure, FixedRatioViewport, PageViewport, Scene, TextMeasure, Viewport, build_scene,
};

/// 一次计算的全部产物：规格、告警、派生指标、抽象布局以及两种场景。
#[derive(Debug, Clone, PartialEq)]
pub struct PanelRender {
    pub spec: PanelSpec,
    pub perforations: Vec<Perforation>,
    pub warnings: Vec<RangeWarning>,
    pub metrics: PanelMetrics,
    pub layout: DimensionLayout,
    pub preview: Scene,
    pub document: Scene,
}

/// 校验 → 布局 → 场景 的流水线配置。调用方持有，核心不读取任何全局状态；
/// 每次调用都从头计算。
pub struct Pipeline {
    bounds: DimensionBounds,
    params: LayoutParams,
    preview: FixedRatioViewport,
    document: PageViewport,
    measure: Box<dyn TextMeasure + Send + Sync>,
}

impl Pipeline {
    pub fn new(bounds: DimensionBounds) -> Self {
        Self {
            bounds,
            params: LayoutParams::default(),
            preview: FixedRatioViewport::default(),
            document: PageViewport::default(),
            measure: Box::new(ApproxTextMeasure::default()),
        }
    }

    pub fn with_layout_params(mut self, params: LayoutParams) -> Self {
        self.params = params;
        self
    }

    pub fn with_preview(mut self, preview: FixedRatioViewport) -> Self {
        self.preview = preview;
        self
    }

    pub fn with_document(mut self, document: PageViewport) -> Self {
        self.document = document;
        self
    }

    /// 替换标签测量实现，例如接入真实字体度量。
    pub fn with_text_measure<M>(mut self, measure: M) -> Self
    where
        M: TextMeasure + Send + Sync + 'static,
    {
        self.measure = Box::new(measure);
        self
    }

    #[inline]
    pub fn bounds(&self) -> &DimensionBounds {
        &self.bounds
    }

    #[inline]
    pub fn layout_params(&self) -> &LayoutParams {
        &self.params
    }

    /// 计算预览与图纸两种场景。校验失败时不产生任何场景。
    pub fn render(&self, raw: &RawPanel) -> Result<PanelRender, EngineError> {
        let validated = validate(raw, &self.bounds)?;
        let layout = layout_dimensions(&validated.spec, &validated.perforations, &self.params);
        let preview = build_scene(
            &validated.spec,
            &validated.perforations,
            &layout,
            &Viewport::FixedRatio(self.preview),
            self.measure.as_ref(),
        )?;
        let document = build_scene(
            &validated.spec,
            &validated.perforations,
            &layout,
            &Viewport::FitToPage(self.document),
            self.measure.as_ref(),
        )?;
        let metrics = validated.spec.metrics();

        info!(
            panel = %validated.spec.summary_label(),
            perforations = validated.perforations.len(),
            warnings = validated.warnings.len(),
            area_m2 = metrics.area_m2,
            weight_kg = metrics.weight_kg,
            "面板计算完成"
        );

        Ok(PanelRender {
            spec: validated.spec,
            perforations: validated.perforations,
            warnings: validated.warnings,
            metrics,
            layout,
            preview,
            document,
        })
    }

    /// 仅为单个视口构建场景。
    pub fn scene_for(&self, raw: &RawPanel, viewport: &Viewport) -> Result<Scene, EngineError> {
        let validated = validate(raw, &self.bounds)?;
        let layout = layout_dimensions(&validated.spec, &validated.perforations, &self.params);
        debug!(space = ?viewport.space(), "构建单视口场景");
        build_scene(
            &validated.spec,
            &validated.perforations,
            &layout,
            viewport,
            self.measure.as_ref(),
        )
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new(DimensionBounds::default())
    }
}

#[cfg(test)]
mod tests {
    use panelcad_core::geometry::Axis;
    use panelcad_core::panel::PerforationId;
    use panelcad_core::validation::{RangeViolation, ValidationError};

    use super::*;
    use crate::layout::EdgeSide;

    #[test]
    fn plain_panel_scenario() {
        let render = Pipeline::default()
            .render(&RawPanel::new(1200.0, 800.0, 6.0))
            .expect("render plain panel");
        assert!((render.metrics.area_m2 - 0.96).abs() < 1e-9);
        assert!((render.metrics.weight_kg - 14.4).abs() < 1e-9);
        for scene in [&render.preview, &render.document] {
            assert!(scene.perforations.is_empty());
            assert!(scene.callouts.is_empty());
            let labels: Vec<&str> = scene
                .dimensions
                .iter()
                .map(|dimension| dimension.label.text.as_str())
                .collect();
            assert_eq!(labels, vec!["1200 mm", "800 mm"]);
        }
    }

    #[test]
    fn single_perforation_scenario() {
        let raw = RawPanel::new(1200.0, 800.0, 6.0).with_perforation(100.0, 100.0, 50.0);
        let render = Pipeline::default().render(&raw).expect("render");
        assert!(render.warnings.is_empty());

        let id = PerforationId::new(1);
        let x = render.layout.callout(id, Axis::X).expect("x callout");
        let y = render.layout.callout(id, Axis::Y).expect("y callout");
        assert_eq!(x.side.describe(Axis::X), "left");
        assert_eq!(y.side.describe(Axis::Y), "top");

        for scene in [&render.preview, &render.document] {
            let circle = scene.perforations[0].circle;
            let rect = scene.panel.rect;
            assert!(circle.center.x() - circle.radius >= rect.left());
            assert!(circle.center.y() - circle.radius >= rect.top());
            assert!(circle.center.x() + circle.radius <= rect.right());
            assert!(circle.center.y() + circle.radius <= rect.bottom());
        }
    }

    #[test]
    fn out_of_range_perforation_scenario() {
        let raw = RawPanel::new(500.0, 500.0, 6.0).with_perforation(600.0, 250.0, 50.0);
        let render = Pipeline::default().render(&raw).expect("render despite warning");

        assert_eq!(render.warnings.len(), 1);
        assert_eq!(render.warnings[0].axis, Axis::X);
        assert!(matches!(
            render.warnings[0].violation,
            RangeViolation::CenterBeyondEnd { .. }
        ));

        for scene in [&render.preview, &render.document] {
            let circle = scene.perforations[0].circle;
            assert!(circle.center.x() > scene.panel.rect.right());
            let callout = scene
                .callout(PerforationId::new(1), Axis::X)
                .expect("callout still produced");
            assert_eq!(callout.side, EdgeSide::End);
        }
    }

    #[test]
    fn validation_errors_block_rendering() {
        let err = Pipeline::default()
            .render(&RawPanel::new(-10.0, 800.0, 6.0))
            .unwrap_err();
        assert!(matches!(
            err,
            EngineError::Validation(ValidationError::NonPositive {
                field: "width_mm",
                ..
            })
        ));
    }

    #[test]
    fn rendering_is_idempotent() {
        let raw = RawPanel::new(2000.0, 1000.0, 10.0)
            .with_perforation(150.0, 900.0, 40.0)
            .with_perforation(1000.0, 500.0, 80.0)
            .with_perforation(1900.0, 100.0, 25.0);
        let pipeline = Pipeline::default();
        let first = pipeline.render(&raw).expect("first render");
        let second = pipeline.render(&raw).expect("second render");
        assert_eq!(first, second);

        let single = pipeline
            .scene_for(&raw, &Viewport::FitToPage(PageViewport::a4()))
            .expect("single viewport");
        assert_eq!(single, first.document);
    }

    struct WideGlyphs;

    impl TextMeasure for WideGlyphs {
        fn text_width(&self, text: &str, font_size: f64) -> f64 {
            text.len() as f64 * font_size
        }
    }

    #[test]
    fn custom_text_measure_sizes_labels() {
        let raw = RawPanel::new(1200.0, 800.0, 6.0).with_perforation(100.0, 100.0, 50.0);
        let narrow = Pipeline::default().render(&raw).expect("default measure");
        let wide = Pipeline::default()
            .with_text_measure(WideGlyphs)
            .render(&raw)
            .expect("custom measure");
        let id = PerforationId::new(1);
        let narrow_label = &narrow.document.callout(id, Axis::X).unwrap().label;
        let wide_label = &wide.document.callout(id, Axis::X).unwrap().label;
        assert!(wide_label.width > narrow_label.width);
        assert_eq!(wide_label.width, 3.0 * 8.0 + 4.0);
    }
}
