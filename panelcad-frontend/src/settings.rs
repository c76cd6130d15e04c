use panelcad_config::{
    AppConfig, BoundsPolicyConfig, DocumentConfig, LayoutConfig, OrientationConfig, PageSizeConfig,
    PanelConfig, PreviewConfig,
};
use panelcad_core::validation::{BoundsPolicy, DimensionBounds};
use panelcad_engine::layout::LayoutParams;
use panelcad_engine::pipeline::Pipeline;
use panelcad_engine::scene::{
    AnnotationStyle, FixedRatioViewport, Orientation, PageSize, PageViewport,
};

use crate::errors::FrontendError;

/// 把 `[panel]` 配置映射为校验使用的尺寸范围。
pub fn dimension_bounds(panel: &PanelConfig) -> DimensionBounds {
    let policy = match panel.bounds_policy {
        BoundsPolicyConfig::Reject => BoundsPolicy::Reject,
        BoundsPolicyConfig::Clamp => BoundsPolicy::Clamp,
    };
    DimensionBounds::new(panel.min_mm, panel.max_mm)
        .with_policy(policy)
        .with_max_perforations(panel.max_perforations)
}

pub fn layout_params(layout: &LayoutConfig) -> Result<LayoutParams, FrontendError> {
    let values = [
        ("base_gap", layout.base_gap),
        ("perpendicular_clearance", layout.perpendicular_clearance),
        ("label_gap", layout.label_gap),
        ("overall_outset", layout.overall_outset),
    ];
    if let Some((name, value)) = values
        .iter()
        .find(|(_, value)| !(value.is_finite() && *value >= 0.0))
    {
        return Err(FrontendError::InvalidConfig(format!(
            "layout.{name} 必须为非负数，当前为 {value}"
        )));
    }
    // 堆叠外伸必须严格递增。
    if !(layout.gap_increment.is_finite() && layout.gap_increment > 0.0) {
        return Err(FrontendError::InvalidConfig(format!(
            "layout.gap_increment 必须为正数，当前为 {}",
            layout.gap_increment
        )));
    }
    Ok(LayoutParams {
        base_gap: layout.base_gap,
        gap_increment: layout.gap_increment,
        perpendicular_clearance: layout.perpendicular_clearance,
        label_gap: layout.label_gap,
        overall_outset: layout.overall_outset,
    })
}

pub fn preview_viewport(preview: &PreviewConfig) -> FixedRatioViewport {
    FixedRatioViewport {
        scale: preview.scale,
        padding: preview.padding,
        style: AnnotationStyle {
            callout_font_size: preview.callout_font_size,
            overall_font_size: preview.overall_font_size,
            ..AnnotationStyle::preview()
        },
    }
}

pub fn document_viewport(document: &DocumentConfig) -> PageViewport {
    let size = match document.page {
        PageSizeConfig::A4 => PageSize::A4,
        PageSizeConfig::A3 => PageSize::A3,
        PageSizeConfig::Letter => PageSize::Letter,
    };
    let orientation = match document.orientation {
        OrientationConfig::Portrait => Orientation::Portrait,
        OrientationConfig::Landscape => Orientation::Landscape,
    };
    PageViewport {
        side_margin: document.side_margin,
        header_band: document.header_band,
        footer_band: document.footer_band,
        frame_margin: document.frame_margin,
        style: AnnotationStyle {
            callout_font_size: document.callout_font_size,
            overall_font_size: document.overall_font_size,
            annotation_scale: document.annotation_scale,
            ..AnnotationStyle::document()
        },
        ..PageViewport::new(size, orientation)
    }
}

/// 按配置组装流水线。视口参数在构建场景时再校验。
pub fn pipeline_from_config(config: &AppConfig) -> Result<Pipeline, FrontendError> {
    Ok(Pipeline::new(dimension_bounds(&config.panel))
        .with_layout_params(layout_params(&config.layout)?)
        .with_preview(preview_viewport(&config.preview))
        .with_document(document_viewport(&config.document)))
}
