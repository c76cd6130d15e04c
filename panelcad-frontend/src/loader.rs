use std::path::PathBuf;

use panelcad_config::FrontendConfig;
use panelcad_core::panel::{Preset, RawPanel};
use panelcad_io::{PanelFileFacade, PanelLoader};
use tracing::info;

use crate::errors::FrontendError;

/// 面板输入来源，便于前端呈现加载信息。
#[derive(Debug, Clone, PartialEq)]
pub enum PanelSource {
    File(PathBuf),
    Preset(Preset),
}

impl PanelSource {
    /// 规格文件优先；否则使用指定预设，再否则使用配置中的默认预设。
    pub fn resolve(
        spec: Option<PathBuf>,
        preset: Option<&str>,
        frontend: &FrontendConfig,
    ) -> Result<Self, FrontendError> {
        if let Some(path) = spec {
            return Ok(Self::File(path));
        }
        let name = preset.unwrap_or(&frontend.default_preset);
        name.parse::<Preset>()
            .map(Self::Preset)
            .map_err(FrontendError::UnknownPreset)
    }

    pub fn describe(&self) -> String {
        match self {
            PanelSource::File(path) => format!("file {}", path.display()),
            PanelSource::Preset(preset) => format!("preset {}", preset.display_name()),
        }
    }
}

/// 预设生成输入时可覆盖的参数。
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PresetOverrides {
    pub thickness_mm: Option<f64>,
    pub perforations: Option<usize>,
}

/// 读取原始面板输入。文件输入原样返回，预设按默认孔位排布生成。
pub fn load_panel(
    source: &PanelSource,
    frontend: &FrontendConfig,
    overrides: PresetOverrides,
) -> Result<RawPanel, FrontendError> {
    match source {
        PanelSource::File(path) => {
            let mut raw = PanelFileFacade::new().load(path)?;
            if let Some(thickness) = overrides.thickness_mm {
                raw.thickness_mm = thickness;
            }
            info!(
                path = %path.display(),
                perforations = raw.perforations.len(),
                "已加载面板规格文件"
            );
            Ok(raw)
        }
        PanelSource::Preset(preset) => {
            let thickness = overrides
                .thickness_mm
                .unwrap_or(frontend.default_thickness_mm);
            let count = overrides
                .perforations
                .unwrap_or(frontend.default_perforations);
            info!(preset = preset.key(), thickness, count, "使用预设生成面板输入");
            Ok(preset.raw_panel(thickness, count))
        }
    }
}
