pub mod dxf;
pub mod svg;

use std::fs;
use std::path::{Path, PathBuf};

use panelcad_core::panel::{DrawingMetadata, PanelMetrics, PanelSpec, RawPanel, format_measure};
use panelcad_engine::scene::Scene;
use serde::Serialize;
use thiserror::Error;

pub use dxf::DxfWriter;
pub use svg::{SvgTheme, SvgWriter};

#[derive(Debug, Error)]
pub enum IoError {
    #[error("unsupported feature: {0}")]
    UnsupportedFeature(String),
    #[error("failed to read file {path:?}: {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write file {path:?}: {source}")]
    WriteError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid panel file {path:?}: {message}")]
    InvalidPanel { path: PathBuf, message: String },
    #[error("failed to encode {format}: {message}")]
    Encode {
        format: &'static str,
        message: String,
    },
}

/// 从文件读取未校验的面板输入。
pub trait PanelLoader {
    fn load(&self, path: &Path) -> Result<RawPanel, IoError>;
}

/// 把场景写成某种输出格式。
pub trait SceneWriter {
    /// 输出文件扩展名（不含点）。
    fn extension(&self) -> &'static str;

    fn render(&self, scene: &Scene, sheet: &TitleBlock) -> Result<String, IoError>;

    fn save(&self, scene: &Scene, sheet: &TitleBlock, path: &Path) -> Result<(), IoError> {
        let content = self.render(scene, sheet)?;
        write_text(path, &content)
    }
}

/// 图纸标题栏与页脚使用的文字信息。
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TitleBlock {
    pub title: String,
    pub client: Option<String>,
    pub reference: Option<String>,
    pub panel: String,
    pub thickness_mm: f64,
    pub area_m2: f64,
    pub weight_kg: f64,
}

impl TitleBlock {
    /// 元数据中的标题优先于默认标题。
    pub fn new(
        default_title: &str,
        metadata: &DrawingMetadata,
        spec: &PanelSpec,
        metrics: &PanelMetrics,
    ) -> Self {
        Self {
            title: metadata
                .title
                .clone()
                .unwrap_or_else(|| default_title.to_string()),
            client: metadata.client.clone(),
            reference: metadata.reference.clone(),
            panel: spec.summary_label(),
            thickness_mm: spec.thickness_mm(),
            area_m2: metrics.rounded_area_m2(),
            weight_kg: metrics.weight_kg,
        }
    }

    /// 页脚文字行，按出现顺序排列。
    pub fn footer_lines(&self) -> Vec<String> {
        let mut lines = vec![format!(
            "PANEL {} mm  |  THICKNESS {} mm  |  AREA {} m2  |  WEIGHT {:.1} kg",
            self.panel,
            format_measure(self.thickness_mm),
            format_measure(self.area_m2),
            self.weight_kg
        )];
        let mut details = Vec::new();
        if let Some(client) = &self.client {
            details.push(format!("CLIENT: {client}"));
        }
        if let Some(reference) = &self.reference {
            details.push(format!("REF: {reference}"));
        }
        if !details.is_empty() {
            lines.push(details.join("  |  "));
        }
        lines
    }
}

/// 面板规格文件：按扩展名选择 TOML 或 JSON。
#[derive(Debug, Default, Clone, Copy)]
pub struct PanelFileFacade;

impl PanelFileFacade {
    pub fn new() -> Self {
        Self
    }

    pub fn save(&self, panel: &RawPanel, path: &Path) -> Result<(), IoError> {
        let content = match PanelFormat::from_path(path)? {
            PanelFormat::Toml => toml::to_string_pretty(panel).map_err(|err| IoError::Encode {
                format: "toml",
                message: err.to_string(),
            })?,
            PanelFormat::Json => {
                serde_json::to_string_pretty(panel).map_err(|err| IoError::Encode {
                    format: "json",
                    message: err.to_string(),
                })?
            }
        };
        write_text(path, &content)
    }
}

impl PanelLoader for PanelFileFacade {
    fn load(&self, path: &Path) -> Result<RawPanel, IoError> {
        let format = PanelFormat::from_path(path)?;
        let data = fs::read_to_string(path).map_err(|source| IoError::ReadError {
            path: path.to_path_buf(),
            source,
        })?;
        let invalid = |message: String| IoError::InvalidPanel {
            path: path.to_path_buf(),
            message,
        };
        match format {
            PanelFormat::Toml => toml::from_str(&data).map_err(|err| invalid(err.to_string())),
            PanelFormat::Json => {
                serde_json::from_str(&data).map_err(|err| invalid(err.to_string()))
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PanelFormat {
    Toml,
    Json,
}

impl PanelFormat {
    fn from_path(path: &Path) -> Result<Self, IoError> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase());
        match extension.as_deref() {
            Some("toml") => Ok(Self::Toml),
            Some("json") => Ok(Self::Json),
            other => Err(IoError::UnsupportedFeature(format!(
                "panel file extension {:?} (expected .toml or .json)",
                other.unwrap_or("")
            ))),
        }
    }
}

/// 以 JSON 导出完整场景，供外部渲染器使用。
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonSceneWriter;

#[derive(Serialize)]
struct SceneDocument<'a> {
    sheet: &'a TitleBlock,
    scene: &'a Scene,
}

impl SceneWriter for JsonSceneWriter {
    fn extension(&self) -> &'static str {
        "json"
    }

    fn render(&self, scene: &Scene, sheet: &TitleBlock) -> Result<String, IoError> {
        serde_json::to_string_pretty(&SceneDocument { sheet, scene }).map_err(|err| {
            IoError::Encode {
                format: "json",
                message: err.to_string(),
            }
        })
    }
}

fn write_text(path: &Path, content: &str) -> Result<(), IoError> {
    if let Some(parent) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|source| IoError::WriteError {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    fs::write(path, content).map_err(|source| IoError::WriteError {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn panel_format_follows_extension() {
        assert_eq!(
            PanelFormat::from_path(Path::new("a/panel.TOML")).unwrap(),
            PanelFormat::Toml
        );
        assert_eq!(
            PanelFormat::from_path(Path::new("panel.json")).unwrap(),
            PanelFormat::Json
        );
        assert!(matches!(
            PanelFormat::from_path(Path::new("panel.yaml")),
            Err(IoError::UnsupportedFeature(_))
        ));
        assert!(PanelFormat::from_path(Path::new("panel")).is_err());
    }
}
