use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

/// 应用配置的根结构。
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub frontend: FrontendConfig,
    #[serde(default)]
    pub panel: PanelConfig,
    #[serde(default)]
    pub layout: LayoutConfig,
    #[serde(default)]
    pub preview: PreviewConfig,
    #[serde(default)]
    pub document: DocumentConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

impl AppConfig {
    /// 从显式路径加载配置。
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// 自动发现配置文件：优先读取环境变量 `PANELCAD_CONFIG`，否则寻找 `./config/default.toml`。
    /// 若文件缺失，则返回默认配置。
    pub fn discover() -> Result<Self, ConfigError> {
        if let Some(path) = env::var_os("PANELCAD_CONFIG") {
            return Self::from_file(PathBuf::from(path));
        }

        let default_path = env::current_dir()
            .map(|dir| dir.join("config").join("default.toml"))
            .map_err(|source| ConfigError::Context {
                message: "获取当前工作目录失败".to_string(),
                source,
            })?;

        if default_path.exists() {
            Self::from_file(default_path)
        } else {
            Ok(Self::default())
        }
    }
}

/// 日志配置，支持设置默认等级。
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "LoggingConfig::default_level")]
    pub level: String,
}

impl LoggingConfig {
    fn default_level() -> String {
        "info".to_string()
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: Self::default_level(),
        }
    }
}

/// 未指定规格文件时 CLI 使用的预设输入。
#[derive(Debug, Clone, Deserialize)]
pub struct FrontendConfig {
    #[serde(default = "FrontendConfig::default_preset")]
    pub default_preset: String,
    #[serde(default = "FrontendConfig::default_thickness")]
    pub default_thickness_mm: f64,
    #[serde(default = "FrontendConfig::default_perforations")]
    pub default_perforations: usize,
}

impl FrontendConfig {
    fn default_preset() -> String {
        "custom".to_string()
    }

    fn default_thickness() -> f64 {
        6.0
    }

    fn default_perforations() -> usize {
        1
    }
}

impl Default for FrontendConfig {
    fn default() -> Self {
        Self {
            default_preset: Self::default_preset(),
            default_thickness_mm: Self::default_thickness(),
            default_perforations: Self::default_perforations(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BoundsPolicyConfig {
    #[default]
    Reject,
    Clamp,
}

/// 面板主尺寸范围。各部署的上限不同（2300 / 5000 / 6000 mm）。
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PanelConfig {
    pub min_mm: f64,
    pub max_mm: f64,
    pub bounds_policy: BoundsPolicyConfig,
    pub max_perforations: usize,
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self {
            min_mm: 1.0,
            max_mm: 6000.0,
            bounds_policy: BoundsPolicyConfig::Reject,
            max_perforations: 50,
        }
    }
}

/// 标注布局常量（标注单位）。
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    pub base_gap: f64,
    pub gap_increment: f64,
    pub perpendicular_clearance: f64,
    pub label_gap: f64,
    pub overall_outset: f64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            base_gap: 30.0,
            gap_increment: 22.0,
            perpendicular_clearance: 40.0,
            label_gap: 10.0,
            overall_outset: 40.0,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PreviewConfig {
    pub scale: f64,
    pub padding: f64,
    pub callout_font_size: f64,
    pub overall_font_size: f64,
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self {
            scale: 0.20,
            padding: 80.0,
            callout_font_size: 10.0,
            overall_font_size: 14.0,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PageSizeConfig {
    #[default]
    A4,
    A3,
    Letter,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrientationConfig {
    #[default]
    Portrait,
    Landscape,
}

/// 打印图纸的版面设置，长度单位为点。
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DocumentConfig {
    pub page: PageSizeConfig,
    pub orientation: OrientationConfig,
    pub side_margin: f64,
    pub header_band: f64,
    pub footer_band: f64,
    pub frame_margin: f64,
    pub title: String,
    pub callout_font_size: f64,
    pub overall_font_size: f64,
    pub annotation_scale: f64,
}

impl Default for DocumentConfig {
    fn default() -> Self {
        Self {
            page: PageSizeConfig::A4,
            orientation: OrientationConfig::Portrait,
            side_margin: 100.0,
            header_band: 200.0,
            footer_band: 150.0,
            frame_margin: 20.0,
            title: "STANDARD DRAWING".to_string(),
            callout_font_size: 8.0,
            overall_font_size: 12.0,
            annotation_scale: 0.5,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Svg,
    Dxf,
    Json,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "OutputConfig::default_directory")]
    pub directory: PathBuf,
    #[serde(default = "OutputConfig::default_formats")]
    pub formats: Vec<OutputFormat>,
}

impl OutputConfig {
    fn default_directory() -> PathBuf {
        PathBuf::from("output")
    }

    fn default_formats() -> Vec<OutputFormat> {
        vec![OutputFormat::Svg]
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: Self::default_directory(),
            formats: Self::default_formats(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("读取配置文件 {path:?} 失败: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("解析配置文件 {path:?} 失败: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("{message}")]
    Context {
        message: String,
        #[source]
        source: std::io::Error,
    },
}
