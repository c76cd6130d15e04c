use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use panelcad_config::{AppConfig, ConfigError, OutputFormat};
use panelcad_core::panel::Preset;
use panelcad_frontend::cli::CliRequest;
use panelcad_frontend::loader::{PanelSource, PresetOverrides};
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

/// 生成玻璃面板的打孔预览图与标准图纸。
#[derive(Debug, Parser)]
#[command(name = "panelcad", version)]
struct Args {
    /// 配置文件路径，缺省时读取 `PANELCAD_CONFIG` 或 ./config/default.toml。
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
    /// 面板规格文件（.toml 或 .json）。
    #[arg(long, value_name = "PATH", conflicts_with = "preset")]
    spec: Option<PathBuf>,
    /// 尺寸预设，例如 `standard-door`。
    #[arg(long, value_name = "NAME")]
    preset: Option<String>,
    /// 覆盖厚度（毫米）。
    #[arg(long, value_name = "MM")]
    thickness: Option<f64>,
    /// 预设生成的孔数。
    #[arg(long, value_name = "N")]
    perforations: Option<usize>,
    /// 输出目录。
    #[arg(long, value_name = "DIR")]
    out: Option<PathBuf>,
    /// 输出格式，可重复指定。
    #[arg(long = "format", value_enum, value_name = "FORMAT")]
    formats: Vec<FormatArg>,
    /// 列出可用预设后退出。
    #[arg(long)]
    list_presets: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum FormatArg {
    Svg,
    Dxf,
    Json,
}

impl From<FormatArg> for OutputFormat {
    fn from(value: FormatArg) -> Self {
        match value {
            FormatArg::Svg => OutputFormat::Svg,
            FormatArg::Dxf => OutputFormat::Dxf,
            FormatArg::Json => OutputFormat::Json,
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    if args.list_presets {
        for preset in Preset::ALL {
            let (width, height) = preset.dimensions();
            println!("{:<14} {width}x{height} mm  {}", preset.key(), preset.display_name());
        }
        return Ok(());
    }

    let (config, fallback) = load_configuration(args.config.clone())?;
    init_logging(&config);
    if let Some(err) = fallback {
        report_fallback(&err);
    }
    info!("启动 panelcad");

    let source =
        PanelSource::resolve(args.spec.clone(), args.preset.as_deref(), &config.frontend)?;
    let formats = if args.formats.is_empty() {
        config.output.formats.clone()
    } else {
        args.formats.iter().copied().map(OutputFormat::from).collect()
    };
    let request = CliRequest {
        source,
        overrides: PresetOverrides {
            thickness_mm: args.thickness,
            perforations: args.perforations,
        },
        output_dir: args.out.unwrap_or_else(|| config.output.directory.clone()),
        formats,
    };

    panelcad_frontend::run_cli(&config, &request).context("生成图纸失败")?;
    Ok(())
}

/// 显式指定的配置文件必须可读；自动发现失败时回退到内建默认值，并把错误
/// 交回调用方，待日志初始化后再报告。
fn load_configuration(override_path: Option<PathBuf>) -> Result<(AppConfig, Option<ConfigError>)> {
    match override_path {
        Some(path) => {
            let config = AppConfig::from_file(&path)
                .with_context(|| format!("加载配置文件 {} 失败", path.display()))?;
            Ok((config, None))
        }
        None => match AppConfig::discover() {
            Ok(cfg) => Ok((cfg, None)),
            Err(err) => Ok((AppConfig::default(), Some(err))),
        },
    }
}

fn report_fallback(err: &ConfigError) {
    match err {
        ConfigError::Io { path, .. } | ConfigError::Parse { path, .. } => {
            warn!(path = %path.display(), error = %err, "加载默认配置失败，使用内建默认值");
        }
        ConfigError::Context { .. } => {
            warn!(error = %err, "加载默认配置失败，使用内建默认值");
        }
    }
}

fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_new(config.logging.level.clone()).unwrap_or_else(|_| EnvFilter::new("info"));
    // 日志写到 stderr，stdout 只输出概览。
    let subscriber = fmt().with_env_filter(filter).with_writer(std::io::stderr);
    if subscriber.try_init().is_err() {
        // 已初始化，忽略
    }
}
