pub mod cli;
pub mod errors;
pub mod loader;
pub mod settings;

use cli::{CliReport, CliRequest};
use errors::FrontendError;
use panelcad_config::AppConfig;
use tracing::info;

/// 运行 CLI 前端并把技术概览打印到标准输出。
pub fn run_cli(config: &AppConfig, request: &CliRequest) -> Result<CliReport, FrontendError> {
    info!("启动 CLI 前端");
    let report = cli::run(config, request)?;
    print!("{}", report.summary);
    Ok(report)
}
