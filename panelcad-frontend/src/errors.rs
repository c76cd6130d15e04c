use panelcad_engine::errors::EngineError;
use panelcad_io::IoError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FrontendError {
    #[error(transparent)]
    Io(#[from] IoError),
    #[error(transparent)]
    Engine(#[from] EngineError),
    #[error("预设无效: {0}")]
    UnknownPreset(String),
    #[error("配置无效: {0}")]
    InvalidConfig(String),
}
