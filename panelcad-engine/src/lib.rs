pub mod layout;
pub mod pipeline;
pub mod scene;

pub mod errors {
    use panelcad_core::validation::ValidationError;
    use thiserror::Error;

    #[derive(Debug, Error)]
    pub enum EngineError {
        #[error("validation failed: {0}")]
        Validation(#[from] ValidationError),
        #[error("invalid viewport: {0}")]
        InvalidViewport(String),
    }
}
