#![forbid(unsafe_code)]

use revop::{ConfigError, EngineError};

pub type Result<T> = std::result::Result<T, DemoError>;

#[derive(Debug, thiserror::Error)]
pub enum DemoError {
    #[error("failed to load engine config: {0}")]
    Config(#[from] ConfigError),

    #[error("scenario '{scenario}' failed: {source}")]
    Engine {
        scenario: &'static str,
        #[source]
        source: EngineError,
    },
}

impl DemoError {
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config(_) => 2,
            Self::Engine { source, .. } if source.is_fatal() => 3,
            Self::Engine { .. } => 1,
        }
    }
}
