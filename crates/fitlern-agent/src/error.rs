use thiserror::Error;

#[derive(Debug, Error)]
pub enum AgentError {
    #[error("Snapshot (de)serialization failed: {0}")]
    Snapshot(#[from] serde_json::Error),
    #[error("Snapshot I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid configuration: {0}")]
    Config(String),
    #[error("Incompatible snapshot: {0}")]
    Incompatible(String),
}

pub type Result<T> = std::result::Result<T, AgentError>;
