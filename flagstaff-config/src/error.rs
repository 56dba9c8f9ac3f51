// Error types for flag set loading

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load flags: {0}")]
    LoadError(String),

    #[error("Failed to parse flag document: {0}")]
    ParseError(String),

    #[error("Unsupported flag file format: {0}")]
    UnknownFormat(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Environment variable error: {0}")]
    EnvError(#[from] std::env::VarError),
}

pub type Result<T> = std::result::Result<T, ConfigError>;
