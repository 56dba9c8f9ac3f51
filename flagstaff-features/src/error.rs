//! Error types for flag parsing and serialization

use thiserror::Error;

/// Result type for flag operations that can fail
pub type FlagResult<T> = Result<T, FlagError>;

/// Flag errors.
///
/// Evaluation never produces these; they only surface from the strict
/// parsing and serialization entry points.
#[derive(Debug, Error)]
pub enum FlagError {
    /// The configuration string is neither a shorthand nor a valid rule document
    #[error("Failed to parse flag rule: {0}")]
    Parse(String),

    /// The rule could not be rendered as JSON
    #[error("Failed to serialize flag rule: {0}")]
    Serialize(String),
}

impl FlagError {
    /// Create a new parse error
    pub fn parse<S: Into<String>>(msg: S) -> Self {
        Self::Parse(msg.into())
    }

    /// Create a new serialization error
    pub fn serialize<S: Into<String>>(msg: S) -> Self {
        Self::Serialize(msg.into())
    }
}

impl From<serde_json::Error> for FlagError {
    fn from(err: serde_json::Error) -> Self {
        if err.is_data() || err.is_syntax() || err.is_eof() {
            Self::Parse(err.to_string())
        } else {
            Self::Serialize(err.to_string())
        }
    }
}
