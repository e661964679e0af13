use thiserror::Error;

/// Errors that can occur when configuring or running the bucketer.
#[derive(Debug, Error)]
pub enum LshError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("shape mismatch ({what}): expected {expected}, got {got}")]
    ShapeMismatch {
        what: &'static str,
        expected: usize,
        got: usize,
    },

    #[cfg(feature = "persistence")]
    #[error("serialization error: {0}")]
    Serialization(String),

    #[cfg(feature = "persistence")]
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// A specialized Result type for bucketing operations.
pub type Result<T> = std::result::Result<T, LshError>;
