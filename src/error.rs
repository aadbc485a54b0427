use crate::timestamp::Timestamp;

/// Failures surfaced by index construction, key resolution and container access.
///
/// Every variant is a local, synchronous failure. Nothing here is retried and
/// nothing is silently turned into an empty result.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Over-, under- or inconsistently specified arguments (range generation, regular index checks).
    #[error("invalid specification: {0}")]
    InvalidSpecification(String),

    /// Malformed date string or frequency code.
    #[error("cannot parse '{input}': {reason}")]
    Parse { input: String, reason: String },

    /// The key matched no position of the index.
    #[error("key not found: {0}")]
    KeyNotFound(String),

    /// A broadcast payload or container shape does not match the resolved positions.
    #[error("length mismatch: expected {expected}, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },

    /// Raw construction with uniqueness required found the same instant twice.
    #[error("duplicate timestamp: {0}")]
    DuplicateTimestamp(Timestamp),

    /// Calendar arithmetic left the representable date range, or a position is out of bounds.
    #[error("out of range: {0}")]
    OutOfRange(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("index encoding error: {0}")]
    Encode(#[from] bincode::Error),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
}

impl Error {
    pub(crate) fn parse(input: &str, reason: impl Into<String>) -> Self {
        Error::Parse {
            input: input.to_string(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
