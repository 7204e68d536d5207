use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    #[error("Embedding failed: {0}")]
    Embedding(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Storage failure on '{key}': {reason}")]
    Storage { key: String, reason: String },

    #[error("Corrupt blob '{key}': {reason}")]
    Corrupt { key: String, reason: String },

    #[error("Vector dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Document '{0}' has no text to index")]
    EmptyDocument(String),
}

impl Error {
    pub fn storage(key: impl Into<String>, reason: impl ToString) -> Self {
        Self::Storage { key: key.into(), reason: reason.to_string() }
    }

    pub fn corrupt(key: impl Into<String>, reason: impl ToString) -> Self {
        Self::Corrupt { key: key.into(), reason: reason.to_string() }
    }

    /// True when the failure only means "nothing persisted under this key".
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
