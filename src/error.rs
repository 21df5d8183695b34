use thiserror::Error;

/// Classifies domain errors for programmatic matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Domain string failed the grammar (empty, stray separator, bad character)
    InvalidDomain,
    /// Construction key was not a string
    InvalidKeyType,
    /// Element could not be converted into the collection's element type
    InvalidElement,
    /// Construction input had an unsupported shape
    InvalidInput,
    /// JSON encoding or decoding failure
    Json,
}

/// Domain library error types
#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Invalid domain: {0:?}")]
    InvalidDomain(String),

    #[error("Invalid key type: {0} (keys must be domain strings)")]
    InvalidKeyType(String),

    #[error("Invalid element for domain {domain}: {message}")]
    InvalidElement { domain: String, message: String },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl DomainError {
    /// Error classification, independent of the message.
    pub fn kind(&self) -> ErrorKind {
        match self {
            DomainError::InvalidDomain(_) => ErrorKind::InvalidDomain,
            DomainError::InvalidKeyType(_) => ErrorKind::InvalidKeyType,
            DomainError::InvalidElement { .. } => ErrorKind::InvalidElement,
            DomainError::InvalidInput(_) => ErrorKind::InvalidInput,
            DomainError::Json(_) => ErrorKind::Json,
        }
    }
}

pub type Result<T> = std::result::Result<T, DomainError>;
