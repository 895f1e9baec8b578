use thiserror::Error;

/// Why a catalog fetch produced no usable records.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("catalog request to {endpoint} failed: {message}")]
    Http { endpoint: String, message: String },
    #[error("catalog request to {endpoint} timed out after {seconds}s")]
    Timeout { endpoint: String, seconds: u64 },
    #[error("catalog payload is malformed: {0}")]
    Malformed(String),
    #[error("no services returned from catalog")]
    Empty,
    #[error("failed reading catalog file {path}: {message}")]
    Io { path: String, message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum VectorizeError {
    #[error("fitted vocabulary is empty")]
    EmptyVocabulary,
}
