//! Error types for Syllabus.

use thiserror::Error;

/// Library-level error type for Syllabus operations.
#[derive(Error, Debug)]
pub enum SyllabusError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Document processing failed: {0}")]
    Document(String),

    #[error("Embedding generation failed: {0}")]
    Embedding(String),

    #[error("Vector store error: {0}")]
    VectorStore(String),

    #[error("Model error: {0}")]
    Model(#[from] crate::llm::ModelError),

    #[error("Tool error: {0}")]
    Tool(String),

    #[error("Session error: {0}")]
    Session(String),

    /// An upstream service is temporarily unreachable or throttling us.
    #[error("Service unavailable: {0}")]
    Unavailable(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Course not found: {0}")]
    CourseNotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl SyllabusError {
    /// Whether retrying the failed operation later could succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            SyllabusError::Unavailable(_) => true,
            SyllabusError::Model(e) => e.is_transient(),
            SyllabusError::Http(e) => is_transient_transport(e),
            _ => false,
        }
    }
}

/// Whether a transport failure may clear up on retry: the connection could
/// not be made, timed out, was dropped mid-request or lost its body.
pub(crate) fn is_transient_transport(err: &reqwest::Error) -> bool {
    err.is_connect() || err.is_timeout() || err.is_request() || err.is_body()
}

/// Result type alias for Syllabus operations.
pub type Result<T> = std::result::Result<T, SyllabusError>;
