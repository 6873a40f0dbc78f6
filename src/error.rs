//! Error types for bluecarbon-registry

use thiserror::Error;

#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("Record not found: {0}")]
    NotFound(String),

    #[error("Blob not found in storage: {0}")]
    BlobNotFound(String),

    #[error("Hash mismatch: expected {expected}, got {actual}")]
    HashMismatch { expected: String, actual: String },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Malformed payload: {0}")]
    Payload(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Persistence transaction failed: {0}")]
    Transaction(String),

    #[error("Draft storage error: {0}")]
    DraftStorage(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sled::Error> for RegistryError {
    fn from(e: sled::Error) -> Self {
        RegistryError::DraftStorage(e.to_string())
    }
}
