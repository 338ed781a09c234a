use std::path::PathBuf;
use thiserror::Error;

/// Failures raised by the journal's collaborators (store, credentials, media,
/// export). The formatter and the filter engine never produce these.
#[derive(Error, Debug)]
pub enum JournalError {
    #[error("Storage I/O failed for {path}: {source}")]
    Storage {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Stored data under '{key}' is not valid JSON: {source}")]
    Corrupt {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Password must be at least {min} characters long")]
    InvalidPassword { min: usize },

    #[error("Credential store failed: {0}")]
    Credential(String),

    #[error("Media operation failed: {0}")]
    Media(String),

    #[error("Export failed: {0}")]
    Export(String),

    #[error("Entry not found: {id}")]
    EntryNotFound { id: String },

    #[error("Invalid configuration in {path}: {message}")]
    Config { path: PathBuf, message: String },
}

impl JournalError {
    pub fn storage(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        JournalError::Storage {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, JournalError>;
