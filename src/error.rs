//! Error types for cover extraction

use std::path::PathBuf;

use thiserror::Error;

/// Result type for archive-level operations
pub type Result<T> = std::result::Result<T, ArchiveError>;

/// Archive access errors
///
/// Only `NotFound` and `Corrupt` raised while opening an EPUB abort an
/// extraction. Entry-level errors are absorbed by the detection strategies.
#[derive(Error, Debug)]
pub enum ArchiveError {
    #[error("EPUB not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Corrupt archive: {0}")]
    Corrupt(String),

    #[error("Entry not found: {0}")]
    EntryNotFound(String),

    #[error("Entry too large: {path} ({size} bytes, limit {limit})")]
    EntryTooLarge { path: String, size: u64, limit: u64 },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ArchiveError {
    /// Map a zip error raised while reading a named entry
    pub(crate) fn from_entry(path: &str, err: zip::result::ZipError) -> Self {
        match err {
            zip::result::ZipError::FileNotFound => ArchiveError::EntryNotFound(path.to_string()),
            zip::result::ZipError::Io(e) => ArchiveError::Io(e),
            other => ArchiveError::Corrupt(format!("{}: {}", path, other)),
        }
    }
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: &'static str, value: String },
}
