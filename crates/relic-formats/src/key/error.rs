//! Error types for KEY index parsing

use thiserror::Error;

use crate::bif::BifError;
use crate::cursor::CursorError;

/// Errors that can occur when reading a KEY index or loading through it
#[derive(Error, Debug)]
pub enum KeyError {
    /// The file does not start with `KEY `
    #[error("not a KEY index: signature {0:?}")]
    InvalidSignature([u8; 4]),

    /// Unsupported KEY version tag
    #[error("unsupported KEY version: {0:?}")]
    UnsupportedVersion([u8; 4]),

    /// A resource refers to an archive the index does not list
    #[error("resource {name} refers to archive {archive}, index lists {available}")]
    MissingArchive {
        /// Resource name
        name: String,
        /// Archive number from the locator
        archive: u16,
        /// Number of archives in the index
        available: usize,
    },

    /// Index data ended early
    #[error("truncated KEY index: {0}")]
    Truncated(#[from] CursorError),

    /// Reading the owning archive failed
    #[error("archive error: {0}")]
    Archive(#[from] BifError),

    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for KEY index operations
pub type KeyResult<T> = std::result::Result<T, KeyError>;
