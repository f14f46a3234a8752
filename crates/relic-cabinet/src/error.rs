//! Error types for cabinet parsing and extraction

use std::fmt;
use std::path::PathBuf;

use relic_crypto::ContentDigest;
use relic_formats::CursorError;
use thiserror::Error;

/// Why an extracted file failed verification
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IntegrityFailure {
    /// The output digest differs from the stored one
    DigestMismatch {
        /// Digest stored in the file descriptor
        expected: ContentDigest,
        /// Digest of the bytes produced
        actual: ContentDigest,
    },
    /// A compressed chunk did not inflate
    CorruptChunk {
        /// Zero-based chunk number within the file
        chunk: usize,
        /// Inflate error message
        reason: String,
    },
}

impl fmt::Display for IntegrityFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DigestMismatch { expected, actual } => {
                write!(f, "digest mismatch: expected {expected}, got {actual}")
            }
            Self::CorruptChunk { chunk, reason } => {
                write!(f, "chunk {chunk} is corrupt: {reason}")
            }
        }
    }
}

/// Errors that can occur when reading a cabinet
#[derive(Error, Debug)]
pub enum CabinetError {
    /// A header or volume does not start with `ISc(`
    #[error("invalid cabinet magic: expected 'ISc(', got {0:02X?}")]
    InvalidMagic([u8; 4]),

    /// Structural problem in the descriptor graph or a volume header
    #[error("invalid cabinet format: {0}")]
    Format(String),

    /// Following link records returned to a file already visited
    #[error("link cycle while resolving file {start}: {chain:?}")]
    LinkCycle {
        /// File the extraction started from
        start: usize,
        /// Indices visited, in order
        chain: Vec<usize>,
    },

    /// File index beyond the file table
    #[error("invalid file index {index}, cabinet has {count} files")]
    InvalidIndex {
        /// Requested index
        index: usize,
        /// Number of files
        count: usize,
    },

    /// File is flagged as not extractable
    #[error("file {index} is flagged invalid (flags {flags:#06x})")]
    InvalidFlags {
        /// File index
        index: usize,
        /// Raw flags
        flags: u16,
    },

    /// Extracted content does not verify
    #[error("integrity check failed for file {index}: {failure}")]
    Integrity {
        /// File index
        index: usize,
        /// What went wrong
        failure: IntegrityFailure,
    },

    /// A volume file could not be opened
    #[error("cannot open volume {}: {}", path.display(), source)]
    VolumeMissing {
        /// Expected volume path
        path: PathBuf,
        /// Underlying error
        source: std::io::Error,
    },

    /// Header data ended early
    #[error("truncated cabinet data: {0}")]
    Truncated(#[from] CursorError),

    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// `BinRW` parsing error
    #[error("binary format error: {0}")]
    BinRw(#[from] binrw::Error),
}

impl CabinetError {
    /// Whether this error means the cabinet data is corrupt
    pub const fn is_integrity(&self) -> bool {
        matches!(self, Self::Integrity { .. })
    }
}

/// Result type for cabinet operations
pub type CabinetResult<T> = std::result::Result<T, CabinetError>;
