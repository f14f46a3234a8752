//! Error types for resource archive parsing

use thiserror::Error;

use crate::cursor::CursorError;

/// Errors that can occur when reading a BIFF/BIFC archive
#[derive(Error, Debug)]
pub enum BifError {
    /// The archive does not start with a recognized container tag
    #[error("invalid archive magic: expected 'BIFF' or 'BIFC', got {0:?}")]
    InvalidContainer([u8; 4]),

    /// The version tag is not one the reader understands
    #[error("unsupported archive version: {0:?}")]
    UnsupportedVersion([u8; 4]),

    /// The chunk stream ended before covering the requested offset
    #[error("block not found for uncompressed offset {offset:#x}")]
    BlockNotFound {
        /// Offset in the uncompressed stream
        offset: u64,
    },

    /// A chunk failed to inflate
    #[error("chunk {chunk} failed to decompress: {source}")]
    Decompression {
        /// Index of the chunk in the stream
        chunk: usize,
        /// Underlying inflate error
        source: std::io::Error,
    },

    /// A chunk inflated to a different length than its header declares
    #[error("chunk {chunk} inflated to {actual} bytes, header declares {expected}")]
    ChunkLength {
        /// Index of the chunk in the stream
        chunk: usize,
        /// Length from the chunk header
        expected: u32,
        /// Length produced by inflation
        actual: usize,
    },

    /// A file index past the end of the file table
    #[error("file index {index} is out of range: the archive has {count} files")]
    FileIndexOutOfRange {
        /// Requested index
        index: u32,
        /// Entries in the file table
        count: u32,
    },

    /// A tileset number past the end of the tileset table
    #[error("tileset {tileset} is out of range: the archive has {count} tileset slots")]
    TilesetOutOfRange {
        /// Requested tileset
        tileset: u32,
        /// Entries in the tileset table
        count: u32,
    },

    /// A resource references data outside the archive
    #[error("resource range {offset:#x}+{length:#x} is outside the archive")]
    ResourceOutOfRange {
        /// Start of the resource
        offset: u64,
        /// Length of the resource
        length: u64,
    },

    /// Archive data ended early
    #[error("truncated archive: {0}")]
    Truncated(#[from] CursorError),

    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// `BinRW` parsing error
    #[error("binary format error: {0}")]
    BinRw(#[from] binrw::Error),
}

/// Result type for archive operations
pub type BifResult<T> = std::result::Result<T, BifError>;
