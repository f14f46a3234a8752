//! Error types for movie decoding

use relic_formats::CursorError;
use thiserror::Error;

/// Errors raised while decoding a movie stream
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VideoError {
    /// The resource does not start with the movie signature
    #[error("not an Interplay movie: bad signature")]
    InvalidSignature,

    /// The stream ended in the middle of a structure
    #[error("truncated stream: {0}")]
    Truncated(#[from] CursorError),

    /// A packet claims more bytes than its chunk holds
    #[error("packet at {offset:#x} needs {len} bytes but its chunk ends at {chunk_end:#x}")]
    PacketOverrun {
        /// Offset of the packet body
        offset: usize,
        /// Declared body length
        len: usize,
        /// End of the enclosing chunk
        chunk_end: usize,
    },

    /// A top-level packet opcode outside the known set
    #[error("unknown opcode {opcode:#04x} at {offset:#x}")]
    UnknownOpcode {
        /// Opcode byte
        opcode: u8,
        /// Offset of the packet header
        offset: usize,
    },

    /// A block control nibble that names no reconstruction operation
    #[error("invalid block opcode {opcode} at block ({x}, {y})")]
    InvalidBlockOpcode {
        /// Control nibble
        opcode: u8,
        /// Block column
        x: usize,
        /// Block row
        y: usize,
    },

    /// A region, palette range or motion vector leaves its buffer
    #[error("{0} is out of bounds")]
    OutOfBounds(String),

    /// A timing packet with a rate the delay formula cannot use
    #[error("invalid timing rate {rate}")]
    InvalidTiming {
        /// Rate field of the packet
        rate: u16,
    },

    /// Video initialization asked for surfaces larger than the decoder allows
    #[error("video surfaces of {width}x{height} blocks exceed the {max} block limit")]
    SurfaceTooLarge {
        /// Requested width in blocks
        width: u16,
        /// Requested height in blocks
        height: u16,
        /// Largest accepted side in blocks
        max: u16,
    },

    /// A video packet arrived before the surfaces were allocated
    #[error("opcode {opcode:#04x} requires video initialization")]
    VideoNotInitialized {
        /// Opcode of the offending packet
        opcode: u8,
    },
}

impl VideoError {
    /// Whether the error means the stream content is malformed
    ///
    /// Only a bad signature is not: that input is not a movie at all.
    pub const fn is_malformed(&self) -> bool {
        !matches!(self, Self::InvalidSignature)
    }
}

/// Result type for movie decoding
pub type VideoResult<T> = Result<T, VideoError>;
