//! BIFF/BIFC resource archives
//!
//! An archive holds a file table (16-byte entries) followed by a tileset
//! table (20-byte entries) and the resource data. The `BIFC` variant stores
//! that whole container as a stream of independently zlib-compressed chunks;
//! table lookups and resource reads then go through [`ChunkedReader`].
//!
//! ```rust,no_run
//! use relic_formats::bif::Bif;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let bif = Bif::open("data/area000a.bif")?;
//! let span = bif.resolve(0, 3)?;
//! println!("resource 3 is {} bytes at {:#x}", span.length, span.offset);
//! let bytes = bif.get(0, 3)?;
//! # let _ = bytes;
//! # Ok(())
//! # }
//! ```

mod archive;
mod chunked;
mod error;
mod header;
mod locator;

pub use archive::Bif;
pub use chunked::{ChunkInfo, ChunkedReader};
pub use error::{BifError, BifResult};
pub use header::{BifHeader, ContainerKind, FileEntry, TilesetEntry};
pub use locator::{ResourceLocator, ResourceSpan};

/// Tag of the uncompressed container
pub const PLAIN_MAGIC: &[u8; 4] = b"BIFF";

/// Tag of the chunk-compressed container
pub const COMPRESSED_MAGIC: &[u8; 4] = b"BIFC";

/// Version tag written by the original toolchain
pub const VERSION_V1: &[u8; 4] = b"V1  ";

/// Version tag used by compressed archives
pub const VERSION_V10: &[u8; 4] = b"V1.0";

/// Offset of the first chunk header in a `BIFC` container
pub const CHUNK_STREAM_OFFSET: usize = 12;
