//! Random access into a zlib chunk stream
//!
//! A compressed archive stores its payload as consecutive
//! `(uncompressed_len, compressed_len, zlib bytes)` triples starting at
//! [`CHUNK_STREAM_OFFSET`]. The reader indexes the triples once and then
//! serves arbitrary `(offset, length)` ranges of the uncompressed stream,
//! inflating only the chunks that overlap the range.

use std::io::Read;

use flate2::read::ZlibDecoder;
use tracing::{debug, warn};

use crate::bif::CHUNK_STREAM_OFFSET;
use crate::bif::error::{BifError, BifResult};
use crate::cursor::ByteCursor;

/// Upper bound on the up-front reservation per compressed byte
const MAX_INFLATE_RATIO: usize = 8;

/// Location of one chunk inside the container
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkInfo {
    /// Offset of this chunk's first byte in the uncompressed stream
    pub uncompressed_start: u64,
    /// Uncompressed length from the chunk header
    pub uncompressed_len: u32,
    /// Offset of the zlib payload inside the container
    pub payload_offset: usize,
    /// Compressed length from the chunk header
    pub compressed_len: u32,
}

impl ChunkInfo {
    /// One past the last uncompressed offset covered by this chunk
    pub fn uncompressed_end(&self) -> u64 {
        self.uncompressed_start + u64::from(self.uncompressed_len)
    }
}

/// Reader over the chunk stream of a `BIFC` container
#[derive(Debug, Clone)]
pub struct ChunkedReader<T> {
    data: T,
    declared_len: u32,
    chunks: Vec<ChunkInfo>,
}

impl<T: AsRef<[u8]>> ChunkedReader<T> {
    /// Index the chunk stream of a whole `BIFC` container
    ///
    /// The container's 12-byte header is not validated here; see
    /// [`ContainerKind::detect`](crate::bif::ContainerKind::detect).
    pub fn new(data: T) -> BifResult<Self> {
        let mut cursor = ByteCursor::new(data.as_ref());
        cursor.seek(8)?;
        let declared_len = cursor.read_u32()?;
        cursor.seek(CHUNK_STREAM_OFFSET)?;

        let mut chunks = Vec::new();
        let mut cur = 0u64;
        while !cursor.is_eof() {
            let uncompressed_len = cursor.read_u32()?;
            let compressed_len = cursor.read_u32()?;
            let payload_offset = cursor.position();
            cursor.skip(compressed_len as usize)?;
            chunks.push(ChunkInfo {
                uncompressed_start: cur,
                uncompressed_len,
                payload_offset,
                compressed_len,
            });
            cur += u64::from(uncompressed_len);
        }

        debug!(
            "Indexed {} chunks covering {} uncompressed bytes",
            chunks.len(),
            cur
        );
        if cur != u64::from(declared_len) {
            warn!(
                "Chunk stream covers {} bytes but header declares {}",
                cur, declared_len
            );
        }

        Ok(Self {
            data,
            declared_len,
            chunks,
        })
    }

    /// Uncompressed length recorded in the container header
    pub const fn declared_len(&self) -> u32 {
        self.declared_len
    }

    /// Sum of all chunk lengths
    pub fn uncompressed_len(&self) -> u64 {
        self.chunks.last().map_or(0, ChunkInfo::uncompressed_end)
    }

    /// Chunk table in stream order
    pub fn chunks(&self) -> &[ChunkInfo] {
        &self.chunks
    }

    /// Inflate one chunk
    pub fn inflate_chunk(&self, index: usize) -> BifResult<Vec<u8>> {
        let Some(info) = self.chunks.get(index) else {
            return Err(BifError::BlockNotFound {
                offset: self.uncompressed_len(),
            });
        };
        let payload = &self.data.as_ref()
            [info.payload_offset..info.payload_offset + info.compressed_len as usize];

        // Inflation stops one byte past the declared length
        let capacity = (info.compressed_len as usize)
            .saturating_mul(MAX_INFLATE_RATIO)
            .min(info.uncompressed_len as usize);
        let mut out = Vec::with_capacity(capacity);
        ZlibDecoder::new(payload)
            .take(u64::from(info.uncompressed_len) + 1)
            .read_to_end(&mut out)
            .map_err(|source| BifError::Decompression {
                chunk: index,
                source,
            })?;

        if out.len() != info.uncompressed_len as usize {
            return Err(BifError::ChunkLength {
                chunk: index,
                expected: info.uncompressed_len,
                actual: out.len(),
            });
        }
        Ok(out)
    }

    /// Read `length` bytes of the uncompressed stream starting at `offset`
    ///
    /// Fails with [`BifError::BlockNotFound`] when the chunk stream ends
    /// before `offset` is covered, or before `length` bytes were collected.
    pub fn get_block(&self, offset: u64, length: usize) -> BifResult<Vec<u8>> {
        let first = self
            .chunks
            .partition_point(|chunk| chunk.uncompressed_end() <= offset);
        if first == self.chunks.len() {
            return Err(BifError::BlockNotFound { offset });
        }

        let mut out = Vec::with_capacity(length);
        let mut delta = (offset - self.chunks[first].uncompressed_start) as usize;
        let mut index = first;
        while out.len() < length {
            if index == self.chunks.len() {
                return Err(BifError::BlockNotFound {
                    offset: offset + out.len() as u64,
                });
            }
            let unpacked = self.inflate_chunk(index)?;
            let take = (unpacked.len() - delta).min(length - out.len());
            out.extend_from_slice(&unpacked[delta..delta + take]);
            delta = 0;
            index += 1;
        }
        Ok(out)
    }
}
