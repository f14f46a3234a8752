//! Archive header and table records

use binrw::{BinRead, BinWrite};

use crate::bif::error::{BifError, BifResult};
use crate::bif::{COMPRESSED_MAGIC, PLAIN_MAGIC, VERSION_V1, VERSION_V10};

/// Container variant selected by the leading magic tag
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerKind {
    /// `BIFF`: tables and data are stored as-is
    Plain,
    /// `BIFC`: the whole plain container is stored as a zlib chunk stream
    Compressed,
}

impl ContainerKind {
    /// Identify the container from its first eight bytes
    pub fn detect(magic: [u8; 4], version: [u8; 4]) -> BifResult<Self> {
        let kind = match &magic {
            PLAIN_MAGIC => Self::Plain,
            COMPRESSED_MAGIC => Self::Compressed,
            _ => return Err(BifError::InvalidContainer(magic)),
        };
        if &version != VERSION_V1 && &version != VERSION_V10 {
            return Err(BifError::UnsupportedVersion(version));
        }
        Ok(kind)
    }
}

/// Plain archive header (20 bytes)
///
/// For the compressed variant the same header is found at the start of the
/// decompressed stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, BinRead, BinWrite)]
#[brw(little)]
pub struct BifHeader {
    /// Container tag
    pub magic: [u8; 4],
    /// Version tag
    pub version: [u8; 4],
    /// Number of entries in the file table
    pub file_count: u32,
    /// Number of entries in the tileset table
    pub tileset_count: u32,
    /// Offset of the file table; the tileset table follows it
    pub file_table_offset: u32,
}

impl BifHeader {
    /// Encoded size in bytes
    pub const SIZE: usize = 20;

    /// Offset of the tileset entry `tileset`
    pub fn tileset_entry_offset(&self, tileset: u32) -> u64 {
        u64::from(self.file_table_offset)
            + u64::from(self.file_count) * FileEntry::SIZE as u64
            + u64::from(tileset) * TilesetEntry::SIZE as u64
    }

    /// Offset of the file entry `index`
    pub fn file_entry_offset(&self, index: u32) -> u64 {
        u64::from(self.file_table_offset) + u64::from(index) * FileEntry::SIZE as u64
    }
}

/// File table record (16 bytes)
#[derive(Debug, Clone, Copy, PartialEq, Eq, BinRead, BinWrite)]
#[brw(little)]
pub struct FileEntry {
    /// Raw locator the entry was stored under
    pub locator: u32,
    /// Offset of the resource data
    pub offset: u32,
    /// Resource size in bytes
    pub size: u32,
    /// Resource type code
    pub resource_type: u16,
    /// Unused
    pub unknown: u16,
}

impl FileEntry {
    /// Encoded size in bytes
    pub const SIZE: usize = 16;

    /// Byte length of the resource
    pub fn length(&self) -> u64 {
        u64::from(self.size)
    }
}

/// Tileset table record (20 bytes)
#[derive(Debug, Clone, Copy, PartialEq, Eq, BinRead, BinWrite)]
#[brw(little)]
pub struct TilesetEntry {
    /// Raw locator the entry was stored under
    pub locator: u32,
    /// Offset of the first tile
    pub offset: u32,
    /// Number of tiles
    pub tile_count: u32,
    /// Size of each tile in bytes
    pub tile_size: u32,
    /// Resource type code
    pub resource_type: u16,
    /// Unused
    pub unknown: u16,
}

impl TilesetEntry {
    /// Encoded size in bytes
    pub const SIZE: usize = 20;

    /// Byte length of all tiles together
    pub fn length(&self) -> u64 {
        u64::from(self.tile_size) * u64::from(self.tile_count)
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use binrw::io::Cursor;

    #[test]
    fn test_detect_container() {
        assert_eq!(
            ContainerKind::detect(*b"BIFF", *b"V1  ").unwrap(),
            ContainerKind::Plain
        );
        assert_eq!(
            ContainerKind::detect(*b"BIFC", *b"V1.0").unwrap(),
            ContainerKind::Compressed
        );
        assert!(matches!(
            ContainerKind::detect(*b"KEY ", *b"V1  "),
            Err(BifError::InvalidContainer(m)) if &m == b"KEY "
        ));
        assert!(matches!(
            ContainerKind::detect(*b"BIFF", *b"V2  "),
            Err(BifError::UnsupportedVersion(v)) if &v == b"V2  "
        ));
    }

    #[test]
    fn test_header_parse() {
        let mut bytes = b"BIFFV1  ".to_vec();
        bytes.extend_from_slice(&3u32.to_le_bytes());
        bytes.extend_from_slice(&1u32.to_le_bytes());
        bytes.extend_from_slice(&0x14u32.to_le_bytes());

        let header = BifHeader::read(&mut Cursor::new(&bytes)).unwrap();
        assert_eq!(header.file_count, 3);
        assert_eq!(header.tileset_count, 1);
        assert_eq!(header.file_entry_offset(2), 0x14 + 32);
        assert_eq!(header.tileset_entry_offset(1), 0x14 + 48 + 20);
    }

    #[test]
    fn test_tileset_length() {
        let entry = TilesetEntry {
            locator: 1 << 14,
            offset: 0x100,
            tile_count: 4,
            tile_size: 5120,
            resource_type: 1003,
            unknown: 0,
        };
        assert_eq!(entry.length(), 4 * 5120);
    }
}
