//! Resource locators and resolved byte ranges

use std::fmt;

/// Packed reference to one resource inside an archive set
///
/// Bits 20..32 pick the archive, bits 14..20 the tileset (zero for ordinary
/// files) and bits 0..14 the file index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceLocator {
    /// Archive number within the KEY index
    pub archive: u16,
    /// Tileset number, zero for ordinary files
    pub tileset: u8,
    /// File index
    pub index: u16,
}

impl ResourceLocator {
    /// Unpack a 32-bit locator
    pub const fn from_raw(raw: u32) -> Self {
        Self {
            archive: (raw >> 20) as u16,
            tileset: ((raw >> 14) & 0x3f) as u8,
            index: (raw & 0x3fff) as u16,
        }
    }

    /// Pack back into the 32-bit form
    pub const fn raw(&self) -> u32 {
        ((self.archive as u32) << 20)
            | (((self.tileset & 0x3f) as u32) << 14)
            | (self.index as u32 & 0x3fff)
    }

    /// Whether the locator addresses a tileset rather than a file
    pub const fn is_tileset(&self) -> bool {
        self.tileset != 0
    }
}

impl fmt::Display for ResourceLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.archive, self.tileset, self.index)
    }
}

/// Byte range of a resource
///
/// For compressed archives the offset is relative to the decompressed stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResourceSpan {
    /// First byte of the resource
    pub offset: u64,
    /// Length in bytes
    pub length: u64,
}

impl ResourceSpan {
    /// One past the last byte
    pub const fn end(&self) -> u64 {
        self.offset + self.length
    }
}
