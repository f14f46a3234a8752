//! Archive access and resource resolution

use std::path::Path;

use binrw::BinRead;
use binrw::io::Cursor;
use tracing::debug;

use crate::bif::chunked::ChunkedReader;
use crate::bif::error::{BifError, BifResult};
use crate::bif::header::{BifHeader, ContainerKind, FileEntry, TilesetEntry};
use crate::bif::locator::{ResourceLocator, ResourceSpan};
use crate::cursor::ByteCursor;

#[derive(Debug, Clone)]
enum Storage {
    Plain(Vec<u8>),
    Compressed(ChunkedReader<Vec<u8>>),
}

impl Storage {
    fn read_range(&self, offset: u64, length: usize) -> BifResult<Vec<u8>> {
        match self {
            Self::Plain(data) => {
                let out_of_range = || BifError::ResourceOutOfRange {
                    offset,
                    length: length as u64,
                };
                let start = usize::try_from(offset).map_err(|_| out_of_range())?;
                let end = start.checked_add(length).ok_or_else(out_of_range)?;
                data.get(start..end)
                    .map(<[u8]>::to_vec)
                    .ok_or_else(out_of_range)
            }
            Self::Compressed(reader) => reader.get_block(offset, length),
        }
    }
}

/// An opened `BIFF` or `BIFC` resource archive
#[derive(Debug, Clone)]
pub struct Bif {
    kind: ContainerKind,
    header: BifHeader,
    storage: Storage,
}

impl Bif {
    /// Read an archive from disk
    pub fn open(path: impl AsRef<Path>) -> BifResult<Self> {
        let path = path.as_ref();
        debug!("Opening archive {}", path.display());
        Self::from_bytes(std::fs::read(path)?)
    }

    /// Parse an archive held in memory
    pub fn from_bytes(data: Vec<u8>) -> BifResult<Self> {
        let mut cursor = ByteCursor::new(&data);
        let magic = cursor.read_tag()?;
        let version = cursor.read_tag()?;
        let kind = ContainerKind::detect(magic, version)?;

        let (header, storage) = match kind {
            ContainerKind::Plain => {
                cursor.seek(0)?;
                let header_bytes = cursor.read_bytes(BifHeader::SIZE)?;
                let header = BifHeader::read(&mut Cursor::new(header_bytes))?;
                (header, Storage::Plain(data))
            }
            ContainerKind::Compressed => {
                let reader = ChunkedReader::new(data)?;
                let header_bytes = reader.get_block(0, BifHeader::SIZE)?;
                let header = BifHeader::read(&mut Cursor::new(&header_bytes))?;
                (header, Storage::Compressed(reader))
            }
        };

        debug!(
            "Archive {:?}: {} files, {} tilesets, table at {:#x}",
            kind, header.file_count, header.tileset_count, header.file_table_offset
        );
        Ok(Self {
            kind,
            header,
            storage,
        })
    }

    /// Container variant
    pub const fn kind(&self) -> ContainerKind {
        self.kind
    }

    /// Archive header; for compressed archives, the decompressed one
    pub const fn header(&self) -> &BifHeader {
        &self.header
    }

    /// Number of file entries
    pub const fn file_count(&self) -> u32 {
        self.header.file_count
    }

    /// Number of tileset entries
    pub const fn tileset_count(&self) -> u32 {
        self.header.tileset_count
    }

    /// Uncompressed length declared by a `BIFC` header
    pub fn declared_len(&self) -> Option<u32> {
        match &self.storage {
            Storage::Plain(_) => None,
            Storage::Compressed(reader) => Some(reader.declared_len()),
        }
    }

    /// Read the file table entry `index`
    pub fn file_entry(&self, index: u32) -> BifResult<FileEntry> {
        if index >= self.file_count() {
            return Err(BifError::FileIndexOutOfRange {
                index,
                count: self.file_count(),
            });
        }
        let offset = self.header.file_entry_offset(index);
        let bytes = self.storage.read_range(offset, FileEntry::SIZE)?;
        Ok(FileEntry::read(&mut Cursor::new(&bytes))?)
    }

    /// Read the tileset table entry `tileset`
    pub fn tileset_entry(&self, tileset: u32) -> BifResult<TilesetEntry> {
        if tileset >= self.tileset_count() {
            return Err(BifError::TilesetOutOfRange {
                tileset,
                count: self.tileset_count(),
            });
        }
        let offset = self.header.tileset_entry_offset(tileset);
        let bytes = self.storage.read_range(offset, TilesetEntry::SIZE)?;
        Ok(TilesetEntry::read(&mut Cursor::new(&bytes))?)
    }

    /// All file table entries in order
    pub fn entries(&self) -> BifResult<Vec<FileEntry>> {
        (0..self.file_count()).map(|i| self.file_entry(i)).collect()
    }

    /// All tileset table entries in order
    pub fn tilesets(&self) -> BifResult<Vec<TilesetEntry>> {
        (0..self.tileset_count())
            .map(|i| self.tileset_entry(i))
            .collect()
    }

    /// Resolve a `(tileset, index)` pair to a byte range
    ///
    /// Tileset zero selects the file table and `index` picks the entry.
    /// Any other tileset selects that tileset table entry and `index` is
    /// ignored; the range covers every tile.
    pub fn resolve(&self, tileset: u32, index: u32) -> BifResult<ResourceSpan> {
        if tileset == 0 {
            let entry = self.file_entry(index)?;
            Ok(ResourceSpan {
                offset: u64::from(entry.offset),
                length: entry.length(),
            })
        } else {
            let entry = self.tileset_entry(tileset)?;
            Ok(ResourceSpan {
                offset: u64::from(entry.offset),
                length: entry.length(),
            })
        }
    }

    /// Resolve a packed locator; its archive field is not consulted
    pub fn resolve_locator(&self, locator: ResourceLocator) -> BifResult<ResourceSpan> {
        self.resolve(u32::from(locator.tileset), u32::from(locator.index))
    }

    /// Read the bytes of a resolved range
    pub fn read_span(&self, span: ResourceSpan) -> BifResult<Vec<u8>> {
        let length = usize::try_from(span.length).map_err(|_| BifError::ResourceOutOfRange {
            offset: span.offset,
            length: span.length,
        })?;
        self.storage.read_range(span.offset, length)
    }

    /// Fetch the bytes of a resource
    pub fn get(&self, tileset: u32, index: u32) -> BifResult<Vec<u8>> {
        self.read_span(self.resolve(tileset, index)?)
    }

    /// Fetch the bytes of the resource a locator points at
    pub fn get_resource(&self, locator: ResourceLocator) -> BifResult<Vec<u8>> {
        self.read_span(self.resolve_locator(locator)?)
    }
}
