//! Header file parsing: groups, components, directories and files
//!
//! Every offset in the header is relative to the descriptor base named in
//! the prelude. Groups and components hang off two 71-slot tables of list
//! heads; each list node points at one descriptor and at the next node.
//! Nodes are visited by offset, and a revisited offset is rejected so a
//! corrupt list cannot loop.

mod records;

use std::collections::{BTreeMap, HashSet};

use binrw::BinRead;
use binrw::io::Cursor;
use relic_crypto::ContentDigest;
use relic_formats::ByteCursor;
use tracing::debug;

use crate::error::{CabinetError, CabinetResult};
use crate::version::{FormatVersion, Layout, StringEncoding};
use records::{
    ComponentRecord, DescriptorTables, GroupRecord, LegacyFileRecord, ListNode,
    MODERN_FILE_RECORD_SIZE, ModernFileRecord, Prelude,
};

pub use records::DESCRIPTOR_SLOTS;

/// Magic at the start of header and volume files
pub const CABINET_MAGIC: [u8; 4] = *b"ISc(";

/// Offset of the descriptor tables from the descriptor base
const TABLES_OFFSET: u64 = 0xc;

/// File flag bits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct FileFlags(pub u16);

impl FileFlags {
    /// Stored bytes are obfuscated
    pub const OBFUSCATED: u16 = 0x2;
    /// Stored bytes are deflate chunks
    pub const COMPRESSED: u16 = 0x4;
    /// Entry must not be extracted
    pub const INVALID: u16 = 0x8;

    /// Stored bytes are obfuscated
    pub const fn is_obfuscated(self) -> bool {
        self.0 & Self::OBFUSCATED != 0
    }

    /// Stored bytes are deflate chunks
    pub const fn is_compressed(self) -> bool {
        self.0 & Self::COMPRESSED != 0
    }

    /// Entry must not be extracted
    pub const fn is_invalid(self) -> bool {
        self.0 & Self::INVALID != 0
    }
}

/// A named range of files
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Group {
    /// Group name
    pub name: String,
    /// Folder next to the header holding files that are copied rather than extracted
    pub source: String,
    /// Destination folder template
    pub destination: String,
    /// First file index
    pub first: u32,
    /// Last file index, inclusive
    pub last: u32,
}

/// A named set of groups
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Component {
    /// Component name
    pub name: String,
    /// Destination folder template, legacy layouts only
    pub destination: String,
    /// Names of the groups this component installs
    pub groups: Vec<String>,
}

/// One file table entry
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FileDescriptor {
    /// File name
    pub name: String,
    /// Directory name, empty for the root
    pub directory: String,
    /// Flag bits
    pub flags: FileFlags,
    /// Uncompressed size
    pub size: u64,
    /// Stored size in the volumes
    pub compressed_size: u64,
    /// Offset of the data in its first volume; zero for files shipped beside the cabinet
    pub offset: u64,
    /// MD5 of the uncompressed data
    pub digest: ContentDigest,
    /// Previous file of a link chain
    pub previous: u32,
    /// Next file of a link chain
    pub next: u32,
    /// Link bits; bit 0 redirects extraction to `previous`
    pub link: u8,
    /// Volume number holding the first byte
    pub volume: u16,
}

impl FileDescriptor {
    /// Whether extraction redirects to another entry
    pub const fn links_previous(&self) -> bool {
        self.link & 1 != 0
    }

    /// Bytes to read from the volumes
    pub const fn stored_size(&self) -> u64 {
        if self.flags.is_compressed() {
            self.compressed_size
        } else {
            self.size
        }
    }
}

/// Parsed header file
#[derive(Debug, Clone)]
pub struct CabinetHeader {
    /// Format version
    pub version: FormatVersion,
    /// Directory names by index; empty slots keep their index
    pub directories: Vec<String>,
    /// Groups by name
    pub groups: BTreeMap<String, Group>,
    /// Components in table order
    pub components: Vec<Component>,
    /// Files by index
    pub files: Vec<FileDescriptor>,
}

struct HeaderReader<'a> {
    cursor: ByteCursor<&'a [u8]>,
    base: u64,
    encoding: StringEncoding,
}

impl HeaderReader<'_> {
    fn position(&self, relative: u64) -> CabinetResult<usize> {
        usize::try_from(self.base + relative)
            .map_err(|_| CabinetError::Format(format!("offset {relative:#x} out of range")))
    }

    fn record<T>(&self, relative: u64, args: T::Args<'static>) -> CabinetResult<T>
    where
        T: BinRead,
    {
        let start = self.position(relative)?;
        let data = self.cursor.data();
        let window = data.get(start..).ok_or_else(|| {
            CabinetError::Format(format!(
                "record at {start:#x} is outside a {} byte header",
                data.len()
            ))
        })?;
        Ok(T::read_options(
            &mut Cursor::new(window),
            binrw::Endian::Little,
            args,
        )?)
    }

    fn string(&mut self, relative: u64) -> CabinetResult<String> {
        let at = self.position(relative)?;
        self.cursor.seek(at)?;
        Ok(match self.encoding {
            StringEncoding::Narrow => self.cursor.read_narrow_string(),
            StringEncoding::Wide => self.cursor.read_wide_string(),
        })
    }

    fn optional_string(&mut self, relative: u32) -> CabinetResult<String> {
        if relative == 0 {
            Ok(String::new())
        } else {
            self.string(u64::from(relative))
        }
    }

    /// Collect descriptor offsets from every list in `heads`
    fn walk_lists(&self, heads: &[u32], kind: &str) -> CabinetResult<Vec<u32>> {
        let mut visited = HashSet::new();
        let mut descriptors = Vec::new();
        for &head in heads {
            let mut offset = head;
            while offset != 0 {
                if !visited.insert(offset) {
                    return Err(CabinetError::Format(format!(
                        "{kind} list revisits node {offset:#x}"
                    )));
                }
                let node: ListNode = self.record(u64::from(offset), ())?;
                descriptors.push(node.descriptor);
                offset = node.next;
            }
        }
        Ok(descriptors)
    }
}

impl CabinetHeader {
    /// Parse a header file
    pub fn parse(data: &[u8]) -> CabinetResult<Self> {
        let prelude = Prelude::read(&mut Cursor::new(data))?;
        if prelude.magic != CABINET_MAGIC {
            return Err(CabinetError::InvalidMagic(prelude.magic));
        }
        let version = FormatVersion::from_word(prelude.version_word);
        let layout = version.layout();

        let mut reader = HeaderReader {
            cursor: ByteCursor::new(data),
            base: u64::from(prelude.descriptor_base),
            encoding: version.encoding(),
        };
        let tables: DescriptorTables = reader.record(TABLES_OFFSET, ())?;
        debug!(
            "Cabinet header version {}: {} directories, {} files",
            version, tables.directory_count, tables.file_count
        );

        let mut groups = BTreeMap::new();
        for descriptor in reader.walk_lists(&tables.group_heads, "group")? {
            let record: GroupRecord = reader.record(u64::from(descriptor), (layout,))?;
            let mut group = Group {
                name: reader.optional_string(record.name)?,
                first: record.first,
                last: record.last,
                ..Group::default()
            };
            if let Some(folders) = record.folders {
                group.source = reader.optional_string(folders.source)?;
                group.destination = reader.optional_string(folders.destination)?;
            }
            groups.insert(group.name.clone(), group);
        }

        let mut components = Vec::new();
        for descriptor in reader.walk_lists(&tables.component_heads, "component")? {
            let record: ComponentRecord = reader.record(u64::from(descriptor), (layout,))?;
            let mut component = Component {
                name: reader.optional_string(record.name)?,
                ..Component::default()
            };
            if let Some(legacy) = record.legacy {
                component.destination = reader.optional_string(legacy.destination)?;
            }
            for i in 0..u64::from(record.group_count) {
                let at = reader.position(u64::from(record.group_table) + i * 4)?;
                reader.cursor.seek(at)?;
                let name_offset = reader.cursor.read_u32()?;
                component.groups.push(reader.string(u64::from(name_offset))?);
            }
            components.push(component);
        }

        let (directories, files) = Self::parse_file_table(&mut reader, &tables, layout)?;
        debug!(
            "Parsed {} groups, {} components, {} files",
            groups.len(),
            components.len(),
            files.len()
        );

        Ok(Self {
            version,
            directories,
            groups,
            components,
            files,
        })
    }

    fn parse_file_table(
        reader: &mut HeaderReader<'_>,
        tables: &DescriptorTables,
        layout: Layout,
    ) -> CabinetResult<(Vec<String>, Vec<FileDescriptor>)> {
        let table = u64::from(tables.file_table_offset);
        let directory_count = tables.directory_count as usize;
        let slot_count = directory_count + tables.file_count as usize;

        let start = reader.position(table)?;
        reader.cursor.seek(start)?;
        let slots = (0..slot_count)
            .map(|_| reader.cursor.read_u32())
            .collect::<Result<Vec<_>, _>>()?;

        let mut directories = Vec::with_capacity(directory_count);
        for &slot in &slots[..directory_count] {
            if slot == 0 {
                directories.push(String::new());
            } else {
                directories.push(reader.string(table + u64::from(slot))?);
            }
        }

        let mut files = Vec::with_capacity(slot_count - directory_count);
        for (i, &slot) in slots[directory_count..].iter().enumerate() {
            let (mut file, name, directory) = if layout.is_legacy() {
                let record: LegacyFileRecord = reader.record(table + u64::from(slot), ())?;
                let file = FileDescriptor {
                    flags: FileFlags(record.flags),
                    size: u64::from(record.size),
                    compressed_size: u64::from(record.compressed_size),
                    offset: u64::from(record.offset),
                    digest: ContentDigest::from_bytes(record.digest),
                    volume: 1,
                    ..FileDescriptor::default()
                };
                (file, record.name, record.directory as usize)
            } else {
                let at = table
                    + u64::from(tables.file_records_offset)
                    + i as u64 * MODERN_FILE_RECORD_SIZE;
                let record: ModernFileRecord = reader.record(at, ())?;
                let file = FileDescriptor {
                    flags: FileFlags(record.flags),
                    size: record.size,
                    compressed_size: record.compressed_size,
                    offset: record.offset,
                    digest: ContentDigest::from_bytes(record.digest),
                    previous: record.previous,
                    next: record.next,
                    link: record.link,
                    volume: record.volume,
                    ..FileDescriptor::default()
                };
                (file, record.name, usize::from(record.directory))
            };

            if name != 0 {
                file.name = reader.string(table + u64::from(name))?;
            }
            if directory != 0 {
                file.directory = directories
                    .get(directory)
                    .cloned()
                    .ok_or_else(|| {
                        CabinetError::Format(format!(
                            "file {i} refers to directory {directory} of {directory_count}"
                        ))
                    })?;
            }
            files.push(file);
        }
        Ok((directories, files))
    }

    /// Group by name
    pub fn group(&self, name: &str) -> Option<&Group> {
        self.groups.get(name)
    }
}
