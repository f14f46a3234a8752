//! Fixed-shape header records
//!
//! Each struct mirrors one on-disk record. Layout-dependent records take the
//! [`Layout`] as a binrw import so the variant is chosen once, at the call
//! site that knows the cabinet version.

use binrw::BinRead;

use crate::version::Layout;

/// Number of slots in the group and component head tables
pub const DESCRIPTOR_SLOTS: usize = 71;

/// Size of a modern file record
pub const MODERN_FILE_RECORD_SIZE: u64 = 0x57;

/// First 16 bytes of the header file
#[derive(Debug, Clone, Copy, PartialEq, Eq, BinRead)]
#[br(little)]
pub struct Prelude {
    /// `ISc(`
    pub magic: [u8; 4],
    /// Raw version word
    pub version_word: u32,
    /// Volume information, unused
    pub volume_info: u32,
    /// Offset every descriptor offset is relative to
    pub descriptor_base: u32,
}

/// Counts and head tables found at `descriptor_base + 0xc`
#[derive(Debug, Clone, PartialEq, Eq, BinRead)]
#[br(little)]
pub struct DescriptorTables {
    /// File table offset relative to the base
    pub file_table_offset: u32,
    /// Number of directory slots in the file table
    #[br(pad_before = 12)]
    pub directory_count: u32,
    /// Number of file slots in the file table
    #[br(pad_before = 8)]
    pub file_count: u32,
    /// Offset of the modern file records relative to the file table
    pub file_records_offset: u32,
    /// Heads of the group descriptor lists
    #[br(pad_before = 0xe)]
    pub group_heads: [u32; DESCRIPTOR_SLOTS],
    /// Heads of the component descriptor lists
    pub component_heads: [u32; DESCRIPTOR_SLOTS],
}

/// Node of a singly linked descriptor list
#[derive(Debug, Clone, Copy, PartialEq, Eq, BinRead)]
#[br(little)]
pub struct ListNode {
    /// Offset of the descriptor this node points at
    #[br(pad_before = 4)]
    pub descriptor: u32,
    /// Offset of the next node, zero at the end
    pub next: u32,
}

/// Source and destination folders of a group
#[derive(Debug, Clone, Copy, PartialEq, Eq, BinRead)]
#[br(little)]
pub struct GroupFolders {
    /// Source folder string offset
    pub source: u32,
    /// Destination folder string offset
    #[br(pad_before = 0x18)]
    pub destination: u32,
}

/// Group descriptor
#[derive(Debug, Clone, Copy, PartialEq, Eq, BinRead)]
#[br(little, import(layout: Layout))]
pub struct GroupRecord {
    /// Name string offset
    pub name: u32,
    /// First file index
    #[br(pad_before = if layout.is_legacy() { 0x12 + 0x36 } else { 0x12 })]
    pub first: u32,
    /// Last file index, inclusive
    pub last: u32,
    /// Folder strings, absent in version 5
    #[br(if(layout.has_group_folders()))]
    pub folders: Option<GroupFolders>,
}

/// Destination folder of a legacy component
#[derive(Debug, Clone, Copy, PartialEq, Eq, BinRead)]
#[br(little)]
pub struct LegacyComponentFolder {
    /// Destination folder string offset
    #[br(pad_before = 0x18)]
    pub destination: u32,
}

/// Component descriptor
#[derive(Debug, Clone, Copy, PartialEq, Eq, BinRead)]
#[br(little, import(layout: Layout))]
pub struct ComponentRecord {
    /// Name string offset
    pub name: u32,
    /// Destination folder, legacy layouts only
    #[br(if(layout.is_legacy()))]
    pub legacy: Option<LegacyComponentFolder>,
    /// Number of group references
    #[br(pad_before = if layout.is_legacy() { 0x50 } else { 0x6b })]
    pub group_count: u16,
    /// Offset of the group name offset table
    pub group_table: u32,
}

/// V0/V5 file record, located through the file table
#[derive(Debug, Clone, Copy, PartialEq, Eq, BinRead)]
#[br(little)]
pub struct LegacyFileRecord {
    /// Name offset relative to the file table
    pub name: u32,
    /// Directory index
    pub directory: u32,
    /// Flag bits
    pub flags: u16,
    /// Uncompressed size
    pub size: u32,
    /// Stored size
    pub compressed_size: u32,
    /// Offset of the data in its volume
    #[br(pad_before = 0x14)]
    pub offset: u32,
    /// MD5 of the uncompressed data
    pub digest: [u8; 16],
}

/// File record used by every later version, 0x57 bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq, BinRead)]
#[br(little)]
pub struct ModernFileRecord {
    /// Flag bits
    pub flags: u16,
    /// Uncompressed size
    pub size: u64,
    /// Stored size
    pub compressed_size: u64,
    /// Offset of the data in its volume
    pub offset: u64,
    /// MD5 of the uncompressed data
    pub digest: [u8; 16],
    /// Name offset relative to the file table
    #[br(pad_before = 0x10)]
    pub name: u32,
    /// Directory index
    pub directory: u16,
    /// Previous file in a link chain
    #[br(pad_before = 0xc)]
    pub previous: u32,
    /// Next file in a link chain
    pub next: u32,
    /// Link flags
    pub link: u8,
    /// Volume holding the data
    pub volume: u16,
}
