//! Synthetic cabinet sets
//!
//! [`CabinetFixture`] lays out a header file and one or two volume files
//! for any version word, so reader tests can run without installer media.

use std::io::{self, Write};
use std::path::Path;

use flate2::Compression;
use flate2::write::DeflateEncoder;
use relic_crypto::{CabinetCipher, ContentDigest};

/// Descriptor base used by every fixture header
const BASE: u32 = 0x10;
/// Size of the fixed tables following the base
const TABLES_END: usize = 0x276;
const FILE_TABLE_FIELD: usize = 0xc;
const DIRECTORY_COUNT_FIELD: usize = 0x1c;
const FILE_COUNT_FIELD: usize = 0x28;
const RECORDS_OFFSET_FIELD: usize = 0x2c;
const GROUP_HEADS: usize = 0x3e;
const COMPONENT_HEADS: usize = 0x15a;
const MODERN_RECORD_SIZE: usize = 0x57;
/// Where file data starts in each volume
const VOLUME_DATA_START: u64 = 0x100;
const VOLUME_BOUNDS: usize = 0x1c;

const FLAG_OBFUSCATED: u16 = 0x2;
const FLAG_COMPRESSED: u16 = 0x4;
const FLAG_INVALID: u16 = 0x8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Layout {
    V0,
    V5,
    Modern,
}

fn version_number(word: u32) -> u32 {
    if word >> 24 == 1 {
        (word >> 12) & 0xf
    } else {
        (word & 0xffff) / 100
    }
}

/// A file entry in a fixture
#[derive(Debug, Clone)]
pub struct FixtureFile {
    /// File name
    pub name: String,
    /// Directory index
    pub directory: u16,
    /// Uncompressed contents
    pub data: Vec<u8>,
    chunk_size: Option<usize>,
    obfuscated: bool,
    invalid: bool,
    external: bool,
    link_to: Option<u32>,
}

impl FixtureFile {
    /// Stored file holding `data`
    pub fn new(name: &str, directory: u16, data: Vec<u8>) -> Self {
        Self {
            name: name.to_string(),
            directory,
            data,
            chunk_size: None,
            obfuscated: false,
            invalid: false,
            external: false,
            link_to: None,
        }
    }

    /// Link entry redirecting to file `target`
    pub fn link(name: &str, directory: u16, target: u32) -> Self {
        Self {
            link_to: Some(target),
            ..Self::new(name, directory, Vec::new())
        }
    }

    /// Store as raw deflate chunks of `chunk_size` input bytes
    #[must_use]
    pub fn compressed(mut self, chunk_size: usize) -> Self {
        self.chunk_size = Some(chunk_size);
        self
    }

    /// Obfuscate the stored bytes
    #[must_use]
    pub fn obfuscated(mut self) -> Self {
        self.obfuscated = true;
        self
    }

    /// Mark the entry invalid
    #[must_use]
    pub fn invalid(mut self) -> Self {
        self.invalid = true;
        self
    }

    /// Ship the file beside the header instead of in a volume
    #[must_use]
    pub fn external(mut self) -> Self {
        self.external = true;
        self
    }

    fn is_stored(&self) -> bool {
        !self.external && self.link_to.is_none()
    }

    fn flags(&self) -> u16 {
        let mut flags = 0;
        if self.chunk_size.is_some() {
            flags |= FLAG_COMPRESSED;
        }
        if self.obfuscated {
            flags |= FLAG_OBFUSCATED;
        }
        if self.invalid {
            flags |= FLAG_INVALID;
        }
        flags
    }

    fn stored_bytes(&self) -> Vec<u8> {
        let mut out = match self.chunk_size {
            Some(size) => {
                let mut out = Vec::new();
                for piece in self.data.chunks(size.max(1)) {
                    let mut encoder = DeflateEncoder::new(Vec::new(), Compression::default());
                    encoder
                        .write_all(piece)
                        .expect("writing to a Vec cannot fail");
                    let raw = encoder.finish().expect("writing to a Vec cannot fail");
                    let len = u16::try_from(raw.len()).expect("chunk fits a length word");
                    out.extend_from_slice(&len.to_le_bytes());
                    out.extend_from_slice(&raw);
                }
                out
            }
            None => self.data.clone(),
        };
        if self.obfuscated {
            CabinetCipher::new().encode_in_place(&mut out);
        }
        out
    }
}

/// A group entry in a fixture
#[derive(Debug, Clone)]
pub struct FixtureGroup {
    name: String,
    first: u32,
    last: u32,
    source: String,
    destination: String,
}

impl FixtureGroup {
    /// Group covering files `first..=last`
    pub fn new(name: &str, first: u32, last: u32) -> Self {
        Self {
            name: name.to_string(),
            first,
            last,
            source: String::new(),
            destination: String::new(),
        }
    }

    /// Set the source folder
    #[must_use]
    pub fn with_source(mut self, source: &str) -> Self {
        self.source = source.to_string();
        self
    }

    /// Set the destination folder
    #[must_use]
    pub fn with_destination(mut self, destination: &str) -> Self {
        self.destination = destination.to_string();
        self
    }
}

#[derive(Debug, Clone)]
struct FixtureComponent {
    name: String,
    destination: String,
    groups: Vec<String>,
}

/// Part of a file's stored bytes inside one volume
#[derive(Debug, Clone, Copy)]
struct Part {
    index: u32,
    offset: u64,
    size: u64,
    stored: u64,
}

#[derive(Debug, Default)]
struct Volumes {
    bodies: Vec<Vec<u8>>,
    parts: Vec<Vec<Part>>,
    locations: Vec<Option<(u16, u64)>>,
}

impl Volumes {
    fn append(&mut self, volume: usize, index: u32, size: u64, bytes: &[u8]) -> u64 {
        while self.bodies.len() <= volume {
            self.bodies.push(vec![0; VOLUME_DATA_START as usize]);
            self.parts.push(Vec::new());
        }
        let offset = self.bodies[volume].len() as u64;
        self.bodies[volume].extend_from_slice(bytes);
        self.parts[volume].push(Part {
            index,
            offset,
            size,
            stored: bytes.len() as u64,
        });
        offset
    }
}

/// Builder for a header file plus volume files
#[derive(Debug, Clone)]
pub struct CabinetFixture {
    version_word: u32,
    directories: Vec<String>,
    files: Vec<FixtureFile>,
    groups: Vec<FixtureGroup>,
    components: Vec<FixtureComponent>,
    split: Option<(usize, usize)>,
}

impl CabinetFixture {
    /// Empty cabinet with the given header version word
    pub fn new(version_word: u32) -> Self {
        Self {
            version_word,
            directories: vec![String::new()],
            files: Vec::new(),
            groups: Vec::new(),
            components: Vec::new(),
            split: None,
        }
    }

    /// Replace the directory table
    #[must_use]
    pub fn with_directories(mut self, directories: &[&str]) -> Self {
        self.directories = directories.iter().map(ToString::to_string).collect();
        self
    }

    /// Append a file
    #[must_use]
    pub fn with_file(mut self, file: FixtureFile) -> Self {
        self.files.push(file);
        self
    }

    /// Append a group
    #[must_use]
    pub fn with_group(mut self, group: FixtureGroup) -> Self {
        self.groups.push(group);
        self
    }

    /// Append a component installing the named groups
    #[must_use]
    pub fn with_component(mut self, name: &str, destination: &str, groups: &[&str]) -> Self {
        self.components.push(FixtureComponent {
            name: name.to_string(),
            destination: destination.to_string(),
            groups: groups.iter().map(ToString::to_string).collect(),
        });
        self
    }

    /// Move file `index` after its first `bytes` stored bytes, and every
    /// later file, into a second volume
    #[must_use]
    pub fn split_at(mut self, index: usize, bytes: usize) -> Self {
        self.split = Some((index, bytes));
        self
    }

    fn layout(&self) -> Layout {
        match version_number(self.version_word) {
            0 => Layout::V0,
            5 => Layout::V5,
            _ => Layout::Modern,
        }
    }

    fn wide(&self) -> bool {
        version_number(self.version_word) >= 17
    }

    fn encode_string(&self, value: &str) -> Vec<u8> {
        if self.wide() {
            value
                .encode_utf16()
                .chain(std::iter::once(0))
                .flat_map(u16::to_le_bytes)
                .collect()
        } else {
            let mut bytes = value.as_bytes().to_vec();
            bytes.push(0);
            bytes
        }
    }

    fn volumes(&self) -> Volumes {
        let mut volumes = Volumes {
            locations: vec![None; self.files.len()],
            ..Volumes::default()
        };
        volumes.bodies.push(vec![0; VOLUME_DATA_START as usize]);
        volumes.parts.push(Vec::new());

        for (i, file) in self.files.iter().enumerate() {
            if !file.is_stored() {
                continue;
            }
            let stored = file.stored_bytes();
            let size = file.data.len() as u64;
            let index = i as u32;
            let offset = match self.split {
                Some((k, n)) if i == k => {
                    let head = n.min(stored.len());
                    let offset = volumes.append(0, index, size, &stored[..head]);
                    volumes.append(1, index, size, &stored[head..]);
                    offset
                }
                Some((k, _)) if i > k => {
                    let offset = volumes.append(1, index, size, &stored);
                    volumes.locations[i] = Some((2, offset));
                    continue;
                }
                _ => volumes.append(0, index, size, &stored),
            };
            volumes.locations[i] = Some((1, offset));
        }
        volumes
    }

    fn volume_header(&self, parts: &[Part]) -> Vec<u8> {
        let mut header = b"ISc(".to_vec();
        header.extend_from_slice(&self.version_word.to_le_bytes());
        header.resize(VOLUME_BOUNDS, 0);

        let empty = Part {
            index: 0,
            offset: 0,
            size: 0,
            stored: 0,
        };
        let first = parts.first().copied().unwrap_or(empty);
        let last = parts.last().copied().unwrap_or(empty);
        header.extend_from_slice(&first.index.to_le_bytes());
        header.extend_from_slice(&last.index.to_le_bytes());
        for value in [
            first.offset,
            first.size,
            first.stored,
            last.offset,
            last.size,
            last.stored,
        ] {
            if self.layout() == Layout::Modern {
                header.extend_from_slice(&value.to_le_bytes());
            } else {
                header.extend_from_slice(&(value as u32).to_le_bytes());
            }
        }
        header
    }

    /// Volume number and offset of the first stored byte of file `index`
    pub fn stored_location(&self, index: usize) -> (u16, u64) {
        self.volumes().locations[index].unwrap_or((1, 0))
    }

    /// Header-file offset of the first node in group slot 0
    pub fn first_group_node(&self, header: &[u8]) -> u32 {
        let at = BASE as usize + GROUP_HEADS;
        u32::from_le_bytes([header[at], header[at + 1], header[at + 2], header[at + 3]])
    }

    /// Build the header file
    pub fn header_bytes(&self) -> Vec<u8> {
        let layout = self.layout();
        let volumes = self.volumes();
        let mut blob = vec![0u8; TABLES_END];

        let push = |blob: &mut Vec<u8>, bytes: &[u8]| -> u32 {
            let offset = blob.len() as u32;
            blob.extend_from_slice(bytes);
            offset
        };
        let put = |blob: &mut Vec<u8>, at: usize, value: u32| {
            blob[at..at + 4].copy_from_slice(&value.to_le_bytes());
        };
        let optional = |blob: &mut Vec<u8>, value: &str| -> u32 {
            if value.is_empty() {
                0
            } else {
                push(blob, &self.encode_string(value))
            }
        };

        // Groups, chained in slot 0
        let mut nodes = Vec::new();
        for group in &self.groups {
            let name = optional(&mut blob, &group.name);
            let mut record = name.to_le_bytes().to_vec();
            let pad = if layout == Layout::Modern { 0x12 } else { 0x12 + 0x36 };
            record.resize(record.len() + pad, 0);
            record.extend_from_slice(&group.first.to_le_bytes());
            record.extend_from_slice(&group.last.to_le_bytes());
            if layout != Layout::V5 {
                let source = optional(&mut blob, &group.source);
                let destination = optional(&mut blob, &group.destination);
                record.extend_from_slice(&source.to_le_bytes());
                record.resize(record.len() + 0x18, 0);
                record.extend_from_slice(&destination.to_le_bytes());
            }
            let descriptor = push(&mut blob, &record);
            let mut node = vec![0u8; 4];
            node.extend_from_slice(&descriptor.to_le_bytes());
            node.extend_from_slice(&0u32.to_le_bytes());
            nodes.push(push(&mut blob, &node));
        }
        for pair in nodes.windows(2) {
            put(&mut blob, pair[0] as usize + 8, pair[1]);
        }
        if let Some(&head) = nodes.first() {
            put(&mut blob, GROUP_HEADS, head);
        }

        // Components, one per slot
        for (slot, component) in self.components.iter().enumerate() {
            let names: Vec<u32> = component
                .groups
                .iter()
                .map(|g| push(&mut blob, &self.encode_string(g)))
                .collect();
            let table = push(
                &mut blob,
                &names.iter().flat_map(|n| n.to_le_bytes()).collect::<Vec<_>>(),
            );
            let name = optional(&mut blob, &component.name);
            let mut record = name.to_le_bytes().to_vec();
            if layout == Layout::Modern {
                record.resize(record.len() + 0x6b, 0);
            } else {
                let destination = optional(&mut blob, &component.destination);
                record.resize(record.len() + 0x18, 0);
                record.extend_from_slice(&destination.to_le_bytes());
                record.resize(record.len() + 0x50, 0);
            }
            record.extend_from_slice(&(names.len() as u16).to_le_bytes());
            record.extend_from_slice(&table.to_le_bytes());
            let descriptor = push(&mut blob, &record);
            let mut node = vec![0u8; 4];
            node.extend_from_slice(&descriptor.to_le_bytes());
            node.extend_from_slice(&0u32.to_le_bytes());
            let node = push(&mut blob, &node);
            put(&mut blob, COMPONENT_HEADS + slot * 4, node);
        }

        // File table, with every offset relative to its start
        let slot_count = self.directories.len() + self.files.len();
        let mut table = vec![0u8; slot_count * 4];
        for (i, directory) in self.directories.iter().enumerate() {
            let offset = optional(&mut table, directory);
            put(&mut table, i * 4, offset);
        }
        let names: Vec<u32> = self
            .files
            .iter()
            .map(|f| optional(&mut table, &f.name))
            .collect();

        let records_offset = table.len() as u32;
        for (i, file) in self.files.iter().enumerate() {
            let (volume, offset) = volumes.locations[i].unwrap_or((1, 0));
            let (size, compressed, digest) = if file.link_to.is_some() {
                (0, 0, [0u8; 16])
            } else {
                (
                    file.data.len() as u64,
                    file.stored_bytes().len() as u64,
                    *ContentDigest::from_data(&file.data).as_bytes(),
                )
            };

            if layout == Layout::Modern {
                let mut record = vec![0u8; MODERN_RECORD_SIZE];
                record[0..2].copy_from_slice(&file.flags().to_le_bytes());
                record[2..10].copy_from_slice(&size.to_le_bytes());
                record[10..18].copy_from_slice(&compressed.to_le_bytes());
                record[18..26].copy_from_slice(&offset.to_le_bytes());
                record[26..42].copy_from_slice(&digest);
                record[58..62].copy_from_slice(&names[i].to_le_bytes());
                record[62..64].copy_from_slice(&file.directory.to_le_bytes());
                if let Some(target) = file.link_to {
                    record[76..80].copy_from_slice(&target.to_le_bytes());
                    record[84] = 1;
                }
                record[85..87].copy_from_slice(&volume.to_le_bytes());
                push(&mut table, &record);
            } else {
                let mut record = Vec::with_capacity(0x3a);
                record.extend_from_slice(&names[i].to_le_bytes());
                record.extend_from_slice(&u32::from(file.directory).to_le_bytes());
                record.extend_from_slice(&file.flags().to_le_bytes());
                record.extend_from_slice(&(size as u32).to_le_bytes());
                record.extend_from_slice(&(compressed as u32).to_le_bytes());
                record.resize(record.len() + 0x14, 0);
                record.extend_from_slice(&(offset as u32).to_le_bytes());
                record.extend_from_slice(&digest);
                let at = push(&mut table, &record);
                put(&mut table, (self.directories.len() + i) * 4, at);
            }
        }

        let file_table = push(&mut blob, &table);
        put(&mut blob, FILE_TABLE_FIELD, file_table);
        put(&mut blob, DIRECTORY_COUNT_FIELD, self.directories.len() as u32);
        put(&mut blob, FILE_COUNT_FIELD, self.files.len() as u32);
        put(&mut blob, RECORDS_OFFSET_FIELD, records_offset);

        let mut header = b"ISc(".to_vec();
        header.extend_from_slice(&self.version_word.to_le_bytes());
        header.extend_from_slice(&0u32.to_le_bytes());
        header.extend_from_slice(&BASE.to_le_bytes());
        header.extend_from_slice(&blob);
        header
    }

    /// Build the volume files, `data1.cab` first
    pub fn volume_bytes(&self) -> Vec<Vec<u8>> {
        let volumes = self.volumes();
        volumes
            .bodies
            .into_iter()
            .zip(&volumes.parts)
            .map(|(mut body, parts)| {
                let header = self.volume_header(parts);
                body[..header.len()].copy_from_slice(&header);
                body
            })
            .collect()
    }

    /// Write `data1.hdr` and the volumes into `dir`
    pub fn write_to(&self, dir: &Path) -> io::Result<()> {
        std::fs::write(dir.join("data1.hdr"), self.header_bytes())?;
        for (i, volume) in self.volume_bytes().into_iter().enumerate() {
            std::fs::write(dir.join(format!("data{}.cab", i + 1)), volume)?;
        }
        Ok(())
    }
}
