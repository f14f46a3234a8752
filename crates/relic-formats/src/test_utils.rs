//! Synthetic archive fixtures

use std::io::Write;

use flate2::Compression;
use flate2::write::ZlibEncoder;

/// Deterministic non-repeating payload
pub fn sample_payload(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i * 31 + i / 7) as u8).collect()
}

/// Wrap `payload` in a `BIFC` container with chunks of `chunk_size` bytes
pub fn compressed_container(payload: &[u8], chunk_size: usize) -> Vec<u8> {
    let mut out = b"BIFCV1.0".to_vec();
    out.extend_from_slice(&(payload.len() as u32).to_le_bytes());
    for chunk in payload.chunks(chunk_size) {
        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(chunk).unwrap();
        let packed = encoder.finish().unwrap();
        out.extend_from_slice(&(chunk.len() as u32).to_le_bytes());
        out.extend_from_slice(&(packed.len() as u32).to_le_bytes());
        out.extend_from_slice(&packed);
    }
    out
}

/// Builds plain and compressed archives
///
/// Tilesets are numbered from 1; table slot 0 is left zeroed.
#[derive(Debug, Clone, Default)]
pub struct ArchiveBuilder {
    files: Vec<(u16, Vec<u8>)>,
    tilesets: Vec<(u16, u32, Vec<u8>)>,
}

impl ArchiveBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(mut self, resource_type: u16, data: Vec<u8>) -> Self {
        self.files.push((resource_type, data));
        self
    }

    pub fn with_tileset(mut self, resource_type: u16, tile_size: u32, data: Vec<u8>) -> Self {
        assert_eq!(data.len() % tile_size as usize, 0);
        self.tilesets.push((resource_type, tile_size, data));
        self
    }

    fn tileset_slots(&self) -> usize {
        if self.tilesets.is_empty() {
            0
        } else {
            self.tilesets.len() + 1
        }
    }

    /// `[start, end)` of the resource data
    pub fn data_region(&self) -> (u64, u64) {
        let start = 20 + self.files.len() * 16 + self.tileset_slots() * 20;
        let len: usize = self.files.iter().map(|(_, d)| d.len()).sum::<usize>()
            + self.tilesets.iter().map(|(_, _, d)| d.len()).sum::<usize>();
        (start as u64, (start + len) as u64)
    }

    pub fn build_plain(&self) -> Vec<u8> {
        let (data_start, _) = self.data_region();
        let mut out = b"BIFFV1  ".to_vec();
        out.extend_from_slice(&(self.files.len() as u32).to_le_bytes());
        out.extend_from_slice(&(self.tileset_slots() as u32).to_le_bytes());
        out.extend_from_slice(&20u32.to_le_bytes());

        let mut offset = data_start as u32;
        for (index, (resource_type, data)) in self.files.iter().enumerate() {
            out.extend_from_slice(&(index as u32).to_le_bytes());
            out.extend_from_slice(&offset.to_le_bytes());
            out.extend_from_slice(&(data.len() as u32).to_le_bytes());
            out.extend_from_slice(&resource_type.to_le_bytes());
            out.extend_from_slice(&0u16.to_le_bytes());
            offset += data.len() as u32;
        }
        if !self.tilesets.is_empty() {
            out.extend_from_slice(&[0u8; 20]);
        }
        for (slot, (resource_type, tile_size, data)) in self.tilesets.iter().enumerate() {
            let locator = ((slot as u32) + 1) << 14;
            out.extend_from_slice(&locator.to_le_bytes());
            out.extend_from_slice(&offset.to_le_bytes());
            out.extend_from_slice(&(data.len() as u32 / tile_size).to_le_bytes());
            out.extend_from_slice(&tile_size.to_le_bytes());
            out.extend_from_slice(&resource_type.to_le_bytes());
            out.extend_from_slice(&0u16.to_le_bytes());
            offset += data.len() as u32;
        }

        for (_, data) in &self.files {
            out.extend_from_slice(data);
        }
        for (_, _, data) in &self.tilesets {
            out.extend_from_slice(data);
        }
        out
    }

    pub fn build_compressed(&self, chunk_size: usize) -> Vec<u8> {
        compressed_container(&self.build_plain(), chunk_size)
    }
}

/// Builds `chitin.key` indexes
#[derive(Debug, Clone, Default)]
pub struct KeyBuilder {
    archives: Vec<(String, u16)>,
    resources: Vec<(String, u16, u32)>,
}

impl KeyBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_archive(mut self, name: &str, location: u16) -> Self {
        self.archives.push((name.to_string(), location));
        self
    }

    pub fn with_resource(mut self, name: &str, resource_type: u16, locator: u32) -> Self {
        self.resources.push((name.to_string(), resource_type, locator));
        self
    }

    pub fn build(&self) -> Vec<u8> {
        let archive_offset = 24usize;
        let names_offset = archive_offset + self.archives.len() * 12;
        let names_len: usize = self.archives.iter().map(|(n, _)| n.len() + 1).sum();
        let resource_offset = names_offset + names_len;

        let mut out = b"KEY V1  ".to_vec();
        out.extend_from_slice(&(self.archives.len() as u32).to_le_bytes());
        out.extend_from_slice(&(self.resources.len() as u32).to_le_bytes());
        out.extend_from_slice(&(archive_offset as u32).to_le_bytes());
        out.extend_from_slice(&(resource_offset as u32).to_le_bytes());

        let mut name_at = names_offset;
        for (name, location) in &self.archives {
            out.extend_from_slice(&0u32.to_le_bytes());
            out.extend_from_slice(&(name_at as u32).to_le_bytes());
            out.extend_from_slice(&((name.len() + 1) as u16).to_le_bytes());
            out.extend_from_slice(&location.to_le_bytes());
            name_at += name.len() + 1;
        }
        for (name, _) in &self.archives {
            out.extend_from_slice(name.as_bytes());
            out.push(0);
        }
        for (name, resource_type, locator) in &self.resources {
            let mut raw = [0u8; 8];
            raw[..name.len()].copy_from_slice(name.as_bytes());
            out.extend_from_slice(&raw);
            out.extend_from_slice(&resource_type.to_le_bytes());
            out.extend_from_slice(&locator.to_le_bytes());
        }
        out
    }
}
