//! Volume files and their headers

use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use relic_formats::ByteCursor;
use tracing::debug;

use crate::config::CabinetConfig;
use crate::error::{CabinetError, CabinetResult};
use crate::header::CABINET_MAGIC;
use crate::version::{FormatVersion, Layout};

/// Offset of the first covered file index
const BOUNDS_OFFSET: usize = 0x1c;

/// Longest volume header, with 64-bit boundary fields
pub const MAX_VOLUME_HEADER_SIZE: usize = BOUNDS_OFFSET + 8 + 6 * 8;

/// Per-volume header describing which files the volume covers
///
/// The first and last covered files may be split across neighbouring
/// volumes; their offsets and stored sizes within this volume are given
/// explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VolumeHeader {
    /// Format version of the volume
    pub version: FormatVersion,
    /// First file index with bytes in this volume
    pub first_index: u32,
    /// Last file index with bytes in this volume
    pub last_index: u32,
    /// Offset of the first file's bytes
    pub first_offset: u64,
    /// Uncompressed size of the first file's part
    pub first_size: u64,
    /// Stored size of the first file's part
    pub first_compressed: u64,
    /// Offset of the last file's bytes
    pub last_offset: u64,
    /// Uncompressed size of the last file's part
    pub last_size: u64,
    /// Stored size of the last file's part
    pub last_compressed: u64,
}

impl VolumeHeader {
    /// Parse a volume header from the start of a volume file
    pub fn parse(data: &[u8]) -> CabinetResult<Self> {
        let mut cursor = ByteCursor::new(data);
        let magic = cursor.read_tag()?;
        if magic != CABINET_MAGIC {
            return Err(CabinetError::InvalidMagic(magic));
        }
        let version = FormatVersion::from_word(cursor.read_u32()?);
        cursor.seek(BOUNDS_OFFSET)?;
        let first_index = cursor.read_u32()?;
        let last_index = cursor.read_u32()?;

        let mut fields = [0u64; 6];
        for field in &mut fields {
            *field = if version.layout().is_legacy() {
                u64::from(cursor.read_u32()?)
            } else {
                cursor.read_u64()?
            };
        }
        let [
            first_offset,
            first_size,
            first_compressed,
            last_offset,
            last_size,
            last_compressed,
        ] = fields;

        Ok(Self {
            version,
            first_index,
            last_index,
            first_offset,
            first_size,
            first_compressed,
            last_offset,
            last_size,
            last_compressed,
        })
    }

    /// Whether this volume lies wholly before `index`
    ///
    /// Only version 5 volumes are skipped this way.
    pub fn precedes(&self, index: u32) -> bool {
        self.version.layout() == Layout::V5 && index > self.last_index
    }
}

/// One open volume file
#[derive(Debug)]
pub(crate) struct VolumeSession {
    pub number: u16,
    pub header: VolumeHeader,
    pub len: u64,
    path: PathBuf,
    reader: BufReader<File>,
}

impl VolumeSession {
    /// Open volume `number`, moving past version 5 volumes that end before `index`
    pub fn open(
        root: &Path,
        config: &CabinetConfig,
        mut number: u16,
        index: u32,
    ) -> CabinetResult<Self> {
        loop {
            let path = config.volume_path(root, number);
            let file = File::open(&path).map_err(|source| CabinetError::VolumeMissing {
                path: path.clone(),
                source,
            })?;
            let len = file.metadata()?.len();
            let mut reader = BufReader::new(file);

            let mut prefix = Vec::with_capacity(MAX_VOLUME_HEADER_SIZE);
            (&mut reader)
                .take(MAX_VOLUME_HEADER_SIZE as u64)
                .read_to_end(&mut prefix)?;
            let header = VolumeHeader::parse(&prefix)?;

            if header.precedes(index) {
                debug!(
                    "Volume {} ends at file {}, skipping for file {}",
                    number, header.last_index, index
                );
                number = number.checked_add(1).ok_or_else(|| {
                    CabinetError::Format("volume number overflow".to_string())
                })?;
                continue;
            }

            debug!(
                "Opened volume {} covering files {}..={}",
                path.display(),
                header.first_index,
                header.last_index
            );
            return Ok(Self {
                number,
                header,
                len,
                path,
                reader,
            });
        }
    }

    pub fn seek(&mut self, offset: u64) -> CabinetResult<()> {
        if offset > self.len {
            return Err(CabinetError::Format(format!(
                "offset {offset:#x} is past the end of {}",
                self.path.display()
            )));
        }
        self.reader.seek(SeekFrom::Start(offset))?;
        Ok(())
    }

    pub fn read_exact(&mut self, buf: &mut [u8]) -> CabinetResult<()> {
        self.reader.read_exact(buf)?;
        Ok(())
    }
}
