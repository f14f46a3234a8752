//! Opened cabinet sets and file extraction

use std::fs::File;
use std::io::{BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use flate2::read::DeflateDecoder;
use relic_crypto::{ContentDigest, DigestWriter};
use tracing::{debug, info};

use crate::config::CabinetConfig;
use crate::error::{CabinetError, CabinetResult, IntegrityFailure};
use crate::header::{CabinetHeader, Component, FileDescriptor, Group};
use crate::stream::VolumeStream;
use crate::version::FormatVersion;

/// Block size used when copying uncompressed files
const COPY_BLOCK: usize = 64 * 1024;

/// Outcome of a successful extraction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtractReport {
    /// Index that was requested
    pub index: usize,
    /// Index whose data was read, after following links
    pub source_index: usize,
    /// Bytes written to the destination
    pub bytes_written: u64,
    /// Verified digest of the written bytes
    pub digest: ContentDigest,
}

/// A cabinet set: one header file plus numbered volume files in one directory
#[derive(Debug, Clone)]
pub struct Cabinet {
    root: PathBuf,
    config: CabinetConfig,
    header: CabinetHeader,
}

impl Cabinet {
    /// Open the cabinet in `root` with the default file names
    pub fn open(root: impl AsRef<Path>) -> CabinetResult<Self> {
        Self::open_with_config(root, CabinetConfig::default())
    }

    /// Open the cabinet in `root` using `config` for file names
    pub fn open_with_config(root: impl AsRef<Path>, config: CabinetConfig) -> CabinetResult<Self> {
        let root = root.as_ref().to_path_buf();
        let path = config.header_path(&root);
        debug!("Reading cabinet header {}", path.display());
        let header = CabinetHeader::parse(&std::fs::read(&path)?)?;
        info!(
            "Opened cabinet {} (version {}, {} files)",
            root.display(),
            header.version,
            header.files.len()
        );
        Ok(Self {
            root,
            config,
            header,
        })
    }

    /// Directory holding the header and volumes
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// File naming in use
    pub const fn config(&self) -> &CabinetConfig {
        &self.config
    }

    /// Parsed header
    pub const fn header(&self) -> &CabinetHeader {
        &self.header
    }

    /// Format version
    pub const fn version(&self) -> FormatVersion {
        self.header.version
    }

    /// All file descriptors
    pub fn files(&self) -> &[FileDescriptor] {
        &self.header.files
    }

    /// Components in table order
    pub fn components(&self) -> &[Component] {
        &self.header.components
    }

    /// Group by name
    pub fn group(&self, name: &str) -> Option<&Group> {
        self.header.group(name)
    }

    /// Follow link records from `index` to the entry holding the data
    pub fn resolve_link(&self, index: usize) -> CabinetResult<usize> {
        let count = self.header.files.len();
        let mut chain = Vec::new();
        let mut current = index;
        loop {
            let file = self
                .header
                .files
                .get(current)
                .ok_or(CabinetError::InvalidIndex {
                    index: current,
                    count,
                })?;
            if file.flags.is_invalid() {
                return Err(CabinetError::InvalidFlags {
                    index: current,
                    flags: file.flags.0,
                });
            }
            if !file.links_previous() {
                return Ok(current);
            }
            chain.push(current);
            current = file.previous as usize;
            if chain.contains(&current) {
                chain.push(current);
                return Err(CabinetError::LinkCycle {
                    start: index,
                    chain,
                });
            }
        }
    }

    /// Extract file `index` into `writer`, verifying its digest
    ///
    /// Bytes are written as they are decoded, so on an integrity failure
    /// the writer has already received output; discarding it is up to
    /// the caller.
    pub fn extract<W: Write>(&self, index: usize, writer: W) -> CabinetResult<ExtractReport> {
        let source_index = self.resolve_link(index)?;
        let file = &self.header.files[source_index];
        debug!(
            "Extracting {} (file {}, volume {}, offset {:#x}, flags {:#x})",
            file.name, source_index, file.volume, file.offset, file.flags.0
        );

        let mut stream = VolumeStream::new(&self.root, &self.config);
        stream.seek(
            file.volume,
            source_index as u32,
            file.offset,
            file.flags.is_obfuscated(),
        )?;

        let mut out = DigestWriter::new(writer);
        if file.flags.is_compressed() {
            let mut left = file.compressed_size;
            let mut chunk = 0usize;
            let mut inflated = Vec::new();
            while left > 0 {
                let mut len = [0u8; 2];
                stream.read_exact(&mut len)?;
                let chunk_len = usize::from(u16::from_le_bytes(len));
                left = left.saturating_sub(2);
                let raw = stream.read_vec(chunk_len)?;
                left = left.saturating_sub(chunk_len as u64);

                inflated.clear();
                DeflateDecoder::new(raw.as_slice())
                    .read_to_end(&mut inflated)
                    .map_err(|e| CabinetError::Integrity {
                        index: source_index,
                        failure: IntegrityFailure::CorruptChunk {
                            chunk,
                            reason: e.to_string(),
                        },
                    })?;
                out.write_all(&inflated)?;
                chunk += 1;
            }
        } else {
            let mut left = file.size;
            let mut block = vec![0u8; COPY_BLOCK];
            while left > 0 {
                let n = usize::try_from(left).map_or(COPY_BLOCK, |l| l.min(COPY_BLOCK));
                stream.read_exact(&mut block[..n])?;
                out.write_all(&block[..n])?;
                left -= n as u64;
            }
        }
        out.flush()?;

        let bytes_written = out.bytes_written();
        let (_, digest) = out.finish();
        if digest != file.digest {
            return Err(CabinetError::Integrity {
                index: source_index,
                failure: IntegrityFailure::DigestMismatch {
                    expected: file.digest,
                    actual: digest,
                },
            });
        }
        Ok(ExtractReport {
            index,
            source_index,
            bytes_written,
            digest,
        })
    }

    /// Extract file `index` to a new file at `path`
    ///
    /// A partially written file is left in place when extraction fails.
    pub fn extract_to_path(&self, index: usize, path: impl AsRef<Path>) -> CabinetResult<ExtractReport> {
        let path = path.as_ref();
        // Validate before creating the destination
        self.resolve_link(index)?;
        let writer = BufWriter::new(File::create(path)?);
        let report = self.extract(index, writer)?;
        debug!("Wrote {} bytes to {}", report.bytes_written, path.display());
        Ok(report)
    }
}
