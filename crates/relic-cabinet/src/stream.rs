//! Reading a file's stored bytes across volume boundaries

use std::path::Path;

use relic_crypto::CabinetCipher;
use tracing::debug;

use crate::config::CabinetConfig;
use crate::error::{CabinetError, CabinetResult};
use crate::volume::VolumeSession;

/// Streaming state for one extraction
///
/// Holds the open volume, the file being read, the bytes left in the current
/// volume for that file and the obfuscation counter. A new stream is created
/// for every extraction, so concurrent extractions never share state.
#[derive(Debug)]
pub(crate) struct VolumeStream<'a> {
    root: &'a Path,
    config: &'a CabinetConfig,
    index: u32,
    session: Option<VolumeSession>,
    remaining: u64,
    cipher: Option<CabinetCipher>,
}

impl<'a> VolumeStream<'a> {
    pub fn new(root: &'a Path, config: &'a CabinetConfig) -> Self {
        Self {
            root,
            config,
            index: 0,
            session: None,
            remaining: 0,
            cipher: None,
        }
    }

    /// Position at the start of file `index`, stored from `offset` in `volume`
    pub fn seek(
        &mut self,
        volume: u16,
        index: u32,
        offset: u64,
        obfuscated: bool,
    ) -> CabinetResult<()> {
        self.index = index;
        let reuse = self.session.as_ref().is_some_and(|s| s.number == volume);
        if !reuse {
            self.session = Some(VolumeSession::open(self.root, self.config, volume, index)?);
        }
        let session = self
            .session
            .as_mut()
            .ok_or_else(|| CabinetError::Format(format!("volume {volume} not open")))?;

        let header = session.header;
        if index == header.last_index && header.last_compressed != 0 {
            session.seek(header.last_offset)?;
            self.remaining = header.last_compressed;
        } else {
            session.seek(offset)?;
            self.remaining = session.len - offset;
        }
        self.cipher = obfuscated.then(CabinetCipher::new);
        Ok(())
    }

    fn session_mut(&mut self) -> CabinetResult<&mut VolumeSession> {
        self.session
            .as_mut()
            .ok_or_else(|| CabinetError::Format("read before seek".to_string()))
    }

    /// Move to the next volume and position at the current file's part
    fn advance_volume(&mut self) -> CabinetResult<()> {
        let number = self
            .session
            .as_ref()
            .map_or(Some(1), |s| s.number.checked_add(1))
            .ok_or_else(|| CabinetError::Format("volume number overflow".to_string()))?;
        let mut session = VolumeSession::open(self.root, self.config, number, self.index)?;
        let header = session.header;

        let (offset, stored) = if self.index == header.first_index {
            (header.first_offset, header.first_compressed)
        } else if self.index == header.last_index {
            (header.last_offset, header.last_compressed)
        } else {
            return Err(CabinetError::Format(format!(
                "volume {} does not continue file {} (covers {}..={})",
                session.number, self.index, header.first_index, header.last_index
            )));
        };
        session.seek(offset)?;
        self.remaining = if stored == 0 {
            session.len - offset
        } else {
            stored
        };
        debug!(
            "File {} continues in volume {} at {:#x} ({} bytes)",
            self.index, session.number, offset, self.remaining
        );
        self.session = Some(session);
        Ok(())
    }

    /// Fill `buf` with the next stored bytes, de-obfuscated
    pub fn read_exact(&mut self, buf: &mut [u8]) -> CabinetResult<()> {
        let mut filled = 0;
        while filled < buf.len() {
            if self.remaining == 0 {
                self.advance_volume()?;
                continue;
            }
            let left = usize::try_from(self.remaining).unwrap_or(usize::MAX);
            let want = (buf.len() - filled).min(left);
            self.session_mut()?
                .read_exact(&mut buf[filled..filled + want])?;
            filled += want;
            self.remaining -= want as u64;
        }
        if let Some(cipher) = self.cipher.as_mut() {
            cipher.decode_in_place(buf);
        }
        Ok(())
    }

    pub fn read_vec(&mut self, len: usize) -> CabinetResult<Vec<u8>> {
        let mut buf = vec![0u8; len];
        self.read_exact(&mut buf)?;
        Ok(buf)
    }
}
