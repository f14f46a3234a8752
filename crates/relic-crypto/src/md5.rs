//! MD5 hashing for extracted file contents

use md5::{Digest, Md5};
use std::fmt;
use std::io::{self, Write};

/// 16-byte MD5 digest stored alongside every cabinet file descriptor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ContentDigest([u8; 16]);

impl ContentDigest {
    /// Create a digest from raw bytes
    pub const fn from_bytes(bytes: [u8; 16]) -> Self {
        Self(bytes)
    }

    /// Compute the MD5 digest of `data`
    pub fn from_data(data: &[u8]) -> Self {
        let mut hasher = Md5::new();
        hasher.update(data);
        Self::from_hasher(hasher)
    }

    fn from_hasher(hasher: Md5) -> Self {
        let result = hasher.finalize();
        let mut bytes = [0u8; 16];
        bytes.copy_from_slice(&result);
        Self(bytes)
    }

    /// Parse a digest from its hex representation
    pub fn from_hex(hex: &str) -> Result<Self, hex::FromHexError> {
        let mut bytes = [0u8; 16];
        hex::decode_to_slice(hex, &mut bytes)?;
        Ok(Self(bytes))
    }

    /// Get raw bytes
    pub const fn as_bytes(&self) -> &[u8; 16] {
        &self.0
    }

    /// Convert to hex string
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Display for ContentDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl From<[u8; 16]> for ContentDigest {
    fn from(bytes: [u8; 16]) -> Self {
        Self(bytes)
    }
}

/// Writer adapter that folds everything written through it into an MD5 digest
///
/// Extraction streams decompressed chunks into the destination and the digest
/// at the same time, so the stored digest can be checked once the last chunk
/// has been written without buffering the whole file.
pub struct DigestWriter<W> {
    inner: W,
    hasher: Md5,
    written: u64,
}

impl<W: Write> DigestWriter<W> {
    /// Wrap `inner`
    pub fn new(inner: W) -> Self {
        Self {
            inner,
            hasher: Md5::new(),
            written: 0,
        }
    }

    /// Number of bytes written so far
    pub const fn bytes_written(&self) -> u64 {
        self.written
    }

    /// Consume the adapter, returning the inner writer and the final digest
    pub fn finish(self) -> (W, ContentDigest) {
        (self.inner, ContentDigest::from_hasher(self.hasher))
    }
}

impl<W: Write> Write for DigestWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.inner.write(buf)?;
        self.hasher.update(&buf[..n]);
        self.written += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}
