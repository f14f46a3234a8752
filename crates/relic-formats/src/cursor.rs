//! Positionable little-endian reader over an in-memory buffer
//!
//! Every decoder in the workspace walks its input through a [`ByteCursor`].
//! Reads are bounds-checked and fail with [`CursorError`] instead of
//! panicking, which is what lets truncated inputs surface as typed errors.

use thiserror::Error;

/// Errors raised by [`ByteCursor`]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CursorError {
    /// A read needed more bytes than remain in the buffer
    #[error("unexpected end of data at {position:#x}: wanted {wanted} bytes, {available} available")]
    UnexpectedEof {
        /// Cursor position at the time of the read
        position: usize,
        /// Number of bytes requested
        wanted: usize,
        /// Number of bytes left in the buffer
        available: usize,
    },

    /// A seek targeted a position past the end of the buffer
    #[error("seek to {target:#x} is outside data of length {len:#x}")]
    SeekOutOfRange {
        /// Requested position
        target: usize,
        /// Buffer length
        len: usize,
    },
}

/// Result type for cursor reads
pub type CursorResult<T> = Result<T, CursorError>;

/// Little-endian reader over any byte container
#[derive(Debug, Clone)]
pub struct ByteCursor<T> {
    data: T,
    pos: usize,
}

impl<T: AsRef<[u8]>> ByteCursor<T> {
    /// Create a cursor positioned at the start of `data`
    pub const fn new(data: T) -> Self {
        Self { data, pos: 0 }
    }

    /// Borrow the whole underlying buffer
    pub fn data(&self) -> &[u8] {
        self.data.as_ref()
    }

    /// Consume the cursor, returning the underlying container
    pub fn into_inner(self) -> T {
        self.data
    }

    /// Total buffer length
    pub fn len(&self) -> usize {
        self.data.as_ref().len()
    }

    /// Whether the buffer is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Current position
    pub const fn position(&self) -> usize {
        self.pos
    }

    /// Bytes left between the position and the end of the buffer
    pub fn remaining(&self) -> usize {
        self.len().saturating_sub(self.pos)
    }

    /// Whether the cursor sits at or past the end of the buffer
    pub fn is_eof(&self) -> bool {
        self.pos >= self.len()
    }

    /// Move to an absolute position. Positioning exactly at the end is allowed.
    pub fn seek(&mut self, pos: usize) -> CursorResult<()> {
        if pos > self.len() {
            return Err(CursorError::SeekOutOfRange {
                target: pos,
                len: self.len(),
            });
        }
        self.pos = pos;
        Ok(())
    }

    /// Advance by `n` bytes
    pub fn skip(&mut self, n: usize) -> CursorResult<()> {
        self.ensure(n)?;
        self.pos += n;
        Ok(())
    }

    /// Step back by `n` bytes
    pub fn rewind(&mut self, n: usize) -> CursorResult<()> {
        let target = self
            .pos
            .checked_sub(n)
            .ok_or(CursorError::SeekOutOfRange {
                target: 0,
                len: self.len(),
            })?;
        self.pos = target;
        Ok(())
    }

    fn ensure(&self, wanted: usize) -> CursorResult<()> {
        let available = self.remaining();
        if wanted > available {
            return Err(CursorError::UnexpectedEof {
                position: self.pos,
                wanted,
                available,
            });
        }
        Ok(())
    }

    /// Borrow the next `n` bytes and advance past them
    pub fn read_bytes(&mut self, n: usize) -> CursorResult<&[u8]> {
        self.ensure(n)?;
        let start = self.pos;
        self.pos += n;
        Ok(&self.data.as_ref()[start..self.pos])
    }

    /// Read a fixed-size array
    pub fn read_array<const N: usize>(&mut self) -> CursorResult<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.read_bytes(N)?);
        Ok(out)
    }

    /// Read a four character tag such as a file signature
    pub fn read_tag(&mut self) -> CursorResult<[u8; 4]> {
        self.read_array()
    }

    /// Read one byte
    pub fn read_u8(&mut self) -> CursorResult<u8> {
        Ok(self.read_array::<1>()?[0])
    }

    /// Read one signed byte
    pub fn read_i8(&mut self) -> CursorResult<i8> {
        Ok(i8::from_le_bytes(self.read_array()?))
    }

    /// Read a little-endian u16
    pub fn read_u16(&mut self) -> CursorResult<u16> {
        Ok(u16::from_le_bytes(self.read_array()?))
    }

    /// Read a little-endian u32
    pub fn read_u32(&mut self) -> CursorResult<u32> {
        Ok(u32::from_le_bytes(self.read_array()?))
    }

    /// Read a little-endian u64
    pub fn read_u64(&mut self) -> CursorResult<u64> {
        Ok(u64::from_le_bytes(self.read_array()?))
    }

    /// Read a NUL terminated single-byte string.
    ///
    /// Reading stops at the terminator (which is consumed) or at the end of
    /// the buffer. Invalid UTF-8 is replaced rather than rejected.
    pub fn read_narrow_string(&mut self) -> String {
        let rest = &self.data.as_ref()[self.pos.min(self.len())..];
        let end = rest.iter().position(|&b| b == 0).unwrap_or(rest.len());
        let text = String::from_utf8_lossy(&rest[..end]).into_owned();
        self.pos += (end + 1).min(rest.len());
        text
    }

    /// Read a NUL terminated UTF-16LE string
    pub fn read_wide_string(&mut self) -> String {
        let mut units = Vec::new();
        while let Ok(unit) = self.read_u16() {
            if unit == 0 {
                break;
            }
            units.push(unit);
        }
        String::from_utf16_lossy(&units)
    }
}
