//! Synthetic movie command streams

/// Preamble: signature plus the six bytes real movies carry after it
const PREAMBLE: &[u8; 26] = b"Interplay MVE File\x1a\0\x1a\0\0\x01\x33\x11";

/// Pack block opcodes into control bytes, two per byte, low nibble first
///
/// Every row of `width` blocks starts a new byte.
pub fn pack_control(width: usize, ops: &[u8]) -> Vec<u8> {
    let mut control = Vec::new();
    for row in ops.chunks(width.max(1)) {
        for pair in row.chunks(2) {
            let lo = pair[0] & 0xf;
            let hi = pair.get(1).map_or(0, |op| op & 0xf);
            control.push(lo | (hi << 4));
        }
    }
    control
}

/// Builder for a movie stream
///
/// Packets accumulate into the open chunk until [`MovieBuilder::end_chunk`]
/// closes it with an end-of-chunk packet.
#[derive(Debug, Clone)]
pub struct MovieBuilder {
    bytes: Vec<u8>,
    chunk: Vec<u8>,
}

impl Default for MovieBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl MovieBuilder {
    /// Stream with only the preamble
    pub fn new() -> Self {
        Self {
            bytes: PREAMBLE.to_vec(),
            chunk: Vec::new(),
        }
    }

    /// Append a raw packet to the open chunk
    #[must_use]
    pub fn packet(mut self, opcode: u8, param: u8, body: &[u8]) -> Self {
        let len = u16::try_from(body.len()).expect("packet body fits a length word");
        self.chunk.extend_from_slice(&len.to_le_bytes());
        self.chunk.push(opcode);
        self.chunk.push(param);
        self.chunk.extend_from_slice(body);
        self
    }

    /// Frame timing packet
    #[must_use]
    pub fn timing(self, raw_delay: u32, rate: u16) -> Self {
        let mut body = raw_delay.to_le_bytes().to_vec();
        body.extend_from_slice(&rate.to_le_bytes());
        self.packet(2, 0, &body)
    }

    /// Video init packet, dimensions in blocks
    #[must_use]
    pub fn init_video(self, width_blocks: u16, height_blocks: u16) -> Self {
        let mut body = width_blocks.to_le_bytes().to_vec();
        body.extend_from_slice(&height_blocks.to_le_bytes());
        body.extend_from_slice(&[0; 4]);
        self.packet(5, 0, &body)
    }

    /// Movie init packet
    #[must_use]
    pub fn init_movie(self, width: u16, height: u16) -> Self {
        let mut body = width.to_le_bytes().to_vec();
        body.extend_from_slice(&height.to_le_bytes());
        self.packet(10, 0, &body)
    }

    /// Palette packet setting entries from `first`
    #[must_use]
    pub fn palette(self, first: u8, entries: &[[u8; 3]]) -> Self {
        let count = u16::try_from(entries.len()).expect("at most 256 entries");
        let mut body = u16::from(first).to_le_bytes().to_vec();
        body.extend_from_slice(&count.to_le_bytes());
        body.extend(entries.iter().flatten());
        self.packet(12, 0, &body)
    }

    /// Decoder control packet
    #[must_use]
    pub fn control(self, control: &[u8]) -> Self {
        self.packet(15, 0, control)
    }

    /// Decode-blocks packet for a region in block units
    #[must_use]
    pub fn decode_blocks(
        self,
        x: u16,
        y: u16,
        width: u16,
        height: u16,
        swap: bool,
        data: &[u8],
    ) -> Self {
        let mut body = vec![0u8; 4];
        for value in [x, y, width, height, u16::from(swap)] {
            body.extend_from_slice(&value.to_le_bytes());
        }
        body.extend_from_slice(data);
        self.packet(17, 0, &body)
    }

    /// Show-frame packet
    #[must_use]
    pub fn show_frame(self) -> Self {
        self.packet(7, 0, &[0; 4])
    }

    /// Close the open chunk with an end-of-chunk packet
    #[must_use]
    pub fn end_chunk(self) -> Self {
        let mut this = self.packet(1, 0, &[]);
        let len = u16::try_from(this.chunk.len()).expect("chunk fits a length word");
        this.bytes.extend_from_slice(&u32::from(len).to_le_bytes());
        this.bytes.append(&mut this.chunk);
        this
    }

    /// Stream bytes, with any open chunk closed and the terminator appended
    pub fn finish(self) -> Vec<u8> {
        let mut this = if self.chunk.is_empty() {
            self
        } else {
            self.end_chunk()
        };
        this.bytes.extend_from_slice(&0u32.to_le_bytes());
        this.bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pack_control() {
        assert_eq!(pack_control(2, &[1, 14, 2, 3]), vec![0xe1, 0x32]);
        // Odd widths start every row on a new byte
        assert_eq!(pack_control(3, &[1, 2, 3, 4, 5, 6]), vec![0x21, 0x03, 0x54, 0x06]);
    }

    #[test]
    fn test_chunk_layout() {
        let bytes = MovieBuilder::new().init_movie(1, 2).finish();
        assert_eq!(&bytes[..20], b"Interplay MVE File\x1a\0");
        // Chunk: init movie (4 + 4) and end of chunk (4)
        assert_eq!(&bytes[26..30], &12u32.to_le_bytes());
        assert_eq!(&bytes[bytes.len() - 4..], &[0; 4]);
    }
}
