//! Rolling byte cipher used to obfuscate installer cabinet payloads.
//!
//! Every payload byte of an obfuscated cabinet file is stored transformed. To
//! recover a byte the reader XORs it with [`XOR_KEY`], rotates it right by two
//! bits and subtracts a rolling counter. The counter starts at zero at the
//! beginning of each file and advances by one per byte, wrapping at [`PERIOD`].
//!
//! ```rust
//! use relic_crypto::CabinetCipher;
//!
//! let mut cipher = CabinetCipher::new();
//! let mut data = vec![0xf4, 0x4c, 0x6c, 0x68, 0x18, 0x4d];
//! cipher.decode_in_place(&mut data);
//! assert_eq!(data, b"Hello!");
//! ```

/// Constant every stored byte is XORed with
pub const XOR_KEY: u8 = 0xd5;

/// Period of the rolling counter
pub const PERIOD: u8 = 71;

/// Stateful cabinet payload cipher.
///
/// The cipher only tracks the rolling counter, so one instance must follow a
/// single file's byte stream from its first byte. Call [`CabinetCipher::reset`]
/// when a new file starts.
#[derive(Debug, Clone, Default)]
pub struct CabinetCipher {
    counter: u8,
}

impl CabinetCipher {
    /// Create a cipher positioned at the first byte of a file
    pub const fn new() -> Self {
        Self { counter: 0 }
    }

    /// Restart the rolling counter
    pub fn reset(&mut self) {
        self.counter = 0;
    }

    /// Current value of the rolling counter
    pub const fn counter(&self) -> u8 {
        self.counter
    }

    fn advance(&mut self) -> u8 {
        let current = self.counter;
        self.counter = (self.counter + 1) % PERIOD;
        current
    }

    /// Decode a single byte, advancing the counter
    pub fn decode_byte(&mut self, byte: u8) -> u8 {
        (byte ^ XOR_KEY).rotate_right(2).wrapping_sub(self.advance())
    }

    /// Decode `data` in place
    pub fn decode_in_place(&mut self, data: &mut [u8]) {
        for byte in data {
            *byte = self.decode_byte(*byte);
        }
    }

    /// Decode `data` into a new buffer
    pub fn decode(&mut self, data: &[u8]) -> Vec<u8> {
        data.iter().map(|&byte| self.decode_byte(byte)).collect()
    }

    /// Apply the inverse transform in place.
    ///
    /// Cabinets are never written by this project; the inverse exists so
    /// fixtures with known plaintext can be produced.
    pub fn encode_in_place(&mut self, data: &mut [u8]) {
        for byte in data {
            *byte = byte.wrapping_add(self.advance()).rotate_left(2) ^ XOR_KEY;
        }
    }
}
