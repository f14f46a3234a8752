//! Format version derivation and layout selection

use std::fmt;

/// Field layout family, fixed once per cabinet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Layout {
    /// Version 0: 32-bit fields, group folders present
    V0,
    /// Version 5: 32-bit fields, no group folders
    V5,
    /// Every later version: 64-bit file fields, fixed-size file records
    Modern,
}

impl Layout {
    /// V0 and V5 share the older record shapes
    pub const fn is_legacy(self) -> bool {
        matches!(self, Self::V0 | Self::V5)
    }

    /// Whether group descriptors carry source and destination folders
    pub const fn has_group_folders(self) -> bool {
        !matches!(self, Self::V5)
    }
}

/// How descriptor strings are encoded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StringEncoding {
    /// One byte per character, NUL terminated
    Narrow,
    /// UTF-16LE, NUL terminated
    Wide,
}

/// Version number derived from a header's version word
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatVersion {
    word: u32,
    number: u32,
}

impl FormatVersion {
    /// First version number that stores wide strings
    pub const FIRST_WIDE: u32 = 17;

    /// Derive the version number from the raw header word
    pub const fn from_word(word: u32) -> Self {
        let number = if word >> 24 == 1 {
            (word >> 12) & 0xf
        } else {
            (word & 0xffff) / 100
        };
        Self { word, number }
    }

    /// Raw header word
    pub const fn word(self) -> u32 {
        self.word
    }

    /// Derived version number
    pub const fn number(self) -> u32 {
        self.number
    }

    /// Record layout for this version
    pub const fn layout(self) -> Layout {
        match self.number {
            0 => Layout::V0,
            5 => Layout::V5,
            _ => Layout::Modern,
        }
    }

    /// String encoding for this version
    pub const fn encoding(self) -> StringEncoding {
        if self.number >= Self::FIRST_WIDE {
            StringEncoding::Wide
        } else {
            StringEncoding::Narrow
        }
    }
}

impl fmt::Display for FormatVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({:#010x})", self.number, self.word)
    }
}
