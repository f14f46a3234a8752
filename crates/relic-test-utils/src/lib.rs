//! Test utilities for relic
//!
//! Builders for synthetic cabinets and movie streams, plus discovery of
//! real game and installer data for the optional real-data tests.

use std::path::{Path, PathBuf};

pub mod cabinet;
pub mod movie;

/// Kinds of real data the tests can use
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataKind {
    /// An installed game: a directory holding `chitin.key`
    Game,
    /// An installer disc: a directory holding `data1.hdr`
    Installer,
}

impl DataKind {
    /// Environment variable overriding discovery
    pub fn env_var(&self) -> &'static str {
        match self {
            DataKind::Game => "RELIC_GAME_DATA",
            DataKind::Installer => "RELIC_INSTALLER_DATA",
        }
    }

    /// File whose presence marks a valid directory
    pub fn marker(&self) -> &'static str {
        match self {
            DataKind::Game => "chitin.key",
            DataKind::Installer => "data1.hdr",
        }
    }
}

/// Locate real data of the given kind
pub fn find_data(kind: DataKind) -> Option<PathBuf> {
    if let Ok(path) = std::env::var(kind.env_var()) {
        let path = PathBuf::from(shellexpand::tilde(&path).to_string());
        if is_valid_data(kind, &path) {
            return Some(path);
        }
    }

    let candidates: &[&str] = match kind {
        DataKind::Game => &["~/games/bg", "~/Games/Baldur's Gate", "/opt/bg"],
        DataKind::Installer => &["/media/cdrom", "/mnt/cdrom", "~/games/bg-cd"],
    };
    candidates
        .iter()
        .map(|c| PathBuf::from(shellexpand::tilde(c).to_string()))
        .find(|path| is_valid_data(kind, path))
}

/// Check that `path` is a directory containing the kind's marker file
pub fn is_valid_data(kind: DataKind, path: &Path) -> bool {
    path.is_dir() && path.join(kind.marker()).is_file()
}

/// Print how to point the tests at real data
pub fn print_setup_instructions() {
    println!("Real data setup:");
    for kind in [DataKind::Game, DataKind::Installer] {
        println!(
            "  export {}=/path/to/dir   (must contain {})",
            kind.env_var(),
            kind.marker()
        );
    }
}

/// Deterministic, poorly compressible bytes
pub fn sample_bytes(len: usize) -> Vec<u8> {
    let mut state = 0x1234_5678u32;
    (0..len)
        .map(|_| {
            state = state.wrapping_mul(1_103_515_245).wrapping_add(12_345);
            (state >> 16) as u8
        })
        .collect()
}

/// Get a real data path or skip the test
#[macro_export]
macro_rules! require_data {
    ($kind:expr) => {
        match $crate::find_data($kind) {
            Some(path) => path,
            None => {
                println!("Skipping test - no {:?} data found", $kind);
                $crate::print_setup_instructions();
                return;
            }
        }
    };
}
