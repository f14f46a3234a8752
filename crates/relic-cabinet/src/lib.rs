//! Reader for multi-volume InstallShield-style installer cabinets
//!
//! A cabinet set is a header file (`data1.hdr`) describing components,
//! groups, directories and files, plus numbered volume files (`data1.cab`,
//! `data2.cab`, ...) holding the file contents. A file's stored bytes may
//! continue from one volume into the next, may be split into raw-deflate
//! chunks, and may be obfuscated with a rolling byte cipher. Every
//! extraction is verified against the MD5 digest stored in the header.
//!
//! # Example
//!
//! ```rust,no_run
//! use relic_cabinet::Cabinet;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let cabinet = Cabinet::open("/mnt/cdrom")?;
//! for (index, file) in cabinet.files().iter().enumerate() {
//!     println!("{index:5} {:10} {}\\{}", file.size, file.directory, file.name);
//! }
//! cabinet.extract_to_path(0, "first.bin")?;
//! # Ok(())
//! # }
//! ```
//!
//! Header records come in three layouts selected by the derived format
//! version (see [`Layout`]); descriptor strings are UTF-16LE from version 17
//! on. One [`Cabinet`] can serve concurrent extractions because every call
//! to [`Cabinet::extract`] owns its own volume stream.

#![warn(missing_docs)]

mod cabinet;
pub mod config;
pub mod error;
pub mod header;
pub mod plan;
mod stream;
pub mod version;
pub mod volume;

pub use cabinet::{Cabinet, ExtractReport};
pub use config::CabinetConfig;
pub use error::{CabinetError, CabinetResult, IntegrityFailure};
pub use header::{CabinetHeader, Component, FileDescriptor, FileFlags, Group};
pub use plan::{InstallAction, InstallStep, InstallSummary};
pub use version::{FormatVersion, Layout, StringEncoding};
pub use volume::VolumeHeader;
