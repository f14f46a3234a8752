//! Readers for the resource containers of 1990s isometric RPGs
//!
//! - [`bif`]: `BIFF` archives and their chunk-compressed `BIFC` variant,
//!   with random access into the compressed stream
//! - [`key`]: the `chitin.key` index mapping resource names to archives
//! - [`cursor`]: the bounds-checked little-endian reader every decoder in
//!   the workspace is built on
//!
//! # Example
//!
//! ```rust,no_run
//! use std::path::Path;
//! use relic_formats::key::{KeyIndex, ResourceType};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let root = Path::new("/games/bg");
//! let index = KeyIndex::open(root.join("chitin.key"))?;
//! if let Some(movie) = index.find("INTRO", ResourceType::Movie) {
//!     let bytes = index.load_resource(root, movie)?;
//!     println!("{} is {} bytes", movie.file_name(), bytes.len());
//! }
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

pub mod bif;
pub mod cursor;
pub mod key;

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, missing_docs)]
pub(crate) mod test_utils;

pub use bif::{Bif, BifError, BifResult, ResourceLocator, ResourceSpan};
pub use cursor::{ByteCursor, CursorError, CursorResult};
pub use key::{KeyError, KeyIndex, KeyResult, ResourceType};
