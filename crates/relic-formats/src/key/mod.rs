//! KEY resource index (`chitin.key`)
//!
//! The index lists every archive of a game installation and every resource
//! inside them. Each resource carries a packed [`ResourceLocator`] naming
//! its archive, tileset and file index.
//!
//! [`ResourceLocator`]: crate::bif::ResourceLocator

mod error;
mod index;
mod resource_type;

pub use error::{KeyError, KeyResult};
pub use index::{ArchiveRef, KeyIndex, ResourceEntry};
pub use resource_type::ResourceType;

/// Signature at the start of a KEY file
pub const KEY_SIGNATURE: &[u8; 4] = b"KEY ";

/// The only supported KEY version tag
pub const KEY_VERSION: &[u8; 4] = b"V1  ";
