//! Digest and obfuscation primitives for the relic decoders
//!
//! This crate provides the two small primitives the installer cabinet reader
//! depends on:
//!
//! - **Hashing**: MD5 content digests, computed in one shot or streamed while
//!   a file is being extracted
//! - **Obfuscation**: the byte-level rolling cipher applied to cabinet payloads
//!   whose file flags request it
//!
//! # Examples
//!
//! ## Content Digest
//!
//! ```
//! use relic_crypto::ContentDigest;
//!
//! let digest = ContentDigest::from_data(b"Hello, World!");
//! assert_eq!(digest.to_hex(), "65a8e27d8879283831b664bd8b7f0ad4");
//! ```
//!
//! ## Streaming Digest
//!
//! ```
//! use relic_crypto::{ContentDigest, DigestWriter};
//! use std::io::Write;
//!
//! let mut writer = DigestWriter::new(Vec::new());
//! writer.write_all(b"Hello, ").expect("Vec writes cannot fail");
//! writer.write_all(b"World!").expect("Vec writes cannot fail");
//! let (bytes, digest) = writer.finish();
//! assert_eq!(bytes, b"Hello, World!");
//! assert_eq!(digest, ContentDigest::from_data(b"Hello, World!"));
//! ```

#![warn(missing_docs)]

pub mod md5;
pub mod obfuscation;

pub use md5::{ContentDigest, DigestWriter};
pub use obfuscation::CabinetCipher;
