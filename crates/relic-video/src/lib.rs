//! Decoder and player for Interplay MVE movies
//!
//! MVE movies carry 8-bit paletted video as a command stream: each chunk
//! holds packets that set the palette, allocate the double-buffered index
//! surfaces, and rebuild the picture one 8x8 block at a time from copies,
//! motion vectors and small pattern fills.
//!
//! - [`decoder`]: the incremental command-stream decoder
//! - [`blocks`]: the 15 block reconstruction methods
//! - [`frame`]: palette and RGB frame buffer
//! - [`player`]: cooperative playback on a tokio task
//!
//! # Example
//!
//! ```rust,no_run
//! use relic_video::Decoder;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut decoder = Decoder::new(std::fs::read("intro.mve")?)?;
//! while let Some((frame, delay)) = decoder.next_frame()? {
//!     println!("{}x{} for {:?}", frame.width(), frame.height(), delay);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! Audio packets are recognised and skipped; only the picture is decoded.

#![warn(missing_docs)]

pub mod blocks;
pub mod decoder;
pub mod error;
pub mod frame;
pub mod player;

pub use blocks::{BLOCK_SIZE, BlockOp, BlockRegion, Surfaces};
pub use decoder::{Decoder, MAX_SURFACE_BLOCKS, MovieInfo, Opcode, SIGNATURE, Step};
pub use error::{VideoError, VideoResult};
pub use frame::{Frame, Palette, Rect};
pub use player::{FrameSink, PlaybackConfig, PlaybackSummary, Player};
