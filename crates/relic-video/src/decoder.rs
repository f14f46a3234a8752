//! Command stream decoder
//!
//! A movie is a 26-byte preamble followed by chunks. Each chunk header is a
//! `u32` whose low 16 bits give the chunk length (zero ends the stream); the
//! chunk holds packets of `u16` length, `u8` opcode and `u8` parameter
//! followed by the body. [`Decoder::step`] handles one packet at a time so
//! callers can interleave other work, and [`Decoder::next_frame`] runs to
//! the next show-frame packet.

use std::time::Duration;

use relic_formats::{ByteCursor, CursorError};
use tracing::{debug, trace, warn};

use crate::blocks::{BlockRegion, Surfaces};
use crate::error::{VideoError, VideoResult};
use crate::frame::{Frame, Palette, Rect};

/// Signature at the start of every movie
pub const SIGNATURE: &[u8; 20] = b"Interplay MVE File\x1a\0";

/// Offset of the first chunk header
pub const STREAM_START: usize = 0x1a;

/// Largest surface side accepted by video initialization, in 8x8 blocks
pub const MAX_SURFACE_BLOCKS: u16 = 512;

const CHUNK_HEADER_SIZE: usize = 4;
const PACKET_HEADER_SIZE: usize = 4;

/// Top-level packet opcodes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Opcode {
    /// 0: end of stream marker, ends the chunk
    EndOfStream,
    /// 1: end of chunk
    EndOfChunk,
    /// 2: frame timing
    Timing,
    /// 3: audio buffer setup
    InitAudio,
    /// 4: start audio
    StartAudio,
    /// 5: allocate video surfaces
    InitVideo,
    /// 7: publish the current frame
    ShowFrame,
    /// 8: audio samples
    AudioData,
    /// 9: audio silence
    AudioSilence,
    /// 10: movie dimensions
    InitMovie,
    /// 12: palette entries
    SetPalette,
    /// 15: block control nibbles
    DecoderControl,
    /// 17: reconstruct a block region
    DecodeBlocks,
    /// 19 and 21: carry nothing the decoder uses
    Ignored(u8),
}

impl Opcode {
    /// Opcode for a packet header byte
    pub const fn from_byte(byte: u8) -> Option<Self> {
        Some(match byte {
            0 => Self::EndOfStream,
            1 => Self::EndOfChunk,
            2 => Self::Timing,
            3 => Self::InitAudio,
            4 => Self::StartAudio,
            5 => Self::InitVideo,
            7 => Self::ShowFrame,
            8 => Self::AudioData,
            9 => Self::AudioSilence,
            10 => Self::InitMovie,
            12 => Self::SetPalette,
            15 => Self::DecoderControl,
            17 => Self::DecodeBlocks,
            19 | 21 => Self::Ignored(byte),
            _ => return None,
        })
    }
}

/// Outcome of one [`Decoder::step`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// A packet or chunk boundary was handled
    Continue,
    /// A frame was published; show it for the given delay
    Frame(Duration),
    /// The stream is finished
    End,
}

/// Movie dimensions declared by an init-movie packet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MovieInfo {
    /// Declared width
    pub width: u16,
    /// Declared height
    pub height: u16,
}

#[derive(Debug, Default)]
struct State {
    palette: Palette,
    surfaces: Option<Surfaces>,
    frame: Option<Frame>,
    control: Vec<u8>,
    dirty: Rect,
    delay: Duration,
    movie: Option<MovieInfo>,
    frames: usize,
}

impl State {
    /// Handle one packet; returns whether a frame was published
    fn handle(
        &mut self,
        opcode: Opcode,
        code: u8,
        param: u8,
        body: &[u8],
    ) -> VideoResult<bool> {
        let mut data = ByteCursor::new(body);
        match opcode {
            Opcode::EndOfStream
            | Opcode::EndOfChunk
            | Opcode::InitAudio
            | Opcode::StartAudio
            | Opcode::AudioData
            | Opcode::AudioSilence
            | Opcode::Ignored(_) => {}
            Opcode::Timing => {
                let raw = data.read_u32()?;
                let rate = data.read_u16()?;
                if rate == 0 || rate > 1000 {
                    return Err(VideoError::InvalidTiming { rate });
                }
                let millis = raw / (1000 / u32::from(rate));
                self.delay = Duration::from_millis(u64::from(millis));
                debug!("Frame delay {:?}", self.delay);
            }
            Opcode::InitVideo => {
                let blocks_wide = data.read_u16()?;
                let blocks_high = data.read_u16()?;
                if blocks_wide > MAX_SURFACE_BLOCKS || blocks_high > MAX_SURFACE_BLOCKS {
                    return Err(VideoError::SurfaceTooLarge {
                        width: blocks_wide,
                        height: blocks_high,
                        max: MAX_SURFACE_BLOCKS,
                    });
                }
                let width = usize::from(blocks_wide) * 8;
                let height = usize::from(blocks_high) * 8;
                debug!("Video surfaces {}x{}", width, height);
                self.surfaces = Some(Surfaces::new(width, height));
                self.frame = Some(Frame::new(width, height));
                self.dirty = Rect::default();
            }
            Opcode::ShowFrame => {
                data.skip(4)?;
                if param > 0 {
                    data.skip(2)?;
                }
                let (Some(surfaces), Some(frame)) = (&self.surfaces, &mut self.frame) else {
                    return Err(VideoError::VideoNotInitialized { opcode: code });
                };
                frame.paint(self.dirty, surfaces.front(), &self.palette);
                self.frames += 1;
                return Ok(true);
            }
            Opcode::InitMovie => {
                let info = MovieInfo {
                    width: data.read_u16()?,
                    height: data.read_u16()?,
                };
                debug!("Movie {}x{}", info.width, info.height);
                self.movie = Some(info);
            }
            Opcode::SetPalette => {
                let first = usize::from(data.read_u16()?);
                let count = usize::from(data.read_u16()?);
                let rgb = data.read_bytes(count * 3)?;
                self.palette.set(first, rgb)?;
            }
            Opcode::DecoderControl => {
                self.control = body.to_vec();
            }
            Opcode::DecodeBlocks => {
                data.skip(4)?;
                let region = BlockRegion {
                    x: usize::from(data.read_u16()?),
                    y: usize::from(data.read_u16()?),
                    width: usize::from(data.read_u16()?),
                    height: usize::from(data.read_u16()?),
                };
                let flags = data.read_u16()?;
                let surfaces = self
                    .surfaces
                    .as_mut()
                    .ok_or(VideoError::VideoNotInitialized { opcode: code })?;
                if flags & 1 != 0 {
                    surfaces.swap();
                }
                trace!("Decoding blocks {:?}", region);
                surfaces.decode(region, &self.control, &mut data)?;
                self.dirty = region.to_pixels();
            }
        }
        Ok(false)
    }
}

/// Incremental movie decoder
///
/// Once a step fails the decoder is finished; later steps return
/// [`Step::End`]. The last published frame stays available through
/// [`Decoder::frame`].
#[derive(Debug)]
pub struct Decoder {
    stream: ByteCursor<Vec<u8>>,
    chunk_end: Option<usize>,
    finished: bool,
    state: State,
}

impl Decoder {
    /// Start decoding `data`, which must begin with the movie signature
    pub fn new(data: Vec<u8>) -> VideoResult<Self> {
        if !data.starts_with(SIGNATURE) {
            return Err(VideoError::InvalidSignature);
        }
        let mut stream = ByteCursor::new(data);
        stream.seek(STREAM_START)?;
        Ok(Self {
            stream,
            chunk_end: None,
            finished: false,
            state: State::default(),
        })
    }

    /// Whether the stream has ended or failed
    pub const fn is_finished(&self) -> bool {
        self.finished
    }

    /// Most recently published frame
    pub const fn frame(&self) -> Option<&Frame> {
        self.state.frame.as_ref()
    }

    /// Current palette
    pub const fn palette(&self) -> &Palette {
        &self.state.palette
    }

    /// Delay to hold each published frame
    pub const fn delay(&self) -> Duration {
        self.state.delay
    }

    /// Dimensions from the init-movie packet, if one was seen
    pub const fn movie_info(&self) -> Option<MovieInfo> {
        self.state.movie
    }

    /// Frame size in pixels once video is initialized
    pub fn frame_size(&self) -> Option<(usize, usize)> {
        self.state
            .surfaces
            .as_ref()
            .map(|s| (s.width(), s.height()))
    }

    /// Number of frames published so far
    pub const fn frames_published(&self) -> usize {
        self.state.frames
    }

    /// Handle the next packet or chunk boundary
    pub fn step(&mut self) -> VideoResult<Step> {
        if self.finished {
            return Ok(Step::End);
        }
        let result = self.advance();
        if result.is_err() || matches!(result, Ok(Step::End)) {
            self.finished = true;
        }
        result
    }

    /// Run until the next published frame
    ///
    /// Returns the frame and its display delay, or `None` at the end of the stream.
    pub fn next_frame(&mut self) -> VideoResult<Option<(&Frame, Duration)>> {
        loop {
            match self.step()? {
                Step::Continue => {}
                Step::End => return Ok(None),
                Step::Frame(delay) => {
                    return Ok(self.state.frame.as_ref().map(|frame| (frame, delay)));
                }
            }
        }
    }

    fn advance(&mut self) -> VideoResult<Step> {
        let Some(chunk_end) = self.chunk_end else {
            return self.open_chunk();
        };
        if self.stream.position() + PACKET_HEADER_SIZE > chunk_end {
            self.close_chunk(chunk_end)?;
            return Ok(Step::Continue);
        }

        let header = self.stream.position();
        let len = usize::from(self.stream.read_u16()?);
        let code = self.stream.read_u8()?;
        let param = self.stream.read_u8()?;
        let offset = self.stream.position();
        if offset + len > chunk_end {
            return Err(VideoError::PacketOverrun {
                offset,
                len,
                chunk_end,
            });
        }
        let Some(opcode) = Opcode::from_byte(code) else {
            warn!("Unknown movie opcode {:#04x} at {:#x}", code, header);
            return Err(VideoError::UnknownOpcode {
                opcode: code,
                offset: header,
            });
        };
        trace!("Packet {:?} ({} bytes) at {:#x}", opcode, len, header);

        let body = self.stream.read_bytes(len)?;
        let published = self.state.handle(opcode, code, param, body)?;

        if matches!(opcode, Opcode::EndOfStream | Opcode::EndOfChunk) {
            self.close_chunk(chunk_end)?;
        }
        Ok(if published {
            Step::Frame(self.state.delay)
        } else {
            Step::Continue
        })
    }

    fn open_chunk(&mut self) -> VideoResult<Step> {
        if self.stream.is_eof() {
            debug!("Movie stream ended without a terminating chunk");
            return Ok(Step::End);
        }
        let header = self.stream.read_u32()?;
        let len = (header & 0xffff) as usize;
        if len == 0 {
            debug!("End of movie after {} frames", self.state.frames);
            return Ok(Step::End);
        }
        let start = self.stream.position();
        if start + len > self.stream.len() {
            return Err(CursorError::UnexpectedEof {
                position: start,
                wanted: len,
                available: self.stream.remaining(),
            }
            .into());
        }
        trace!("Chunk type {} ({} bytes) at {:#x}", header >> 16, len, start - CHUNK_HEADER_SIZE);
        self.chunk_end = Some(start + len);
        Ok(Step::Continue)
    }

    fn close_chunk(&mut self, chunk_end: usize) -> VideoResult<()> {
        self.stream.seek(chunk_end)?;
        self.chunk_end = None;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use relic_test_utils::movie::{MovieBuilder, pack_control};
    use relic_test_utils::sample_bytes;

    fn solid_movie(blocks: u16, index: u8) -> MovieBuilder {
        let count = usize::from(blocks) * usize::from(blocks);
        MovieBuilder::new()
            .timing(66_000, 15)
            .init_video(blocks, blocks)
            .palette(index, &[[10, 20, 30]])
            .end_chunk()
            .control(&pack_control(usize::from(blocks), &vec![14; count]))
            .decode_blocks(0, 0, blocks, blocks, false, &vec![index; count])
            .show_frame()
            .end_chunk()
    }

    #[test]
    fn test_solid_fill_frame() {
        let mut decoder = Decoder::new(solid_movie(16, 5).finish()).unwrap();
        let (frame, delay) = decoder.next_frame().unwrap().unwrap();
        assert_eq!((frame.width(), frame.height()), (128, 128));
        assert!(frame.pixels().chunks(3).all(|p| p == [40, 80, 120]));
        // 66000 / (1000 / 15)
        assert_eq!(delay, Duration::from_millis(1000));
        assert!(decoder.next_frame().unwrap().is_none());
        assert!(decoder.is_finished());
    }

    #[test]
    fn test_unchanged_blocks_keep_frame() {
        let literal = sample_bytes(64 * 4);
        let bytes = MovieBuilder::new()
            .init_video(2, 2)
            .palette(0, &(0..=255u8).map(|i| [i & 63, i >> 2, 7]).collect::<Vec<_>>())
            .control(&pack_control(2, &[11; 4]))
            .decode_blocks(0, 0, 2, 2, false, &literal)
            .show_frame()
            .end_chunk()
            .control(&pack_control(2, &[1; 4]))
            .decode_blocks(0, 0, 2, 2, false, &[])
            .show_frame()
            .end_chunk()
            .finish();

        let mut decoder = Decoder::new(bytes).unwrap();
        let first = decoder.next_frame().unwrap().unwrap().0.clone();
        let second = decoder.next_frame().unwrap().unwrap().0.clone();
        assert_eq!(first, second);
        assert_eq!(decoder.frames_published(), 2);
    }

    #[test]
    fn test_dirty_rect_limits_conversion() {
        let bytes = MovieBuilder::new()
            .init_video(2, 1)
            .palette(1, &[[1, 1, 1]])
            .palette(2, &[[2, 2, 2]])
            .control(&pack_control(2, &[14, 14]))
            .decode_blocks(0, 0, 2, 1, false, &[1, 1])
            .show_frame()
            .control(&pack_control(1, &[14]))
            .decode_blocks(1, 0, 1, 1, false, &[2])
            .palette(1, &[[3, 3, 3]])
            .show_frame()
            .end_chunk()
            .finish();

        let mut decoder = Decoder::new(bytes).unwrap();
        decoder.next_frame().unwrap().unwrap();
        let (frame, _) = decoder.next_frame().unwrap().unwrap();
        // The left block was outside the second region and keeps its old colour
        assert_eq!(frame.pixel(0, 0), Some([4, 4, 4]));
        assert_eq!(frame.pixel(8, 0), Some([8, 8, 8]));
    }

    #[test]
    fn test_swap_flag() {
        let bytes = MovieBuilder::new()
            .init_video(1, 1)
            .palette(9, &[[9, 9, 9]])
            .control(&pack_control(1, &[14]))
            .decode_blocks(0, 0, 1, 1, false, &[9])
            .show_frame()
            // Swap, then copy the co-located block of the previous frame
            .control(&pack_control(1, &[0]))
            .decode_blocks(0, 0, 1, 1, true, &[])
            .show_frame()
            .end_chunk()
            .finish();

        let mut decoder = Decoder::new(bytes).unwrap();
        let first = decoder.next_frame().unwrap().unwrap().0.clone();
        let (second, _) = decoder.next_frame().unwrap().unwrap();
        assert_eq!(&first, second);
        assert_eq!(second.pixel(3, 3), Some([36, 36, 36]));
    }

    #[test]
    fn test_movie_info_and_ignored_packets() {
        let bytes = MovieBuilder::new()
            .packet(3, 0, &[0; 8])
            .init_movie(320, 200)
            .packet(19, 0, &[1, 2, 3])
            .end_chunk()
            .finish();
        let mut decoder = Decoder::new(bytes).unwrap();
        assert!(decoder.next_frame().unwrap().is_none());
        assert_eq!(
            decoder.movie_info(),
            Some(MovieInfo {
                width: 320,
                height: 200
            })
        );
        assert_eq!(decoder.frame_size(), None);
    }

    #[test]
    fn test_end_chunk_skips_rest_of_chunk() {
        // Packets after an end-of-chunk marker in the same chunk are never read
        let bytes = MovieBuilder::new()
            .init_video(1, 1)
            .packet(1, 0, &[])
            .packet(0x42, 0, &[])
            .end_chunk()
            .finish();
        let mut decoder = Decoder::new(bytes).unwrap();
        assert!(decoder.next_frame().unwrap().is_none());
        assert_eq!(decoder.frame_size(), Some((8, 8)));
    }

    #[test]
    fn test_unknown_opcode_stops_decoding() {
        let bytes = MovieBuilder::new()
            .packet(0x42, 0, &[])
            .end_chunk()
            .finish();
        let mut decoder = Decoder::new(bytes).unwrap();
        let err = decoder.next_frame().unwrap_err();
        assert!(matches!(err, VideoError::UnknownOpcode { opcode: 0x42, .. }));
        assert!(err.is_malformed());
        assert!(decoder.is_finished());
        assert!(decoder.next_frame().unwrap().is_none());
    }

    #[test]
    fn test_packets_before_video_init() {
        let bytes = MovieBuilder::new().show_frame().end_chunk().finish();
        let mut decoder = Decoder::new(bytes).unwrap();
        assert_eq!(
            decoder.next_frame().unwrap_err(),
            VideoError::VideoNotInitialized { opcode: 7 }
        );
    }

    #[test]
    fn test_oversized_surfaces_rejected() {
        let bytes = MovieBuilder::new()
            .init_video(0xffff, 0xffff)
            .end_chunk()
            .finish();
        let mut decoder = Decoder::new(bytes).unwrap();
        let err = decoder.next_frame().unwrap_err();
        assert_eq!(
            err,
            VideoError::SurfaceTooLarge {
                width: 0xffff,
                height: 0xffff,
                max: MAX_SURFACE_BLOCKS,
            }
        );
        assert!(err.is_malformed());
        assert!(decoder.frame_size().is_none());

        let bytes = MovieBuilder::new()
            .init_video(MAX_SURFACE_BLOCKS, 1)
            .end_chunk()
            .finish();
        let mut decoder = Decoder::new(bytes).unwrap();
        assert!(decoder.next_frame().unwrap().is_none());
        assert_eq!(
            decoder.frame_size(),
            Some((usize::from(MAX_SURFACE_BLOCKS) * 8, 8))
        );
    }

    #[test]
    fn test_invalid_timing() {
        let bytes = MovieBuilder::new().timing(1000, 0).end_chunk().finish();
        let mut decoder = Decoder::new(bytes).unwrap();
        assert_eq!(
            decoder.next_frame().unwrap_err(),
            VideoError::InvalidTiming { rate: 0 }
        );
    }

    #[test]
    fn test_truncated_stream() {
        let bytes = solid_movie(4, 1).finish();
        // Cut inside the block data of the second chunk
        let cut = bytes.len() - 30;
        let mut decoder = Decoder::new(bytes[..cut].to_vec()).unwrap();
        let err = decoder.next_frame().unwrap_err();
        assert!(matches!(err, VideoError::Truncated(_)), "unexpected error: {err}");
    }

    #[test]
    fn test_signature_checked() {
        assert_eq!(
            Decoder::new(b"RIFF0000WAVE".to_vec()).unwrap_err(),
            VideoError::InvalidSignature
        );
        assert!(!VideoError::InvalidSignature.is_malformed());
    }
}
