//! 8x8 block reconstruction
//!
//! A decode-blocks packet walks a region of the frame block by block. Each
//! block's operation comes from a 4-bit control nibble (two blocks per
//! control byte, low nibble first, a fresh byte at the start of every row)
//! and its parameters from the packet body.
//!
//! The colour-fill operations pick a sub-block partitioning by comparing
//! pairs of colour bytes. The comparisons, including which ones are strict,
//! decide how many parameter bytes the block consumes, so they must stay
//! exactly as they are.

use relic_formats::ByteCursor;

use crate::error::{VideoError, VideoResult};
use crate::frame::Rect;

/// Block edge in pixels
pub const BLOCK_SIZE: usize = 8;

/// Reconstruction operation selected by a control nibble
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockOp {
    /// 0: copy the co-located block of the back surface
    CopyBack,
    /// 1: leave the block unchanged
    Skip,
    /// 2: copy from later in the current surface
    CopyAhead,
    /// 3: copy from earlier in the current surface
    CopyBehind,
    /// 4: copy from the back surface, offset by a nibble pair
    ShiftNibbles,
    /// 5: copy from the back surface, offset by two signed bytes
    ShiftBytes,
    /// 7: two colours, bit per pixel or per 2x2 cell
    TwoColor,
    /// 8: two colours per quadrant or half
    QuadrantTwoColor,
    /// 9: four colours, two bits per pixel or per cell
    FourColor,
    /// 10: four colours per quadrant or half
    QuadrantFourColor,
    /// 11: 64 literal pixels
    Literal,
    /// 12: sixteen 2x2 cells
    Fill2x2,
    /// 13: two colours per 4-row half
    Fill4x4,
    /// 14: one colour
    Solid,
    /// 15: two-colour checkerboard
    Checkerboard,
}

impl BlockOp {
    /// Operation for a control nibble; 6 and values above 15 have none
    pub const fn from_nibble(nibble: u8) -> Option<Self> {
        Some(match nibble {
            0 => Self::CopyBack,
            1 => Self::Skip,
            2 => Self::CopyAhead,
            3 => Self::CopyBehind,
            4 => Self::ShiftNibbles,
            5 => Self::ShiftBytes,
            7 => Self::TwoColor,
            8 => Self::QuadrantTwoColor,
            9 => Self::FourColor,
            10 => Self::QuadrantFourColor,
            11 => Self::Literal,
            12 => Self::Fill2x2,
            13 => Self::Fill4x4,
            14 => Self::Solid,
            15 => Self::Checkerboard,
            _ => return None,
        })
    }
}

/// Region in block units
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BlockRegion {
    /// Left block column
    pub x: usize,
    /// Top block row
    pub y: usize,
    /// Width in blocks
    pub width: usize,
    /// Height in blocks
    pub height: usize,
}

impl BlockRegion {
    /// The same region in pixels
    pub const fn to_pixels(self) -> Rect {
        Rect {
            x: self.x * BLOCK_SIZE,
            y: self.y * BLOCK_SIZE,
            width: self.width * BLOCK_SIZE,
            height: self.height * BLOCK_SIZE,
        }
    }
}

/// Offset table shared by operations 2 and 3
fn near_offset(value: u8) -> (isize, isize) {
    let value = isize::from(value);
    if value >= 56 {
        let value = value - 56;
        (value % 29 - 14, value / 29 + 8)
    } else {
        (value % 7 + 8, value / 7)
    }
}

/// Front and back palette-index surfaces
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Surfaces {
    width: usize,
    height: usize,
    front: Vec<u8>,
    back: Vec<u8>,
}

impl Surfaces {
    /// Zeroed surfaces of `width` x `height` pixels
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            front: vec![0; width * height],
            back: vec![0; width * height],
        }
    }

    /// Width in pixels
    pub const fn width(&self) -> usize {
        self.width
    }

    /// Height in pixels
    pub const fn height(&self) -> usize {
        self.height
    }

    /// Surface being decoded into
    pub fn front(&self) -> &[u8] {
        &self.front
    }

    /// Previous frame's surface
    pub fn back(&self) -> &[u8] {
        &self.back
    }

    /// Exchange front and back
    pub fn swap(&mut self) {
        std::mem::swap(&mut self.front, &mut self.back);
    }

    /// Reconstruct every block of `region` into the front surface
    ///
    /// `control` holds the operation nibbles and `data` the per-block
    /// parameters, consumed in block order.
    pub fn decode(
        &mut self,
        region: BlockRegion,
        control: &[u8],
        data: &mut ByteCursor<&[u8]>,
    ) -> VideoResult<()> {
        let columns = self.width / BLOCK_SIZE;
        let rows = self.height / BLOCK_SIZE;
        if region.x + region.width > columns || region.y + region.height > rows {
            return Err(VideoError::OutOfBounds(format!(
                "block region {region:?} of a {columns}x{rows} block frame"
            )));
        }

        let mut control = ByteCursor::new(control);
        let mut key = 0u8;
        for by in region.y..region.y + region.height {
            for (column, bx) in (region.x..region.x + region.width).enumerate() {
                if column & 1 == 0 {
                    key = control.read_u8()?;
                } else {
                    key >>= 4;
                }
                let nibble = key & 0xf;
                let op = BlockOp::from_nibble(nibble).ok_or(VideoError::InvalidBlockOpcode {
                    opcode: nibble,
                    x: bx,
                    y: by,
                })?;
                let mut block = Block {
                    front: &mut self.front,
                    back: &self.back,
                    stride: self.width,
                    origin: by * BLOCK_SIZE * self.width + bx * BLOCK_SIZE,
                };
                block.apply(op, data)?;
            }
        }
        Ok(())
    }
}

/// One block being reconstructed
struct Block<'a> {
    front: &'a mut [u8],
    back: &'a [u8],
    stride: usize,
    origin: usize,
}

impl Block<'_> {
    fn set(&mut self, x: usize, y: usize, value: u8) {
        self.front[self.origin + y * self.stride + x] = value;
    }

    /// Start of the 8x8 source displaced by (`dx`, `dy`), checked against the surface
    fn source(&self, dx: isize, dy: isize) -> VideoResult<usize> {
        let stride = self.stride as isize;
        let start = self.origin as isize + dy * stride + dx;
        let end = start + 7 * stride + BLOCK_SIZE as isize;
        if start < 0 || end > self.front.len() as isize {
            return Err(VideoError::OutOfBounds(format!(
                "motion vector ({dx}, {dy}) from offset {}",
                self.origin
            )));
        }
        Ok(start as usize)
    }

    fn copy_from_back(&mut self, dx: isize, dy: isize) -> VideoResult<()> {
        let source = self.source(dx, dy)?;
        for row in 0..BLOCK_SIZE {
            let to = self.origin + row * self.stride;
            let from = source + row * self.stride;
            self.front[to..to + BLOCK_SIZE].copy_from_slice(&self.back[from..from + BLOCK_SIZE]);
        }
        Ok(())
    }

    fn copy_within(&mut self, dx: isize, dy: isize) -> VideoResult<()> {
        let source = self.source(dx, dy)?;
        for row in 0..BLOCK_SIZE {
            let from = source + row * self.stride;
            self.front
                .copy_within(from..from + BLOCK_SIZE, self.origin + row * self.stride);
        }
        Ok(())
    }

    fn apply(&mut self, op: BlockOp, data: &mut ByteCursor<&[u8]>) -> VideoResult<()> {
        match op {
            BlockOp::CopyBack => self.copy_from_back(0, 0)?,
            BlockOp::Skip => {}
            BlockOp::CopyAhead => {
                let (dx, dy) = near_offset(data.read_u8()?);
                self.copy_within(dx, dy)?;
            }
            BlockOp::CopyBehind => {
                let (dx, dy) = near_offset(data.read_u8()?);
                self.copy_within(-dx, -dy)?;
            }
            BlockOp::ShiftNibbles => {
                let value = data.read_u8()?;
                let dx = isize::from(value & 0xf) - 8;
                let dy = isize::from(value >> 4) - 8;
                self.copy_from_back(dx, dy)?;
            }
            BlockOp::ShiftBytes => {
                let dx = isize::from(data.read_i8()?);
                let dy = isize::from(data.read_i8()?);
                self.copy_from_back(dx, dy)?;
            }
            BlockOp::TwoColor => self.two_color(data)?,
            BlockOp::QuadrantTwoColor => self.quadrant_two_color(data)?,
            BlockOp::FourColor => self.four_color(data)?,
            BlockOp::QuadrantFourColor => self.quadrant_four_color(data)?,
            BlockOp::Literal => {
                let pixels = data.read_bytes(BLOCK_SIZE * BLOCK_SIZE)?;
                for (row, line) in pixels.chunks_exact(BLOCK_SIZE).enumerate() {
                    let to = self.origin + row * self.stride;
                    self.front[to..to + BLOCK_SIZE].copy_from_slice(line);
                }
            }
            BlockOp::Fill2x2 => {
                for pair in 0..4 {
                    let colors: [u8; 4] = data.read_array()?;
                    for y in pair * 2..pair * 2 + 2 {
                        for (x, &color) in colors.iter().enumerate() {
                            self.set(x * 2, y, color);
                            self.set(x * 2 + 1, y, color);
                        }
                    }
                }
            }
            BlockOp::Fill4x4 => {
                for half in 0..2 {
                    let lo = data.read_u8()?;
                    let hi = data.read_u8()?;
                    for y in half * 4..half * 4 + 4 {
                        for x in 0..4 {
                            self.set(x, y, lo);
                            self.set(x + 4, y, hi);
                        }
                    }
                }
            }
            BlockOp::Solid => {
                let color = data.read_u8()?;
                for y in 0..BLOCK_SIZE {
                    for x in 0..BLOCK_SIZE {
                        self.set(x, y, color);
                    }
                }
            }
            BlockOp::Checkerboard => {
                let colors: [u8; 2] = data.read_array()?;
                for y in 0..BLOCK_SIZE {
                    for x in 0..BLOCK_SIZE {
                        self.set(x, y, colors[(x + y) & 1]);
                    }
                }
            }
        }
        Ok(())
    }

    /// Op 7: `lo <= hi` selects one bit per pixel, otherwise one bit per 2x2 cell
    fn two_color(&mut self, data: &mut ByteCursor<&[u8]>) -> VideoResult<()> {
        let lo = data.read_u8()?;
        let hi = data.read_u8()?;
        let pick = |bits: u8| if bits & 1 == 0 { lo } else { hi };

        if lo <= hi {
            for y in 0..BLOCK_SIZE {
                let mut bits = data.read_u8()?;
                for x in 0..BLOCK_SIZE {
                    self.set(x, y, pick(bits));
                    bits >>= 1;
                }
            }
        } else {
            let mut bits = 0u8;
            for cy in 0..4 {
                if cy & 1 == 0 {
                    bits = data.read_u8()?;
                }
                for cx in 0..4 {
                    let color = pick(bits);
                    for (x, y) in [(0, 0), (1, 0), (0, 1), (1, 1)] {
                        self.set(cx * 2 + x, cy * 2 + y, color);
                    }
                    bits >>= 1;
                }
            }
        }
        Ok(())
    }

    /// Op 8: two colours for each 4x4 quadrant, each 4x8 half, or each 8x4 half
    fn quadrant_two_color(&mut self, data: &mut ByteCursor<&[u8]>) -> VideoResult<()> {
        let head: [u8; 12] = data.read_array()?;
        let pick = |bits: u8, lo: u8, hi: u8| if bits & 1 == 0 { lo } else { hi };

        if head[0] <= head[1] {
            // Quadrants: left pair in bytes 0..8, right pair in 8..16
            let tail: [u8; 4] = data.read_array()?;
            let mut s = [0u8; 16];
            s[..12].copy_from_slice(&head);
            s[12..].copy_from_slice(&tail);
            for i in 0..2 {
                let (lo, hi) = (s[i * 4], s[i * 4 + 1]);
                let (lo2, hi2) = (s[i * 4 + 8], s[i * 4 + 9]);
                let (mut key, mut key2) = (0u8, 0u8);
                for y in 0..4 {
                    if y & 1 == 0 {
                        key = s[i * 4 + y / 2 + 2];
                        key2 = s[i * 4 + y / 2 + 10];
                    }
                    for x in 0..4 {
                        self.set(x, i * 4 + y, pick(key, lo, hi));
                        self.set(x + 4, i * 4 + y, pick(key2, lo2, hi2));
                        key >>= 1;
                        key2 >>= 1;
                    }
                }
            }
        } else if head[6] <= head[7] {
            // Left and right halves
            let (lo, hi, lo2, hi2) = (head[0], head[1], head[6], head[7]);
            let (mut key, mut key2) = (0u8, 0u8);
            for y in 0..BLOCK_SIZE {
                if y & 1 == 0 {
                    key = head[y / 2 + 2];
                    key2 = head[y / 2 + 8];
                }
                for x in 0..4 {
                    self.set(x, y, pick(key, lo, hi));
                    self.set(x + 4, y, pick(key2, lo2, hi2));
                    key >>= 1;
                    key2 >>= 1;
                }
            }
        } else {
            // Top and bottom halves
            for i in 0..2 {
                let (lo, hi) = (head[i * 6], head[i * 6 + 1]);
                for y in 0..4 {
                    let mut key = head[i * 6 + y / 2 + 2];
                    for x in 0..BLOCK_SIZE {
                        self.set(x, i * 4 + y, pick(key, lo, hi));
                        key >>= 1;
                    }
                }
            }
        }
        Ok(())
    }

    /// Op 9: four colours at one of four pixel granularities
    fn four_color(&mut self, data: &mut ByteCursor<&[u8]>) -> VideoResult<()> {
        let colors: [u8; 4] = data.read_array()?;
        let pick = |bits: u16| colors[usize::from(bits & 3)];

        match (colors[0] <= colors[1], colors[2] <= colors[3]) {
            (true, true) => {
                for y in 0..BLOCK_SIZE {
                    let mut bits = data.read_u16()?;
                    for x in 0..BLOCK_SIZE {
                        self.set(x, y, pick(bits));
                        bits >>= 2;
                    }
                }
            }
            (true, false) => {
                for cy in 0..4 {
                    let mut bits = u16::from(data.read_u8()?);
                    for cx in 0..4 {
                        let color = pick(bits);
                        for (x, y) in [(0, 0), (1, 0), (0, 1), (1, 1)] {
                            self.set(cx * 2 + x, cy * 2 + y, color);
                        }
                        bits >>= 2;
                    }
                }
            }
            (false, true) => {
                for y in 0..BLOCK_SIZE {
                    let mut bits = u16::from(data.read_u8()?);
                    for cx in 0..4 {
                        let color = pick(bits);
                        self.set(cx * 2, y, color);
                        self.set(cx * 2 + 1, y, color);
                        bits >>= 2;
                    }
                }
            }
            (false, false) => {
                for cy in 0..4 {
                    let mut bits = data.read_u16()?;
                    for x in 0..BLOCK_SIZE {
                        let color = pick(bits);
                        self.set(x, cy * 2, color);
                        self.set(x, cy * 2 + 1, color);
                        bits >>= 2;
                    }
                }
            }
        }
        Ok(())
    }

    /// Op 10: four colours for each quadrant, each 4x8 half, or each 8x4 half
    fn quadrant_four_color(&mut self, data: &mut ByteCursor<&[u8]>) -> VideoResult<()> {
        let head: [u8; 24] = data.read_array()?;

        if head[0] <= head[1] {
            let tail: [u8; 8] = data.read_array()?;
            let mut s = [0u8; 32];
            s[..24].copy_from_slice(&head);
            s[24..].copy_from_slice(&tail);
            for i in 0..2 {
                let colors = &s[i * 8..i * 8 + 4];
                let colors2 = &s[i * 8 + 16..i * 8 + 20];
                for y in 0..4 {
                    let mut key = s[i * 8 + y + 4];
                    let mut key2 = s[i * 8 + y + 20];
                    for x in 0..4 {
                        self.set(x, i * 4 + y, colors[usize::from(key & 3)]);
                        self.set(x + 4, i * 4 + y, colors2[usize::from(key2 & 3)]);
                        key >>= 2;
                        key2 >>= 2;
                    }
                }
            }
        } else if head[12] < head[13] {
            let colors = &head[0..4];
            let colors2 = &head[12..16];
            for y in 0..BLOCK_SIZE {
                let mut key = head[y + 4];
                let mut key2 = head[y + 16];
                for x in 0..4 {
                    self.set(x, y, colors[usize::from(key & 3)]);
                    self.set(x + 4, y, colors2[usize::from(key2 & 3)]);
                    key >>= 2;
                    key2 >>= 2;
                }
            }
        } else {
            for i in 0..2 {
                let colors = &head[i * 12..i * 12 + 4];
                for step in 0..BLOCK_SIZE {
                    let mut key = head[i * 12 + step + 4];
                    for x in 0..4 {
                        self.set(x + (step & 1) * 4, i * 4 + step / 2, colors[usize::from(key & 3)]);
                        key >>= 2;
                    }
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const ONE: BlockRegion = BlockRegion {
        x: 0,
        y: 0,
        width: 1,
        height: 1,
    };

    /// Decode one block at the top-left of a 2x2 block surface
    fn decode_one(op: u8, data: &[u8]) -> VideoResult<(Surfaces, usize)> {
        let mut surfaces = Surfaces::new(16, 16);
        let mut cursor = ByteCursor::new(data);
        surfaces.decode(ONE, &[op], &mut cursor)?;
        Ok((surfaces, cursor.position()))
    }

    /// Top-left 8x8 block of the front surface as rows
    fn block(surfaces: &Surfaces) -> Vec<Vec<u8>> {
        surfaces
            .front()
            .chunks(16)
            .take(8)
            .map(|row| row[..8].to_vec())
            .collect()
    }

    fn uniform_rows(left: u8, right: u8) -> Vec<u8> {
        [left; 4].into_iter().chain([right; 4]).collect()
    }

    #[test]
    fn test_nibble_table() {
        assert_eq!(BlockOp::from_nibble(0), Some(BlockOp::CopyBack));
        assert_eq!(BlockOp::from_nibble(6), None);
        assert_eq!(BlockOp::from_nibble(15), Some(BlockOp::Checkerboard));
        assert_eq!(BlockOp::from_nibble(16), None);
    }

    #[test]
    fn test_near_offsets() {
        assert_eq!(near_offset(0), (8, 0));
        assert_eq!(near_offset(55), (14, 7));
        assert_eq!(near_offset(56), (-14, 8));
        assert_eq!(near_offset(56 + 29 + 3), (-11, 9));
    }

    #[test]
    fn test_solid_and_checkerboard() {
        let (surfaces, used) = decode_one(14, &[7]).unwrap();
        assert_eq!(used, 1);
        assert!(block(&surfaces).iter().flatten().all(|&p| p == 7));

        let (surfaces, used) = decode_one(15, &[1, 2]).unwrap();
        assert_eq!(used, 2);
        let rows = block(&surfaces);
        assert_eq!(rows[0], vec![1, 2, 1, 2, 1, 2, 1, 2]);
        assert_eq!(rows[1], vec![2, 1, 2, 1, 2, 1, 2, 1]);
    }

    #[test]
    fn test_literal() {
        let pixels: Vec<u8> = (0..64).collect();
        let (surfaces, used) = decode_one(11, &pixels).unwrap();
        assert_eq!(used, 64);
        let rows = block(&surfaces);
        assert_eq!(rows[3], (24..32).collect::<Vec<u8>>());
    }

    #[test]
    fn test_fills() {
        let data: Vec<u8> = (1..=16).collect();
        let (surfaces, used) = decode_one(12, &data).unwrap();
        assert_eq!(used, 16);
        let rows = block(&surfaces);
        assert_eq!(rows[0], vec![1, 1, 2, 2, 3, 3, 4, 4]);
        assert_eq!(rows[1], rows[0]);
        assert_eq!(rows[7], vec![13, 13, 14, 14, 15, 15, 16, 16]);

        let (surfaces, used) = decode_one(13, &[1, 2, 3, 4]).unwrap();
        assert_eq!(used, 4);
        let rows = block(&surfaces);
        assert_eq!(rows[0], uniform_rows(1, 2));
        assert_eq!(rows[3], uniform_rows(1, 2));
        assert_eq!(rows[4], uniform_rows(3, 4));
    }

    #[test]
    fn test_two_color_branches() {
        // lo <= hi: one bit per pixel
        let mut data = vec![3, 9];
        data.extend([0b0000_0001, 0b1000_0000, 0, 0, 0, 0, 0, 0xff]);
        let (surfaces, used) = decode_one(7, &data).unwrap();
        assert_eq!(used, 10);
        let rows = block(&surfaces);
        assert_eq!(rows[0], vec![9, 3, 3, 3, 3, 3, 3, 3]);
        assert_eq!(rows[1], vec![3, 3, 3, 3, 3, 3, 3, 9]);
        assert_eq!(rows[7], vec![9; 8]);

        // lo > hi: one bit per 2x2 cell, one byte per two cell rows
        let (surfaces, used) = decode_one(7, &[9, 3, 0b0001_0001, 0b1000_0000]).unwrap();
        assert_eq!(used, 4);
        let rows = block(&surfaces);
        assert_eq!(rows[0], vec![3, 3, 9, 9, 9, 9, 9, 9]);
        assert_eq!(rows[1], rows[0]);
        assert_eq!(rows[2], rows[0]);
        assert_eq!(rows[6], vec![9, 9, 9, 9, 9, 9, 3, 3]);
    }

    #[test]
    fn test_quadrant_two_color_branches() {
        // Quadrants: 16 bytes, all bits clear paints each quadrant's low colour
        let data = [1, 2, 0, 0, 3, 4, 0, 0, 5, 6, 0, 0, 7, 8, 0, 0];
        let (surfaces, used) = decode_one(8, &data).unwrap();
        assert_eq!(used, 16);
        let rows = block(&surfaces);
        assert_eq!(rows[0], uniform_rows(1, 5));
        assert_eq!(rows[4], uniform_rows(3, 7));

        // Left/right halves: 12 bytes
        let data = [2, 1, 0xff, 0xff, 0xff, 0xff, 5, 6, 0, 0, 0, 0, 0xee];
        let (surfaces, used) = decode_one(8, &data).unwrap();
        assert_eq!(used, 12);
        let rows = block(&surfaces);
        assert_eq!(rows[0], uniform_rows(1, 5));
        assert_eq!(rows[7], uniform_rows(1, 5));

        // Top/bottom halves: 12 bytes, second colour pair at byte 6
        let data = [2, 1, 0, 0, 0, 0, 6, 5, 0xff, 0xff, 0xff, 0xff];
        let (surfaces, used) = decode_one(8, &data).unwrap();
        assert_eq!(used, 12);
        let rows = block(&surfaces);
        assert_eq!(rows[0], vec![2; 8]);
        assert_eq!(rows[4], vec![5; 8]);
    }

    #[test]
    fn test_four_color_branches() {
        // Per pixel: 4 + 16 bytes
        let mut data = vec![0, 1, 2, 3];
        data.extend([0b1110_0100, 0b1110_0100]);
        data.extend([0; 14]);
        let (surfaces, used) = decode_one(9, &data).unwrap();
        assert_eq!(used, 20);
        assert_eq!(block(&surfaces)[0], vec![0, 1, 2, 3, 0, 1, 2, 3]);

        // 2x2 cells: 4 + 4 bytes
        let (surfaces, used) = decode_one(9, &[0, 1, 3, 2, 0b1110_0100, 0, 0, 0]).unwrap();
        assert_eq!(used, 8);
        let rows = block(&surfaces);
        assert_eq!(rows[0], vec![0, 0, 1, 1, 3, 3, 2, 2]);
        assert_eq!(rows[1], rows[0]);
        assert_eq!(rows[2], vec![0; 8]);

        // 2x1 cells: 4 + 8 bytes
        let (surfaces, used) =
            decode_one(9, &[1, 0, 2, 3, 0b1110_0100, 0, 0, 0, 0, 0, 0, 0]).unwrap();
        assert_eq!(used, 12);
        let rows = block(&surfaces);
        assert_eq!(rows[0], vec![1, 1, 0, 0, 2, 2, 3, 3]);
        assert_eq!(rows[1], vec![1; 8]);

        // 1x2 cells: 4 + 8 bytes
        let (surfaces, used) =
            decode_one(9, &[1, 0, 3, 2, 0b1110_0100, 0b1110_0100, 0, 0, 0, 0, 0, 0]).unwrap();
        assert_eq!(used, 12);
        let rows = block(&surfaces);
        assert_eq!(rows[0], vec![1, 0, 3, 2, 1, 0, 3, 2]);
        assert_eq!(rows[1], rows[0]);
        assert_eq!(rows[2], vec![1; 8]);
    }

    #[test]
    fn test_quadrant_four_color_branches() {
        // Quadrants: 32 bytes
        let mut data = vec![0u8; 32];
        for (i, base) in [(0, 10), (8, 20), (16, 30), (24, 40)] {
            data[i..i + 4].copy_from_slice(&[base, base + 1, base + 2, base + 3]);
        }
        let (surfaces, used) = decode_one(10, &data).unwrap();
        assert_eq!(used, 32);
        let rows = block(&surfaces);
        assert_eq!(rows[0], uniform_rows(10, 30));
        assert_eq!(rows[4], uniform_rows(20, 40));

        // Left/right halves: 24 bytes
        let mut data = vec![0u8; 24];
        data[0..4].copy_from_slice(&[5, 4, 6, 7]);
        data[12..16].copy_from_slice(&[1, 2, 3, 4]);
        data[11] = 0xff;
        let (surfaces, used) = decode_one(10, &data).unwrap();
        assert_eq!(used, 24);
        let rows = block(&surfaces);
        assert_eq!(rows[0], uniform_rows(5, 1));
        assert_eq!(rows[7], uniform_rows(7, 1));

        // Top/bottom halves: 24 bytes; equal bytes 12 and 13 fail the strict test
        let mut data = vec![0u8; 24];
        data[0..4].copy_from_slice(&[5, 4, 6, 7]);
        data[12..16].copy_from_slice(&[9, 9, 8, 8]);
        data[5] = 0b0101_0101;
        let (surfaces, used) = decode_one(10, &data).unwrap();
        assert_eq!(used, 24);
        let rows = block(&surfaces);
        assert_eq!(rows[0], vec![5, 5, 5, 5, 4, 4, 4, 4]);
        assert_eq!(rows[4], vec![9; 8]);
    }

    #[test]
    fn test_motion_from_back() {
        let mut surfaces = Surfaces::new(16, 16);
        let mut cursor = ByteCursor::new(&[14u8, 5][..]);
        // Paint the right block, then move it into the back surface
        let right = BlockRegion { x: 1, ..ONE };
        surfaces.decode(right, &[14], &mut cursor).unwrap();
        surfaces.swap();

        // Copy it back into the left block with a +8 horizontal vector
        let mut cursor = ByteCursor::new(&[8u8, 0][..]);
        surfaces.decode(ONE, &[5], &mut cursor).unwrap();
        assert!(block(&surfaces).iter().flatten().all(|&p| p == 14));

        // Nibble form: (0x8 - 8, 0x8 - 8) is the co-located block, which is empty
        let mut cursor = ByteCursor::new(&[0x88u8][..]);
        surfaces.decode(ONE, &[4], &mut cursor).unwrap();
        assert!(block(&surfaces).iter().flatten().all(|&p| p == 0));
    }

    #[test]
    fn test_copy_back_and_skip() {
        let mut surfaces = Surfaces::new(16, 16);
        let mut cursor = ByteCursor::new(&[3u8][..]);
        surfaces.decode(ONE, &[14], &mut cursor).unwrap();
        let before = surfaces.front().to_vec();

        let mut cursor = ByteCursor::new(&[][..]);
        surfaces.decode(ONE, &[1], &mut cursor).unwrap();
        assert_eq!(surfaces.front(), &before[..]);

        surfaces.swap();
        surfaces.decode(ONE, &[0], &mut cursor).unwrap();
        assert_eq!(surfaces.front(), &before[..]);
    }

    #[test]
    fn test_intra_copies() {
        let mut surfaces = Surfaces::new(16, 16);
        let region = BlockRegion {
            x: 0,
            y: 0,
            width: 2,
            height: 1,
        };
        // Right block solid 4, then left block copies from 8 pixels ahead
        let mut cursor = ByteCursor::new(&[4u8][..]);
        surfaces
            .decode(BlockRegion { x: 1, ..ONE }, &[14], &mut cursor)
            .unwrap();
        let mut cursor = ByteCursor::new(&[0u8][..]);
        surfaces.decode(ONE, &[2], &mut cursor).unwrap();
        assert!(block(&surfaces).iter().flatten().all(|&p| p == 4));

        // Left solid 6, right copies from 8 pixels behind
        let mut cursor = ByteCursor::new(&[6u8, 0][..]);
        surfaces.decode(region, &[0x3e], &mut cursor).unwrap();
        assert!(surfaces.front()[..128].chunks(16).all(|row| row == [6; 16]));
    }

    #[test]
    fn test_invalid_opcode() {
        let err = decode_one(6, &[]).unwrap_err();
        assert_eq!(
            err,
            VideoError::InvalidBlockOpcode {
                opcode: 6,
                x: 0,
                y: 0
            }
        );
    }

    #[test]
    fn test_motion_out_of_bounds() {
        // (-8, -8) from the top-left block leaves the surface
        let err = decode_one(4, &[0x00]).unwrap_err();
        assert!(matches!(err, VideoError::OutOfBounds(_)));
        let err = decode_one(3, &[0]).unwrap_err();
        assert!(matches!(err, VideoError::OutOfBounds(_)));
    }

    #[test]
    fn test_truncated_parameters() {
        assert!(matches!(
            decode_one(11, &[0; 63]),
            Err(VideoError::Truncated(_))
        ));
        assert!(matches!(
            decode_one(10, &[1, 2, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0]),
            Err(VideoError::Truncated(_))
        ));
    }

    #[test]
    fn test_region_and_control_checked() {
        let mut surfaces = Surfaces::new(16, 16);
        let mut cursor = ByteCursor::new(&[][..]);
        let region = BlockRegion {
            x: 1,
            y: 0,
            width: 2,
            height: 1,
        };
        assert!(matches!(
            surfaces.decode(region, &[0x11], &mut cursor),
            Err(VideoError::OutOfBounds(_))
        ));

        let region = BlockRegion {
            x: 0,
            y: 0,
            width: 2,
            height: 2,
        };
        // Two rows need two control bytes
        assert!(matches!(
            surfaces.decode(region, &[0x11], &mut cursor),
            Err(VideoError::Truncated(_))
        ));
    }
}
