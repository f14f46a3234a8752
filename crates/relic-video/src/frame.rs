//! Palette and RGB frame buffer

use crate::error::{VideoError, VideoResult};

/// Number of palette entries
pub const PALETTE_ENTRIES: usize = 256;

/// Pixel rectangle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rect {
    /// Left edge
    pub x: usize,
    /// Top edge
    pub y: usize,
    /// Width in pixels
    pub width: usize,
    /// Height in pixels
    pub height: usize,
}

impl Rect {
    /// Whether the rectangle covers no pixels
    pub const fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// 256-entry palette of 6-bit colour components
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Palette {
    entries: [[u8; 3]; PALETTE_ENTRIES],
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            entries: [[0; 3]; PALETTE_ENTRIES],
        }
    }
}

impl Palette {
    /// Overwrite entries from `first` with consecutive RGB triplets
    pub fn set(&mut self, first: usize, rgb: &[u8]) -> VideoResult<()> {
        let count = rgb.len() / 3;
        if first + count > PALETTE_ENTRIES {
            return Err(VideoError::OutOfBounds(format!(
                "palette range {first}..{}",
                first + count
            )));
        }
        for (entry, triplet) in self.entries[first..first + count]
            .iter_mut()
            .zip(rgb.chunks_exact(3))
        {
            entry.copy_from_slice(triplet);
        }
        Ok(())
    }

    /// Stored components of entry `index`
    pub const fn raw(&self, index: u8) -> [u8; 3] {
        self.entries[index as usize]
    }

    /// Entry `index` scaled to 8-bit RGB
    pub const fn rgb(&self, index: u8) -> [u8; 3] {
        let [r, g, b] = self.entries[index as usize];
        [r.wrapping_mul(4), g.wrapping_mul(4), b.wrapping_mul(4)]
    }
}

/// RGB888 frame, rows top to bottom
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    width: usize,
    height: usize,
    pixels: Vec<u8>,
}

impl Frame {
    /// Black frame of the given size
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            pixels: vec![0; width * height * 3],
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

    /// Packed RGB bytes
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Consume the frame, returning its RGB bytes
    pub fn into_pixels(self) -> Vec<u8> {
        self.pixels
    }

    /// Colour at (`x`, `y`)
    pub fn pixel(&self, x: usize, y: usize) -> Option<[u8; 3]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let at = (y * self.width + x) * 3;
        Some([self.pixels[at], self.pixels[at + 1], self.pixels[at + 2]])
    }

    /// Convert `rect` of an index surface with the frame's dimensions
    ///
    /// Pixels outside `rect` keep their previous colours.
    pub(crate) fn paint(&mut self, rect: Rect, indices: &[u8], palette: &Palette) {
        for y in rect.y..rect.y + rect.height {
            let row = y * self.width;
            for x in rect.x..rect.x + rect.width {
                let at = (row + x) * 3;
                self.pixels[at..at + 3].copy_from_slice(&palette.rgb(indices[row + x]));
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_palette_scaling() {
        let mut palette = Palette::default();
        palette.set(10, &[63, 32, 1, 5, 6, 7]).unwrap();
        assert_eq!(palette.raw(10), [63, 32, 1]);
        assert_eq!(palette.rgb(10), [252, 128, 4]);
        assert_eq!(palette.rgb(11), [20, 24, 28]);
        assert_eq!(palette.rgb(12), [0, 0, 0]);
    }

    #[test]
    fn test_palette_range_checked() {
        let mut palette = Palette::default();
        assert!(palette.set(255, &[1, 2, 3]).is_ok());
        assert!(matches!(
            palette.set(255, &[1, 2, 3, 4, 5, 6]),
            Err(VideoError::OutOfBounds(_))
        ));
    }

    #[test]
    fn test_paint_only_touches_rect() {
        let mut palette = Palette::default();
        palette.set(1, &[1, 1, 1]).unwrap();
        let mut frame = Frame::new(4, 2);
        let indices = [1u8; 8];
        frame.paint(
            Rect {
                x: 1,
                y: 1,
                width: 2,
                height: 1,
            },
            &indices,
            &palette,
        );
        assert_eq!(frame.pixel(0, 1), Some([0, 0, 0]));
        assert_eq!(frame.pixel(1, 1), Some([4, 4, 4]));
        assert_eq!(frame.pixel(2, 1), Some([4, 4, 4]));
        assert_eq!(frame.pixel(1, 0), Some([0, 0, 0]));
        assert_eq!(frame.pixel(4, 0), None);
    }
}
