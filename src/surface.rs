//! Framebuffer drawing surface
//!
//! [`Surface`] owns the RGB565 pixel store the scanout reads from and
//! provides the raw primitives the test patterns are built from. Colors are
//! given in asset order and every store swaps red and blue into scanout
//! order (see [`Color::swap_red_blue`]).
//!
//! The backing buffer is sized once for the largest image the board
//! supports. A timing change re-anchors the surface to the new image size
//! inside the same buffer; nothing is reallocated.
//!
//! ## Example
//!
//! ```
//! use ntsc_overlay::{Color, Surface};
//!
//! let mut surface = Surface::new([0u16; 64 * 48], 64, 48, 0xD000_0000);
//! surface.fill(Color::BLACK);
//! surface.fill_rect(10, 10, 20, 20, Color::RED);
//!
//! // Stored in scanout order
//! assert_eq!(surface.pixel(15, 15), Some(Color::BLUE));
//! ```

use crate::color::Color;
use crate::error::ConfigError;

/// Concentric rectangle colors, outermost first
pub const RECT_COLORS: [Color; 5] = [
    Color::RED,
    Color::GREEN,
    Color::BLUE,
    Color::WHITE,
    Color::BLACK,
];

/// A borrowed RGB565 image in asset order
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Bitmap<'a> {
    pixels: &'a [u16],
    width: u32,
    height: u32,
}

impl<'a> Bitmap<'a> {
    /// Wrap a row-major pixel slice
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::BitmapTooSmall`] if `pixels` holds fewer than
    /// `width * height` values.
    pub fn new(pixels: &'a [u16], width: u32, height: u32) -> Result<Self, ConfigError> {
        let required = width as usize * height as usize;
        if pixels.len() < required {
            return Err(ConfigError::BitmapTooSmall {
                required,
                provided: pixels.len(),
            });
        }
        Ok(Self {
            pixels,
            width,
            height,
        })
    }

    /// Image width in pixels
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Image height in pixels
    pub fn height(&self) -> u32 {
        self.height
    }

    fn get(&self, x: u32, y: u32) -> Option<u16> {
        self.pixels
            .get(y as usize * self.width as usize + x as usize)
            .copied()
    }
}

/// RGB565 framebuffer with bounds-checked drawing
///
/// ## Type Parameters
///
/// * `B` - Backing store implementing `AsRef<[u16]> + AsMut<[u16]>`
pub struct Surface<B> {
    /// Pixel store, row-major, scanout order
    buffer: B,
    /// Active image width in pixels
    width: u32,
    /// Active image height in pixels
    height: u32,
    /// Address the scanout reads the buffer from
    base_address: u32,
}

impl<B> Surface<B>
where
    B: AsRef<[u16]> + AsMut<[u16]>,
{
    /// Create a surface over a buffer
    ///
    /// # Panics
    ///
    /// Panics if the buffer holds fewer than `width * height` pixels.
    /// Use [`try_new`](Self::try_new) for a fallible version.
    pub fn new(buffer: B, width: u32, height: u32, base_address: u32) -> Self {
        let required = width as usize * height as usize;
        assert!(
            buffer.as_ref().len() >= required,
            "framebuffer too small: required {} pixels, got {}",
            required,
            buffer.as_ref().len()
        );
        Self {
            buffer,
            width,
            height,
            base_address,
        }
    }

    /// Create a surface, returning an error if the buffer is too small
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::BufferTooSmall`] if the buffer holds fewer than
    /// `width * height` pixels.
    pub fn try_new(
        buffer: B,
        width: u32,
        height: u32,
        base_address: u32,
    ) -> Result<Self, ConfigError> {
        let required = width as usize * height as usize;
        if buffer.as_ref().len() < required {
            return Err(ConfigError::BufferTooSmall {
                required,
                provided: buffer.as_ref().len(),
            });
        }
        Ok(Self {
            buffer,
            width,
            height,
            base_address,
        })
    }

    /// Active image width
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Active image height
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Address the scanout layer points at
    pub fn base_address(&self) -> u32 {
        self.base_address
    }

    /// Number of pixels the backing buffer holds
    pub fn capacity(&self) -> usize {
        self.buffer.as_ref().len()
    }

    /// Active image pixels in scanout order
    pub fn pixels(&self) -> &[u16] {
        let len = self.width as usize * self.height as usize;
        &self.buffer.as_ref()[..len]
    }

    /// Release the backing buffer
    pub fn release(self) -> B {
        self.buffer
    }

    /// Re-point the surface at a new image size inside the same buffer
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::BufferTooSmall`] without changing anything if
    /// the buffer cannot hold the new size.
    pub fn reanchor(&mut self, width: u32, height: u32) -> Result<(), ConfigError> {
        let required = width as usize * height as usize;
        if self.capacity() < required {
            return Err(ConfigError::BufferTooSmall {
                required,
                provided: self.capacity(),
            });
        }
        self.width = width;
        self.height = height;
        Ok(())
    }

    /// Read back a stored pixel (scanout order)
    pub fn pixel(&self, x: u32, y: u32) -> Option<Color> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.buffer
            .as_ref()
            .get(self.index(x, y))
            .map(|&raw| Color::from_raw(raw))
    }

    /// Fill the whole image with one color
    pub fn fill(&mut self, color: Color) {
        let len = self.width as usize * self.height as usize;
        let raw = color.swap_red_blue().raw();
        self.buffer.as_mut()[..len].fill(raw);
    }

    /// Fill an inclusive rectangle
    ///
    /// Corners may be given in either order. Pixels outside the image are
    /// skipped.
    pub fn fill_rect(&mut self, x1: u32, y1: u32, x2: u32, y2: u32, color: Color) {
        let (x1, x2) = if x1 > x2 { (x2, x1) } else { (x1, x2) };
        let (y1, y2) = if y1 > y2 { (y2, y1) } else { (y1, y2) };
        if x1 >= self.width || y1 >= self.height {
            return;
        }
        let x2 = x2.min(self.width - 1);
        let y2 = y2.min(self.height - 1);
        let raw = color.swap_red_blue().raw();
        for y in y1..=y2 {
            let start = self.index(x1, y);
            let end = self.index(x2, y);
            self.buffer.as_mut()[start..=end].fill(raw);
        }
    }

    /// Set a single pixel; out-of-range coordinates are ignored
    pub fn draw_pixel(&mut self, x: u32, y: u32, color: Color) {
        if x >= self.width || y >= self.height {
            return;
        }
        let index = self.index(x, y);
        self.buffer.as_mut()[index] = color.swap_red_blue().raw();
    }

    /// Blit an image across the surface
    ///
    /// With `center`, an image smaller than the surface on an axis is offset
    /// by half the difference on that axis. With `tile`, the image repeats to
    /// cover the surface. With neither, the image sits at the origin and is
    /// clipped at the far edges.
    pub fn draw_bitmap(&mut self, bitmap: &Bitmap<'_>, tile: bool, center: bool) {
        if bitmap.width == 0 || bitmap.height == 0 {
            return;
        }
        let offset_x = centering_offset(self.width, bitmap.width, center);
        let offset_y = centering_offset(self.height, bitmap.height, center);

        for y in 0..self.height {
            let Some(src_y) = source_index(y, offset_y, bitmap.height, tile) else {
                continue;
            };
            for x in 0..self.width {
                let Some(src_x) = source_index(x, offset_x, bitmap.width, tile) else {
                    continue;
                };
                if let Some(raw) = bitmap.get(src_x, src_y) {
                    let index = self.index(x, y);
                    self.buffer.as_mut()[index] = Color::from_raw(raw).swap_red_blue().raw();
                }
            }
        }
    }

    /// Concentric rectangle test pattern
    ///
    /// Starts with a rectangle covering the whole image and shrinks width
    /// and height by `step` for each inner rectangle, cycling through
    /// [`RECT_COLORS`]. A `step` of 0 draws the outer rectangle only.
    pub fn draw_rects(&mut self, step: u32) {
        let center_x = self.width / 2;
        let center_y = self.height / 2;
        let mut width = self.width;
        let mut height = self.height;

        for color in RECT_COLORS.iter().cycle() {
            if width == 0 || height == 0 {
                break;
            }
            self.fill_rect(
                center_x - width / 2,
                center_y - height / 2,
                center_x + width / 2,
                center_y + height / 2,
                *color,
            );
            if step == 0 {
                break;
            }
            width = width.saturating_sub(step);
            height = height.saturating_sub(step);
        }
    }

    fn index(&self, x: u32, y: u32) -> usize {
        y as usize * self.width as usize + x as usize
    }
}

/// Offset that centers an image of `image` pixels on `screen` pixels
pub fn centering_offset(screen: u32, image: u32, center: bool) -> i64 {
    if center && image < screen {
        i64::from((screen - image) / 2)
    } else {
        0
    }
}

fn source_index(dst: u32, offset: i64, size: u32, tile: bool) -> Option<u32> {
    let size = i64::from(size);
    let mut src = i64::from(dst) - offset;
    if tile {
        src = src.rem_euclid(size);
    }
    if (0..size).contains(&src) {
        u32::try_from(src).ok()
    } else {
        None
    }
}
