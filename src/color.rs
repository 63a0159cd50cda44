//! RGB565 colors
//!
//! Test-pattern assets and the palette below are stored in conventional
//! RGB565 order (red in the high five bits). The scanout path on this board
//! has red and blue crossed, so every pixel written into the framebuffer goes
//! through [`Color::swap_red_blue`] first.
//!
//! | Channel | Mask     |
//! |---------|----------|
//! | Red     | `0xF800` |
//! | Green   | `0x07E0` |
//! | Blue    | `0x001F` |
//!
//! ## Example
//!
//! ```
//! use ntsc_overlay::Color;
//!
//! assert_eq!(Color::RED.raw(), 0xF800);
//! assert_eq!(Color::RED.swap_red_blue(), Color::BLUE);
//! assert_eq!(Color::GREEN.swap_red_blue(), Color::GREEN);
//! ```

/// Red channel mask
pub const RED_MASK: u16 = 0xF800;
/// Green channel mask
pub const GREEN_MASK: u16 = 0x07E0;
/// Blue channel mask
pub const BLUE_MASK: u16 = 0x001F;

/// A 16-bit RGB565 color
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Color(u16);

impl Color {
    /// Fully lit red
    pub const RED: Self = Self::from_rgb(31, 0, 0);
    /// Green at half of the 6-bit range
    pub const GREEN: Self = Self::from_rgb(0, 31, 0);
    /// Fully lit blue
    pub const BLUE: Self = Self::from_rgb(0, 0, 31);
    /// Red plus blue
    pub const BRIGHT_PURPLE: Self = Self::from_rgb(31, 0, 31);
    /// All bits set
    pub const WHITE: Self = Self(0xFFFF);
    /// All bits clear
    pub const BLACK: Self = Self(0);

    /// Build a color from its raw 16-bit value
    pub const fn from_raw(raw: u16) -> Self {
        Self(raw)
    }

    /// Build a color from channel values (red 0..=31, green 0..=63, blue 0..=31)
    ///
    /// Out-of-range channel bits are masked off.
    pub const fn from_rgb(red: u8, green: u8, blue: u8) -> Self {
        Self(((red as u16 & 0x1F) << 11) | ((green as u16 & 0x3F) << 5) | (blue as u16 & 0x1F))
    }

    /// Raw 16-bit value
    pub const fn raw(self) -> u16 {
        self.0
    }

    /// Exchange the red and blue channels, keeping green in place
    ///
    /// ```
    /// use ntsc_overlay::Color;
    ///
    /// let c = Color::from_raw(0x1234);
    /// assert_eq!(c.swap_red_blue().swap_red_blue(), c);
    /// ```
    pub const fn swap_red_blue(self) -> Self {
        let raw = self.0;
        Self(((raw & BLUE_MASK) << 11) | ((raw & RED_MASK) >> 11) | (raw & GREEN_MASK))
    }
}

impl From<u16> for Color {
    fn from(raw: u16) -> Self {
        Self(raw)
    }
}

impl From<Color> for u16 {
    fn from(color: Color) -> Self {
        color.0
    }
}

#[cfg(feature = "graphics")]
impl From<embedded_graphics_core::pixelcolor::Rgb565> for Color {
    fn from(color: embedded_graphics_core::pixelcolor::Rgb565) -> Self {
        use embedded_graphics_core::pixelcolor::IntoStorage;
        Self(color.into_storage())
    }
}
