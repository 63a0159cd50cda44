//! ADV7393 video encoder driver
//!
//! The encoder generates its NTSC colour subcarrier digitally from the pixel
//! clock: a 32-bit phase accumulator advances by the value in
//! [`SD_FSC`](crate::register::SD_FSC) on every encoder clock cycle (two per
//! pixel). The increment is recomputed and rewritten after every timing or
//! clock change. A stale value makes the colour reference drift against the
//! picture and the receiver loses colour lock.
//!
//! ```text
//! cycles_per_line = 2 * (total_width + 1)
//! line_hz         = pixel_clock * 2 / cycles_per_line
//! word            = round(Fsc / line_hz * 2^32 / cycles_per_line)
//! ```
//!
//! ## Example
//!
//! ```
//! use ntsc_overlay::encoder::subcarrier_word;
//!
//! // 13.5 MHz, 858 clocks per line: the ADV7393 datasheet value
//! assert_eq!(subcarrier_word(13_500_000, 857), Some(0x21F0_7C1F));
//!
//! // under Fsc / 2 the increment no longer fits 32 bits
//! assert_eq!(subcarrier_word(892_857, 779), None);
//! ```

use crate::interface::RegisterInterface;
use crate::register::{
    self, SD_FSC, SD_MODE_2, SD_MODE_4, SD_MODE_6, SD_MODE_7, SD_TIMING_0, SOFTWARE_RESET,
};

/// NTSC colour subcarrier frequency in Hz (315 MHz / 88)
pub const NTSC_SUBCARRIER_HZ: f64 = 315_000_000.0 / 88.0;

type EncoderResult<T, I> = core::result::Result<T, <I as RegisterInterface>::Error>;

/// Replace a bit field inside a register value
///
/// Clears `length` bits starting at `position`, then ORs in the low `length`
/// bits of `value`.
///
/// ```
/// use ntsc_overlay::encoder::set_field;
///
/// assert_eq!(set_field(0x08, 0b10, 1, 2), 0x0C);
/// assert_eq!(set_field(0xFF, 0, 4, 4), 0x0F);
/// ```
pub const fn set_field(byte: u8, value: u8, position: u8, length: u8) -> u8 {
    let mask = (((1u16 << length) - 1) << position) as u8;
    (byte & !mask) | ((value << position) & mask)
}

/// Subcarrier phase increment for a pixel clock and line length
///
/// `total_width` is the scanout's accumulated total width (line length
/// minus one). Returns `None` when the pixel clock is too slow for the
/// increment to fit 32 bits (`2 * pixel_clock_hz <= Fsc`), including zero.
pub fn subcarrier_word(pixel_clock_hz: u32, total_width: u32) -> Option<u32> {
    if f64::from(pixel_clock_hz) * 2.0 <= NTSC_SUBCARRIER_HZ {
        return None;
    }
    let cycles_per_line = 2.0 * (f64::from(total_width) + 1.0);
    let line_hz = f64::from(pixel_clock_hz) * 2.0 / cycles_per_line;
    let word = (NTSC_SUBCARRIER_HZ / line_hz) * 4_294_967_296.0 / cycles_per_line;
    // core has no f64::round; the value is always positive
    let word = word + 0.5;
    (word < 4_294_967_296.0).then_some(word as u32)
}

/// Driver for the ADV7393 standard-definition encoder path
pub struct Adv7393<I>
where
    I: RegisterInterface,
{
    /// Register bus
    interface: I,
}

impl<I> Adv7393<I>
where
    I: RegisterInterface,
{
    /// Create a driver over a register interface
    pub fn new(interface: I) -> Self {
        Self { interface }
    }

    /// Boot register sequence
    ///
    /// Software reset, then 16-bit RGB input, non-interlaced, slave timing
    /// mode 2 so the encoder follows the scanout's sync signals. With
    /// `color_bars` the internal bar generator replaces the input.
    pub fn init(&mut self, color_bars: bool) -> EncoderResult<(), I> {
        let mode_4 = if color_bars {
            set_field(register::reset::SD_MODE_4, 1, 6, 1)
        } else {
            register::reset::SD_MODE_4
        };
        let sequence = [
            (SOFTWARE_RESET, set_field(register::reset::SOFTWARE_RESET, 1, 1, 1)),
            // square pixel, pixel data valid, active video edge control
            (
                SD_MODE_2,
                set_field(
                    set_field(set_field(register::reset::SD_MODE_2, 1, 4, 1), 1, 6, 1),
                    1,
                    7,
                    1,
                ),
            ),
            (SD_MODE_4, mode_4),
            // RGB input
            (SD_MODE_6, set_field(register::reset::SD_MODE_6, 1, 7, 1)),
            // 16-bit RGB, non-interlaced
            (
                SD_MODE_7,
                set_field(set_field(register::reset::SD_MODE_7, 0b10, 3, 2), 1, 1, 1),
            ),
            // slave, timing mode 2
            (SD_TIMING_0, set_field(register::reset::SD_TIMING_0, 0b10, 1, 2)),
        ];
        for (reg, value) in sequence {
            self.interface.write_register(reg, value)?;
        }
        log::debug!("adv7393: init done (color bars: {})", color_bars);
        Ok(())
    }

    /// Read a single register
    pub fn read_register(&mut self, reg: u8) -> EncoderResult<u8, I> {
        self.interface.read_register(reg)
    }

    /// Write a single register
    pub fn write_register(&mut self, reg: u8, value: u8) -> EncoderResult<(), I> {
        self.interface.write_register(reg, value)
    }

    /// Read back the subcarrier increment
    pub fn read_subcarrier(&mut self) -> EncoderResult<u32, I> {
        let mut word = 0u32;
        for (i, reg) in SD_FSC.iter().enumerate() {
            word |= u32::from(self.interface.read_register(*reg)?) << (8 * i);
        }
        Ok(word)
    }

    /// Write the subcarrier increment, least significant byte first
    pub fn write_subcarrier(&mut self, word: u32) -> EncoderResult<(), I> {
        for (reg, byte) in SD_FSC.iter().zip(word.to_le_bytes()) {
            self.interface.write_register(*reg, byte)?;
        }
        Ok(())
    }

    /// Recompute and write the subcarrier for the current timing
    ///
    /// Returns the word written, or `None` without touching the encoder when
    /// the pixel clock is too slow (see [`subcarrier_word`]).
    pub fn resync(
        &mut self,
        pixel_clock_hz: u32,
        total_width: u32,
    ) -> EncoderResult<Option<u32>, I> {
        let Some(word) = subcarrier_word(pixel_clock_hz, total_width) else {
            log::warn!("adv7393: no subcarrier for {} Hz", pixel_clock_hz);
            return Ok(None);
        };
        self.write_subcarrier(word)?;
        log::debug!(
            "adv7393: subcarrier {:#010x} ({} Hz, total width {})",
            word,
            pixel_clock_hz,
            total_width
        );
        Ok(Some(word))
    }

    /// Borrow the register interface
    pub fn interface_mut(&mut self) -> &mut I {
        &mut self.interface
    }

    /// Release the register interface
    pub fn release(self) -> I {
        self.interface
    }
}
