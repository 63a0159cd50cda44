//! Scanout timing and pixel clock parameters
//!
//! [`TimingConfig`] mirrors the scanout controller's accumulated timing
//! registers. Every horizontal value is counted in pixel clocks and every
//! vertical value in lines, each accumulated from the start of sync:
//!
//! ```text
//! |<- hsync ->|<- back porch ->|<------- active ------->|<- front ->|
//! 0     horizontal_sync  accumulated_hbp    accumulated_active_width  total_width
//! ```
//!
//! [`ClockConfig`] holds the PLL settings that produce the pixel clock.
//!
//! ## Example
//!
//! ```
//! use ntsc_overlay::{ClockConfig, TimingConfig};
//!
//! let timing = TimingConfig::default();
//! assert!(timing.validate().is_ok());
//! assert_eq!(timing.image_width, 640);
//!
//! let clock = ClockConfig::default();
//! assert_eq!(clock.pixel_clock_hz(8_000_000, 4), 12_000_000);
//! ```

use crate::error::{ConfigError, MAX_HORIZONTAL, MAX_VERTICAL, TimingFault};

/// Size of a [`TimingConfig`] on the wire (ten little-endian `u32`)
pub const TIMING_WIRE_SIZE: usize = 40;

/// Size of a [`ClockConfig`] on the wire (three little-endian `u32`)
pub const CLOCK_WIRE_SIZE: usize = 12;

/// Valid PLL multiplier range
pub const PLL_N_RANGE: core::ops::RangeInclusive<u32> = 50..=432;

/// Valid PLL divider range
pub const PLL_R_RANGE: core::ops::RangeInclusive<u32> = 2..=7;

/// Valid PLL input frequency (oscillator / M) in Hz
pub const VCO_INPUT_RANGE: core::ops::RangeInclusive<u32> = 1_000_000..=2_000_000;

/// Valid PLL VCO output frequency in Hz
pub const VCO_OUTPUT_RANGE: core::ops::RangeInclusive<u32> = 100_000_000..=432_000_000;

/// Slowest pixel clock whose subcarrier increment fits 32 bits
///
/// Just above half the NTSC subcarrier frequency.
pub const MIN_PIXEL_CLOCK_HZ: u32 = 1_789_773;

/// Scanout timing parameters
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TimingConfig {
    /// Horizontal sync width minus one
    pub horizontal_sync: u32,
    /// Vertical sync height minus one
    pub vertical_sync: u32,
    /// Horizontal sync plus back porch
    pub accumulated_hbp: u32,
    /// Vertical sync plus back porch
    pub accumulated_vbp: u32,
    /// Horizontal sync, back porch and active width
    pub accumulated_active_width: u32,
    /// Vertical sync, back porch and active height
    pub accumulated_active_height: u32,
    /// Full line length in pixel clocks
    pub total_width: u32,
    /// Full frame height in lines
    pub total_height: u32,
    /// Width of the framebuffer layer in pixels
    pub image_width: u32,
    /// Height of the framebuffer layer in lines
    pub image_height: u32,
}

impl Default for TimingConfig {
    /// Boot timing: 640x240 non-interlaced NTSC
    fn default() -> Self {
        Self {
            horizontal_sync: 63,
            vertical_sync: 3,
            accumulated_hbp: 123,
            accumulated_vbp: 18,
            accumulated_active_width: 763,
            accumulated_active_height: 258,
            total_width: 779,
            total_height: 261,
            image_width: 640,
            image_height: 240,
        }
    }
}

impl TimingConfig {
    /// Check register ranges and the ordering of the accumulated values
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidTiming`] naming the first relation that
    /// does not hold.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let fault = |fault| Err(ConfigError::InvalidTiming(fault));

        let horizontal = [
            self.horizontal_sync,
            self.accumulated_hbp,
            self.accumulated_active_width,
            self.total_width,
            self.image_width,
        ];
        if horizontal.iter().any(|&v| v > MAX_HORIZONTAL) {
            return fault(TimingFault::HorizontalRange);
        }
        let vertical = [
            self.vertical_sync,
            self.accumulated_vbp,
            self.accumulated_active_height,
            self.total_height,
            self.image_height,
        ];
        if vertical.iter().any(|&v| v > MAX_VERTICAL) {
            return fault(TimingFault::VerticalRange);
        }

        if self.accumulated_active_width < self.horizontal_sync + self.accumulated_hbp {
            return fault(TimingFault::HorizontalActive);
        }
        if self.total_width < self.accumulated_active_width {
            return fault(TimingFault::HorizontalTotal);
        }
        if self.accumulated_active_height < self.vertical_sync + self.accumulated_vbp {
            return fault(TimingFault::VerticalActive);
        }
        if self.total_height < self.accumulated_active_height {
            return fault(TimingFault::VerticalTotal);
        }
        if self.image_width == 0
            || self.image_width > self.accumulated_active_width - self.accumulated_hbp
        {
            return fault(TimingFault::ImageWidth);
        }
        if self.image_height == 0
            || self.image_height > self.accumulated_active_height - self.accumulated_vbp
        {
            return fault(TimingFault::ImageHeight);
        }
        Ok(())
    }

    /// Build a timing from sync and porch widths
    ///
    /// Widths are plain counts (pixel clocks or lines); the accumulated
    /// register values are derived from them. The image fills the active
    /// area. The result is not validated.
    ///
    /// ```
    /// use ntsc_overlay::TimingConfig;
    ///
    /// let timing = TimingConfig::from_porches(64, 60, 640, 16, 4, 15, 240, 3);
    /// assert_eq!(timing, TimingConfig::default());
    /// ```
    #[allow(clippy::too_many_arguments)]
    pub const fn from_porches(
        h_sync: u32,
        h_back_porch: u32,
        active_width: u32,
        h_front_porch: u32,
        v_sync: u32,
        v_back_porch: u32,
        active_height: u32,
        v_front_porch: u32,
    ) -> Self {
        let hbp = h_sync + h_back_porch;
        let vbp = v_sync + v_back_porch;
        Self {
            horizontal_sync: h_sync.saturating_sub(1),
            vertical_sync: v_sync.saturating_sub(1),
            accumulated_hbp: hbp.saturating_sub(1),
            accumulated_vbp: vbp.saturating_sub(1),
            accumulated_active_width: (hbp + active_width).saturating_sub(1),
            accumulated_active_height: (vbp + active_height).saturating_sub(1),
            total_width: (hbp + active_width + h_front_porch).saturating_sub(1),
            total_height: (vbp + active_height + v_front_porch).saturating_sub(1),
            image_width: active_width,
            image_height: active_height,
        }
    }

    /// Frames per second at the given pixel clock
    pub fn frame_rate(&self, pixel_clock_hz: u32) -> f64 {
        let clocks_per_frame =
            (f64::from(self.total_width) + 1.0) * (f64::from(self.total_height) + 1.0);
        f64::from(pixel_clock_hz) / clocks_per_frame
    }

    /// Number of pixels in the framebuffer layer
    pub fn image_pixels(&self) -> usize {
        self.image_width as usize * self.image_height as usize
    }

    /// Encode as ten little-endian words in field order
    pub fn to_le_bytes(&self) -> [u8; TIMING_WIRE_SIZE] {
        let words = [
            self.horizontal_sync,
            self.vertical_sync,
            self.accumulated_hbp,
            self.accumulated_vbp,
            self.accumulated_active_width,
            self.accumulated_active_height,
            self.total_width,
            self.total_height,
            self.image_width,
            self.image_height,
        ];
        let mut bytes = [0u8; TIMING_WIRE_SIZE];
        for (chunk, word) in bytes.chunks_exact_mut(4).zip(words) {
            chunk.copy_from_slice(&word.to_le_bytes());
        }
        bytes
    }

    /// Decode from ten little-endian words
    ///
    /// Returns `None` if fewer than [`TIMING_WIRE_SIZE`] bytes are given.
    /// Bytes past the first forty are ignored. The result is not validated.
    pub fn from_le_bytes(bytes: &[u8]) -> Option<Self> {
        let [
            horizontal_sync,
            vertical_sync,
            accumulated_hbp,
            accumulated_vbp,
            accumulated_active_width,
            accumulated_active_height,
            total_width,
            total_height,
            image_width,
            image_height,
        ] = read_words::<10>(bytes)?;
        Some(Self {
            horizontal_sync,
            vertical_sync,
            accumulated_hbp,
            accumulated_vbp,
            accumulated_active_width,
            accumulated_active_height,
            total_width,
            total_height,
            image_width,
            image_height,
        })
    }
}

/// Pixel clock output divider
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PllDivider {
    /// Divide by 2
    Div2,
    /// Divide by 4
    Div4,
    /// Divide by 8
    #[default]
    Div8,
    /// Divide by 16
    Div16,
}

impl PllDivider {
    /// Map a wire index (0..=3) to a divider
    pub fn from_index(index: u32) -> Option<Self> {
        match index {
            0 => Some(Self::Div2),
            1 => Some(Self::Div4),
            2 => Some(Self::Div8),
            3 => Some(Self::Div16),
            _ => None,
        }
    }

    /// Wire index of this divider
    pub fn index(self) -> u32 {
        match self {
            Self::Div2 => 0,
            Self::Div4 => 1,
            Self::Div8 => 2,
            Self::Div16 => 3,
        }
    }

    /// Division factor
    pub fn value(self) -> u32 {
        2 << self.index()
    }
}

/// Pixel clock PLL settings
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ClockConfig {
    /// PLL multiplier
    pub pll_n: u32,
    /// PLL divider
    pub pll_r: u32,
    /// Output divider
    pub divider: PllDivider,
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self {
            pll_n: 192,
            pll_r: 4,
            divider: PllDivider::Div8,
        }
    }
}

impl ClockConfig {
    /// Build a clock configuration from raw wire values
    ///
    /// # Errors
    ///
    /// Returns an error if any value is outside its valid range.
    pub fn from_raw(pll_n: u32, pll_r: u32, divider_index: u32) -> Result<Self, ConfigError> {
        let divider =
            PllDivider::from_index(divider_index).ok_or(ConfigError::InvalidDivider(divider_index))?;
        let config = Self {
            pll_n,
            pll_r,
            divider,
        };
        config.validate()?;
        Ok(config)
    }

    /// Check the PLL ranges
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !PLL_N_RANGE.contains(&self.pll_n) {
            return Err(ConfigError::InvalidPllN(self.pll_n));
        }
        if !PLL_R_RANGE.contains(&self.pll_r) {
            return Err(ConfigError::InvalidPllR(self.pll_r));
        }
        Ok(())
    }

    /// Check the PLL against the board oscillator
    ///
    /// Runs [`validate`](Self::validate), then checks the PLL input and VCO
    /// frequencies and that the pixel clock is fast enough for the encoder
    /// subcarrier. Returns the pixel clock.
    ///
    /// # Errors
    ///
    /// - [`ConfigError::InvalidOscillator`] if the oscillator or `pll_m` is zero
    /// - [`ConfigError::InvalidVco`] if the PLL input or output is out of range
    /// - [`ConfigError::PixelClockTooSlow`] below [`MIN_PIXEL_CLOCK_HZ`]
    pub fn validate_for(&self, oscillator_hz: u32, pll_m: u32) -> Result<u32, ConfigError> {
        self.validate()?;
        if oscillator_hz == 0 || pll_m == 0 {
            return Err(ConfigError::InvalidOscillator {
                hz: oscillator_hz,
                pll_m,
            });
        }
        let input_hz = oscillator_hz / pll_m;
        let output_hz = u64::from(input_hz) * u64::from(self.pll_n);
        let output_hz = u32::try_from(output_hz).unwrap_or(u32::MAX);
        if !VCO_INPUT_RANGE.contains(&input_hz) || !VCO_OUTPUT_RANGE.contains(&output_hz) {
            return Err(ConfigError::InvalidVco {
                input_hz,
                output_hz,
            });
        }
        let pixel_clock_hz = self.pixel_clock_hz(oscillator_hz, pll_m);
        if pixel_clock_hz < MIN_PIXEL_CLOCK_HZ {
            return Err(ConfigError::PixelClockTooSlow(pixel_clock_hz));
        }
        Ok(pixel_clock_hz)
    }

    /// Pixel clock produced from the given oscillator and input prescaler
    ///
    /// Returns 0 when `pll_m` is zero.
    pub fn pixel_clock_hz(&self, oscillator_hz: u32, pll_m: u32) -> u32 {
        if pll_m == 0 {
            return 0;
        }
        let vco = u64::from(oscillator_hz) / u64::from(pll_m) * u64::from(self.pll_n);
        let hz = vco / u64::from(self.pll_r.max(1)) / u64::from(self.divider.value());
        u32::try_from(hz).unwrap_or(u32::MAX)
    }

    /// Encode as N, R and divider index, little-endian
    pub fn to_le_bytes(&self) -> [u8; CLOCK_WIRE_SIZE] {
        let mut bytes = [0u8; CLOCK_WIRE_SIZE];
        let words = [self.pll_n, self.pll_r, self.divider.index()];
        for (chunk, word) in bytes.chunks_exact_mut(4).zip(words) {
            chunk.copy_from_slice(&word.to_le_bytes());
        }
        bytes
    }

    /// Decode N, R and divider index
    ///
    /// Returns `None` if fewer than [`CLOCK_WIRE_SIZE`] bytes are given.
    pub fn from_le_bytes(bytes: &[u8]) -> Option<Result<Self, ConfigError>> {
        let [pll_n, pll_r, divider] = read_words::<3>(bytes)?;
        Some(Self::from_raw(pll_n, pll_r, divider))
    }
}

fn read_words<const N: usize>(bytes: &[u8]) -> Option<[u32; N]> {
    if bytes.len() < N * 4 {
        return None;
    }
    let mut words = [0u32; N];
    for (word, chunk) in words.iter_mut().zip(bytes.chunks_exact(4)) {
        *word = u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
    }
    Some(words)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_timing_is_valid() {
        assert_eq!(TimingConfig::default().validate(), Ok(()));
    }

    #[test]
    fn test_total_width_shorter_than_active() {
        let timing = TimingConfig {
            total_width: 700,
            ..TimingConfig::default()
        };
        assert_eq!(
            timing.validate(),
            Err(ConfigError::InvalidTiming(TimingFault::HorizontalTotal))
        );
    }

    #[test]
    fn test_active_height_inside_back_porch() {
        let timing = TimingConfig {
            accumulated_active_height: 20,
            ..TimingConfig::default()
        };
        assert_eq!(
            timing.validate(),
            Err(ConfigError::InvalidTiming(TimingFault::VerticalActive))
        );
    }

    #[test]
    fn test_image_wider_than_active_area() {
        let timing = TimingConfig {
            image_width: 641,
            ..TimingConfig::default()
        };
        assert_eq!(
            timing.validate(),
            Err(ConfigError::InvalidTiming(TimingFault::ImageWidth))
        );
    }

    #[test]
    fn test_zero_image_height() {
        let timing = TimingConfig {
            image_height: 0,
            ..TimingConfig::default()
        };
        assert_eq!(
            timing.validate(),
            Err(ConfigError::InvalidTiming(TimingFault::ImageHeight))
        );
    }

    #[test]
    fn test_register_ranges() {
        let timing = TimingConfig {
            total_width: 5000,
            ..TimingConfig::default()
        };
        assert_eq!(
            timing.validate(),
            Err(ConfigError::InvalidTiming(TimingFault::HorizontalRange))
        );
        let timing = TimingConfig {
            total_height: 3000,
            ..TimingConfig::default()
        };
        assert_eq!(
            timing.validate(),
            Err(ConfigError::InvalidTiming(TimingFault::VerticalRange))
        );
    }

    #[test]
    fn test_timing_wire_layout() {
        let bytes = TimingConfig::default().to_le_bytes();
        assert_eq!(&bytes[..4], &[63, 0, 0, 0]);
        assert_eq!(&bytes[24..28], &779u32.to_le_bytes());
        assert_eq!(&bytes[32..36], &640u32.to_le_bytes());
        assert_eq!(
            TimingConfig::from_le_bytes(&bytes),
            Some(TimingConfig::default())
        );
    }

    #[test]
    fn test_timing_short_payload() {
        assert_eq!(TimingConfig::from_le_bytes(&[0u8; 39]), None);
    }

    #[test]
    fn test_divider_index_mapping() {
        assert_eq!(PllDivider::from_index(0), Some(PllDivider::Div2));
        assert_eq!(PllDivider::from_index(3), Some(PllDivider::Div16));
        assert_eq!(PllDivider::from_index(4), None);
        assert_eq!(PllDivider::Div2.value(), 2);
        assert_eq!(PllDivider::Div4.value(), 4);
        assert_eq!(PllDivider::Div8.value(), 8);
        assert_eq!(PllDivider::Div16.value(), 16);
    }

    #[test]
    fn test_default_pixel_clock() {
        assert_eq!(ClockConfig::default().pixel_clock_hz(8_000_000, 4), 12_000_000);
    }

    #[test]
    fn test_pixel_clock_zero_prescaler() {
        assert_eq!(ClockConfig::default().pixel_clock_hz(8_000_000, 0), 0);
    }

    #[test]
    fn test_clock_ranges() {
        assert_eq!(ClockConfig::from_raw(49, 4, 2), Err(ConfigError::InvalidPllN(49)));
        assert_eq!(ClockConfig::from_raw(433, 4, 2), Err(ConfigError::InvalidPllN(433)));
        assert_eq!(ClockConfig::from_raw(192, 1, 2), Err(ConfigError::InvalidPllR(1)));
        assert_eq!(ClockConfig::from_raw(192, 8, 2), Err(ConfigError::InvalidPllR(8)));
        assert_eq!(ClockConfig::from_raw(192, 4, 8), Err(ConfigError::InvalidDivider(8)));
        assert_eq!(ClockConfig::from_raw(192, 4, 2), Ok(ClockConfig::default()));
    }

    #[test]
    fn test_timing_from_porches() {
        let timing = TimingConfig::from_porches(64, 60, 640, 16, 4, 15, 240, 3);
        assert_eq!(timing, TimingConfig::default());

        // 858x262 line with a 720-wide active area
        let timing = TimingConfig::from_porches(62, 57, 720, 19, 3, 15, 240, 4);
        assert_eq!(timing.horizontal_sync, 61);
        assert_eq!(timing.accumulated_hbp, 118);
        assert_eq!(timing.accumulated_active_width, 838);
        assert_eq!(timing.total_width, 857);
        assert_eq!(timing.total_height, 261);
        assert_eq!(timing.image_width, 720);
        assert_eq!(timing.validate(), Ok(()));
    }

    #[test]
    fn test_frame_rate() {
        let rate = TimingConfig::default().frame_rate(12_000_000);
        assert!((rate - 12_000_000.0 / (780.0 * 262.0)).abs() < 1e-9);
        assert!((rate - 58.72).abs() < 0.01);

        let timing = TimingConfig::from_porches(62, 57, 720, 19, 3, 15, 240, 4);
        assert!((timing.frame_rate(13_500_000) - 60.05).abs() < 0.01);
        assert_eq!(timing.frame_rate(0), 0.0);
    }

    #[test]
    fn test_clock_validated_against_oscillator() {
        assert_eq!(
            ClockConfig::default().validate_for(8_000_000, 4),
            Ok(12_000_000)
        );
        let fast = ClockConfig {
            pll_n: 216,
            pll_r: 2,
            divider: PllDivider::Div16,
        };
        assert_eq!(fast.validate_for(8_000_000, 4), Ok(13_500_000));
    }

    #[test]
    fn test_clock_too_slow_for_subcarrier() {
        // VCO in range, but 892857 Hz is under Fsc / 2
        let slow = ClockConfig {
            pll_n: 50,
            pll_r: 7,
            divider: PllDivider::Div16,
        };
        assert_eq!(slow.validate(), Ok(()));
        assert_eq!(
            slow.validate_for(8_000_000, 4),
            Err(ConfigError::PixelClockTooSlow(892_857))
        );
        assert_eq!(crate::encoder::subcarrier_word(892_857, 779), None);

        // the floor itself still fits
        assert!(crate::encoder::subcarrier_word(MIN_PIXEL_CLOCK_HZ, 779).is_some());
        assert_eq!(crate::encoder::subcarrier_word(MIN_PIXEL_CLOCK_HZ - 1, 779), None);
    }

    #[test]
    fn test_clock_vco_ranges() {
        // 8 MHz / 2 = 4 MHz into the PLL
        assert_eq!(
            ClockConfig::default().validate_for(8_000_000, 2),
            Err(ConfigError::InvalidVco {
                input_hz: 4_000_000,
                output_hz: 768_000_000,
            })
        );
        // 2 MHz * 432 = 864 MHz out of the VCO
        let clock = ClockConfig {
            pll_n: 432,
            ..ClockConfig::default()
        };
        assert_eq!(
            clock.validate_for(8_000_000, 4),
            Err(ConfigError::InvalidVco {
                input_hz: 2_000_000,
                output_hz: 864_000_000,
            })
        );
        assert!(matches!(
            ClockConfig::default().validate_for(8_000_000, 0),
            Err(ConfigError::InvalidOscillator { pll_m: 0, .. })
        ));
    }

    #[test]
    fn test_clock_wire_layout() {
        let bytes = ClockConfig::default().to_le_bytes();
        assert_eq!(bytes, [192, 0, 0, 0, 4, 0, 0, 0, 2, 0, 0, 0]);
        assert_eq!(
            ClockConfig::from_le_bytes(&bytes),
            Some(Ok(ClockConfig::default()))
        );
        assert_eq!(ClockConfig::from_le_bytes(&bytes[..8]), None);
    }
}
