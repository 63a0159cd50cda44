//! Overlay configuration types and builder

use crate::error::ConfigError;
use crate::timing::{ClockConfig, TimingConfig};

/// Default external oscillator frequency (8 MHz)
pub const DEFAULT_OSCILLATOR_HZ: u32 = 8_000_000;

/// Default PLL input prescaler
pub const DEFAULT_PLL_M: u32 = 4;

/// Default framebuffer address (start of external SDRAM bank 2)
pub const DEFAULT_FRAMEBUFFER_ADDRESS: u32 = 0xD000_0000;

/// Default NEC address accepted from the remote
pub const DEFAULT_REMOTE_ADDRESS: u16 = 0x87;

/// Default minimum spacing between remote events in milliseconds
pub const DEFAULT_DEBOUNCE_MS: u32 = 10;

/// Default number of rectangles in the random burst pattern
pub const DEFAULT_BURST_COUNT: u32 = 100;

/// Overlay configuration
///
/// Holds the boot timing and clock plus the board constants the engine
/// needs. Use [`Builder`] to create a Config.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    /// Timing applied at boot
    pub timing: TimingConfig,
    /// Pixel clock applied at boot
    pub clock: ClockConfig,
    /// External oscillator frequency in Hz
    pub oscillator_hz: u32,
    /// PLL input prescaler
    pub pll_m: u32,
    /// Address the scanout reads the framebuffer from
    pub framebuffer_address: u32,
    /// NEC address accepted from the remote
    pub remote_address: u16,
    /// Minimum spacing between remote events in milliseconds
    pub debounce_ms: u32,
    /// Number of rectangles in the random burst pattern
    pub burst_count: u32,
    /// Whether the encoder outputs its internal colour bars
    pub color_bars: bool,
}

impl Config {
    /// Pixel clock produced by the boot clock configuration
    pub fn pixel_clock_hz(&self) -> u32 {
        self.clock.pixel_clock_hz(self.oscillator_hz, self.pll_m)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            timing: TimingConfig::default(),
            clock: ClockConfig::default(),
            oscillator_hz: DEFAULT_OSCILLATOR_HZ,
            pll_m: DEFAULT_PLL_M,
            framebuffer_address: DEFAULT_FRAMEBUFFER_ADDRESS,
            remote_address: DEFAULT_REMOTE_ADDRESS,
            debounce_ms: DEFAULT_DEBOUNCE_MS,
            burst_count: DEFAULT_BURST_COUNT,
            color_bars: false,
        }
    }
}

/// Builder for constructing overlay configuration
///
/// # Example
///
/// ```
/// use ntsc_overlay::{Builder, TimingConfig};
///
/// let timing = TimingConfig {
///     image_width: 320,
///     ..TimingConfig::default()
/// };
/// let config = match Builder::new().timing(timing).debounce_ms(20).build() {
///     Ok(config) => config,
///     Err(_) => return,
/// };
/// assert_eq!(config.timing.image_width, 320);
/// assert_eq!(config.pixel_clock_hz(), 12_000_000);
/// ```
#[must_use]
#[derive(Clone, Debug, Default)]
pub struct Builder {
    config: Config,
}

impl Builder {
    /// Create a new Builder with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the boot timing
    pub fn timing(mut self, timing: TimingConfig) -> Self {
        self.config.timing = timing;
        self
    }

    /// Set the boot pixel clock
    pub fn clock(mut self, clock: ClockConfig) -> Self {
        self.config.clock = clock;
        self
    }

    /// Set the external oscillator frequency
    pub fn oscillator_hz(mut self, hz: u32) -> Self {
        self.config.oscillator_hz = hz;
        self
    }

    /// Set the PLL input prescaler
    pub fn pll_m(mut self, pll_m: u32) -> Self {
        self.config.pll_m = pll_m;
        self
    }

    /// Set the framebuffer address
    pub fn framebuffer_address(mut self, address: u32) -> Self {
        self.config.framebuffer_address = address;
        self
    }

    /// Set the accepted remote address
    pub fn remote_address(mut self, address: u16) -> Self {
        self.config.remote_address = address;
        self
    }

    /// Set the remote debounce window
    pub fn debounce_ms(mut self, ms: u32) -> Self {
        self.config.debounce_ms = ms;
        self
    }

    /// Set the number of rectangles in the random burst
    pub fn burst_count(mut self, count: u32) -> Self {
        self.config.burst_count = count;
        self
    }

    /// Enable the encoder's colour bar generator
    pub fn color_bars(mut self, enabled: bool) -> Self {
        self.config.color_bars = enabled;
        self
    }

    /// Build the configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the timing does not validate, or the clock does
    /// not validate against the oscillator and prescaler (see
    /// [`ClockConfig::validate_for`]).
    pub fn build(self) -> Result<Config, ConfigError> {
        let config = self.config;
        config.timing.validate()?;
        config
            .clock
            .validate_for(config.oscillator_hz, config.pll_m)?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TimingFault;

    #[test]
    fn test_defaults() {
        let config = Builder::new().build().unwrap();
        assert_eq!(config.timing, TimingConfig::default());
        assert_eq!(config.clock, ClockConfig::default());
        assert_eq!(config.framebuffer_address, 0xD000_0000);
        assert_eq!(config.remote_address, 0x87);
        assert_eq!(config.debounce_ms, 10);
        assert_eq!(config.burst_count, 100);
        assert!(!config.color_bars);
        assert_eq!(config.pixel_clock_hz(), 12_000_000);
    }

    #[test]
    fn test_invalid_timing_rejected() {
        let timing = TimingConfig {
            image_width: 0,
            ..TimingConfig::default()
        };
        assert_eq!(
            Builder::new().timing(timing).build(),
            Err(ConfigError::InvalidTiming(TimingFault::ImageWidth))
        );
    }

    #[test]
    fn test_invalid_clock_rejected() {
        let clock = ClockConfig {
            pll_n: 10,
            ..ClockConfig::default()
        };
        assert_eq!(
            Builder::new().clock(clock).build(),
            Err(ConfigError::InvalidPllN(10))
        );
    }

    #[test]
    fn test_slow_pixel_clock_rejected() {
        let clock = ClockConfig {
            pll_n: 50,
            pll_r: 7,
            divider: crate::timing::PllDivider::Div16,
        };
        assert_eq!(
            Builder::new().clock(clock).build(),
            Err(ConfigError::PixelClockTooSlow(892_857))
        );
    }

    #[test]
    fn test_vco_input_out_of_range() {
        assert!(matches!(
            Builder::new().oscillator_hz(25_000_000).build(),
            Err(ConfigError::InvalidVco {
                input_hz: 6_250_000,
                ..
            })
        ));
        let config = Builder::new()
            .oscillator_hz(25_000_000)
            .pll_m(25)
            .clock(ClockConfig {
                pll_n: 384,
                pll_r: 4,
                divider: crate::timing::PllDivider::Div8,
            })
            .build()
            .unwrap();
        assert_eq!(config.pixel_clock_hz(), 12_000_000);
    }

    #[test]
    fn test_zero_prescaler_rejected() {
        assert!(matches!(
            Builder::new().pll_m(0).build(),
            Err(ConfigError::InvalidOscillator { pll_m: 0, .. })
        ));
    }
}
