//! Error types for the overlay engine
//!
//! ## Error Types
//!
//! - [`ConfigError`] - A configuration value was rejected before anything was applied
//! - [`Error`] - Runtime errors from the timing controller and command dispatch
//! - [`FrameError`](crate::protocol::FrameError) - Malformed or corrupted serial frames
//!
//! Hardware failures while a configuration is being applied are fatal:
//! the controller stops and every later call reports [`Error::Halted`].
//!
//! ## Example
//!
//! ```
//! use ntsc_overlay::{ConfigError, TimingConfig};
//!
//! let mut timing = TimingConfig::default();
//! timing.total_width = 100; // shorter than the active area
//! assert!(matches!(timing.validate(), Err(ConfigError::InvalidTiming(_))));
//! ```

use core::fmt::Debug;

/// Largest value the scanout accepts for horizontal timing fields (12-bit registers)
pub const MAX_HORIZONTAL: u32 = 0x0FFF;

/// Largest value the scanout accepts for vertical timing fields (11-bit registers)
pub const MAX_VERTICAL: u32 = 0x07FF;

/// Which timing relation a rejected [`TimingConfig`](crate::TimingConfig) broke
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TimingFault {
    /// Active width does not cover horizontal sync plus back porch
    HorizontalActive,
    /// Total width is shorter than the active width
    HorizontalTotal,
    /// Active height does not cover vertical sync plus back porch
    VerticalActive,
    /// Total height is shorter than the active height
    VerticalTotal,
    /// Image width is zero or wider than the active area
    ImageWidth,
    /// Image height is zero or taller than the active area
    ImageHeight,
    /// A horizontal field exceeds [`MAX_HORIZONTAL`]
    HorizontalRange,
    /// A vertical field exceeds [`MAX_VERTICAL`]
    VerticalRange,
}

/// Errors raised while validating configuration values
///
/// Nothing is applied to hardware when one of these is returned.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConfigError {
    /// Timing relations do not hold
    InvalidTiming(TimingFault),
    /// PLL multiplier outside 50..=432
    InvalidPllN(u32),
    /// PLL divider outside 2..=7
    InvalidPllR(u32),
    /// Output divider index outside 0..=3
    InvalidDivider(u32),
    /// Oscillator or input prescaler is zero
    InvalidOscillator {
        /// Oscillator frequency in Hz
        hz: u32,
        /// Input prescaler
        pll_m: u32,
    },
    /// PLL input or VCO output frequency outside the PLL's range
    InvalidVco {
        /// Oscillator divided by the input prescaler, in Hz
        input_hz: u32,
        /// VCO output in Hz
        output_hz: u32,
    },
    /// Pixel clock too slow for the encoder subcarrier increment
    PixelClockTooSlow(u32),
    /// Framebuffer cannot hold the requested image
    BufferTooSmall {
        /// Required size in pixels
        required: usize,
        /// Provided size in pixels
        provided: usize,
    },
    /// Bitmap pixel slice is shorter than width * height
    BitmapTooSmall {
        /// Required size in pixels
        required: usize,
        /// Provided size in pixels
        provided: usize,
    },
    /// Screen index outside the pattern table
    InvalidScreen(u8),
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::InvalidTiming(fault) => write!(f, "Invalid timing: {fault:?}"),
            Self::InvalidPllN(n) => write!(f, "PLL multiplier {n} outside 50..=432"),
            Self::InvalidPllR(r) => write!(f, "PLL divider {r} outside 2..=7"),
            Self::InvalidDivider(index) => {
                write!(f, "Output divider index {index} outside 0..=3")
            }
            Self::InvalidOscillator { hz, pll_m } => {
                write!(f, "Invalid oscillator: {hz} Hz / M={pll_m}")
            }
            Self::InvalidVco {
                input_hz,
                output_hz,
            } => write!(f, "PLL out of range: input {input_hz} Hz, VCO {output_hz} Hz"),
            Self::PixelClockTooSlow(hz) => {
                write!(f, "Pixel clock {hz} Hz too slow for the subcarrier")
            }
            Self::BufferTooSmall { required, provided } => write!(
                f,
                "Framebuffer too small: required {required} pixels, provided {provided}"
            ),
            Self::BitmapTooSmall { required, provided } => write!(
                f,
                "Bitmap too small: required {required} pixels, provided {provided}"
            ),
            Self::InvalidScreen(index) => write!(f, "Invalid screen index {index}"),
        }
    }
}

impl core::error::Error for ConfigError {}

/// Runtime errors from the timing controller and command dispatch
///
/// Generic over the encoder bus error `B` and the scanout error `S` so callers
/// can match on the underlying hardware error.
#[derive(Debug, PartialEq, Eq)]
pub enum Error<B, S> {
    /// Encoder register bus error
    Bus(B),
    /// Scanout hardware error
    Scanout(S),
    /// Configuration rejected before anything was applied
    Config(ConfigError),
    /// A previous hardware failure stopped the controller
    Halted,
}

impl<B, S> Error<B, S> {
    /// Whether the device must stop after this error
    ///
    /// Bus and scanout failures leave the scanout geometry or the encoder
    /// subcarrier half-applied.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Bus(_) | Self::Scanout(_) | Self::Halted)
    }
}

impl<B, S> From<ConfigError> for Error<B, S> {
    fn from(err: ConfigError) -> Self {
        Self::Config(err)
    }
}

impl<B: Debug, S: Debug> core::fmt::Display for Error<B, S> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Bus(e) => write!(f, "Encoder bus error: {e:?}"),
            Self::Scanout(e) => write!(f, "Scanout error: {e:?}"),
            Self::Config(e) => write!(f, "{e}"),
            Self::Halted => write!(f, "Controller halted after a hardware failure"),
        }
    }
}

impl<B: Debug, S: Debug> core::error::Error for Error<B, S> {}
