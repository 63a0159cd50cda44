//! Scanout hardware abstraction
//!
//! The scanout controller (an STM32 LTDC on the reference board) reads the
//! framebuffer over the memory bus and drives the panel and the video
//! encoder with pixel data plus horizontal and vertical sync. The crate
//! never touches its registers directly; the board implements [`Scanout`]
//! and hands it to the [`TimingController`](crate::TimingController).
//!
//! ## Example
//!
//! ```
//! use ntsc_overlay::{ClockConfig, Scanout, TimingConfig};
//!
//! struct Ltdc {
//!     base: u32,
//! }
//!
//! impl Scanout for Ltdc {
//!     type Error = core::convert::Infallible;
//!
//!     fn set_layer_geometry(&mut self, timing: &TimingConfig) -> Result<(), Self::Error> {
//!         // program SSCR/BPCR/AWCR/TWCR and the layer window
//!         let _ = timing;
//!         Ok(())
//!     }
//!
//!     fn set_base_address(&mut self, address: u32) -> Result<(), Self::Error> {
//!         self.base = address;
//!         Ok(())
//!     }
//!
//!     fn set_pixel_clock(&mut self, clock: &ClockConfig) -> Result<(), Self::Error> {
//!         // reprogram PLLSAI N/R and the LCD clock divider
//!         let _ = clock;
//!         Ok(())
//!     }
//! }
//! ```

use core::fmt::Debug;

use crate::timing::{ClockConfig, TimingConfig};

/// Display timing controller operations
///
/// All operations are fallible so the caller can stop on a half-applied
/// configuration.
pub trait Scanout {
    /// Error type for scanout operations
    type Error: Debug;

    /// Program sync, porch, active and total timing plus the layer window
    ///
    /// The layer window spans `0..image_width` by `0..image_height` and uses
    /// RGB565 pixels.
    fn set_layer_geometry(&mut self, timing: &TimingConfig) -> Result<(), Self::Error>;

    /// Point the layer at the framebuffer start
    fn set_base_address(&mut self, address: u32) -> Result<(), Self::Error>;

    /// Reprogram the pixel clock PLL
    fn set_pixel_clock(&mut self, clock: &ClockConfig) -> Result<(), Self::Error>;
}
