//! Timing controller
//!
//! [`TimingController`] owns the scanout, the encoder and the live timing
//! and clock parameters. Every change goes through the same sequence:
//!
//! 1. Validate (nothing touched on failure)
//! 2. Program the scanout
//! 3. Re-anchor the surface and re-point the layer
//! 4. Commit the new parameters
//! 5. Resync the encoder subcarrier
//!
//! A hardware error in steps 2..=5 leaves scanout and encoder disagreeing,
//! so the controller halts and refuses further work with [`Error::Halted`].

use crate::config::Config;
use crate::encoder::Adv7393;
use crate::error::{ConfigError, Error};
use crate::interface::RegisterInterface;
use crate::scanout::Scanout;
use crate::surface::Surface;
use crate::timing::{ClockConfig, TimingConfig};

/// Error type produced by a controller over scanout `S` and register bus `I`
pub type ControllerError<S, I> =
    Error<<I as RegisterInterface>::Error, <S as Scanout>::Error>;

type ControllerResult<T, S, I> = core::result::Result<T, ControllerError<S, I>>;

/// Owns scanout timing, the pixel clock and encoder synchronization
pub struct TimingController<S, I>
where
    S: Scanout,
    I: RegisterInterface,
{
    /// Scanout hardware
    scanout: S,
    /// Video encoder
    encoder: Adv7393<I>,
    /// Committed timing
    timing: TimingConfig,
    /// Committed pixel clock
    clock: ClockConfig,
    /// External oscillator frequency
    oscillator_hz: u32,
    /// PLL input prescaler
    pll_m: u32,
    /// Encoder colour bar mode
    color_bars: bool,
    /// Set after a hardware failure
    halted: bool,
}

impl<S, I> TimingController<S, I>
where
    S: Scanout,
    I: RegisterInterface,
{
    /// Create a controller holding the boot configuration
    ///
    /// Nothing is written to hardware until [`init`](Self::init).
    pub fn new(scanout: S, interface: I, config: &Config) -> Self {
        Self {
            scanout,
            encoder: Adv7393::new(interface),
            timing: config.timing,
            clock: config.clock,
            oscillator_hz: config.oscillator_hz,
            pll_m: config.pll_m,
            color_bars: config.color_bars,
            halted: false,
        }
    }

    /// Boot bring-up
    ///
    /// Runs the encoder register sequence, programs the pixel clock and
    /// layer geometry, points the layer at the surface and performs the
    /// first subcarrier resync.
    pub fn init<B>(&mut self, surface: &mut Surface<B>) -> ControllerResult<(), S, I>
    where
        B: AsRef<[u16]> + AsMut<[u16]>,
    {
        self.check_halted()?;
        let timing = self.timing;
        Self::check_capacity(&timing, surface)?;
        self.check_clock(&self.clock)?;

        let result = self.bring_up(&timing, surface);
        self.finish(result)?;
        log::info!(
            "controller: up, {}x{} @ {} Hz",
            timing.image_width,
            timing.image_height,
            self.pixel_clock_hz()
        );
        Ok(())
    }

    /// Committed timing
    pub fn current_config(&self) -> TimingConfig {
        self.timing
    }

    /// Committed pixel clock configuration
    pub fn clock_config(&self) -> ClockConfig {
        self.clock
    }

    /// Pixel clock derived from the committed clock configuration
    pub fn pixel_clock_hz(&self) -> u32 {
        self.clock.pixel_clock_hz(self.oscillator_hz, self.pll_m)
    }

    /// Whether a hardware failure stopped the controller
    pub fn is_halted(&self) -> bool {
        self.halted
    }

    /// Apply a new timing
    ///
    /// # Errors
    ///
    /// - [`Error::Config`] if the timing does not validate or the surface
    ///   cannot hold the new image. Nothing is changed.
    /// - [`Error::Scanout`] / [`Error::Bus`] if the hardware fails while
    ///   applying. The controller halts.
    /// - [`Error::Halted`] after an earlier hardware failure.
    pub fn reconfigure<B>(
        &mut self,
        timing: TimingConfig,
        surface: &mut Surface<B>,
    ) -> ControllerResult<(), S, I>
    where
        B: AsRef<[u16]> + AsMut<[u16]>,
    {
        self.check_halted()?;
        if let Err(err) = timing.validate() {
            log::warn!("controller: timing rejected: {}", err);
            return Err(err.into());
        }
        Self::check_capacity(&timing, surface)?;

        let result = self.apply_timing(&timing, surface);
        self.finish(result)?;
        log::info!(
            "controller: timing {}x{}, total {}x{}",
            timing.image_width,
            timing.image_height,
            timing.total_width + 1,
            timing.total_height + 1
        );
        Ok(())
    }

    /// Apply a new pixel clock
    ///
    /// Same error behavior as [`reconfigure`](Self::reconfigure).
    pub fn set_clock_config(&mut self, clock: ClockConfig) -> ControllerResult<(), S, I> {
        self.check_halted()?;
        self.check_clock(&clock)?;

        let result = self.apply_clock(&clock);
        self.finish(result)?;
        log::info!(
            "controller: clock N={} R={} /{} -> {} Hz",
            clock.pll_n,
            clock.pll_r,
            clock.divider.value(),
            self.pixel_clock_hz()
        );
        Ok(())
    }

    /// Rewrite the encoder subcarrier for the committed timing
    ///
    /// Returns the word written.
    pub fn resync(&mut self) -> ControllerResult<u32, S, I> {
        self.check_halted()?;
        let result = self.sync_subcarrier(self.timing.total_width);
        self.finish(result)
    }

    /// Read an encoder register
    pub fn read_register(&mut self, reg: u8) -> ControllerResult<u8, S, I> {
        self.check_halted()?;
        let result = self.encoder.read_register(reg).map_err(Error::Bus);
        self.finish(result)
    }

    /// Write an encoder register
    ///
    /// No whitelist is applied; any register may be written.
    pub fn write_register(&mut self, reg: u8, value: u8) -> ControllerResult<(), S, I> {
        self.check_halted()?;
        log::debug!("controller: poke {:#04x} = {:#04x}", reg, value);
        let result = self.encoder.write_register(reg, value).map_err(Error::Bus);
        self.finish(result)
    }

    /// Direct access to the encoder, bypassing halt tracking
    pub fn encoder_mut(&mut self) -> &mut Adv7393<I> {
        &mut self.encoder
    }

    /// Direct access to the scanout
    pub fn scanout_mut(&mut self) -> &mut S {
        &mut self.scanout
    }

    /// Release the scanout and the encoder interface
    pub fn release(self) -> (S, I) {
        (self.scanout, self.encoder.release())
    }

    fn check_halted(&self) -> ControllerResult<(), S, I> {
        if self.halted {
            return Err(Error::Halted);
        }
        Ok(())
    }

    fn check_clock(&self, clock: &ClockConfig) -> ControllerResult<u32, S, I> {
        clock
            .validate_for(self.oscillator_hz, self.pll_m)
            .map_err(|err| {
                log::warn!("controller: clock rejected: {}", err);
                err.into()
            })
    }

    fn check_capacity<B>(timing: &TimingConfig, surface: &Surface<B>) -> ControllerResult<(), S, I>
    where
        B: AsRef<[u16]> + AsMut<[u16]>,
    {
        let required = timing.image_pixels();
        if surface.capacity() < required {
            let err = ConfigError::BufferTooSmall {
                required,
                provided: surface.capacity(),
            };
            log::warn!("controller: timing rejected: {}", err);
            return Err(err.into());
        }
        Ok(())
    }

    fn bring_up<B>(
        &mut self,
        timing: &TimingConfig,
        surface: &mut Surface<B>,
    ) -> ControllerResult<(), S, I>
    where
        B: AsRef<[u16]> + AsMut<[u16]>,
    {
        self.encoder.init(self.color_bars).map_err(Error::Bus)?;
        self.scanout
            .set_pixel_clock(&self.clock)
            .map_err(Error::Scanout)?;
        self.apply_timing(timing, surface)
    }

    fn apply_timing<B>(
        &mut self,
        timing: &TimingConfig,
        surface: &mut Surface<B>,
    ) -> ControllerResult<(), S, I>
    where
        B: AsRef<[u16]> + AsMut<[u16]>,
    {
        self.scanout
            .set_layer_geometry(timing)
            .map_err(Error::Scanout)?;
        surface.reanchor(timing.image_width, timing.image_height)?;
        self.scanout
            .set_base_address(surface.base_address())
            .map_err(Error::Scanout)?;
        self.timing = *timing;
        self.sync_subcarrier(timing.total_width)?;
        Ok(())
    }

    fn apply_clock(&mut self, clock: &ClockConfig) -> ControllerResult<(), S, I> {
        self.scanout
            .set_pixel_clock(clock)
            .map_err(Error::Scanout)?;
        self.clock = *clock;
        self.sync_subcarrier(self.timing.total_width)?;
        Ok(())
    }

    fn sync_subcarrier(&mut self, total_width: u32) -> ControllerResult<u32, S, I> {
        let pixel_clock_hz = self.pixel_clock_hz();
        self.encoder
            .resync(pixel_clock_hz, total_width)
            .map_err(Error::Bus)?
            .ok_or(Error::Config(ConfigError::PixelClockTooSlow(pixel_clock_hz)))
    }

    fn finish<T>(&mut self, result: ControllerResult<T, S, I>) -> ControllerResult<T, S, I> {
        if let Err(err) = &result {
            if err.is_fatal() {
                self.halted = true;
                log::error!("controller: halted: {}", err);
            }
        }
        result
    }
}
