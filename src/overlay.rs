//! Top-level overlay engine
//!
//! [`Overlay`] ties the timing controller, the framebuffer surface and the
//! screen sequencer together. The engine itself belongs to the main loop;
//! interrupts only ever see the [`SharedState`], which is usually a `static`.
//!
//! The serial receive interrupt hands complete packets to
//! [`SharedState::accept_frame`]. Screen steps are applied on the spot;
//! every other command waits in a one-packet mailbox until the main loop
//! calls [`Overlay::poll`], which runs it and returns the reply to
//! transmit. [`Overlay::tick`] then draws whatever screen is requested.
//! Code that owns the engine outright can call [`Overlay::handle_frame`]
//! directly.
//!
//! ## Example
//!
//! ```
//! use core::convert::Infallible;
//! use ntsc_overlay::protocol::{Opcode, Packet};
//! use ntsc_overlay::remote::RemoteDecoder;
//! use ntsc_overlay::sequencer::RandomSource;
//! use ntsc_overlay::overlay::Accepted;
//! use ntsc_overlay::{
//!     Builder, ClockConfig, Overlay, RegisterInterface, Scanout, SharedState, TimingConfig,
//! };
//!
//! # struct Ltdc;
//! # impl Scanout for Ltdc {
//! #     type Error = Infallible;
//! #     fn set_layer_geometry(&mut self, _: &TimingConfig) -> Result<(), Self::Error> { Ok(()) }
//! #     fn set_base_address(&mut self, _: u32) -> Result<(), Self::Error> { Ok(()) }
//! #     fn set_pixel_clock(&mut self, _: &ClockConfig) -> Result<(), Self::Error> { Ok(()) }
//! # }
//! # struct Encoder;
//! # impl RegisterInterface for Encoder {
//! #     type Error = Infallible;
//! #     fn read_register(&mut self, _: u8) -> Result<u8, Self::Error> { Ok(0) }
//! #     fn write_register(&mut self, _: u8, _: u8) -> Result<(), Self::Error> { Ok(()) }
//! # }
//! # struct Nec;
//! # impl RemoteDecoder for Nec { fn rearm(&mut self) {} }
//! # struct Rng;
//! # impl RandomSource for Rng { fn next_random(&mut self) -> u32 { 4 } }
//! static SHARED: SharedState = SharedState::new();
//!
//! let timing = TimingConfig {
//!     image_width: 64,
//!     image_height: 48,
//!     ..TimingConfig::default()
//! };
//! let config = match Builder::new().timing(timing).build() {
//!     Ok(config) => config,
//!     Err(_) => return,
//! };
//! let mut overlay = match Overlay::new(Ltdc, Encoder, [0u16; 64 * 48], &SHARED, config) {
//!     Ok(overlay) => overlay,
//!     Err(_) => return,
//! };
//! if overlay.init().is_err() {
//!     return;
//! }
//!
//! // receive interrupt, through the static only
//! if let Ok(packet) = Packet::command(Opcode::NextScreen, &[]) {
//!     assert_eq!(SHARED.accept_frame(&packet), Accepted::Applied);
//! }
//! if let Ok(packet) = Packet::command(Opcode::GetConfig, &[]) {
//!     assert_eq!(SHARED.accept_frame(&packet), Accepted::Queued);
//! }
//!
//! // main loop
//! if let Ok(Some(reply)) = overlay.poll() {
//!     assert_eq!(reply.payload_len(), 40);
//! }
//! assert_eq!(overlay.tick(0, &mut Nec, &(), &mut Rng), Some(1));
//! ```

use crate::config::Config;
use crate::controller::{ControllerError, TimingController};
use crate::error::Error;
use crate::interface::RegisterInterface;
use crate::protocol::{Command, FrameError, MAX_PAYLOAD, Packet, PacketMailbox, ReplyTag};
use crate::remote::{Remote, RemoteDecoder, RemoteMailbox};
use crate::scanout::Scanout;
use crate::sequencer::{BitmapSource, RandomSource, ScreenState, Sequencer};
use crate::surface::Surface;
use crate::timing::ClockConfig;

/// State shared between interrupt handlers and the main loop
#[derive(Debug, Default)]
pub struct SharedState {
    /// Displayed and requested screen
    pub screens: ScreenState,
    /// Latest remote decoder result
    pub remote: RemoteMailbox,
    /// Host command waiting for the main loop
    pub requests: PacketMailbox,
}

/// What [`SharedState::accept_frame`] did with a packet
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Accepted {
    /// Corrupt packet or unknown opcode
    Dropped,
    /// Screen step applied immediately
    Applied,
    /// Stored for [`Overlay::poll`]
    Queued,
    /// An earlier command is still waiting; this one was discarded
    Busy,
}

impl SharedState {
    /// Create shared state with nothing drawn and screen 0 requested
    pub const fn new() -> Self {
        Self {
            screens: ScreenState::new(),
            remote: RemoteMailbox::new(),
            requests: PacketMailbox::new(),
        }
    }

    /// Take a received packet from interrupt context
    ///
    /// Next and previous screen are applied to [`screens`](Self::screens)
    /// directly. Any other valid command is queued for [`Overlay::poll`];
    /// a second command arriving before the main loop drains the first
    /// is discarded.
    pub fn accept_frame(&self, packet: &Packet) -> Accepted {
        match Command::parse(packet) {
            Ok(Command::NextScreen) => {
                self.screens.next();
                Accepted::Applied
            }
            Ok(Command::PrevScreen) => {
                self.screens.prev();
                Accepted::Applied
            }
            Ok(_) => {
                if self.requests.publish(packet) {
                    Accepted::Queued
                } else {
                    log::warn!("overlay: command {:#04x} dropped, mailbox busy", packet.tag());
                    Accepted::Busy
                }
            }
            Err(err) => {
                log::trace!("overlay: dropped frame: {}", err);
                Accepted::Dropped
            }
        }
    }
}

type OverlayResult<T, S, I> = core::result::Result<T, ControllerError<S, I>>;

/// The overlay engine
///
/// ## Type Parameters
///
/// * `S` - Scanout hardware implementing [`Scanout`]
/// * `I` - Encoder register bus implementing [`RegisterInterface`]
/// * `B` - Framebuffer store implementing `AsRef<[u16]> + AsMut<[u16]>`
pub struct Overlay<'a, S, I, B>
where
    S: Scanout,
    I: RegisterInterface,
    B: AsRef<[u16]> + AsMut<[u16]>,
{
    controller: TimingController<S, I>,
    surface: Surface<B>,
    shared: &'a SharedState,
    remote: Remote,
    burst_count: u32,
}

impl<'a, S, I, B> Overlay<'a, S, I, B>
where
    S: Scanout,
    I: RegisterInterface,
    B: AsRef<[u16]> + AsMut<[u16]>,
{
    /// Assemble the engine from its collaborators
    ///
    /// Nothing is written to hardware until [`init`](Self::init).
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::BufferTooSmall`](crate::ConfigError::BufferTooSmall)
    /// if the framebuffer cannot hold the boot image.
    pub fn new(
        scanout: S,
        interface: I,
        framebuffer: B,
        shared: &'a SharedState,
        config: Config,
    ) -> Result<Self, crate::error::ConfigError> {
        let surface = Surface::try_new(
            framebuffer,
            config.timing.image_width,
            config.timing.image_height,
            config.framebuffer_address,
        )?;
        Ok(Self {
            controller: TimingController::new(scanout, interface, &config),
            surface,
            shared,
            remote: Remote::new(config.remote_address, config.debounce_ms),
            burst_count: config.burst_count,
        })
    }

    /// Bring up encoder and scanout with the boot configuration
    ///
    /// The requested screen is drawn on the next [`tick`](Self::tick).
    pub fn init(&mut self) -> OverlayResult<(), S, I> {
        self.controller.init(&mut self.surface)?;
        self.shared.screens.re_init();
        Ok(())
    }

    /// Dispatch one received packet
    ///
    /// Returns the reply to transmit, if the command has one. Corrupt
    /// packets and unknown opcodes are dropped with `Ok(None)`.
    ///
    /// # Errors
    ///
    /// - [`Error::Config`] if a pushed configuration does not validate.
    ///   Nothing is changed.
    /// - [`Error::Scanout`] / [`Error::Bus`] if the hardware fails. The
    ///   controller halts.
    /// - [`Error::Halted`] after an earlier hardware failure.
    pub fn handle_frame(&mut self, packet: &Packet) -> OverlayResult<Option<Packet>, S, I> {
        let command = match Command::parse(packet) {
            Ok(command) => command,
            Err(FrameError::UnknownOpcode(opcode)) => {
                log::debug!("overlay: ignoring opcode {:#04x}", opcode);
                return Ok(None);
            }
            Err(err) => {
                log::trace!("overlay: dropped frame: {}", err);
                return Ok(None);
            }
        };
        if self.controller.is_halted() {
            return Err(Error::Halted);
        }
        log::debug!("overlay: {:?}", command);

        match command {
            Command::NextScreen => {
                self.shared.screens.next();
                Ok(None)
            }
            Command::PrevScreen => {
                self.shared.screens.prev();
                Ok(None)
            }
            Command::GetConfig => {
                let bytes = self.controller.current_config().to_le_bytes();
                Ok(Packet::reply(ReplyTag::TimingConfig, &bytes).ok())
            }
            Command::PushConfig(timing) => {
                self.controller.reconfigure(timing, &mut self.surface)?;
                self.shared.screens.re_init();
                Ok(None)
            }
            Command::GetClockConfig => {
                let bytes = self.controller.clock_config().to_le_bytes();
                Ok(Packet::reply(ReplyTag::ClockConfig, &bytes).ok())
            }
            Command::PushClockConfig {
                pll_n,
                pll_r,
                divider,
            } => {
                let clock = ClockConfig::from_raw(pll_n, pll_r, divider).inspect_err(|err| {
                    log::warn!("overlay: clock rejected: {}", err);
                })?;
                self.controller.set_clock_config(clock)?;
                Ok(None)
            }
            Command::GetEncoderConfig(registers) => {
                let mut payload = [0u8; MAX_PAYLOAD];
                for (pair, &reg) in payload.chunks_exact_mut(2).zip(registers) {
                    pair[0] = reg;
                    pair[1] = self.controller.read_register(reg)?;
                }
                let len = registers.len() * 2;
                Ok(Packet::reply(ReplyTag::EncoderConfig, &payload[..len]).ok())
            }
            Command::PushEncoderConfig(pairs) => {
                for pair in pairs.chunks_exact(2) {
                    self.controller.write_register(pair[0], pair[1])?;
                }
                Ok(None)
            }
        }
    }

    /// Run the command queued by [`SharedState::accept_frame`], if any
    ///
    /// Returns the reply to transmit. Errors are those of
    /// [`handle_frame`](Self::handle_frame).
    pub fn poll(&mut self) -> OverlayResult<Option<Packet>, S, I> {
        match self.shared.requests.take() {
            Some(packet) => self.handle_frame(&packet),
            None => Ok(None),
        }
    }

    /// Main loop step
    ///
    /// Consumes a pending remote event (re-arming the decoder), then draws
    /// the requested screen if it is not on display. Returns the screen
    /// drawn. Nothing is drawn once the controller has halted.
    pub fn tick<D, A, R>(
        &mut self,
        now_ms: u32,
        decoder: &mut D,
        assets: &A,
        rng: &mut R,
    ) -> Option<u8>
    where
        D: RemoteDecoder + ?Sized,
        A: BitmapSource + ?Sized,
        R: RandomSource + ?Sized,
    {
        if let Some(event) = self.shared.remote.take() {
            if let Some(action) = self.remote.process(event, now_ms) {
                self.shared.screens.apply(action);
            }
            decoder.rearm();
        }
        if self.controller.is_halted() {
            return None;
        }
        Sequencer::new(&self.shared.screens, self.burst_count).tick(
            &mut self.surface,
            assets,
            rng,
        )
    }

    /// Shared state
    pub fn shared(&self) -> &'a SharedState {
        self.shared
    }

    /// The timing controller
    pub fn controller(&self) -> &TimingController<S, I> {
        &self.controller
    }

    /// Mutable access to the timing controller
    pub fn controller_mut(&mut self) -> &mut TimingController<S, I> {
        &mut self.controller
    }

    /// The framebuffer surface
    pub fn surface(&self) -> &Surface<B> {
        &self.surface
    }

    /// Mutable access to the framebuffer surface
    pub fn surface_mut(&mut self) -> &mut Surface<B> {
        &mut self.surface
    }

    /// Release the scanout, encoder interface and framebuffer
    pub fn release(self) -> (S, I, B) {
        let (scanout, interface) = self.controller.release();
        (scanout, interface, self.surface.release())
    }
}
