//! NTSC Overlay Timing and Control Engine
//!
//! Drives a framebuffer overlay through a TFT-style scanout and an ADV7393
//! composite video encoder: scanout timing and pixel clock control, encoder
//! subcarrier synchronization, a checksummed 64-byte serial command protocol,
//! and a sequencer of test screens selectable from the host or an NEC remote.
//!
//! ## Features
//!
//! - `no_std` compatible, no `unsafe`
//! - `embedded-hal` v1.0 I2C support for the encoder
//! - `embedded-graphics` integration (with `graphics` feature)
//! - Validated timing and clock reconfiguration at runtime
//! - Encoder subcarrier recomputed after every timing or clock change
//! - Interrupt-safe screen selection, command and remote mailboxes
//!
//! ## Usage
//!
//! ```rust,no_run
//! use core::convert::Infallible;
//! use embedded_hal::i2c::{I2c, Operation};
//! use ntsc_overlay::protocol::FrameReceiver;
//! use ntsc_overlay::remote::RemoteDecoder;
//! use ntsc_overlay::sequencer::RandomSource;
//! use ntsc_overlay::{Builder, ClockConfig, I2cInterface, Overlay, Scanout, SharedState, TimingConfig};
//!
//! # struct MockI2c;
//! # impl embedded_hal::i2c::ErrorType for MockI2c { type Error = Infallible; }
//! # impl I2c for MockI2c {
//! #     fn transaction(
//! #         &mut self,
//! #         _address: u8,
//! #         _operations: &mut [Operation<'_>],
//! #     ) -> Result<(), Self::Error> {
//! #         Ok(())
//! #     }
//! # }
//! # struct Ltdc;
//! # impl Scanout for Ltdc {
//! #     type Error = Infallible;
//! #     fn set_layer_geometry(&mut self, _: &TimingConfig) -> Result<(), Self::Error> { Ok(()) }
//! #     fn set_base_address(&mut self, _: u32) -> Result<(), Self::Error> { Ok(()) }
//! #     fn set_pixel_clock(&mut self, _: &ClockConfig) -> Result<(), Self::Error> { Ok(()) }
//! # }
//! # struct Nec;
//! # impl RemoteDecoder for Nec { fn rearm(&mut self) {} }
//! # struct Rng;
//! # impl RandomSource for Rng { fn next_random(&mut self) -> u32 { 0 } }
//! # fn uart_read() -> Option<u8> { None }
//! # fn uart_write(_: &[u8]) {}
//! # fn millis() -> u32 { 0 }
//! static SHARED: SharedState = SharedState::new();
//!
//! let config = match Builder::new().build() {
//!     Ok(config) => config,
//!     Err(_) => return,
//! };
//! let framebuffer = [0u16; 640 * 240];
//! let interface = I2cInterface::new(MockI2c);
//! let mut overlay = match Overlay::new(Ltdc, interface, framebuffer, &SHARED, config) {
//!     Ok(overlay) => overlay,
//!     Err(_) => return,
//! };
//! if overlay.init().is_err() {
//!     return;
//! }
//!
//! // UART receive interrupt: sees only the static
//! let mut receiver = FrameReceiver::new();
//! let mut on_uart_rx = |byte: u8| {
//!     if let Some(packet) = receiver.feed(byte) {
//!         SHARED.accept_frame(&packet);
//!     }
//! };
//!
//! loop {
//!     # while let Some(byte) = uart_read() { on_uart_rx(byte); }
//!     match overlay.poll() {
//!         Ok(Some(reply)) => uart_write(reply.as_bytes()),
//!         Ok(None) => {}
//!         Err(err) if err.is_fatal() => return,
//!         Err(_) => {}
//!     }
//!     overlay.tick(millis(), &mut Nec, &(), &mut Rng);
//! }
//! ```

#![no_std]

#[cfg(any(test, feature = "alloc"))]
extern crate alloc;

#[cfg(test)]
extern crate std;

/// RGB565 color type
pub mod color;
/// Overlay configuration types and builder
pub mod config;
/// Timing and pixel clock control
pub mod controller;
/// ADV7393 encoder driver and subcarrier computation
pub mod encoder;
/// Error types for the engine
pub mod error;
/// Encoder register bus abstraction
pub mod interface;
/// Top-level overlay engine
pub mod overlay;
/// Serial command protocol
pub mod protocol;
/// ADV7393 register map
pub mod register;
/// Infrared remote handling
pub mod remote;
/// Scanout hardware abstraction
pub mod scanout;
/// Test screen sequencing
pub mod sequencer;
/// Framebuffer drawing surface
pub mod surface;
/// Scanout timing and pixel clock parameters
pub mod timing;

/// Graphics support via embedded-graphics (requires `graphics` feature)
#[cfg(feature = "graphics")]
pub mod graphics;

pub use color::Color;
pub use config::{Builder, Config};
pub use controller::{ControllerError, TimingController};
pub use encoder::Adv7393;
pub use error::{ConfigError, Error, TimingFault};
pub use interface::{I2cInterface, InterfaceError, RegisterInterface};
pub use overlay::{Accepted, Overlay, SharedState};
pub use protocol::{Command, FrameError, FrameReceiver, Opcode, Packet, PacketMailbox};
pub use scanout::Scanout;
pub use sequencer::{BitmapSource, RandomSource, ScreenState, TestCard};
pub use surface::{Bitmap, Surface};
pub use timing::{ClockConfig, PllDivider, TimingConfig};
