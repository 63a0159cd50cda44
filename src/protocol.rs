//! Serial command protocol
//!
//! Every message in either direction is one fixed 64-byte packet:
//!
//! | Offset   | Content                                   |
//! |----------|-------------------------------------------|
//! | `0`      | Opcode (host to device) or reply tag      |
//! | `1`      | Payload length (0..=61)                   |
//! | `2..63`  | Payload, unused bytes filled with `0xFF`  |
//! | `63`     | Checksum: 8-bit sum of bytes `0..63`      |
//!
//! Multi-byte values are little-endian `u32`. Packets that fail the checksum
//! are dropped without a reply.
//!
//! ## Example
//!
//! ```
//! use ntsc_overlay::protocol::{Command, FrameReceiver, Opcode, Packet};
//!
//! let packet = match Packet::command(Opcode::NextScreen, &[]) {
//!     Ok(packet) => packet,
//!     Err(_) => return,
//! };
//!
//! let mut receiver = FrameReceiver::new();
//! let mut received = None;
//! for &byte in packet.as_bytes() {
//!     received = receiver.feed(byte);
//! }
//! let received = match received {
//!     Some(packet) => packet,
//!     None => return,
//! };
//! assert_eq!(Command::parse(&received), Ok(Command::NextScreen));
//! ```

use core::sync::atomic::{AtomicU8, AtomicU32, Ordering};

use crate::timing::{CLOCK_WIRE_SIZE, TIMING_WIRE_SIZE, TimingConfig};

/// Packet size in bytes
pub const FRAME_SIZE: usize = 64;

/// Largest payload a packet carries
pub const MAX_PAYLOAD: usize = FRAME_SIZE - 3;

/// Filler for unused payload bytes
pub const FILL_BYTE: u8 = 0xFF;

/// Most encoder registers one read request may name (two reply bytes each)
pub const MAX_REGISTER_READS: usize = MAX_PAYLOAD / 2;

/// 8-bit wrapping sum
///
/// ```
/// use ntsc_overlay::protocol::checksum;
///
/// assert_eq!(checksum(&[0xC1, 0x00]), 0xC1);
/// assert_eq!(checksum(&[0xFF, 0x02]), 0x01);
/// ```
pub fn checksum(bytes: &[u8]) -> u8 {
    bytes.iter().fold(0u8, |sum, &b| sum.wrapping_add(b))
}

/// Errors raised while validating or decoding a packet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameError {
    /// Checksum byte does not match the sum of the packet
    InvalidChecksum {
        /// Sum of bytes `0..63`
        expected: u8,
        /// Byte 63
        found: u8,
    },
    /// Payload length exceeds [`MAX_PAYLOAD`]
    PayloadTooLarge(usize),
    /// Opcode byte is not a known command
    UnknownOpcode(u8),
    /// Payload is shorter than the command requires
    Truncated {
        /// Opcode of the command
        opcode: u8,
        /// Bytes required
        required: usize,
        /// Bytes present
        provided: usize,
    },
    /// Register read request names more than [`MAX_REGISTER_READS`] registers
    TooManyRegisters(usize),
}

impl core::fmt::Display for FrameError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::InvalidChecksum { expected, found } => write!(
                f,
                "Checksum mismatch: expected {expected:#04x}, found {found:#04x}"
            ),
            Self::PayloadTooLarge(len) => {
                write!(f, "Payload length {len} exceeds {MAX_PAYLOAD}")
            }
            Self::UnknownOpcode(op) => write!(f, "Unknown opcode {op:#04x}"),
            Self::Truncated {
                opcode,
                required,
                provided,
            } => write!(
                f,
                "Opcode {opcode:#04x} needs {required} payload bytes, got {provided}"
            ),
            Self::TooManyRegisters(count) => write!(
                f,
                "Register read of {count} registers exceeds {MAX_REGISTER_READS}"
            ),
        }
    }
}

impl core::error::Error for FrameError {}

/// Host to device opcodes
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum Opcode {
    /// Step to the next test screen
    NextScreen = 0xC1,
    /// Step to the previous test screen
    PrevScreen = 0xC2,
    /// Read the scanout timing
    GetConfig = 0xC3,
    /// Replace the scanout timing
    PushConfig = 0xC4,
    /// Read the pixel clock PLL settings
    GetClockConfig = 0xC5,
    /// Replace the pixel clock PLL settings
    PushClockConfig = 0xC6,
    /// Read encoder registers
    GetEncoderConfig = 0xC7,
    /// Write encoder registers
    PushEncoderConfig = 0xC8,
}

impl TryFrom<u8> for Opcode {
    type Error = FrameError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0xC1 => Ok(Self::NextScreen),
            0xC2 => Ok(Self::PrevScreen),
            0xC3 => Ok(Self::GetConfig),
            0xC4 => Ok(Self::PushConfig),
            0xC5 => Ok(Self::GetClockConfig),
            0xC6 => Ok(Self::PushClockConfig),
            0xC7 => Ok(Self::GetEncoderConfig),
            0xC8 => Ok(Self::PushEncoderConfig),
            other => Err(FrameError::UnknownOpcode(other)),
        }
    }
}

/// Device to host reply tags
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum ReplyTag {
    /// Scanout timing, ten words
    TimingConfig = 0xF1,
    /// Pixel clock settings, three words
    ClockConfig = 0xF2,
    /// Encoder `(register, value)` pairs
    EncoderConfig = 0xF3,
}

/// One 64-byte protocol packet
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Packet {
    bytes: [u8; FRAME_SIZE],
}

impl Packet {
    /// Wrap received bytes without validating them
    pub const fn from_bytes(bytes: [u8; FRAME_SIZE]) -> Self {
        Self { bytes }
    }

    /// Build a packet with fill bytes and checksum
    ///
    /// # Errors
    ///
    /// Returns [`FrameError::PayloadTooLarge`] if the payload exceeds
    /// [`MAX_PAYLOAD`].
    pub fn build(tag: u8, payload: &[u8]) -> Result<Self, FrameError> {
        if payload.len() > MAX_PAYLOAD {
            return Err(FrameError::PayloadTooLarge(payload.len()));
        }
        let mut bytes = [FILL_BYTE; FRAME_SIZE];
        bytes[0] = tag;
        bytes[1] = payload.len() as u8;
        bytes[2..2 + payload.len()].copy_from_slice(payload);
        bytes[FRAME_SIZE - 1] = checksum(&bytes[..FRAME_SIZE - 1]);
        Ok(Self { bytes })
    }

    /// Build a host command
    pub fn command(opcode: Opcode, payload: &[u8]) -> Result<Self, FrameError> {
        Self::build(opcode as u8, payload)
    }

    /// Build a device reply
    pub fn reply(tag: ReplyTag, payload: &[u8]) -> Result<Self, FrameError> {
        Self::build(tag as u8, payload)
    }

    /// Opcode or reply tag byte
    pub fn tag(&self) -> u8 {
        self.bytes[0]
    }

    /// Declared payload length
    pub fn payload_len(&self) -> usize {
        self.bytes[1] as usize
    }

    /// Payload bytes, clamped to [`MAX_PAYLOAD`]
    pub fn payload(&self) -> &[u8] {
        let len = self.payload_len().min(MAX_PAYLOAD);
        &self.bytes[2..2 + len]
    }

    /// Checksum byte as received
    pub fn checksum(&self) -> u8 {
        self.bytes[FRAME_SIZE - 1]
    }

    /// Check the checksum and the declared length
    ///
    /// # Errors
    ///
    /// Returns [`FrameError::InvalidChecksum`] or
    /// [`FrameError::PayloadTooLarge`].
    pub fn validate(&self) -> Result<(), FrameError> {
        let expected = checksum(&self.bytes[..FRAME_SIZE - 1]);
        if expected != self.checksum() {
            return Err(FrameError::InvalidChecksum {
                expected,
                found: self.checksum(),
            });
        }
        if self.payload_len() > MAX_PAYLOAD {
            return Err(FrameError::PayloadTooLarge(self.payload_len()));
        }
        Ok(())
    }

    /// Whether [`validate`](Self::validate) passes
    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }

    /// Raw packet bytes
    pub fn as_bytes(&self) -> &[u8; FRAME_SIZE] {
        &self.bytes
    }
}

/// A decoded host command
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command<'a> {
    /// Step to the next test screen
    NextScreen,
    /// Step to the previous test screen
    PrevScreen,
    /// Read the scanout timing
    GetConfig,
    /// Replace the scanout timing (not yet validated)
    PushConfig(TimingConfig),
    /// Read the pixel clock settings
    GetClockConfig,
    /// Replace the pixel clock settings (raw wire values)
    PushClockConfig {
        /// PLL multiplier
        pll_n: u32,
        /// PLL divider
        pll_r: u32,
        /// Output divider index, 0..=3 for /2, /4, /8, /16
        divider: u32,
    },
    /// Read the listed encoder registers
    GetEncoderConfig(&'a [u8]),
    /// Write `(register, value)` pairs; a trailing odd byte is ignored
    PushEncoderConfig(&'a [u8]),
}

impl<'a> Command<'a> {
    /// Validate and decode a packet
    ///
    /// # Errors
    ///
    /// Returns a [`FrameError`] if the packet is corrupt, the opcode is
    /// unknown, or the payload is too short for the command.
    pub fn parse(packet: &'a Packet) -> Result<Self, FrameError> {
        packet.validate()?;
        let opcode = Opcode::try_from(packet.tag())?;
        let payload = packet.payload();
        let require = |required: usize| {
            if payload.len() < required {
                Err(FrameError::Truncated {
                    opcode: opcode as u8,
                    required,
                    provided: payload.len(),
                })
            } else {
                Ok(())
            }
        };

        match opcode {
            Opcode::NextScreen => Ok(Self::NextScreen),
            Opcode::PrevScreen => Ok(Self::PrevScreen),
            Opcode::GetConfig => Ok(Self::GetConfig),
            Opcode::PushConfig => {
                require(TIMING_WIRE_SIZE)?;
                let timing = TimingConfig::from_le_bytes(payload).ok_or(FrameError::Truncated {
                    opcode: opcode as u8,
                    required: TIMING_WIRE_SIZE,
                    provided: payload.len(),
                })?;
                Ok(Self::PushConfig(timing))
            }
            Opcode::GetClockConfig => Ok(Self::GetClockConfig),
            Opcode::PushClockConfig => {
                require(CLOCK_WIRE_SIZE)?;
                let word = |i: usize| {
                    u32::from_le_bytes([
                        payload[i * 4],
                        payload[i * 4 + 1],
                        payload[i * 4 + 2],
                        payload[i * 4 + 3],
                    ])
                };
                Ok(Self::PushClockConfig {
                    pll_n: word(0),
                    pll_r: word(1),
                    divider: word(2),
                })
            }
            Opcode::GetEncoderConfig => {
                if payload.len() > MAX_REGISTER_READS {
                    return Err(FrameError::TooManyRegisters(payload.len()));
                }
                Ok(Self::GetEncoderConfig(payload))
            }
            Opcode::PushEncoderConfig => Ok(Self::PushEncoderConfig(payload)),
        }
    }
}

/// Accumulates received bytes into packets
///
/// Models the receive interrupt's 64-byte buffer: every 64th byte completes
/// a packet and the receiver starts over.
#[derive(Debug, Clone)]
pub struct FrameReceiver {
    buffer: [u8; FRAME_SIZE],
    len: usize,
}

impl Default for FrameReceiver {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameReceiver {
    /// Create an empty receiver
    pub const fn new() -> Self {
        Self {
            buffer: [0; FRAME_SIZE],
            len: 0,
        }
    }

    /// Discard any partial packet
    pub fn reset(&mut self) {
        self.len = 0;
    }

    /// Bytes received toward the current packet
    pub fn pending(&self) -> usize {
        self.len
    }

    /// Feed one byte
    ///
    /// Returns the packet when this byte completes it. The packet is not
    /// validated.
    pub fn feed(&mut self, byte: u8) -> Option<Packet> {
        self.buffer[self.len] = byte;
        self.len += 1;
        if self.len < FRAME_SIZE {
            return None;
        }
        self.len = 0;
        Some(Packet::from_bytes(self.buffer))
    }

    /// Feed bytes until a packet completes
    ///
    /// Returns the packet and the number of bytes consumed. Bytes after the
    /// completed packet are not consumed.
    pub fn feed_bytes(&mut self, bytes: &[u8]) -> (Option<Packet>, usize) {
        for (i, &byte) in bytes.iter().enumerate() {
            if let Some(packet) = self.feed(byte) {
                return (Some(packet), i + 1);
            }
        }
        (None, bytes.len())
    }
}

const SLOT_EMPTY: u8 = 0;
const SLOT_WRITING: u8 = 1;
const SLOT_FULL: u8 = 2;
const SLOT_READING: u8 = 3;

/// Single-slot packet handoff from an interrupt to the main loop
///
/// The producer claims the slot with a compare-exchange, so a packet is
/// never torn: a publish while the slot is occupied fails and the caller
/// decides what to do with the packet.
#[derive(Debug)]
pub struct PacketMailbox {
    state: AtomicU8,
    words: [AtomicU32; FRAME_SIZE / 4],
}

impl Default for PacketMailbox {
    fn default() -> Self {
        Self::new()
    }
}

impl PacketMailbox {
    /// Create an empty mailbox
    pub const fn new() -> Self {
        Self {
            state: AtomicU8::new(SLOT_EMPTY),
            words: [const { AtomicU32::new(0) }; FRAME_SIZE / 4],
        }
    }

    /// Store a packet (interrupt side)
    ///
    /// Returns `false` if a packet is already waiting.
    pub fn publish(&self, packet: &Packet) -> bool {
        if self
            .state
            .compare_exchange(SLOT_EMPTY, SLOT_WRITING, Ordering::Acquire, Ordering::Relaxed)
            .is_err()
        {
            return false;
        }
        for (word, chunk) in self.words.iter().zip(packet.as_bytes().chunks_exact(4)) {
            word.store(
                u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]),
                Ordering::Relaxed,
            );
        }
        self.state.store(SLOT_FULL, Ordering::Release);
        true
    }

    /// Take the waiting packet, if any (main loop side)
    pub fn take(&self) -> Option<Packet> {
        self.state
            .compare_exchange(SLOT_FULL, SLOT_READING, Ordering::Acquire, Ordering::Relaxed)
            .ok()?;
        let mut bytes = [0u8; FRAME_SIZE];
        for (chunk, word) in bytes.chunks_exact_mut(4).zip(&self.words) {
            chunk.copy_from_slice(&word.load(Ordering::Relaxed).to_le_bytes());
        }
        self.state.store(SLOT_EMPTY, Ordering::Release);
        Some(Packet::from_bytes(bytes))
    }

    /// Whether a packet is waiting
    pub fn is_pending(&self) -> bool {
        self.state.load(Ordering::Acquire) == SLOT_FULL
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_build_fills_and_sums() {
        let packet = Packet::command(Opcode::NextScreen, &[]).unwrap();
        let bytes = packet.as_bytes();
        assert_eq!(bytes[0], 0xC1);
        assert_eq!(bytes[1], 0);
        assert!(bytes[2..63].iter().all(|&b| b == 0xFF));
        // 0xC1 + 61 * 0xFF, mod 256
        let expected = (0xC1u32 + 61 * 0xFF) as u8;
        assert_eq!(bytes[63], expected);
        assert!(packet.is_valid());
    }

    #[test]
    fn test_payload_too_large() {
        assert_eq!(
            Packet::build(0xC8, &[0u8; 62]),
            Err(FrameError::PayloadTooLarge(62))
        );
        assert!(Packet::build(0xC8, &[0u8; 61]).is_ok());
    }

    #[test]
    fn test_declared_length_over_limit_rejected() {
        let mut bytes = *Packet::command(Opcode::NextScreen, &[]).unwrap().as_bytes();
        bytes[1] = 62;
        bytes[63] = checksum(&bytes[..63]);
        let packet = Packet::from_bytes(bytes);
        assert_eq!(packet.validate(), Err(FrameError::PayloadTooLarge(62)));
        assert_eq!(packet.payload().len(), MAX_PAYLOAD);
    }

    #[test]
    fn test_checksum_off_by_one_rejected() {
        let mut bytes = *Packet::command(Opcode::NextScreen, &[]).unwrap().as_bytes();
        bytes[63] = bytes[63].wrapping_add(1);
        let packet = Packet::from_bytes(bytes);
        assert!(matches!(
            Command::parse(&packet),
            Err(FrameError::InvalidChecksum { .. })
        ));
    }

    #[test]
    fn test_unknown_opcode() {
        let packet = Packet::build(0x42, &[]).unwrap();
        assert_eq!(Command::parse(&packet), Err(FrameError::UnknownOpcode(0x42)));
    }

    #[test]
    fn test_parse_push_config() {
        let timing = TimingConfig::default();
        let packet = Packet::command(Opcode::PushConfig, &timing.to_le_bytes()).unwrap();
        assert_eq!(Command::parse(&packet), Ok(Command::PushConfig(timing)));
    }

    #[test]
    fn test_parse_push_config_truncated() {
        let packet = Packet::command(Opcode::PushConfig, &[0u8; 39]).unwrap();
        assert_eq!(
            Command::parse(&packet),
            Err(FrameError::Truncated {
                opcode: 0xC4,
                required: 40,
                provided: 39
            })
        );
    }

    #[test]
    fn test_parse_push_clock_config() {
        let payload = [216, 0, 0, 0, 2, 0, 0, 0, 3, 0, 0, 0];
        let packet = Packet::command(Opcode::PushClockConfig, &payload).unwrap();
        assert_eq!(
            Command::parse(&packet),
            Ok(Command::PushClockConfig {
                pll_n: 216,
                pll_r: 2,
                divider: 3
            })
        );
    }

    #[test]
    fn test_parse_encoder_read_limit() {
        let packet = Packet::command(Opcode::GetEncoderConfig, &[0x80; 30]).unwrap();
        assert!(matches!(
            Command::parse(&packet),
            Ok(Command::GetEncoderConfig(regs)) if regs.len() == 30
        ));
        let packet = Packet::command(Opcode::GetEncoderConfig, &[0x80; 31]).unwrap();
        assert_eq!(
            Command::parse(&packet),
            Err(FrameError::TooManyRegisters(31))
        );
    }

    #[test]
    fn test_receiver_assembles_packets() {
        let first = Packet::command(Opcode::NextScreen, &[]).unwrap();
        let second = Packet::command(Opcode::GetConfig, &[]).unwrap();
        let mut stream = [0u8; 2 * FRAME_SIZE];
        stream[..FRAME_SIZE].copy_from_slice(first.as_bytes());
        stream[FRAME_SIZE..].copy_from_slice(second.as_bytes());

        let mut receiver = FrameReceiver::new();
        let (packet, used) = receiver.feed_bytes(&stream);
        assert_eq!(packet, Some(first));
        assert_eq!(used, FRAME_SIZE);
        assert_eq!(receiver.pending(), 0);

        let (packet, used) = receiver.feed_bytes(&stream[used..]);
        assert_eq!(packet, Some(second));
        assert_eq!(used, FRAME_SIZE);
    }

    #[test]
    fn test_receiver_partial_and_reset() {
        let mut receiver = FrameReceiver::new();
        let (packet, used) = receiver.feed_bytes(&[0u8; 10]);
        assert_eq!(packet, None);
        assert_eq!(used, 10);
        assert_eq!(receiver.pending(), 10);
        receiver.reset();
        assert_eq!(receiver.pending(), 0);
    }

    #[test]
    fn test_mailbox_holds_one_packet() {
        let mailbox = PacketMailbox::new();
        assert!(!mailbox.is_pending());
        assert_eq!(mailbox.take(), None);

        let first = Packet::command(Opcode::GetConfig, &[]).unwrap();
        let second = Packet::command(Opcode::PushEncoderConfig, &[0x80, 0x11]).unwrap();
        assert!(mailbox.publish(&first));
        assert!(!mailbox.publish(&second));
        assert!(mailbox.is_pending());

        assert_eq!(mailbox.take(), Some(first));
        assert_eq!(mailbox.take(), None);
        assert!(mailbox.publish(&second));
        assert_eq!(mailbox.take(), Some(second));
    }

    #[test]
    fn test_mailbox_keeps_every_byte() {
        let timing = TimingConfig::default().to_le_bytes();
        let packet = Packet::command(Opcode::PushConfig, &timing).unwrap();
        let mailbox = PacketMailbox::new();
        assert!(mailbox.publish(&packet));
        let taken = mailbox.take().unwrap();
        assert_eq!(taken.as_bytes(), packet.as_bytes());
        assert!(taken.is_valid());
    }

    proptest! {
        #[test]
        fn prop_appended_sum_validates(body in proptest::collection::vec(any::<u8>(), 63)) {
            let mut bytes = [0u8; FRAME_SIZE];
            bytes[..63].copy_from_slice(&body);
            bytes[1] = bytes[1] % (MAX_PAYLOAD as u8 + 1);
            bytes[63] = checksum(&bytes[..63]);
            prop_assert!(Packet::from_bytes(bytes).is_valid());
        }

        #[test]
        fn prop_single_bit_flip_invalidates(
            body in proptest::collection::vec(any::<u8>(), 63),
            index in 0usize..63,
            bit in 0u8..8,
        ) {
            let mut bytes = [0u8; FRAME_SIZE];
            bytes[..63].copy_from_slice(&body);
            bytes[63] = checksum(&bytes[..63]);
            bytes[index] ^= 1 << bit;
            let packet = Packet::from_bytes(bytes);
            prop_assert!(
                matches!(packet.validate(), Err(FrameError::InvalidChecksum { .. })),
                "flip at byte {} bit {} went unnoticed",
                index,
                bit
            );
        }

        #[test]
        fn prop_built_packets_validate(
            tag in any::<u8>(),
            payload in proptest::collection::vec(any::<u8>(), 0..=MAX_PAYLOAD),
        ) {
            let packet = Packet::build(tag, &payload).unwrap();
            prop_assert!(packet.is_valid());
            prop_assert_eq!(packet.payload(), payload.as_slice());
        }
    }
}
