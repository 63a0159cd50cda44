//! Infrared remote handling
//!
//! The NEC pulse decoder runs in a timer capture interrupt and reports each
//! result through a callback. The callback publishes a [`RemoteEvent`] into
//! a [`RemoteMailbox`]; the main loop takes it, runs it through [`Remote`]
//! (debounce, address filter, key table) and re-arms the decoder.
//!
//! ## Example
//!
//! ```
//! use ntsc_overlay::remote::{Remote, RemoteAction, RemoteEvent, RemoteMailbox};
//!
//! static MAILBOX: RemoteMailbox = RemoteMailbox::new();
//!
//! // decoder callback
//! MAILBOX.publish(RemoteEvent::decoded(0x87, 0x0C));
//!
//! // main loop
//! let mut remote = Remote::new(0x87, 10);
//! if let Some(event) = MAILBOX.take() {
//!     assert_eq!(remote.process(event, 100), Some(RemoteAction::Next));
//! }
//! ```

use core::sync::atomic::{AtomicU32, Ordering};

/// Outcome reported by the pulse decoder
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RemoteKind {
    /// A complete address and command
    Decoded,
    /// The key is still held
    Repeat,
    /// The pulse train did not decode
    Error,
}

impl RemoteKind {
    const fn bits(self) -> u32 {
        match self {
            Self::Decoded => 0,
            Self::Repeat => 1,
            Self::Error => 2,
        }
    }

    const fn from_bits(bits: u32) -> Self {
        match bits {
            0 => Self::Decoded,
            1 => Self::Repeat,
            _ => Self::Error,
        }
    }
}

/// One decoder result
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RemoteEvent {
    /// NEC address (extended, 16-bit)
    pub address: u16,
    /// NEC command
    pub command: u8,
    /// Decode outcome
    pub kind: RemoteKind,
}

impl RemoteEvent {
    /// A decoded key press
    pub const fn decoded(address: u16, command: u8) -> Self {
        Self {
            address,
            command,
            kind: RemoteKind::Decoded,
        }
    }

    /// A repeat code
    pub const fn repeat() -> Self {
        Self {
            address: 0,
            command: 0,
            kind: RemoteKind::Repeat,
        }
    }

    /// A decode error
    pub const fn error() -> Self {
        Self {
            address: 0,
            command: 0,
            kind: RemoteKind::Error,
        }
    }

    const fn pack(self) -> u32 {
        PENDING | (self.kind.bits() << 24) | ((self.address as u32) << 8) | self.command as u32
    }

    const fn unpack(word: u32) -> Self {
        Self {
            address: (word >> 8) as u16,
            command: word as u8,
            kind: RemoteKind::from_bits((word >> 24) & 0x3),
        }
    }
}

const PENDING: u32 = 1 << 31;

/// One-slot mailbox between the decoder interrupt and the main loop
///
/// The event is packed into a single atomic word so publishing and taking
/// never observe a half-written event. A new event overwrites one that has
/// not been taken yet.
#[derive(Debug, Default)]
pub struct RemoteMailbox {
    slot: AtomicU32,
}

impl RemoteMailbox {
    /// Create an empty mailbox
    pub const fn new() -> Self {
        Self {
            slot: AtomicU32::new(0),
        }
    }

    /// Publish an event (interrupt side)
    pub fn publish(&self, event: RemoteEvent) {
        self.slot.store(event.pack(), Ordering::Release);
    }

    /// Take the pending event, if any (main loop side)
    pub fn take(&self) -> Option<RemoteEvent> {
        let word = self.slot.swap(0, Ordering::AcqRel);
        (word & PENDING != 0).then(|| RemoteEvent::unpack(word))
    }

    /// Whether an event is waiting
    pub fn is_pending(&self) -> bool {
        self.slot.load(Ordering::Acquire) & PENDING != 0
    }
}

/// Screen change requested by a key
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RemoteAction {
    /// Next screen
    Next,
    /// Previous screen
    Prev,
    /// Jump to a screen
    Select(u8),
}

/// Command to action table
///
/// Right and down step forward, left and up step back, number keys 1..=7
/// jump to screens 0..=6.
pub const KEYMAP: [(u8, RemoteAction); 11] = [
    (0x0C, RemoteAction::Next),
    (0x0D, RemoteAction::Next),
    (0x0E, RemoteAction::Prev),
    (0x0F, RemoteAction::Prev),
    (0x1F, RemoteAction::Select(0)),
    (0x10, RemoteAction::Select(1)),
    (0x1A, RemoteAction::Select(2)),
    (0x1C, RemoteAction::Select(3)),
    (0x05, RemoteAction::Select(4)),
    (0x04, RemoteAction::Select(5)),
    (0x40, RemoteAction::Select(6)),
];

/// Look up a command in [`KEYMAP`]
pub fn lookup(command: u8) -> Option<RemoteAction> {
    KEYMAP
        .iter()
        .find(|(key, _)| *key == command)
        .map(|(_, action)| *action)
}

/// Minimum spacing between accepted events
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Debounce {
    window_ms: u32,
    last_ms: u32,
}

impl Debounce {
    /// Create a debounce window
    pub const fn new(window_ms: u32) -> Self {
        Self {
            window_ms,
            last_ms: 0,
        }
    }

    /// Accept an event at `now_ms` if strictly more than the window has
    /// passed since the last accepted one
    ///
    /// Tolerates the millisecond counter wrapping.
    pub fn accept(&mut self, now_ms: u32) -> bool {
        if now_ms.wrapping_sub(self.last_ms) > self.window_ms {
            self.last_ms = now_ms;
            true
        } else {
            false
        }
    }
}

/// Pulse decoder control
pub trait RemoteDecoder {
    /// Start capturing the next code
    fn rearm(&mut self);
}

/// Filters decoder events into screen actions
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Remote {
    address: u16,
    debounce: Debounce,
}

impl Remote {
    /// Accept codes for `address`, at most one per `debounce_ms`
    pub const fn new(address: u16, debounce_ms: u32) -> Self {
        Self {
            address,
            debounce: Debounce::new(debounce_ms),
        }
    }

    /// Accepted NEC address
    pub fn address(&self) -> u16 {
        self.address
    }

    /// Turn an event into an action
    ///
    /// The debounce window applies to every event. Repeats, errors,
    /// foreign addresses and unmapped keys yield `None`.
    pub fn process(&mut self, event: RemoteEvent, now_ms: u32) -> Option<RemoteAction> {
        if !self.debounce.accept(now_ms) {
            log::trace!("remote: {:?} inside debounce window", event.kind);
            return None;
        }
        match event.kind {
            RemoteKind::Repeat | RemoteKind::Error => None,
            RemoteKind::Decoded if event.address != self.address => {
                log::trace!("remote: ignoring address {:#06x}", event.address);
                None
            }
            RemoteKind::Decoded => {
                let action = lookup(event.command);
                log::debug!("remote: key {:#04x} -> {:?}", event.command, action);
                action
            }
        }
    }
}
