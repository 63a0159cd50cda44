//! Test screen sequencing
//!
//! Thirteen test screens are bound to render actions through [`PATTERNS`].
//! [`ScreenState`] holds the screen on display and the screen requested by
//! the serial link or the remote; [`Sequencer::tick`] draws the requested
//! screen whenever the two differ.
//!
//! | # | Screen |
//! |---|--------|
//! | 0..=2 | Concentric rectangles, step 10, 4, 1 |
//! | 3..=5 | Solid red, green, blue |
//! | 6 | PM5544 card on blue, centred |
//! | 7 | SMPTE bars on red, centred |
//! | 8 | MFD single page on black, centred |
//! | 9 | MFD multi page on black, centred |
//! | 10 | Picture tiled over red |
//! | 11 | Burst of random rectangles |
//! | 12 | Random solid fill |
//!
//! ## Example
//!
//! ```
//! use ntsc_overlay::sequencer::{RandomSource, ScreenState, Sequencer};
//! use ntsc_overlay::{Color, Surface};
//!
//! struct Lcg(u32);
//! impl RandomSource for Lcg {
//!     fn next_random(&mut self) -> u32 {
//!         self.0 = self.0.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
//!         self.0
//!     }
//! }
//!
//! static SCREENS: ScreenState = ScreenState::new();
//!
//! let mut surface = Surface::new([0u16; 32 * 24], 32, 24, 0);
//! let sequencer = Sequencer::new(&SCREENS, 100);
//!
//! SCREENS.next();
//! SCREENS.next();
//! SCREENS.next(); // screen 3, solid red
//! assert_eq!(sequencer.tick(&mut surface, &(), &mut Lcg(1)), Some(3));
//! assert_eq!(surface.pixel(0, 0), Some(Color::RED.swap_red_blue()));
//!
//! // nothing to do until the selection changes again
//! assert_eq!(sequencer.tick(&mut surface, &(), &mut Lcg(1)), None);
//! ```

use core::sync::atomic::{AtomicU8, Ordering};

use crate::color::Color;
use crate::error::ConfigError;
use crate::remote::RemoteAction;
use crate::surface::{Bitmap, Surface};

/// Number of test screens
pub const SCREEN_COUNT: u8 = 13;

/// Marker for "nothing drawn yet"
const UNSET: u8 = 0xFF;

/// Bitmap test cards
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TestCard {
    /// Philips PM5544, 320x240
    Pm5544,
    /// SMPTE colour bars, 320x240
    SmpteBars,
    /// Single-page MFD mock-up, 317x186
    MfdSingle,
    /// Multi-page MFD mock-up, 317x185
    MfdMulti,
    /// Photograph, 240x320
    Picture,
}

impl TestCard {
    /// Native size of the asset (width, height)
    pub const fn size(self) -> (u32, u32) {
        match self {
            Self::Pm5544 | Self::SmpteBars => (320, 240),
            Self::MfdSingle => (317, 186),
            Self::MfdMulti => (317, 185),
            Self::Picture => (240, 320),
        }
    }
}

/// Render action for one screen
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Pattern {
    /// Concentric rectangles shrinking by `step`
    Rects {
        /// Shrink per ring in pixels
        step: u32,
    },
    /// Solid color
    Fill(Color),
    /// Background fill with a bitmap on top
    Card {
        /// Fill drawn first
        background: Color,
        /// Bitmap asset
        card: TestCard,
        /// Repeat the bitmap across the surface
        tile: bool,
        /// Centre the bitmap
        center: bool,
    },
    /// Random rectangles in random colors
    RandomRects,
    /// One random solid fill
    RandomFill,
}

/// Screen table, indexed by screen number
pub const PATTERNS: [Pattern; SCREEN_COUNT as usize] = [
    Pattern::Rects { step: 10 },
    Pattern::Rects { step: 4 },
    Pattern::Rects { step: 1 },
    Pattern::Fill(Color::RED),
    Pattern::Fill(Color::GREEN),
    Pattern::Fill(Color::BLUE),
    Pattern::Card {
        background: Color::BLUE,
        card: TestCard::Pm5544,
        tile: false,
        center: true,
    },
    Pattern::Card {
        background: Color::RED,
        card: TestCard::SmpteBars,
        tile: false,
        center: true,
    },
    Pattern::Card {
        background: Color::BLACK,
        card: TestCard::MfdSingle,
        tile: false,
        center: true,
    },
    Pattern::Card {
        background: Color::BLACK,
        card: TestCard::MfdMulti,
        tile: false,
        center: true,
    },
    Pattern::Card {
        background: Color::RED,
        card: TestCard::Picture,
        tile: true,
        center: false,
    },
    Pattern::RandomRects,
    Pattern::RandomFill,
];

/// Provides bitmap assets
///
/// `()` provides none; card screens then show their background only.
pub trait BitmapSource {
    /// Bitmap for a test card, if available
    fn bitmap(&self, card: TestCard) -> Option<Bitmap<'_>>;
}

impl BitmapSource for () {
    fn bitmap(&self, _card: TestCard) -> Option<Bitmap<'_>> {
        None
    }
}

/// Hardware random number source
pub trait RandomSource {
    /// Next 32-bit random value
    fn next_random(&mut self) -> u32;
}

/// Displayed and requested screen, shared between interrupt and main loop
///
/// Each field is a single atomic byte. The serial and remote handlers only
/// move `requested`; the main loop only moves `current`.
#[derive(Debug)]
pub struct ScreenState {
    current: AtomicU8,
    requested: AtomicU8,
}

impl Default for ScreenState {
    fn default() -> Self {
        Self::new()
    }
}

impl ScreenState {
    /// Nothing drawn, screen 0 requested
    pub const fn new() -> Self {
        Self {
            current: AtomicU8::new(UNSET),
            requested: AtomicU8::new(0),
        }
    }

    /// Request the next screen, wrapping after the last
    ///
    /// Returns the new request.
    pub fn next(&self) -> u8 {
        self.step(|index| (index + 1) % SCREEN_COUNT)
    }

    /// Request the previous screen, wrapping before the first
    ///
    /// Returns the new request.
    pub fn prev(&self) -> u8 {
        self.step(|index| index.checked_sub(1).unwrap_or(SCREEN_COUNT - 1))
    }

    /// Request a specific screen
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidScreen`] for indices past the table.
    pub fn select(&self, index: u8) -> Result<(), ConfigError> {
        if index >= SCREEN_COUNT {
            return Err(ConfigError::InvalidScreen(index));
        }
        self.requested.store(index, Ordering::Release);
        Ok(())
    }

    /// Apply a remote action
    pub fn apply(&self, action: RemoteAction) {
        match action {
            RemoteAction::Next => {
                self.next();
            }
            RemoteAction::Prev => {
                self.prev();
            }
            RemoteAction::Select(index) => {
                // keymap indices are always in range
                let _ = self.select(index);
            }
        }
    }

    /// Requested screen
    pub fn requested(&self) -> u8 {
        self.requested.load(Ordering::Acquire)
    }

    /// Screen on display, `None` before the first draw or after a re-init
    pub fn current(&self) -> Option<u8> {
        let current = self.current.load(Ordering::Acquire);
        (current < SCREEN_COUNT).then_some(current)
    }

    /// Force the requested screen to be drawn again on the next tick
    pub fn re_init(&self) {
        self.current.store(UNSET, Ordering::Release);
    }

    /// Screen waiting to be drawn
    pub fn pending(&self) -> Option<u8> {
        let requested = self.requested();
        (self.current.load(Ordering::Acquire) != requested).then_some(requested)
    }

    /// Record that `index` is on display
    pub fn mark_rendered(&self, index: u8) {
        self.current.store(index, Ordering::Release);
    }

    fn step(&self, f: impl Fn(u8) -> u8) -> u8 {
        let previous = self
            .requested
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |index| {
                Some(f(index.min(SCREEN_COUNT - 1)))
            })
            .unwrap_or_else(|index| index);
        f(previous.min(SCREEN_COUNT - 1))
    }
}

/// Draws the requested screen
#[derive(Debug, Clone, Copy)]
pub struct Sequencer<'a> {
    screens: &'a ScreenState,
    burst_count: u32,
}

impl<'a> Sequencer<'a> {
    /// Create a sequencer over shared screen state
    pub const fn new(screens: &'a ScreenState, burst_count: u32) -> Self {
        Self {
            screens,
            burst_count,
        }
    }

    /// Shared screen state
    pub fn screens(&self) -> &'a ScreenState {
        self.screens
    }

    /// Draw the requested screen if it is not on display
    ///
    /// Returns the screen drawn.
    pub fn tick<B, A, R>(&self, surface: &mut Surface<B>, assets: &A, rng: &mut R) -> Option<u8>
    where
        B: AsRef<[u16]> + AsMut<[u16]>,
        A: BitmapSource + ?Sized,
        R: RandomSource + ?Sized,
    {
        let index = self.screens.pending()?;
        let pattern = PATTERNS.get(index as usize)?;
        log::debug!("sequencer: screen {} ({:?})", index, pattern);
        render(pattern, surface, assets, rng, self.burst_count);
        self.screens.mark_rendered(index);
        Some(index)
    }
}

/// Draw one pattern
pub fn render<B, A, R>(
    pattern: &Pattern,
    surface: &mut Surface<B>,
    assets: &A,
    rng: &mut R,
    burst_count: u32,
) where
    B: AsRef<[u16]> + AsMut<[u16]>,
    A: BitmapSource + ?Sized,
    R: RandomSource + ?Sized,
{
    match *pattern {
        Pattern::Rects { step } => surface.draw_rects(step),
        Pattern::Fill(color) => surface.fill(color),
        Pattern::Card {
            background,
            card,
            tile,
            center,
        } => {
            surface.fill(background);
            match assets.bitmap(card) {
                Some(bitmap) => surface.draw_bitmap(&bitmap, tile, center),
                None => log::warn!("sequencer: no bitmap for {:?}", card),
            }
        }
        Pattern::RandomRects => {
            let width = surface.width().max(1);
            let height = surface.height().max(1);
            for _ in 0..burst_count {
                let x1 = rng.next_random() % width;
                let y1 = rng.next_random() % height;
                let x2 = rng.next_random() % width;
                let y2 = rng.next_random() % height;
                let color = Color::from_raw(rng.next_random() as u16);
                surface.fill_rect(x1, y1, x2, y2, color);
            }
        }
        Pattern::RandomFill => surface.fill(Color::from_raw(rng.next_random() as u16)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;
    use alloc::vec::Vec;

    /// Replays a fixed sequence, counting draws
    struct ScriptedRandom {
        values: Vec<u32>,
        calls: usize,
    }

    impl ScriptedRandom {
        fn new(values: &[u32]) -> Self {
            Self {
                values: values.to_vec(),
                calls: 0,
            }
        }
    }

    impl RandomSource for ScriptedRandom {
        fn next_random(&mut self) -> u32 {
            let value = self.values[self.calls % self.values.len()];
            self.calls += 1;
            value
        }
    }

    struct Cards {
        pixels: Vec<u16>,
    }

    impl BitmapSource for Cards {
        fn bitmap(&self, card: TestCard) -> Option<Bitmap<'_>> {
            match card {
                TestCard::SmpteBars => Bitmap::new(&self.pixels, 2, 2).ok(),
                _ => None,
            }
        }
    }

    fn test_surface() -> Surface<Vec<u16>> {
        Surface::new(vec![0u16; 8 * 6], 8, 6, 0)
    }

    #[test]
    fn test_next_wraps_after_thirteen() {
        let screens = ScreenState::new();
        for _ in 0..SCREEN_COUNT {
            screens.next();
        }
        assert_eq!(screens.requested(), 0);
    }

    #[test]
    fn test_prev_wraps_to_last() {
        let screens = ScreenState::new();
        assert_eq!(screens.prev(), 12);
        assert_eq!(screens.prev(), 11);
        assert_eq!(screens.next(), 12);
        assert_eq!(screens.next(), 0);
    }

    #[test]
    fn test_select_range() {
        let screens = ScreenState::new();
        assert_eq!(screens.select(12), Ok(()));
        assert_eq!(screens.requested(), 12);
        assert_eq!(screens.select(13), Err(ConfigError::InvalidScreen(13)));
        assert_eq!(screens.requested(), 12);
    }

    #[test]
    fn test_apply_remote_actions() {
        let screens = ScreenState::new();
        screens.apply(RemoteAction::Select(5));
        assert_eq!(screens.requested(), 5);
        screens.apply(RemoteAction::Next);
        assert_eq!(screens.requested(), 6);
        screens.apply(RemoteAction::Prev);
        screens.apply(RemoteAction::Prev);
        assert_eq!(screens.requested(), 4);
    }

    #[test]
    fn test_initial_state_draws_screen_zero() {
        let screens = ScreenState::new();
        assert_eq!(screens.current(), None);
        assert_eq!(screens.pending(), Some(0));
    }

    #[test]
    fn test_tick_is_one_shot() {
        let screens = ScreenState::new();
        let sequencer = Sequencer::new(&screens, 100);
        let mut surface = test_surface();
        let mut rng = ScriptedRandom::new(&[1]);

        assert_eq!(sequencer.tick(&mut surface, &(), &mut rng), Some(0));
        assert_eq!(screens.current(), Some(0));
        assert_eq!(sequencer.tick(&mut surface, &(), &mut rng), None);
    }

    #[test]
    fn test_re_init_redraws_requested() {
        let screens = ScreenState::new();
        let sequencer = Sequencer::new(&screens, 100);
        let mut surface = test_surface();
        let mut rng = ScriptedRandom::new(&[1]);

        screens.select(4).unwrap();
        assert_eq!(sequencer.tick(&mut surface, &(), &mut rng), Some(4));
        surface.fill(Color::BLACK);
        screens.re_init();
        assert_eq!(screens.current(), None);
        assert_eq!(sequencer.tick(&mut surface, &(), &mut rng), Some(4));
        assert_eq!(surface.pixel(0, 0), Some(Color::GREEN));
    }

    #[test]
    fn test_card_without_asset_draws_background() {
        let screens = ScreenState::new();
        let sequencer = Sequencer::new(&screens, 100);
        let mut surface = test_surface();
        let mut rng = ScriptedRandom::new(&[1]);

        screens.select(6).unwrap();
        sequencer.tick(&mut surface, &(), &mut rng);
        assert!(surface.pixels().iter().all(|&p| p == Color::RED.raw()));
    }

    #[test]
    fn test_card_centered_over_background() {
        let screens = ScreenState::new();
        let sequencer = Sequencer::new(&screens, 100);
        let mut surface = test_surface();
        let mut rng = ScriptedRandom::new(&[1]);
        let cards = Cards {
            pixels: vec![Color::WHITE.raw(); 4],
        };

        screens.select(7).unwrap();
        sequencer.tick(&mut surface, &cards, &mut rng);
        // 8x6 surface, 2x2 card at (3, 2)
        assert_eq!(surface.pixel(3, 2), Some(Color::WHITE));
        assert_eq!(surface.pixel(4, 3), Some(Color::WHITE));
        assert_eq!(surface.pixel(0, 0), Some(Color::BLUE));
        assert_eq!(surface.pixel(5, 2), Some(Color::BLUE));
    }

    #[test]
    fn test_random_burst_draw_count() {
        let screens = ScreenState::new();
        let sequencer = Sequencer::new(&screens, 100);
        let mut surface = test_surface();
        let mut rng = ScriptedRandom::new(&[3, 2, 5, 4, 0x001F]);

        screens.select(11).unwrap();
        sequencer.tick(&mut surface, &(), &mut rng);
        // five draws per rectangle
        assert_eq!(rng.calls, 500);
        // every rectangle is (3, 2)..=(5, 4) in blue, stored as red
        assert_eq!(surface.pixel(4, 3), Some(Color::RED));
        assert_eq!(surface.pixel(0, 0), Some(Color::BLACK));
    }

    #[test]
    fn test_random_fill() {
        let screens = ScreenState::new();
        let sequencer = Sequencer::new(&screens, 100);
        let mut surface = test_surface();
        let mut rng = ScriptedRandom::new(&[0x0001_F800]);

        screens.select(12).unwrap();
        sequencer.tick(&mut surface, &(), &mut rng);
        assert_eq!(rng.calls, 1);
        assert!(surface.pixels().iter().all(|&p| p == Color::BLUE.raw()));
    }

    #[test]
    fn test_table_shape() {
        assert_eq!(PATTERNS.len(), 13);
        assert_eq!(PATTERNS[2], Pattern::Rects { step: 1 });
        assert!(matches!(
            PATTERNS[10],
            Pattern::Card {
                card: TestCard::Picture,
                tile: true,
                center: false,
                ..
            }
        ));
    }
}
