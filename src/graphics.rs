//! Graphics support via embedded-graphics
//!
//! [`Surface`] implements the [`DrawTarget`] trait from the embedded-graphics
//! ecosystem with [`Rgb565`] colors, so text, primitives and images can be
//! drawn over the test patterns. Colors go through the same red/blue swap as
//! the native primitives.
//!
//! ## Example
//!
//! ```
//! use embedded_graphics::{
//!     pixelcolor::Rgb565,
//!     prelude::*,
//!     primitives::{Circle, PrimitiveStyle, Rectangle},
//! };
//! use ntsc_overlay::{Color, Surface};
//!
//! let mut surface = Surface::new([0u16; 64 * 48], 64, 48, 0);
//!
//! let _ = surface.clear(Rgb565::BLACK);
//! let _ = Rectangle::new(Point::new(4, 4), Size::new(20, 10))
//!     .into_styled(PrimitiveStyle::with_stroke(Rgb565::WHITE, 1))
//!     .draw(&mut surface);
//! let _ = Circle::new(Point::new(30, 20), 12)
//!     .into_styled(PrimitiveStyle::with_fill(Rgb565::RED))
//!     .draw(&mut surface);
//!
//! assert_eq!(surface.pixel(4, 4), Some(Color::WHITE));
//! assert_eq!(surface.pixel(36, 26), Some(Color::BLUE));
//! ```

use core::convert::Infallible;
use embedded_graphics_core::{
    draw_target::DrawTarget,
    geometry::{Dimensions, OriginDimensions, Point, Size},
    pixelcolor::Rgb565,
    primitives::Rectangle,
    Pixel,
};

use crate::color::Color;
use crate::surface::Surface;

impl<B> DrawTarget for Surface<B>
where
    B: AsRef<[u16]> + AsMut<[u16]>,
{
    type Color = Rgb565;
    type Error = Infallible;

    fn draw_iter<Iter>(&mut self, pixels: Iter) -> Result<(), Self::Error>
    where
        Iter: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(Point { x, y }, color) in pixels {
            if x < 0 || y < 0 {
                continue;
            }
            // out-of-range positives are skipped by draw_pixel
            self.draw_pixel(x as u32, y as u32, Color::from(color));
        }

        Ok(())
    }

    fn fill_solid(&mut self, area: &Rectangle, color: Self::Color) -> Result<(), Self::Error> {
        let area = area.intersection(&self.bounding_box());
        if let Some(bottom_right) = area.bottom_right() {
            self.fill_rect(
                area.top_left.x as u32,
                area.top_left.y as u32,
                bottom_right.x as u32,
                bottom_right.y as u32,
                Color::from(color),
            );
        }
        Ok(())
    }

    fn clear(&mut self, color: Self::Color) -> Result<(), Self::Error> {
        self.fill(Color::from(color));
        Ok(())
    }
}

impl<B> OriginDimensions for Surface<B>
where
    B: AsRef<[u16]> + AsMut<[u16]>,
{
    fn size(&self) -> Size {
        Size::new(self.width(), self.height())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;
    use alloc::vec::Vec;
    use embedded_graphics::{
        prelude::*,
        primitives::{Line, PrimitiveStyle},
    };

    fn test_surface() -> Surface<Vec<u16>> {
        Surface::new(vec![0u16; 16 * 8], 16, 8, 0)
    }

    #[test]
    fn test_size_follows_active_image() {
        let mut surface = Surface::new(vec![0u16; 640 * 240], 640, 240, 0);
        assert_eq!(surface.size(), Size::new(640, 240));
        surface.reanchor(320, 240).unwrap();
        assert_eq!(surface.size(), Size::new(320, 240));
    }

    #[test]
    fn test_draw_iter_skips_out_of_range() {
        let mut surface = test_surface();
        let pixels = [
            Pixel(Point::new(-1, 0), Rgb565::WHITE),
            Pixel(Point::new(0, -1), Rgb565::WHITE),
            Pixel(Point::new(16, 0), Rgb565::WHITE),
            Pixel(Point::new(0, 8), Rgb565::WHITE),
        ];
        surface.draw_iter(pixels).unwrap();
        assert!(surface.pixels().iter().all(|&p| p == 0));

        surface
            .draw_iter([Pixel(Point::new(15, 7), Rgb565::BLUE)])
            .unwrap();
        assert_eq!(surface.pixel(15, 7), Some(Color::RED));
    }

    #[test]
    fn test_clear_fills_active_image() {
        let mut surface = test_surface();
        surface.clear(Rgb565::GREEN).unwrap();
        assert!(surface.pixels().iter().all(|&p| p == Color::GREEN.raw()));
    }

    #[test]
    fn test_fill_solid_clips() {
        let mut surface = test_surface();
        surface
            .fill_solid(
                &Rectangle::new(Point::new(-4, 6), Size::new(8, 8)),
                Rgb565::WHITE,
            )
            .unwrap();
        assert_eq!(surface.pixel(0, 6), Some(Color::WHITE));
        assert_eq!(surface.pixel(3, 7), Some(Color::WHITE));
        assert_eq!(surface.pixel(4, 7), Some(Color::BLACK));
        assert_eq!(surface.pixel(0, 5), Some(Color::BLACK));
    }

    #[test]
    fn test_fill_solid_outside_is_noop() {
        let mut surface = test_surface();
        surface
            .fill_solid(
                &Rectangle::new(Point::new(20, 20), Size::new(4, 4)),
                Rgb565::WHITE,
            )
            .unwrap();
        assert!(surface.pixels().iter().all(|&p| p == 0));
    }

    #[test]
    fn test_primitive_line() {
        let mut surface = test_surface();
        Line::new(Point::new(0, 0), Point::new(7, 7))
            .into_styled(PrimitiveStyle::with_stroke(Rgb565::RED, 1))
            .draw(&mut surface)
            .unwrap();
        for i in 0..8 {
            assert_eq!(surface.pixel(i, i), Some(Color::BLUE));
        }
        assert_eq!(surface.pixel(1, 0), Some(Color::BLACK));
    }
}
