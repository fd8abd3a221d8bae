//! 64x64 memory LCD.
//!
//! One byte per pixel, row-major: `1` is a set (black) pixel, `0` is clear
//! (white). Firmware draws through `embedded-graphics` and calls `update`
//! once the frame is complete; hosts only see the buffer between ticks.

#![allow(clippy::cast_possible_truncation)]

use std::convert::Infallible;

use embedded_graphics::Pixel;
use embedded_graphics::pixelcolor::BinaryColor;
use embedded_graphics::prelude::{DrawTarget, OriginDimensions, Size};

pub const DISPLAY_WIDTH: u32 = 64;
pub const DISPLAY_HEIGHT: u32 = 64;

const PIXELS: usize = (DISPLAY_WIDTH * DISPLAY_HEIGHT) as usize;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Screen {
    pixels: Vec<u8>,
    updates: u64,
}

impl Screen {
    #[must_use]
    pub fn new() -> Self {
        Self {
            pixels: vec![0; PIXELS],
            updates: 0,
        }
    }

    /// Raw pixels, one byte each.
    #[must_use]
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Whether the pixel at `(x, y)` is set; `None` off-panel.
    #[must_use]
    pub fn pixel(&self, x: u32, y: u32) -> Option<bool> {
        if x >= DISPLAY_WIDTH || y >= DISPLAY_HEIGHT {
            return None;
        }
        Some(self.pixels[(y * DISPLAY_WIDTH + x) as usize] != 0)
    }

    /// Set a pixel; off-panel coordinates are ignored.
    pub fn set_pixel(&mut self, x: i32, y: i32, on: bool) {
        if let (Ok(x), Ok(y)) = (u32::try_from(x), u32::try_from(y)) {
            if x < DISPLAY_WIDTH && y < DISPLAY_HEIGHT {
                self.pixels[(y * DISPLAY_WIDTH + x) as usize] = u8::from(on);
            }
        }
    }

    /// Present the frame. The simulated panel never reports a pending
    /// transfer, so this always succeeds.
    pub fn update(&mut self) -> bool {
        self.updates += 1;
        true
    }

    /// Frames presented since power-on.
    #[must_use]
    pub const fn updates(&self) -> u64 {
        self.updates
    }

    /// Number of set pixels.
    #[must_use]
    pub fn lit(&self) -> usize {
        self.pixels.iter().filter(|&&p| p != 0).count()
    }

    /// Write the frame as RGBA into `buffer` (at least `64*64*4` bytes).
    pub fn write_rgba(&self, buffer: &mut [u8]) {
        for (dst, &p) in buffer.chunks_exact_mut(4).zip(&self.pixels) {
            let v = if p != 0 { 0x00 } else { 0xFF };
            dst.copy_from_slice(&[v, v, v, 0xFF]);
        }
    }
}

impl Default for Screen {
    fn default() -> Self {
        Self::new()
    }
}

impl DrawTarget for Screen {
    type Color = BinaryColor;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(point, color) in pixels {
            self.set_pixel(point.x, point.y, color.is_on());
        }
        Ok(())
    }

    fn clear(&mut self, color: Self::Color) -> Result<(), Self::Error> {
        self.pixels.fill(u8::from(color.is_on()));
        Ok(())
    }
}

impl OriginDimensions for Screen {
    fn size(&self) -> Size {
        Size::new(DISPLAY_WIDTH, DISPLAY_HEIGHT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_graphics::prelude::*;
    use embedded_graphics::primitives::{Line, PrimitiveStyle};

    #[test]
    fn out_of_bounds_pixels_are_discarded() {
        let mut screen = Screen::new();
        let pixels = [
            Pixel(Point::new(-1, 0), BinaryColor::On),
            Pixel(Point::new(64, 3), BinaryColor::On),
            Pixel(Point::new(3, 64), BinaryColor::On),
            Pixel(Point::new(63, 63), BinaryColor::On),
        ];
        screen.draw_iter(pixels).expect("infallible");
        assert_eq!(screen.lit(), 1);
        assert_eq!(screen.pixel(63, 63), Some(true));
    }

    #[test]
    fn lines_draw_through_embedded_graphics() {
        let mut screen = Screen::new();
        Line::new(Point::new(0, 40), Point::new(64, 40))
            .into_styled(PrimitiveStyle::with_stroke(BinaryColor::On, 1))
            .draw(&mut screen)
            .expect("infallible");
        assert_eq!(screen.lit(), 64);
        assert_eq!(screen.pixel(10, 40), Some(true));
    }

    #[test]
    fn set_pixels_are_black_in_rgba() {
        let mut screen = Screen::new();
        screen.set_pixel(1, 0, true);
        let mut rgba = vec![0u8; PIXELS * 4];
        screen.write_rgba(&mut rgba);
        assert_eq!(&rgba[0..4], &[0xFF, 0xFF, 0xFF, 0xFF]);
        assert_eq!(&rgba[4..8], &[0x00, 0x00, 0x00, 0xFF]);
    }

    #[test]
    fn clear_fills_every_pixel() {
        let mut screen = Screen::new();
        screen.clear(BinaryColor::On).expect("infallible");
        assert_eq!(screen.lit(), PIXELS);
    }
}
