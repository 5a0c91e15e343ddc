use core::iter::repeat;

use smart_leds::{RGB8, SmartLedsWrite, brightness};

/// An LED strip showing a single color on every pixel
pub trait LedStrip {
    type Error;

    /// Set every pixel to `color`
    fn fill(&mut self, color: RGB8) -> Result<(), Self::Error>;
}

/// [`LedStrip`] over any [`smart_leds`] driver (WS2812 and friends) with `N` pixels.
///
/// Colors are scaled by a global brightness before they're written.
pub struct SmartLedStrip<W, const N: usize> {
    writer: W,
    brightness: u8,
}

impl<W: SmartLedsWrite, const N: usize> SmartLedStrip<W, N>
where
    RGB8: Into<W::Color>,
{
    pub fn new(writer: W, brightness: u8) -> Self {
        Self { writer, brightness }
    }

    pub fn set_brightness(&mut self, brightness: u8) {
        self.brightness = brightness;
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: SmartLedsWrite, const N: usize> LedStrip for SmartLedStrip<W, N>
where
    RGB8: Into<W::Color>,
{
    type Error = W::Error;

    fn fill(&mut self, color: RGB8) -> Result<(), Self::Error> {
        self.writer.write(brightness(repeat(color).take(N), self.brightness))
    }
}
