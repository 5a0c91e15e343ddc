//! Status display
//!
//! The display only shows short lines of text. [`StatusDisplay`] is the seam to the hardware,
//! with the `display` feature [`TextDisplay`] renders the lines on any monochrome
//! `embedded-graphics` draw target, e.g. a buffered SSD1306.

#[cfg(feature = "display")]
use embedded_graphics::{
    mono_font::{MonoTextStyle, ascii::FONT_6X10},
    pixelcolor::BinaryColor,
    prelude::*,
    primitives::{PrimitiveStyle, Rectangle},
    text::{Baseline, Text},
};

/// Top-left corner of a line of text, in pixels
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TextPosition {
    pub x: i32,
    pub y: i32,
}

impl TextPosition {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// A display which can show lines of text
pub trait StatusDisplay {
    type Error;

    /// Replace the line starting at `position` with `text`
    fn draw_text(&mut self, text: &str, position: TextPosition) -> Result<(), Self::Error>;

    /// Push the drawn content to the panel, for buffered displays
    fn flush(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

/// Renders text lines with a 6x10 font on a monochrome draw target.
#[cfg(feature = "display")]
pub struct TextDisplay<T> {
    target: T,
}

#[cfg(feature = "display")]
impl<T: DrawTarget<Color = BinaryColor>> TextDisplay<T> {
    pub fn new(target: T) -> Self {
        Self { target }
    }

    pub fn target(&mut self) -> &mut T {
        &mut self.target
    }

    pub fn into_inner(self) -> T {
        self.target
    }
}

#[cfg(feature = "display")]
impl<T: DrawTarget<Color = BinaryColor>> StatusDisplay for TextDisplay<T> {
    type Error = T::Error;

    fn draw_text(&mut self, text: &str, position: TextPosition) -> Result<(), Self::Error> {
        let origin = Point::new(position.x, position.y);
        let width = (self.target.bounding_box().size.width as i32 - position.x).max(0) as u32;

        // Clear the previous content of the line
        Rectangle::new(origin, Size::new(width, FONT_6X10.character_size.height))
            .into_styled(PrimitiveStyle::with_fill(BinaryColor::Off))
            .draw(&mut self.target)?;

        let style = MonoTextStyle::new(&FONT_6X10, BinaryColor::On);
        Text::with_baseline(text, origin, style, Baseline::Top).draw(&mut self.target)?;
        Ok(())
    }
}
