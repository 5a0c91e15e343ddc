use core::convert::Infallible;
use core::fmt::Write;

use heapless::String;

use super::Controller;
use crate::config::FeedbackConfig;
use crate::display::{StatusDisplay, TextPosition};
use crate::event::LayerChangeEvent;
use crate::light::LedStrip;

/// Placeholder for boards without a status display
pub struct NoDisplay;

impl StatusDisplay for NoDisplay {
    type Error = Infallible;

    fn draw_text(&mut self, _text: &str, _position: TextPosition) -> Result<(), Self::Error> {
        Ok(())
    }
}

/// Shows the current layer on the LED strip and on the optional status display.
pub struct FeedbackSink<'a, L: LedStrip, D: StatusDisplay = NoDisplay> {
    led: L,
    display: Option<D>,
    config: FeedbackConfig<'a>,
}

impl<'a, L: LedStrip> FeedbackSink<'a, L, NoDisplay> {
    pub fn without_display(led: L, config: FeedbackConfig<'a>) -> Self {
        Self {
            led,
            display: None,
            config,
        }
    }
}

impl<'a, L: LedStrip, D: StatusDisplay> FeedbackSink<'a, L, D> {
    pub fn new(led: L, display: Option<D>, config: FeedbackConfig<'a>) -> Self {
        Self { led, display, config }
    }

    pub fn led(&mut self) -> &mut L {
        &mut self.led
    }

    pub fn display(&mut self) -> Option<&mut D> {
        self.display.as_mut()
    }

    /// Paint the base layer color, the title and the base layer number
    pub fn init(&mut self) {
        self.fill(self.config.layer_color(0));
        if let (Some(display), Some(title)) = (self.display.as_mut(), self.config.title) {
            if display.draw_text(title, self.config.title_position).is_err() {
                warn!("Failed to draw title on display");
            }
        }
        self.show_layer(0);
    }

    /// React to a change of the highest active layer
    pub fn on_layer_change_event(&mut self, event: LayerChangeEvent) {
        if event.layer as usize >= self.config.layer_colors.len() {
            warn!("No color for layer {}, use default color", event.layer);
        }
        self.fill(self.config.layer_color(event.layer));
        self.show_layer(event.layer);
    }

    fn fill(&mut self, color: smart_leds::RGB8) {
        if self.led.fill(color).is_err() {
            warn!("Failed to update LED strip");
        }
    }

    fn show_layer(&mut self, layer: u8) {
        let Some(display) = self.display.as_mut() else {
            return;
        };
        let mut text: String<8> = String::new();
        // "L: 255" fits
        write!(text, "L: {}", layer).ok();
        if display.draw_text(&text, self.config.layer_position).is_err() {
            warn!("Failed to draw layer on display");
        }
        if display.flush().is_err() {
            warn!("Failed to flush display");
        }
    }
}

impl<L: LedStrip, D: StatusDisplay> Controller for FeedbackSink<'_, L, D> {
    type Event = LayerChangeEvent;

    fn process_event(&mut self, event: Self::Event) {
        self.on_layer_change_event(event);
    }
}
