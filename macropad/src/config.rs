use embassy_time::Duration;
use smart_leds::RGB8;

use crate::display::TextPosition;

/// Layer colors of the default configuration: blue, green and purple.
pub const DEFAULT_LAYER_COLORS: [RGB8; 3] = [
    RGB8 { r: 0, g: 100, b: 255 },
    RGB8 { r: 0, g: 255, b: 100 },
    RGB8 { r: 200, g: 0, b: 255 },
];

/// Tunable configurations of the macropad.
///
/// Everything is known at compile time, `Default` gives the values of the reference board.
#[derive(Clone, Copy, Debug)]
pub struct MacropadConfig<'a> {
    /// Interval between two ticks of the pipeline
    pub scan_interval: Duration,
    pub debounce: DebounceConfig,
    pub encoder: EncoderConfig,
    pub feedback: FeedbackConfig<'a>,
}

impl Default for MacropadConfig<'_> {
    fn default() -> Self {
        Self {
            scan_interval: Duration::from_millis(1),
            debounce: DebounceConfig::default(),
            encoder: EncoderConfig::default(),
            feedback: FeedbackConfig::default(),
        }
    }
}

/// Config for the switch debouncer
#[derive(Clone, Copy, Debug)]
pub struct DebounceConfig {
    /// A new raw state must be seen continuously for this long before it's reported
    pub window: Duration,
}

impl Default for DebounceConfig {
    fn default() -> Self {
        Self {
            window: Duration::from_millis(10),
        }
    }
}

/// Config for rotary encoders
#[derive(Clone, Copy, Debug)]
pub struct EncoderConfig {
    /// Valid quadrature steps per detent
    pub resolution: u8,
    /// Minimal interval between two reported detents, closer ones are dropped
    pub chatter_window: Duration,
    /// Swap clockwise and counter-clockwise
    pub reverse: bool,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            resolution: 4,
            chatter_window: Duration::from_millis(5),
            reverse: false,
        }
    }
}

/// Config for the LED strip and the status display
#[derive(Clone, Copy, Debug)]
pub struct FeedbackConfig<'a> {
    /// Color of each layer, indexed by layer number
    pub layer_colors: &'a [RGB8],
    /// Used for layers without an entry in `layer_colors`
    pub default_color: RGB8,
    /// Global LED brightness, 0..=255
    pub brightness: u8,
    /// Static first line of the display
    pub title: Option<&'a str>,
    pub title_position: TextPosition,
    /// Where the `L: <n>` line is drawn
    pub layer_position: TextPosition,
}

impl Default for FeedbackConfig<'_> {
    fn default() -> Self {
        Self {
            layer_colors: &DEFAULT_LAYER_COLORS,
            default_color: RGB8 { r: 128, g: 128, b: 128 },
            brightness: 153,
            title: Some("CodeMate"),
            title_position: TextPosition::new(0, 0),
            layer_position: TextPosition::new(0, 16),
        }
    }
}

impl FeedbackConfig<'_> {
    /// Color of the given layer, falls back to `default_color`
    pub fn layer_color(&self, layer: u8) -> RGB8 {
        self.layer_colors.get(layer as usize).copied().unwrap_or(self.default_color)
    }
}
