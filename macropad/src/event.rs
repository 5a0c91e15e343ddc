use embassy_time::Instant;
use macropad_types::keycode::KeyCode;

/// Position of a physical switch in the matrix
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct KeyPos {
    pub row: u8,
    pub col: u8,
}

impl KeyPos {
    pub const fn new(row: u8, col: u8) -> Self {
        Self { row, col }
    }
}

/// A debounced switch transition.
///
/// For one position, pressed and released events always alternate, starting with a press.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct KeyEvent {
    pub pos: KeyPos,
    pub pressed: bool,
    /// When the transition was confirmed
    pub timestamp: Instant,
}

/// The encoder direction is either `Clockwise` or `CounterClockwise`
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Direction {
    /// A clockwise turn
    Clockwise,
    /// A counterclockwise turn
    CounterClockwise,
}

/// One detent of a rotary encoder
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct EncoderEvent {
    pub id: u8,
    pub direction: Direction,
    pub timestamp: Instant,
}

/// A key state change sent to the host, in causal order
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct OutputEvent {
    pub key: KeyCode,
    pub pressed: bool,
}

impl OutputEvent {
    pub fn down(key: impl Into<KeyCode>) -> Self {
        Self {
            key: key.into(),
            pressed: true,
        }
    }

    pub fn up(key: impl Into<KeyCode>) -> Self {
        Self {
            key: key.into(),
            pressed: false,
        }
    }
}

/// Raised when the highest active layer changed during a tick
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LayerChangeEvent {
    pub layer: u8,
}
