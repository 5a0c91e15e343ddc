//! Actions bound to keys and encoders.
//!
//! Actions are defined at configuration time and never change at runtime.
//! They are looked up by `(position, layer)` for switches and by
//! `(encoder id, layer)` for rotary encoders.
//!
//! Key types:
//! - [`Action`] - What a binding does when triggered
//! - [`MacroStep`] - A single step of a macro
//! - [`MacroSequence`] - A named, ordered list of macro steps

use crate::keycode::KeyCode;
use crate::modifier::ModifierCombination;

/// A logical action resolved from a keymap.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Action {
    /// Does nothing
    #[default]
    No,
    /// Falls through to the next active layer below
    Transparent,
    /// Press and release a single key
    Emit(KeyCode),
    /// Press a key with modifiers held, e.g. `Ctrl+C`
    EmitWithModifier(KeyCode, ModifierCombination),
    /// Activate a layer while the bound switch is held
    Momentary(u8),
    /// Run a macro sequence
    Macro(&'static MacroSequence),
    /// Actions of a rotary encoder, one per direction.
    ///
    /// Only valid in the encoder table.
    EncoderBinding {
        ccw: &'static Action,
        cw: &'static Action,
    },
}

impl Action {
    /// Single key binding for a HID or consumer key
    pub const fn key(key: KeyCode) -> Self {
        Action::Emit(key)
    }

    /// Whether the binding falls through to lower layers
    pub const fn is_transparent(&self) -> bool {
        matches!(self, Action::Transparent)
    }
}

/// A single step of a macro.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MacroStep {
    /// Press a key and keep it held
    KeyDown(KeyCode),
    /// Release a previously pressed key
    KeyUp(KeyCode),
    /// Wait for the given milliseconds without blocking other events
    Delay(u16),
    /// Press then release a key
    Tap(KeyCode),
    /// Type ascii text, shifted chars are wrapped in left shift
    Text(&'static str),
}

/// A named, ordered, immutable list of [`MacroStep`]s.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MacroSequence {
    pub name: &'static str,
    pub steps: &'static [MacroStep],
    /// Pause after each key released by a `Tap` or `Text` step, in milliseconds
    pub tap_interval_ms: u16,
}

impl MacroSequence {
    pub const fn new(name: &'static str, steps: &'static [MacroStep]) -> Self {
        Self {
            name,
            steps,
            tap_interval_ms: 0,
        }
    }

    pub const fn with_tap_interval(mut self, ms: u16) -> Self {
        self.tap_interval_ms = ms;
        self
    }

    pub const fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}
