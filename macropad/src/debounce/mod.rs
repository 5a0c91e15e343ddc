use embassy_time::Instant;

use crate::event::{KeyEvent, KeyPos};

pub mod default_debouncer;

pub trait DebouncerTrait {
    /// Feed one raw reading of the switch at `pos`, taken at `now`.
    ///
    /// Returns a debounced event when a transition is confirmed.
    fn process(&mut self, pos: KeyPos, pressed: bool, now: Instant) -> Option<KeyEvent>;

    /// Forget all filter state, the next reading of each switch becomes its rest state
    fn reset(&mut self);
}
