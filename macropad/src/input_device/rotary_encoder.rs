//! General rotary encoder
//!
//! Quadrature decoding uses the same transition table as QMK: each valid gray-code
//! step counts ±1, a detent is reported after `resolution` steps in one direction.
use embassy_time::{Duration, Instant};
use embedded_hal::digital::InputPin;

use super::InputDevice;
use crate::config::EncoderConfig;
use crate::event::{Direction, EncoderEvent};

/// Pulse of each transition, indexed by `prev_state << 2 | state`, where a state is `A << 1 | B`.
/// Positive pulses are clockwise.
const LUT: [i8; 16] = [0, -1, 1, 0, 1, 0, 0, -1, -1, 0, 0, 1, 0, 1, -1, 0];

/// Decodes raw (A, B) readings of one encoder into detent events.
#[derive(Clone, Debug)]
pub struct EncoderTracker {
    /// The index of the rotary encoder
    id: u8,
    /// Last (A, B) state, `None` before the first reading
    state: Option<u8>,
    /// Accumulated steps of the current detent
    pulses: i8,
    resolution: u8,
    reverse: bool,
    chatter_window: Duration,
    /// Time of the last reported detent
    last_event: Option<Instant>,
}

impl EncoderTracker {
    pub fn new(id: u8, config: EncoderConfig) -> Self {
        Self {
            id,
            state: None,
            pulses: 0,
            resolution: config.resolution.clamp(1, i8::MAX as u8),
            reverse: config.reverse,
            chatter_window: config.chatter_window,
            last_event: None,
        }
    }

    pub fn id(&self) -> u8 {
        self.id
    }

    /// Feed one reading of both encoder lines.
    pub fn process(&mut self, pin_a: bool, pin_b: bool, now: Instant) -> Option<EncoderEvent> {
        let state = ((pin_a as u8) << 1) | pin_b as u8;
        // The first reading only sets the state
        let prev = self.state.replace(state)?;
        if prev == state {
            return None;
        }

        if prev ^ state == 0b11 {
            // Both lines changed at once, a step was missed or it's noise
            trace!("Encoder {} skipped a step, drop partial detent", self.id);
            self.pulses = 0;
            return None;
        }

        self.pulses += LUT[((prev << 2) | state) as usize];
        if self.pulses.unsigned_abs() < self.resolution {
            return None;
        }

        let clockwise = (self.pulses > 0) != self.reverse;
        self.pulses = 0;
        let direction = if clockwise {
            Direction::Clockwise
        } else {
            Direction::CounterClockwise
        };

        if let Some(last) = self.last_event
            && now.saturating_duration_since(last) < self.chatter_window
        {
            debug!("Encoder {} chatter, drop {:?}", self.id, direction);
            return None;
        }
        self.last_event = Some(now);

        Some(EncoderEvent {
            id: self.id,
            direction,
            timestamp: now,
        })
    }

    /// Forget the state, the next reading becomes the new reference
    pub fn reset(&mut self) {
        self.state = None;
        self.pulses = 0;
        self.last_event = None;
    }
}

/// Holds both [`InputPin`](https://docs.rs/embedded-hal/latest/embedded_hal/digital/trait.InputPin.html)s
/// and the decoder of one encoder. The pins are active low.
pub struct RotaryEncoder<A: InputPin, B: InputPin> {
    pin_a: A,
    pin_b: B,
    tracker: EncoderTracker,
}

impl<A: InputPin, B: InputPin> RotaryEncoder<A, B> {
    pub fn new(pin_a: A, pin_b: B, id: u8, config: EncoderConfig) -> Self {
        Self {
            pin_a,
            pin_b,
            tracker: EncoderTracker::new(id, config),
        }
    }

    /// Read both pins and decode. A failed read skips this tick.
    pub fn read(&mut self, now: Instant) -> Option<EncoderEvent> {
        let (Ok(a), Ok(b)) = (self.pin_a.is_low(), self.pin_b.is_low()) else {
            return None;
        };
        self.tracker.process(a, b, now)
    }

    pub fn tracker(&mut self) -> &mut EncoderTracker {
        &mut self.tracker
    }

    /// Consumes this encoder, returning the underlying pins `A` and `B`.
    pub fn into_inner(self) -> (A, B) {
        (self.pin_a, self.pin_b)
    }
}

impl<A: InputPin, B: InputPin> InputDevice for RotaryEncoder<A, B> {
    type Event = EncoderEvent;

    fn poll(&mut self, now: Instant) -> Option<EncoderEvent> {
        self.read(now)
    }
}
