//! Input devices other than the key matrix
//!
//! Every device is polled once per tick by the pipeline, nothing here waits on hardware.

use core::future::Future;

use embassy_time::Instant;

use crate::event::EncoderEvent;

pub mod rotary_encoder;

/// The trait for polled input devices.
pub trait InputDevice {
    type Event;

    /// Sample the device, returns an event when the sample completes one
    fn poll(&mut self, now: Instant) -> Option<Self::Event>;
}

/// Stand-in encoder type for boards without encoders, never produces an event
pub struct NoEncoder;

impl InputDevice for NoEncoder {
    type Event = EncoderEvent;

    fn poll(&mut self, _now: Instant) -> Option<EncoderEvent> {
        None
    }
}

/// A long running task, e.g. the whole pipeline driven by a ticker
///
/// ```ignore
/// let mut macropad = Macropad::new(...);
/// macropad.run().await;
/// ```
pub trait Runnable {
    fn run(&mut self) -> impl Future<Output = ()>;
}
