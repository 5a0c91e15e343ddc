//! Controllers drive output devices other than the host connection
//!
//! A controller receives events from the pipeline and updates its devices.
//! Hardware errors are logged by the controller and never reach the pipeline.

pub mod feedback;

/// This trait provides the interface for individual output device controllers.
pub trait Controller {
    /// Type of the received events
    type Event;

    /// Process a received event
    fn process_event(&mut self, event: Self::Event);
}
