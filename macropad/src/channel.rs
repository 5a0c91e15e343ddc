//! Exposed channels which can be used to share data across tasks

pub use embassy_sync::{blocking_mutex, channel};

use crate::hid::ReportChannel;

/// Capacity of the report channel between the pipeline and the host transport
pub const REPORT_CHANNEL_SIZE: usize = 16;

/// Channel for keyboard reports from the pipeline to the hid writer
pub static KEYBOARD_REPORT_CHANNEL: ReportChannel<REPORT_CHANNEL_SIZE> = channel::Channel::new();
