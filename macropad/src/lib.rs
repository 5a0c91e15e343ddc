//! Event pipeline of a programmable macropad.
//!
//! Raw switch and encoder readings go through debouncing, layer resolution and macro
//! playback, and come out as an ordered stream of key events, HID reports and
//! layer feedback for the LED strip and the status display.
//!
//! ## Feature flags
#![doc = document_features::document_features!()]
#![no_std]

// This mod MUST go first, so that the others see its macros.
#[macro_use]
pub(crate) mod fmt;

pub mod channel;
pub mod config;
pub mod controller;
pub mod debounce;
pub mod dispatcher;
pub mod display;
pub mod error;
pub mod event;
pub mod hid;
pub mod input_device;
pub mod keyboard_macros;
pub mod keymap;
pub mod layout_macro;
pub mod light;
pub mod macropad;
pub mod matrix;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
pub use embassy_futures;
pub use embassy_time;
pub use macropad_types::{action, keycode, modifier};
pub use smart_leds::RGB8;

pub use crate::macropad::Macropad;

pub type RawMutex = CriticalSectionRawMutex;
