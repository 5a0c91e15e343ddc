//! # Macropad Types
//!
//! Fundamental type definitions shared by the macropad runtime and by keymap definitions.
//!
//! ## Modules
//!
//! - [`action`] - Actions bound to keys and encoders, macro sequences
//! - [`keycode`] - HID keyboard and consumer keycodes, ascii conversion
//! - [`modifier`] - Modifier combinations used by chords and reports

#![no_std]

pub mod action;
pub mod keycode;
pub mod modifier;
