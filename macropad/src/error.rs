//! Configuration errors found when validating a keymap
//!
//! None of these errors stop the device: the affected binding is logged and treated as a no-op.

use core::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// A key of the base layer is transparent, there is nothing below to fall through to
    TransparentBaseKey { row: u8, col: u8 },
    /// The base layer encoder binding is transparent
    TransparentBaseEncoder { id: u8 },
    /// A momentary binding targets layer 0 or a layer that doesn't exist
    InvalidMomentaryLayer { layer: u8, target: u8 },
    /// An encoder binding is placed on a switch
    EncoderBindingOnKey { layer: u8, row: u8, col: u8 },
    /// The encoder table holds something other than an encoder binding
    InvalidEncoderAction { layer: u8, id: u8 },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::TransparentBaseKey { row, col } => {
                write!(f, "Key ({}, {}) is transparent on the base layer", row, col)
            }
            ConfigError::TransparentBaseEncoder { id } => {
                write!(f, "Encoder {} is transparent on the base layer", id)
            }
            ConfigError::InvalidMomentaryLayer { layer, target } => {
                write!(f, "Momentary binding on layer {} targets invalid layer {}", layer, target)
            }
            ConfigError::EncoderBindingOnKey { layer, row, col } => {
                write!(f, "Encoder binding on key ({}, {}) of layer {}", row, col, layer)
            }
            ConfigError::InvalidEncoderAction { layer, id } => {
                write!(f, "Encoder {} of layer {} is not an encoder binding", id, layer)
            }
        }
    }
}

impl core::error::Error for ConfigError {}
