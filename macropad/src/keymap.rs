use heapless::Vec;
use macropad_types::action::Action;

use crate::error::ConfigError;
use crate::event::{Direction, KeyPos};

/// Max number of momentary layer activations held at the same time
pub const MAX_MOMENTARY_DEPTH: usize = 8;

/// Keymap represents the stack of layers.
///
/// Layer 0 is the base layer and is always active. Momentary layers are stacked on top of it,
/// the most recently activated one has the highest precedence. The same layer may be on the
/// stack more than once when several switches hold it.
///
/// The action of a position is the first non-transparent action found walking the stack
/// from the top down to layer 0.
pub struct KeyMap<'a, const ROW: usize, const COL: usize, const NUM_LAYER: usize, const NUM_ENCODER: usize = 0> {
    /// Layers
    layers: &'a [[[Action; COL]; ROW]; NUM_LAYER],
    /// Encoder bindings of each layer
    encoders: Option<&'a [[Action; NUM_ENCODER]; NUM_LAYER]>,
    /// Active momentary layers, in activation order
    momentary: Vec<u8, MAX_MOMENTARY_DEPTH>,
}

impl<'a, const ROW: usize, const COL: usize, const NUM_LAYER: usize, const NUM_ENCODER: usize>
    KeyMap<'a, ROW, COL, NUM_LAYER, NUM_ENCODER>
{
    pub fn new(
        layers: &'a [[[Action; COL]; ROW]; NUM_LAYER],
        encoders: Option<&'a [[Action; NUM_ENCODER]; NUM_LAYER]>,
    ) -> Self {
        Self {
            layers,
            encoders,
            momentary: Vec::new(),
        }
    }

    pub fn num_layers(&self) -> usize {
        NUM_LAYER
    }

    /// Active layers from the highest precedence down to layer 0
    pub fn active_layers(&self) -> impl Iterator<Item = u8> + '_ {
        self.momentary.iter().rev().copied().chain(core::iter::once(0))
    }

    /// The layer with the highest precedence
    pub fn top_layer(&self) -> u8 {
        self.momentary.last().copied().unwrap_or(0)
    }

    /// Resolve the action of a position through the active layers
    pub fn resolve(&self, pos: KeyPos) -> Action {
        let (row, col) = (pos.row as usize, pos.col as usize);
        if row >= ROW || col >= COL {
            warn!("Key {:?} is out of the keymap", pos);
            return Action::No;
        }

        for layer in self.active_layers() {
            let Some(keys) = self.layers.get(layer as usize) else {
                continue;
            };
            let action = keys[row][col];
            if !action.is_transparent() {
                return action;
            }
        }

        error!("Key {:?} is transparent on the base layer", pos);
        Action::No
    }

    /// Resolve the encoder binding of an encoder through the active layers
    pub fn resolve_encoder(&self, id: u8) -> Action {
        let Some(encoders) = self.encoders else {
            return Action::No;
        };
        for layer in self.active_layers() {
            match encoders.get(layer as usize).and_then(|e| e.get(id as usize)) {
                Some(Action::Transparent) => continue,
                Some(action) => return *action,
                None => {
                    warn!("Encoder {} is out of the keymap", id);
                    return Action::No;
                }
            }
        }

        error!("Encoder {} is transparent on the base layer", id);
        Action::No
    }

    /// Resolve the action of one encoder direction.
    ///
    /// Unlike [`resolve_encoder`](Self::resolve_encoder), a transparent direction inside a
    /// binding falls through to lower layers as well.
    pub fn resolve_encoder_direction(&self, id: u8, direction: Direction) -> Action {
        let Some(encoders) = self.encoders else {
            return Action::No;
        };
        for layer in self.active_layers() {
            let Some(binding) = encoders.get(layer as usize).and_then(|e| e.get(id as usize)) else {
                warn!("Encoder {} is out of the keymap", id);
                return Action::No;
            };
            match binding {
                Action::Transparent => continue,
                Action::EncoderBinding { ccw, cw } => {
                    let action = match direction {
                        Direction::Clockwise => **cw,
                        Direction::CounterClockwise => **ccw,
                    };
                    if action.is_transparent() {
                        continue;
                    }
                    return action;
                }
                Action::No => return Action::No,
                _ => {
                    error!("Encoder {} on layer {} is not an encoder binding", id, layer);
                    return Action::No;
                }
            }
        }

        Action::No
    }

    /// Push a momentary layer, returns false if the layer can't be activated
    pub fn activate_momentary(&mut self, layer: u8) -> bool {
        if layer == 0 || layer as usize >= NUM_LAYER {
            warn!("Not a valid momentary layer: {}, total layers: {}", layer, NUM_LAYER);
            return false;
        }
        if self.momentary.push(layer).is_err() {
            warn!("Too many momentary layers, ignore layer {}", layer);
            return false;
        }
        true
    }

    /// Remove the most recent activation of `layer`, no-op if it's not active
    pub fn deactivate_momentary(&mut self, layer: u8) -> bool {
        match self.momentary.iter().rposition(|l| *l == layer) {
            Some(idx) => {
                self.momentary.remove(idx);
                true
            }
            None => false,
        }
    }

    /// Drop all momentary layers
    pub fn reset(&mut self) {
        self.momentary.clear();
    }

    /// Check the keymap for configuration errors, returns the first one found.
    ///
    /// Bindings with errors still resolve at runtime, they're treated as no-ops.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (layer, keys) in self.layers.iter().enumerate() {
            for (row, cols) in keys.iter().enumerate() {
                for (col, action) in cols.iter().enumerate() {
                    let (layer, row, col) = (layer as u8, row as u8, col as u8);
                    match action {
                        Action::Transparent if layer == 0 => {
                            return Err(ConfigError::TransparentBaseKey { row, col });
                        }
                        Action::Momentary(target) => self.check_momentary(layer, *target)?,
                        Action::EncoderBinding { .. } => {
                            return Err(ConfigError::EncoderBindingOnKey { layer, row, col });
                        }
                        _ => (),
                    }
                }
            }
        }

        let Some(encoders) = self.encoders else {
            return Ok(());
        };
        for (layer, bindings) in encoders.iter().enumerate() {
            for (id, binding) in bindings.iter().enumerate() {
                let (layer, id) = (layer as u8, id as u8);
                match binding {
                    Action::Transparent if layer == 0 => {
                        return Err(ConfigError::TransparentBaseEncoder { id });
                    }
                    Action::Transparent | Action::No => (),
                    Action::EncoderBinding { ccw, cw } => {
                        for action in [**ccw, **cw] {
                            match action {
                                Action::EncoderBinding { .. } | Action::Momentary(_) => {
                                    return Err(ConfigError::InvalidEncoderAction { layer, id });
                                }
                                Action::Transparent if layer == 0 => {
                                    return Err(ConfigError::TransparentBaseEncoder { id });
                                }
                                _ => (),
                            }
                        }
                    }
                    _ => return Err(ConfigError::InvalidEncoderAction { layer, id }),
                }
            }
        }

        Ok(())
    }

    fn check_momentary(&self, layer: u8, target: u8) -> Result<(), ConfigError> {
        if target == 0 || target as usize >= NUM_LAYER {
            return Err(ConfigError::InvalidMomentaryLayer { layer, target });
        }
        Ok(())
    }
}
