use embassy_time::Instant;
use heapless::{Deque, Vec};
use macropad_types::action::{Action, MacroSequence};
use macropad_types::keycode::KeyCode;
use macropad_types::modifier::ModifierCombination;

use crate::event::{EncoderEvent, KeyEvent, KeyPos, LayerChangeEvent, OutputEvent};
use crate::keyboard_macros::MacroPlayer;
use crate::keymap::KeyMap;

/// Capacity of the output queue, drained by the pipeline after every tick
pub const OUTPUT_QUEUE_SIZE: usize = 64;

/// Max number of macro keys whose release waits for their macro to finish
const MAX_DEFERRED_RELEASES: usize = 4;

/// What a pressed switch resolved to when it was pressed.
///
/// The release of a switch always undoes its press-time action, whatever the layers are by then.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
enum HeldAction {
    Key(KeyCode),
    KeyWithModifier(KeyCode, ModifierCombination),
    Layer(u8),
    Macro(&'static MacroSequence),
    /// Nothing to undo on release
    Ignored,
}

/// Merges key events, encoder events and macro playback into one ordered output stream.
///
/// Call [`tick`](Self::tick) once per scan, then drain the produced events with
/// [`drain_output`](Self::drain_output).
pub struct ActionDispatcher<'a, const ROW: usize, const COL: usize, const NUM_LAYER: usize, const NUM_ENCODER: usize = 0>
{
    keymap: KeyMap<'a, ROW, COL, NUM_LAYER, NUM_ENCODER>,
    player: MacroPlayer,
    /// Press-time action of every held switch
    held: [[Option<HeldAction>; COL]; ROW],
    /// The switch which started the playing macro
    macro_owner: Option<KeyPos>,
    deferred_releases: Vec<KeyPos, MAX_DEFERRED_RELEASES>,
    output: Deque<OutputEvent, OUTPUT_QUEUE_SIZE>,
    output_overflows: u32,
    /// Top layer at the end of the previous tick
    last_layer: u8,
}

impl<'a, const ROW: usize, const COL: usize, const NUM_LAYER: usize, const NUM_ENCODER: usize>
    ActionDispatcher<'a, ROW, COL, NUM_LAYER, NUM_ENCODER>
{
    pub fn new(keymap: KeyMap<'a, ROW, COL, NUM_LAYER, NUM_ENCODER>) -> Self {
        Self {
            keymap,
            player: MacroPlayer::new(),
            held: [[None; COL]; ROW],
            macro_owner: None,
            deferred_releases: Vec::new(),
            output: Deque::new(),
            output_overflows: 0,
            last_layer: 0,
        }
    }

    pub fn keymap(&self) -> &KeyMap<'a, ROW, COL, NUM_LAYER, NUM_ENCODER> {
        &self.keymap
    }

    pub fn player(&self) -> &MacroPlayer {
        &self.player
    }

    /// Number of output events lost because the queue was full
    pub fn output_overflows(&self) -> u32 {
        self.output_overflows
    }

    /// Run a whole tick: key events first, then encoder events, then one macro step.
    pub fn tick(
        &mut self,
        now: Instant,
        key_events: impl IntoIterator<Item = KeyEvent>,
        encoder_events: impl IntoIterator<Item = EncoderEvent>,
    ) -> Option<LayerChangeEvent> {
        for event in key_events {
            self.process_key_event(event);
        }
        for event in encoder_events {
            self.process_encoder_event(event);
        }
        self.finish_tick(now)
    }

    /// Process a debounced switch transition
    pub fn process_key_event(&mut self, event: KeyEvent) {
        let (row, col) = (event.pos.row as usize, event.pos.col as usize);
        if row >= ROW || col >= COL {
            warn!("Key event out of the keymap: {:?}", event);
            return;
        }

        if event.pressed {
            self.press(event.pos);
        } else {
            self.release(event.pos);
        }
    }

    fn press(&mut self, pos: KeyPos) {
        // A previous release of this switch may still wait for its macro
        if let Some(idx) = self.deferred_releases.iter().position(|p| *p == pos) {
            self.deferred_releases.remove(idx);
            self.finish_release(pos);
        }
        if self.held[pos.row as usize][pos.col as usize].is_some() {
            warn!("Key {:?} pressed twice without release", pos);
            self.finish_release(pos);
        }

        let action = self.keymap.resolve(pos);
        debug!("Press {:?}: {:?}", pos, action);
        let held = match action {
            Action::No | Action::Transparent => HeldAction::Ignored,
            Action::Emit(key) => {
                self.emit(OutputEvent::down(key));
                HeldAction::Key(key)
            }
            Action::EmitWithModifier(key, modifiers) => {
                for m in modifiers.keycodes() {
                    self.emit(OutputEvent::down(m));
                }
                self.emit(OutputEvent::down(key));
                HeldAction::KeyWithModifier(key, modifiers)
            }
            Action::Momentary(layer) => {
                if self.keymap.activate_momentary(layer) {
                    HeldAction::Layer(layer)
                } else {
                    HeldAction::Ignored
                }
            }
            Action::Macro(sequence) => {
                if self.player.start(sequence) {
                    self.macro_owner = Some(pos);
                    HeldAction::Macro(sequence)
                } else {
                    HeldAction::Ignored
                }
            }
            Action::EncoderBinding { .. } => {
                error!("Key {:?} is bound to an encoder action, ignored", pos);
                HeldAction::Ignored
            }
        };
        self.held[pos.row as usize][pos.col as usize] = Some(held);
    }

    fn release(&mut self, pos: KeyPos) {
        let Some(held) = self.held[pos.row as usize][pos.col as usize] else {
            debug!("Key {:?} released without a press, ignored", pos);
            return;
        };

        if matches!(held, HeldAction::Macro(_)) && self.macro_owner == Some(pos) && !self.player.is_idle() {
            if self.deferred_releases.contains(&pos) {
                return;
            }
            if self.deferred_releases.push(pos).is_ok() {
                debug!("Macro of key {:?} is playing, defer its release", pos);
                return;
            }
            warn!("Too many deferred releases, release {:?} now", pos);
        }

        self.finish_release(pos);
    }

    /// Undo the press-time action of a switch
    fn finish_release(&mut self, pos: KeyPos) {
        let Some(held) = self.held[pos.row as usize][pos.col as usize].take() else {
            return;
        };
        debug!("Release {:?}: {:?}", pos, held);
        match held {
            HeldAction::Key(key) => self.emit(OutputEvent::up(key)),
            HeldAction::KeyWithModifier(key, modifiers) => {
                self.emit(OutputEvent::up(key));
                for m in modifiers.keycodes().rev() {
                    self.emit(OutputEvent::up(m));
                }
            }
            HeldAction::Layer(layer) => {
                self.keymap.deactivate_momentary(layer);
            }
            HeldAction::Macro(_) => {
                if self.macro_owner == Some(pos) {
                    self.macro_owner = None;
                }
            }
            HeldAction::Ignored => (),
        }
    }

    /// Process one encoder detent, its action is pressed and released at once
    pub fn process_encoder_event(&mut self, event: EncoderEvent) {
        let action = self.keymap.resolve_encoder_direction(event.id, event.direction);
        debug!("Encoder {} {:?}: {:?}", event.id, event.direction, action);
        match action {
            Action::No | Action::Transparent => (),
            Action::Emit(key) => {
                self.emit(OutputEvent::down(key));
                self.emit(OutputEvent::up(key));
            }
            Action::EmitWithModifier(key, modifiers) => {
                for m in modifiers.keycodes() {
                    self.emit(OutputEvent::down(m));
                }
                self.emit(OutputEvent::down(key));
                self.emit(OutputEvent::up(key));
                for m in modifiers.keycodes().rev() {
                    self.emit(OutputEvent::up(m));
                }
            }
            Action::Macro(sequence) => {
                self.player.start(sequence);
            }
            Action::Momentary(layer) => {
                warn!("Encoder {} can't hold layer {}, ignored", event.id, layer);
            }
            Action::EncoderBinding { .. } => {
                error!("Nested encoder binding of encoder {}, ignored", event.id);
            }
        }
    }

    /// Step the macro player once and report a layer change, if any.
    ///
    /// The layer is compared with the one at the end of the previous tick, so layers
    /// toggled back and forth within a tick don't raise a notification.
    pub fn finish_tick(&mut self, now: Instant) -> Option<LayerChangeEvent> {
        let (output, overflows) = (&mut self.output, &mut self.output_overflows);
        self.player.tick(now, |e| enqueue(output, overflows, e));

        if self.player.is_idle() {
            self.flush_deferred_releases();
            // A switch still held after its macro ended no longer owns the player
            self.macro_owner = None;
        }

        let layer = self.keymap.top_layer();
        if layer == self.last_layer {
            return None;
        }
        info!("Layer changed: {} -> {}", self.last_layer, layer);
        self.last_layer = layer;
        Some(LayerChangeEvent { layer })
    }

    /// Take the output events produced so far, in order
    pub fn drain_output(&mut self) -> impl Iterator<Item = OutputEvent> + '_ {
        core::iter::from_fn(move || self.output.pop_front())
    }

    /// Stop the playing macro, releasing the keys it holds
    pub fn cancel_macro(&mut self) -> bool {
        let (output, overflows) = (&mut self.output, &mut self.output_overflows);
        let cancelled = self.player.cancel(|e| enqueue(output, overflows, e));
        self.flush_deferred_releases();
        cancelled
    }

    /// Release everything: the macro, every held key and every momentary layer.
    ///
    /// The resulting layer change is reported by the next tick.
    pub fn reset(&mut self) {
        info!("Reset dispatcher");
        self.cancel_macro();
        for row in 0..ROW {
            for col in 0..COL {
                self.finish_release(KeyPos::new(row as u8, col as u8));
            }
        }
        self.keymap.reset();
        self.macro_owner = None;
    }

    fn flush_deferred_releases(&mut self) {
        while let Some(pos) = self.deferred_releases.pop() {
            self.finish_release(pos);
        }
    }

    fn emit(&mut self, event: OutputEvent) {
        enqueue(&mut self.output, &mut self.output_overflows, event);
    }
}

fn enqueue(output: &mut Deque<OutputEvent, OUTPUT_QUEUE_SIZE>, overflows: &mut u32, event: OutputEvent) {
    if output.push_back(event).is_err() {
        *overflows = overflows.wrapping_add(1);
        error!("Output queue is full, drop {:?}", event);
    }
}
