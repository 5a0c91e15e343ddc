use embassy_time::{Duration, Instant};
use heapless::Vec;
use macropad_types::action::{MacroSequence, MacroStep};
use macropad_types::keycode::{HidKeyCode, KeyCode, from_ascii};

use crate::event::OutputEvent;

/// Max number of keys a macro can hold down at the same time
pub const MACRO_MAX_HELD_KEYS: usize = 8;

/// State of the [`MacroPlayer`]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MacroState {
    Idle,
    Running,
    WaitingDelay,
}

/// The smallest unit the player executes, one per tick
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum MacroOperation {
    Press(KeyCode),
    Release(KeyCode),
    Wait(u16),
}

type Operations = Vec<MacroOperation, 5>;

/// Expand `unit` of a step into operations. A unit is one char for `Text` steps, the whole
/// step otherwise. Returns `None` when the step has no such unit.
fn expand(step: MacroStep, unit: usize, tap_interval: u16) -> Option<Operations> {
    let mut ops = Operations::new();
    let tap = |ops: &mut Operations, key: KeyCode| {
        ops.push(MacroOperation::Press(key)).ok();
        ops.push(MacroOperation::Release(key)).ok();
    };
    match step {
        MacroStep::KeyDown(k) if unit == 0 => ops.push(MacroOperation::Press(k)).ok()?,
        MacroStep::KeyUp(k) if unit == 0 => ops.push(MacroOperation::Release(k)).ok()?,
        MacroStep::Delay(ms) if unit == 0 => ops.push(MacroOperation::Wait(ms)).ok()?,
        MacroStep::Tap(k) if unit == 0 => tap(&mut ops, k),
        MacroStep::Text(text) => {
            let c = *text.as_bytes().get(unit)?;
            match from_ascii(c) {
                (HidKeyCode::No, _) => {
                    warn!("Unsupported char in macro text: {}", c);
                    // Skipped, nothing to execute for this unit
                    return Some(ops);
                }
                (key, true) => {
                    ops.push(MacroOperation::Press(HidKeyCode::LShift.into())).ok();
                    tap(&mut ops, key.into());
                    ops.push(MacroOperation::Release(HidKeyCode::LShift.into())).ok();
                }
                (key, false) => tap(&mut ops, key.into()),
            }
        }
        _ => return None,
    }
    if tap_interval > 0 && matches!(step, MacroStep::Tap(_) | MacroStep::Text(_)) {
        ops.push(MacroOperation::Wait(tap_interval)).ok();
    }
    Some(ops)
}

/// Position of the next operation in a sequence
#[derive(Clone, Copy, Debug, Default)]
struct Cursor {
    step: usize,
    unit: usize,
    op: usize,
}

impl Cursor {
    /// Get the next operation and move forward
    fn next(&mut self, sequence: &MacroSequence) -> Option<MacroOperation> {
        loop {
            let step = *sequence.steps.get(self.step)?;
            match expand(step, self.unit, sequence.tap_interval_ms) {
                Some(ops) => {
                    if let Some(op) = ops.get(self.op) {
                        self.op += 1;
                        return Some(*op);
                    }
                    self.unit += 1;
                    self.op = 0;
                }
                None => {
                    self.step += 1;
                    self.unit = 0;
                    self.op = 0;
                }
            }
        }
    }
}

struct ActiveMacro {
    sequence: &'static MacroSequence,
    cursor: Cursor,
    /// Set while waiting for a delay
    wake_at: Option<Instant>,
}

impl ActiveMacro {
    fn is_exhausted(&self) -> bool {
        let mut cursor = self.cursor;
        self.wake_at.is_none() && cursor.next(self.sequence).is_none()
    }
}

/// Plays one macro at a time, one operation per tick.
///
/// Delays never block: the player records a wake time and checks it on every tick.
pub struct MacroPlayer {
    active: Option<ActiveMacro>,
    /// Keys pressed by the macro and not released yet
    held: Vec<KeyCode, MACRO_MAX_HELD_KEYS>,
    /// Triggers ignored because a macro was already running
    dropped: u32,
}

impl Default for MacroPlayer {
    fn default() -> Self {
        Self::new()
    }
}

impl MacroPlayer {
    pub const fn new() -> Self {
        Self {
            active: None,
            held: Vec::new(),
            dropped: 0,
        }
    }

    pub fn state(&self) -> MacroState {
        match &self.active {
            None => MacroState::Idle,
            Some(active) if active.wake_at.is_some() => MacroState::WaitingDelay,
            Some(_) => MacroState::Running,
        }
    }

    pub fn is_idle(&self) -> bool {
        self.active.is_none()
    }

    /// The macro being played
    pub fn current(&self) -> Option<&'static MacroSequence> {
        self.active.as_ref().map(|a| a.sequence)
    }

    /// Number of triggers dropped because another macro was running
    pub fn dropped_triggers(&self) -> u32 {
        self.dropped
    }

    /// Start playing a macro from the next tick on.
    ///
    /// Macros are not queued: if one is already playing the new one is dropped and false is returned.
    pub fn start(&mut self, sequence: &'static MacroSequence) -> bool {
        if let Some(active) = &self.active {
            self.dropped = self.dropped.wrapping_add(1);
            warn!(
                "Macro {} is running, drop trigger of macro {}",
                active.sequence.name, sequence.name
            );
            return false;
        }
        debug!("Start macro {}", sequence.name);
        self.active = Some(ActiveMacro {
            sequence,
            cursor: Cursor::default(),
            wake_at: None,
        });
        true
    }

    /// Execute at most one key operation of the playing macro
    pub fn tick(&mut self, now: Instant, mut emit: impl FnMut(OutputEvent)) {
        let Some(active) = &mut self.active else {
            return;
        };

        loop {
            if let Some(wake_at) = active.wake_at {
                if now < wake_at {
                    return;
                }
                active.wake_at = None;
            }

            match active.cursor.next(active.sequence) {
                Some(MacroOperation::Press(key)) => {
                    emit(OutputEvent::down(key));
                    if self.held.push(key).is_err() {
                        warn!("Too many keys held by macro, {:?} won't be auto released", key);
                    }
                    break;
                }
                Some(MacroOperation::Release(key)) => {
                    emit(OutputEvent::up(key));
                    if let Some(idx) = self.held.iter().position(|k| *k == key) {
                        self.held.remove(idx);
                    }
                    break;
                }
                Some(MacroOperation::Wait(ms)) => {
                    active.wake_at = Some(now + Duration::from_millis(ms as u64));
                    if ms > 0 {
                        return;
                    }
                }
                None => break,
            }
        }

        if active.is_exhausted() {
            self.finish(emit);
        }
    }

    /// Stop the playing macro, releasing every key it holds.
    ///
    /// Returns false if no macro was playing.
    pub fn cancel(&mut self, emit: impl FnMut(OutputEvent)) -> bool {
        let Some(active) = self.active.take() else {
            return false;
        };
        info!("Cancel macro {}", active.sequence.name);
        self.release_held(emit);
        true
    }

    fn finish(&mut self, emit: impl FnMut(OutputEvent)) {
        if let Some(active) = self.active.take() {
            if !self.held.is_empty() {
                warn!("Macro {} ended with keys held, release them", active.sequence.name);
            }
            debug!("Macro {} done", active.sequence.name);
        }
        self.release_held(emit);
    }

    fn release_held(&mut self, mut emit: impl FnMut(OutputEvent)) {
        while let Some(key) = self.held.pop() {
            emit(OutputEvent::up(key));
        }
    }
}
