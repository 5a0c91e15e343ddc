use embassy_time::{Duration, Instant};

use super::DebouncerTrait;
use crate::config::DebounceConfig;
use crate::event::{KeyEvent, KeyPos};

/// Tracks the debounce state of a single key.
#[derive(Copy, Clone, Debug, PartialEq)]
enum DebounceCounter {
    /// The raw reading equals the reported state
    Idle,
    /// The raw reading differs from the reported state.
    /// The payload is the time the differing reading was first seen.
    Debouncing(Instant),
}

/// The last state reported for a key
#[derive(Copy, Clone, Debug, PartialEq)]
enum StableState {
    /// Never scanned
    Unknown,
    Released,
    Pressed,
    /// Found closed on the first scan, its release is absorbed
    HeldAtBoot,
}

impl StableState {
    fn pressed(self) -> bool {
        matches!(self, StableState::Pressed | StableState::HeldAtBoot)
    }
}

#[derive(Copy, Clone, Debug)]
struct KeyDebounce {
    counter: DebounceCounter,
    state: StableState,
}

impl KeyDebounce {
    const INIT: Self = Self {
        counter: DebounceCounter::Idle,
        state: StableState::Unknown,
    };
}

/// Time based debouncer: a new raw state is reported once it has been seen
/// continuously for the whole window.
pub struct DefaultDebouncer<const ROW: usize, const COL: usize> {
    keys: [[KeyDebounce; COL]; ROW],
    window: Duration,
}

impl<const ROW: usize, const COL: usize> Default for DefaultDebouncer<ROW, COL> {
    fn default() -> Self {
        Self::new(DebounceConfig::default())
    }
}

impl<const ROW: usize, const COL: usize> DefaultDebouncer<ROW, COL> {
    pub fn new(config: DebounceConfig) -> Self {
        DefaultDebouncer {
            keys: [[KeyDebounce::INIT; COL]; ROW],
            window: config.window,
        }
    }
}

impl<const ROW: usize, const COL: usize> DebouncerTrait for DefaultDebouncer<ROW, COL> {
    fn process(&mut self, pos: KeyPos, pressed: bool, now: Instant) -> Option<KeyEvent> {
        let Some(key) = self
            .keys
            .get_mut(pos.row as usize)
            .and_then(|r| r.get_mut(pos.col as usize))
        else {
            warn!("Debouncer got out of range position {:?}", pos);
            return None;
        };

        // The first reading is the rest state
        if key.state == StableState::Unknown {
            key.state = if pressed {
                debug!("Key {:?} is held at boot, ignore it until released", pos);
                StableState::HeldAtBoot
            } else {
                StableState::Released
            };
            return None;
        }

        // Contradicting or stable reading, drop the candidate
        if key.state.pressed() == pressed {
            key.counter = DebounceCounter::Idle;
            return None;
        }

        let start = match key.counter {
            DebounceCounter::Idle => {
                key.counter = DebounceCounter::Debouncing(now);
                now
            }
            DebounceCounter::Debouncing(start) => start,
        };

        if now.saturating_duration_since(start) < self.window {
            return None;
        }

        key.counter = DebounceCounter::Idle;
        let held_at_boot = key.state == StableState::HeldAtBoot;
        key.state = if pressed {
            StableState::Pressed
        } else {
            StableState::Released
        };
        if held_at_boot {
            trace!("Key {:?} held at boot is released", pos);
            return None;
        }

        Some(KeyEvent {
            pos,
            pressed,
            timestamp: now,
        })
    }

    fn reset(&mut self) {
        self.keys = [[KeyDebounce::INIT; COL]; ROW];
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn at(ms: u64) -> Instant {
        Instant::from_millis(ms)
    }

    fn debouncer() -> DefaultDebouncer<1, 2> {
        DefaultDebouncer::new(DebounceConfig {
            window: Duration::from_millis(10),
        })
    }

    #[test]
    fn test_first_reading_is_rest_state() {
        let mut d = debouncer();
        let pos = KeyPos::new(0, 0);
        assert_eq!(d.process(pos, false, at(0)), None);
        assert_eq!(d.process(pos, false, at(20)), None);
    }

    #[test]
    fn test_press_confirmed_after_window() {
        let mut d = debouncer();
        let pos = KeyPos::new(0, 1);
        d.process(pos, false, at(0));
        assert_eq!(d.process(pos, true, at(1)), None);
        assert_eq!(d.process(pos, true, at(10)), None);
        let event = d.process(pos, true, at(11)).unwrap();
        assert!(event.pressed);
        assert_eq!(event.pos, pos);
        assert_eq!(event.timestamp, at(11));
        // Stable afterwards
        assert_eq!(d.process(pos, true, at(30)), None);
    }

    #[test]
    fn test_bounce_resets_candidate() {
        let mut d = debouncer();
        let pos = KeyPos::new(0, 0);
        d.process(pos, false, at(0));
        d.process(pos, true, at(1));
        d.process(pos, true, at(8));
        // Contact bounce, back to open
        d.process(pos, false, at(9));
        assert_eq!(d.process(pos, true, at(12)), None);
        assert_eq!(d.process(pos, true, at(21)), None);
        assert!(d.process(pos, true, at(22)).unwrap().pressed);
    }

    #[test]
    fn test_held_at_boot_release_is_absorbed() {
        let mut d = debouncer();
        let pos = KeyPos::new(0, 0);
        assert_eq!(d.process(pos, true, at(0)), None);
        d.process(pos, false, at(5));
        assert_eq!(d.process(pos, false, at(15)), None);
        d.process(pos, true, at(20));
        assert!(d.process(pos, true, at(30)).unwrap().pressed);
    }

    #[test]
    fn test_zero_window_and_out_of_range() {
        let mut d = DefaultDebouncer::<1, 1>::new(DebounceConfig {
            window: Duration::from_millis(0),
        });
        let pos = KeyPos::new(0, 0);
        d.process(pos, false, at(0));
        assert!(d.process(pos, true, at(1)).is_some());
        assert_eq!(d.process(KeyPos::new(3, 0), true, at(2)), None);
        d.reset();
        assert_eq!(d.process(pos, true, at(3)), None);
    }
}
