#![allow(dead_code)]

use std::collections::VecDeque;

use embassy_sync::channel::Channel;
use embassy_time::Instant;
use macropad::action::{Action, MacroSequence, MacroStep};
use macropad::channel::REPORT_CHANNEL_SIZE;
use macropad::config::{DebounceConfig, MacropadConfig};
use macropad::controller::feedback::FeedbackSink;
use macropad::debounce::DebouncerTrait;
use macropad::debounce::default_debouncer::DefaultDebouncer;
use macropad::display::{StatusDisplay, TextPosition};
use macropad::event::{Direction, EncoderEvent, KeyPos, LayerChangeEvent};
use macropad::hid::{Report, ReportChannel};
use macropad::input_device::InputDevice;
use macropad::keymap::KeyMap;
use macropad::light::LedStrip;
use macropad::matrix::MatrixTrait;
use macropad::modifier::ModifierCombination;
use macropad::{Macropad, RGB8, a, encoder, k, layer, mc, media, mo, wm};

// Init logger for tests
#[ctor::ctor]
pub fn init_log() {
    let _ = env_logger::builder()
        .filter_level(log::LevelFilter::Debug)
        .is_test(true)
        .try_init();
}

pub const KC_LCTRL: u8 = 1 << 0;
pub const KC_LSHIFT: u8 = 1 << 1;
pub const KC_LGUI: u8 = 1 << 3;

const LCTL: ModifierCombination = ModifierCombination::LCTRL;
const LCTL_LSFT: ModifierCombination = ModifierCombination::LCTRL.union(ModifierCombination::LSHIFT);
const LGUI: ModifierCombination = ModifierCombination::LGUI;
const LGUI_LSFT: ModifierCombination = ModifierCombination::LGUI.union(ModifierCombination::LSHIFT);

pub static GIT_STATUS: MacroSequence = MacroSequence::new("git_status", &[MacroStep::Text("git status\n")]);
// Leaves the cursor between the quotes
pub static GIT_COMMIT: MacroSequence =
    MacroSequence::new("git_commit", &[MacroStep::Text("git commit -m \"\"\n")]).with_tap_interval(10);
pub static GIT_PUSH: MacroSequence = MacroSequence::new("git_push", &[MacroStep::Text("git push\n")]);
pub static COMMENT_BLOCK: MacroSequence = MacroSequence::new(
    "comment_block",
    &[MacroStep::Text(
        "# =============================================\n# \n# =============================================\n",
    )],
);
pub static TODO_COMMENT: MacroSequence = MacroSequence::new("todo", &[MacroStep::Text("// TODO: ")]);
pub static RUN_PYTHON: MacroSequence = MacroSequence::new("run_python", &[MacroStep::Text("python main.py\n")]);

/// Keymap of the 3x3 reference board
pub static KEYMAP: [[[Action; 3]; 3]; 3] = [
    // copy | paste | undo
    // cut  | save  | redo
    // L1   | L2    | screenshot
    layer!([
        [wm!(C, LCTL), wm!(V, LCTL), wm!(Z, LCTL)],
        [wm!(X, LCTL), wm!(S, LCTL), wm!(Y, LCTL)],
        [mo!(1), mo!(2), wm!(S, LGUI_LSFT)]
    ]),
    // git status | terminal | debug
    // git commit | comment  | todo
    // (hold)     | run py   | git push
    layer!([
        [mc!(GIT_STATUS), wm!(Grave, LCTL_LSFT), k!(F5)],
        [mc!(GIT_COMMIT), mc!(COMMENT_BLOCK), mc!(TODO_COMMENT)],
        [a!(Transparent), mc!(RUN_PYTHON), mc!(GIT_PUSH)]
    ]),
    // play/pause | next | prev
    // mute       | vol+ | vol-
    // back       | hold | emoji
    layer!([
        [media!(PlayPause), media!(NextTrack), media!(PrevTrack)],
        [media!(Mute), media!(VolumeIncrement), media!(VolumeDecrement)],
        [media!(Back), a!(Transparent), wm!(Dot, LGUI)]
    ]),
];

/// Volume on layer 0, zoom on layer 1, tracks on layer 2
pub static ENCODERS: [[Action; 1]; 3] = [
    [encoder!(media!(VolumeDecrement), media!(VolumeIncrement))],
    [encoder!(wm!(Minus, LCTL), wm!(Equal, LCTL))],
    [encoder!(media!(PrevTrack), media!(NextTrack))],
];

/// Matrix fed with raw switch states set by the test
pub struct TestMatrix<const ROW: usize, const COL: usize> {
    raw: [[bool; COL]; ROW],
    debouncer: DefaultDebouncer<ROW, COL>,
}

impl<const ROW: usize, const COL: usize> TestMatrix<ROW, COL> {
    pub fn new(config: DebounceConfig) -> Self {
        Self {
            raw: [[false; COL]; ROW],
            debouncer: DefaultDebouncer::new(config),
        }
    }

    pub fn set(&mut self, row: usize, col: usize, pressed: bool) {
        self.raw[row][col] = pressed;
    }
}

impl<const ROW: usize, const COL: usize> MatrixTrait for TestMatrix<ROW, COL> {
    const ROW: usize = ROW;
    const COL: usize = COL;

    fn scan(&mut self, now: Instant, mut on_event: impl FnMut(macropad::event::KeyEvent)) {
        for row in 0..ROW {
            for col in 0..COL {
                let pos = KeyPos::new(row as u8, col as u8);
                if let Some(event) = self.debouncer.process(pos, self.raw[row][col], now) {
                    on_event(event);
                }
            }
        }
    }

    fn reset(&mut self) {
        self.debouncer.reset();
    }
}

/// Encoder which reports the detents queued by the test, one per tick
pub struct TestEncoder {
    id: u8,
    pending: VecDeque<Direction>,
}

impl TestEncoder {
    pub fn new(id: u8) -> Self {
        Self {
            id,
            pending: VecDeque::new(),
        }
    }

    pub fn turn(&mut self, direction: Direction) {
        self.pending.push_back(direction);
    }
}

impl InputDevice for TestEncoder {
    type Event = EncoderEvent;

    fn poll(&mut self, now: Instant) -> Option<EncoderEvent> {
        self.pending.pop_front().map(|direction| EncoderEvent {
            id: self.id,
            direction,
            timestamp: now,
        })
    }
}

#[derive(Default)]
pub struct RecordingStrip {
    pub fills: Vec<RGB8>,
}

impl LedStrip for RecordingStrip {
    type Error = ();

    fn fill(&mut self, color: RGB8) -> Result<(), Self::Error> {
        self.fills.push(color);
        Ok(())
    }
}

#[derive(Default)]
pub struct RecordingDisplay {
    pub lines: Vec<(String, TextPosition)>,
}

impl StatusDisplay for RecordingDisplay {
    type Error = ();

    fn draw_text(&mut self, text: &str, position: TextPosition) -> Result<(), Self::Error> {
        self.lines.push((text.into(), position));
        Ok(())
    }
}

/// Report as seen by the host
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HostReport {
    Keyboard(u8, [u8; 6]),
    Media(u16),
}

impl From<Report> for HostReport {
    fn from(report: Report) -> Self {
        match report {
            Report::KeyboardReport(r) => HostReport::Keyboard(r.modifier, r.keycodes),
            Report::MediaKeyboardReport(r) => HostReport::Media(r.usage_id),
        }
    }
}

/// Keyboard report with one key and the given modifier byte
pub fn kb(modifier: u8, key: u8) -> HostReport {
    HostReport::Keyboard(modifier, [key, 0, 0, 0, 0, 0])
}

pub type CodeMate = Macropad<'static, TestMatrix<3, 3>, TestEncoder, RecordingStrip, RecordingDisplay, 3, 3, 3, 1>;

/// Drives the reference board tick by tick, one tick per millisecond
pub struct Harness {
    pub pad: CodeMate,
    pub channel: &'static ReportChannel<REPORT_CHANNEL_SIZE>,
    pub now: u64,
    pub reports: Vec<HostReport>,
    pub layer_changes: Vec<LayerChangeEvent>,
    /// The host stops reading reports
    pub stalled: bool,
}

impl Harness {
    pub fn new() -> Self {
        let channel: &'static ReportChannel<REPORT_CHANNEL_SIZE> = Box::leak(Box::new(Channel::new()));
        let config = MacropadConfig::default();
        let feedback = FeedbackSink::new(
            RecordingStrip::default(),
            Some(RecordingDisplay::default()),
            config.feedback,
        );
        let pad = Macropad::new(
            TestMatrix::new(config.debounce),
            [TestEncoder::new(0)],
            KeyMap::new(&KEYMAP, Some(&ENCODERS)),
            feedback,
            &config,
            channel,
        );
        let mut harness = Self {
            pad,
            channel,
            now: 0,
            reports: Vec::new(),
            layer_changes: Vec::new(),
            stalled: false,
        };
        // First scan learns the rest state
        harness.tick();
        harness
    }

    pub fn tick(&mut self) {
        if let Some(change) = self.pad.tick(Instant::from_millis(self.now)) {
            self.layer_changes.push(change);
        }
        self.collect_reports();
        self.now += 1;
    }

    /// Tick once per millisecond for `ms` milliseconds
    pub fn advance(&mut self, ms: u64) {
        for _ in 0..ms {
            self.tick();
        }
    }

    pub fn press(&mut self, row: usize, col: usize) {
        self.pad.matrix().set(row, col, true);
    }

    pub fn release(&mut self, row: usize, col: usize) {
        self.pad.matrix().set(row, col, false);
    }

    /// Press a switch and wait until the press is debounced
    pub fn tap_down(&mut self, row: usize, col: usize) {
        self.press(row, col);
        self.advance(12);
    }

    /// Release a switch and wait until the release is debounced
    pub fn tap_up(&mut self, row: usize, col: usize) {
        self.release(row, col);
        self.advance(12);
    }

    pub fn collect_reports(&mut self) {
        if self.stalled {
            return;
        }
        while let Ok(report) = self.channel.try_receive() {
            self.reports.push(report.into());
        }
    }

    pub fn take_reports(&mut self) -> Vec<HostReport> {
        core::mem::take(&mut self.reports)
    }

    /// Tick until the macro player is idle, panics if it takes longer than `max_ms`
    pub fn run_macro(&mut self, max_ms: u64) {
        for _ in 0..max_ms {
            if self.pad.dispatcher().player().is_idle() {
                return;
            }
            self.tick();
        }
        panic!("Macro still playing after {} ms", max_ms);
    }
}

/// Keycodes of the key presses in `reports`, modifiers excluded
pub fn typed_keys(reports: &[HostReport]) -> Vec<u8> {
    let mut typed = Vec::new();
    let mut previous = [0u8; 6];
    for report in reports {
        if let HostReport::Keyboard(_, keycodes) = report {
            for key in keycodes {
                if *key != 0 && !previous.contains(key) {
                    typed.push(*key);
                }
            }
            previous = *keycodes;
        }
    }
    typed
}
