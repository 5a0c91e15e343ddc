pub mod common;

use common::*;
use macropad::config::DEFAULT_LAYER_COLORS;
use macropad::display::TextPosition;
use macropad::event::{Direction, LayerChangeEvent};

const KC_C: u8 = 0x06;
const KC_S: u8 = 0x16;

#[test]
fn test_copy_chord() {
    let mut h = Harness::new();
    h.tap_down(0, 0);
    assert_eq!(h.take_reports(), vec![kb(KC_LCTRL, 0), kb(KC_LCTRL, KC_C)]);
    h.tap_up(0, 0);
    assert_eq!(h.take_reports(), vec![kb(KC_LCTRL, 0), kb(0, 0)]);
}

#[test]
fn test_bouncing_press_reports_once() {
    let mut h = Harness::new();
    h.press(0, 0);
    h.advance(2);
    h.release(0, 0);
    h.advance(2);
    h.press(0, 0);
    h.advance(3);
    h.release(0, 0);
    h.advance(1);
    h.press(0, 0);
    // Not stable for the whole window yet
    h.advance(9);
    assert!(h.take_reports().is_empty());
    h.advance(10);
    assert_eq!(h.take_reports(), vec![kb(KC_LCTRL, 0), kb(KC_LCTRL, KC_C)]);
}

#[test]
fn test_short_glitch_is_ignored() {
    let mut h = Harness::new();
    h.press(1, 1);
    h.advance(5);
    h.release(1, 1);
    h.advance(20);
    assert!(h.take_reports().is_empty());
}

#[test]
fn test_screenshot_chord() {
    let mut h = Harness::new();
    h.tap_down(2, 2);
    let reports = h.take_reports();
    assert_eq!(reports.last(), Some(&kb(KC_LSHIFT | KC_LGUI, KC_S)));
    h.tap_up(2, 2);
    assert_eq!(h.take_reports().last(), Some(&kb(0, 0)));
}

#[test]
fn test_feedback_init() {
    let mut h = Harness::new();
    let feedback = h.pad.feedback();
    assert_eq!(feedback.led().fills, vec![DEFAULT_LAYER_COLORS[0]]);
    let display = feedback.display().unwrap();
    assert_eq!(display.lines[0], (String::from("CodeMate"), TextPosition::new(0, 0)));
    assert_eq!(display.lines[1], (String::from("L: 0"), TextPosition::new(0, 16)));
}

#[test]
fn test_layer_feedback() {
    let mut h = Harness::new();
    h.tap_down(2, 0);
    assert_eq!(h.layer_changes, vec![LayerChangeEvent { layer: 1 }]);
    assert!(h.take_reports().is_empty());
    {
        let feedback = h.pad.feedback();
        assert_eq!(feedback.led().fills.last(), Some(&DEFAULT_LAYER_COLORS[1]));
        let line = feedback.display().unwrap().lines.last().unwrap().clone();
        assert_eq!(line, (String::from("L: 1"), TextPosition::new(0, 16)));
    }

    h.tap_up(2, 0);
    assert_eq!(
        h.layer_changes,
        vec![LayerChangeEvent { layer: 1 }, LayerChangeEvent { layer: 0 }]
    );
    let feedback = h.pad.feedback();
    assert_eq!(feedback.led().fills.last(), Some(&DEFAULT_LAYER_COLORS[0]));
    assert_eq!(feedback.display().unwrap().lines.last().unwrap().0, "L: 0");
}

#[test]
fn test_momentary_layer_key() {
    let mut h = Harness::new();
    h.tap_down(2, 1);
    assert_eq!(h.pad.dispatcher().keymap().top_layer(), 2);

    h.tap_down(1, 1);
    assert_eq!(h.take_reports(), vec![HostReport::Media(0xE9)]);
    h.tap_up(1, 1);
    assert_eq!(h.take_reports(), vec![HostReport::Media(0)]);

    h.tap_up(2, 1);
    assert_eq!(h.pad.dispatcher().keymap().top_layer(), 0);
    h.tap_down(1, 1);
    assert_eq!(h.take_reports(), vec![kb(KC_LCTRL, 0), kb(KC_LCTRL, KC_S)]);
}

#[test]
fn test_release_uses_press_time_action() {
    let mut h = Harness::new();
    h.tap_down(0, 0);
    h.tap_down(2, 1);
    h.take_reports();

    // (0, 0) is play/pause on layer 2, the release still undoes Ctrl+C
    h.tap_up(0, 0);
    assert_eq!(h.take_reports(), vec![kb(KC_LCTRL, 0), kb(0, 0)]);
}

#[test]
fn test_reset_releases_everything() {
    let mut h = Harness::new();
    h.tap_down(0, 0);
    h.tap_down(2, 1);
    h.take_reports();

    h.pad.reset();
    h.collect_reports();
    assert_eq!(h.take_reports(), vec![kb(KC_LCTRL, 0), kb(0, 0)]);
    h.tick();
    assert_eq!(h.layer_changes.last(), Some(&LayerChangeEvent { layer: 0 }));

    // Switches held across the reset are ignored until released
    h.advance(15);
    h.tap_up(0, 0);
    h.tap_up(2, 1);
    assert!(h.take_reports().is_empty());
    assert_eq!(h.pad.dispatcher().keymap().top_layer(), 0);

    h.tap_down(0, 0);
    assert_eq!(h.take_reports(), vec![kb(KC_LCTRL, 0), kb(KC_LCTRL, KC_C)]);
}

#[test]
fn test_host_resyncs_after_dropped_reports() {
    let mut h = Harness::new();
    h.tap_down(0, 0);
    assert_eq!(h.take_reports(), vec![kb(KC_LCTRL, 0), kb(KC_LCTRL, KC_C)]);

    // Volume detents fill the channel while the host is stalled
    h.stalled = true;
    for _ in 0..8 {
        h.pad.encoders()[0].turn(Direction::Clockwise);
    }
    h.advance(8);
    assert!(h.channel.is_full());

    // Both reports of the release are lost
    h.tap_up(0, 0);
    assert_eq!(h.pad.dropped_reports(), 2);

    h.stalled = false;
    h.advance(5);
    let reports = h.take_reports();
    assert_eq!(reports.len(), 18);
    assert!(reports[..16].iter().all(|r| matches!(r, HostReport::Media(_))));
    // The host sees the released keys again
    assert_eq!(&reports[16..], &[kb(0, 0), HostReport::Media(0)]);
}
