//! HID reports sent to the host
//!
//! [`HidReportState`] folds the ordered output events into boot keyboard reports (6KRO)
//! and consumer reports. Reports are handed to the host transport through a channel,
//! the transport implements [`HidWriter`].

use core::future::Future;

use embassy_sync::channel::Channel;
use macropad_types::keycode::{ConsumerKey, HidKeyCode, KeyCode};
use usbd_hid::descriptor::{KeyboardReport, MediaKeyboardReport};

use crate::RawMutex;
use crate::event::OutputEvent;

/// Channel carrying reports from the pipeline to the host transport
pub type ReportChannel<const N: usize> = Channel<RawMutex, Report, N>;

pub enum Report {
    /// Normal keyboard hid report
    KeyboardReport(KeyboardReport),
    /// Media keyboard report
    MediaKeyboardReport(MediaKeyboardReport),
}

#[derive(PartialEq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum HidError {
    /// The host is not connected
    Disconnected,
    /// The transport failed to send the report
    WriteFailed,
    BufferOverflow,
}

/// HidWriter is the host transport, via USB or anything else
pub trait HidWriter {
    /// Write a report to the host, returns the number of bytes written
    fn write_report(&mut self, report: Report) -> impl Future<Output = Result<usize, HidError>>;
}

/// Write every report received from the channel, forever
pub async fn run_reporter<W: HidWriter, const N: usize>(channel: &ReportChannel<N>, writer: &mut W) -> ! {
    loop {
        let report = channel.receive().await;
        if let Err(e) = writer.write_report(report).await {
            error!("Failed to send report: {:?}", e);
        }
    }
}

/// Write the reports already queued in the channel, returns the number of reports sent
pub async fn flush_reports<W: HidWriter, const N: usize>(channel: &ReportChannel<N>, writer: &mut W) -> usize {
    let mut sent = 0;
    while let Ok(report) = channel.try_receive() {
        match writer.write_report(report).await {
            Ok(_) => sent += 1,
            Err(e) => error!("Failed to send report: {:?}", e),
        }
    }
    sent
}

/// Keys currently reported as pressed to the host
#[derive(Default)]
pub struct HidReportState {
    /// How many output events hold each modifier, LCtrl first
    modifiers: [u8; 8],
    keycodes: [u8; 6],
    consumer: u16,
}

impl HidReportState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply an output event, returns the report to send if the host visible state changed
    pub fn apply(&mut self, event: OutputEvent) -> Option<Report> {
        match event.key {
            KeyCode::Hid(key) if key.is_modifier() => self.apply_modifier(key, event.pressed),
            KeyCode::Hid(key) => self.apply_key(key, event.pressed),
            KeyCode::Consumer(key) => self.apply_consumer(key, event.pressed),
        }
    }

    /// The modifier byte of the keyboard report
    pub fn modifier(&self) -> u8 {
        self.modifiers
            .iter()
            .enumerate()
            .fold(0, |acc, (i, count)| if *count > 0 { acc | (1 << i) } else { acc })
    }

    pub fn keyboard_report(&self) -> KeyboardReport {
        KeyboardReport {
            modifier: self.modifier(),
            reserved: 0,
            leds: 0,
            keycodes: self.keycodes,
        }
    }

    pub fn media_report(&self) -> MediaKeyboardReport {
        MediaKeyboardReport { usage_id: self.consumer }
    }

    fn apply_modifier(&mut self, key: HidKeyCode, pressed: bool) -> Option<Report> {
        let before = self.modifier();
        let count = &mut self.modifiers[(key as u8 - HidKeyCode::LCtrl as u8) as usize];
        *count = if pressed {
            count.saturating_add(1)
        } else {
            count.saturating_sub(1)
        };
        (self.modifier() != before).then(|| Report::KeyboardReport(self.keyboard_report()))
    }

    fn apply_key(&mut self, key: HidKeyCode, pressed: bool) -> Option<Report> {
        let code = key as u8;
        if code == 0 {
            return None;
        }
        if pressed {
            if self.keycodes.contains(&code) {
                return None;
            }
            let Some(slot) = self.keycodes.iter_mut().find(|k| **k == 0) else {
                warn!("Too many keys pressed, drop {:?}", key);
                return None;
            };
            *slot = code;
        } else {
            let slot = self.keycodes.iter_mut().find(|k| **k == code)?;
            *slot = 0;
        }
        Some(Report::KeyboardReport(self.keyboard_report()))
    }

    fn apply_consumer(&mut self, key: ConsumerKey, pressed: bool) -> Option<Report> {
        let usage_id = key as u16;
        if pressed {
            self.consumer = usage_id;
        } else if self.consumer == usage_id {
            self.consumer = 0;
        } else {
            return None;
        }
        Some(Report::MediaKeyboardReport(MediaKeyboardReport {
            usage_id: self.consumer,
        }))
    }
}
