use embassy_time::{Duration, Instant, Ticker};

use crate::channel::REPORT_CHANNEL_SIZE;
use crate::config::MacropadConfig;
use crate::controller::Controller;
use crate::controller::feedback::FeedbackSink;
use crate::dispatcher::ActionDispatcher;
use crate::display::StatusDisplay;
use crate::event::{EncoderEvent, LayerChangeEvent};
use crate::hid::{HidReportState, Report, ReportChannel};
use crate::input_device::{InputDevice, Runnable};
use crate::keymap::KeyMap;
use crate::light::LedStrip;
use crate::matrix::MatrixTrait;

/// The whole macropad: matrix, encoders, layers, macros, feedback and host reports.
///
/// Every [`tick`](Self::tick) runs one pass of the pipeline:
/// scan the matrix, poll the encoders, dispatch the events, step the macro player,
/// update the feedback devices and queue the HID reports.
pub struct Macropad<
    'a,
    M: MatrixTrait,
    E: InputDevice<Event = EncoderEvent>,
    L: LedStrip,
    D: StatusDisplay,
    const ROW: usize,
    const COL: usize,
    const NUM_LAYER: usize,
    const NUM_ENCODER: usize,
> {
    matrix: M,
    encoders: [E; NUM_ENCODER],
    dispatcher: ActionDispatcher<'a, ROW, COL, NUM_LAYER, NUM_ENCODER>,
    feedback: FeedbackSink<'a, L, D>,
    hid: HidReportState,
    reports: &'a ReportChannel<REPORT_CHANNEL_SIZE>,
    scan_interval: Duration,
    /// Reports lost because the report channel was full
    dropped_reports: u32,
    /// A report was lost, the host needs the whole state again
    resync: bool,
}

impl<
    'a,
    M: MatrixTrait,
    E: InputDevice<Event = EncoderEvent>,
    L: LedStrip,
    D: StatusDisplay,
    const ROW: usize,
    const COL: usize,
    const NUM_LAYER: usize,
    const NUM_ENCODER: usize,
> Macropad<'a, M, E, L, D, ROW, COL, NUM_LAYER, NUM_ENCODER>
{
    /// Build the pipeline, validate the keymap and show the base layer on the feedback devices.
    ///
    /// Keymap errors are logged, the invalid bindings do nothing at runtime.
    pub fn new(
        matrix: M,
        encoders: [E; NUM_ENCODER],
        keymap: KeyMap<'a, ROW, COL, NUM_LAYER, NUM_ENCODER>,
        mut feedback: FeedbackSink<'a, L, D>,
        config: &MacropadConfig<'a>,
        reports: &'a ReportChannel<REPORT_CHANNEL_SIZE>,
    ) -> Self {
        if M::ROW != ROW || M::COL != COL {
            error!(
                "Matrix is {}x{} but the keymap is {}x{}",
                M::ROW,
                M::COL,
                ROW,
                COL
            );
        }
        if let Err(e) = keymap.validate() {
            error!("Invalid keymap: {:?}", e);
        }
        feedback.init();

        Self {
            matrix,
            encoders,
            dispatcher: ActionDispatcher::new(keymap),
            feedback,
            hid: HidReportState::new(),
            reports,
            scan_interval: config.scan_interval,
            dropped_reports: 0,
            resync: false,
        }
    }

    /// Run one pass of the pipeline, returns the layer change of this tick, if any
    pub fn tick(&mut self, now: Instant) -> Option<LayerChangeEvent> {
        let dispatcher = &mut self.dispatcher;
        self.matrix.scan(now, |event| dispatcher.process_key_event(event));

        for encoder in self.encoders.iter_mut() {
            if let Some(event) = encoder.poll(now) {
                debug!("Encoder event: {:?}", event);
                self.dispatcher.process_encoder_event(event);
            }
        }

        let layer_change = self.dispatcher.finish_tick(now);
        if let Some(event) = layer_change {
            self.feedback.process_event(event);
        }

        self.send_reports();
        layer_change
    }

    /// Stop the playing macro, the held macro keys are released with the next reports
    pub fn cancel_macro(&mut self) -> bool {
        let cancelled = self.dispatcher.cancel_macro();
        self.send_reports();
        cancelled
    }

    /// Release every key and layer and forget the switch states.
    ///
    /// Switches still held are learned again as the rest state by the next scan.
    pub fn reset(&mut self) {
        self.dispatcher.reset();
        self.matrix.reset();
        self.send_reports();
    }

    pub fn dispatcher(&self) -> &ActionDispatcher<'a, ROW, COL, NUM_LAYER, NUM_ENCODER> {
        &self.dispatcher
    }

    pub fn feedback(&mut self) -> &mut FeedbackSink<'a, L, D> {
        &mut self.feedback
    }

    pub fn matrix(&mut self) -> &mut M {
        &mut self.matrix
    }

    pub fn encoders(&mut self) -> &mut [E; NUM_ENCODER] {
        &mut self.encoders
    }

    pub fn hid_state(&self) -> &HidReportState {
        &self.hid
    }

    pub fn dropped_reports(&self) -> u32 {
        self.dropped_reports
    }

    fn send_reports(&mut self) {
        // Reports are state snapshots, after a loss resend the current state before any new change
        if self.resync && self.reports.free_capacity() >= 2 {
            let keyboard = self.reports.try_send(Report::KeyboardReport(self.hid.keyboard_report()));
            let media = self.reports.try_send(Report::MediaKeyboardReport(self.hid.media_report()));
            if keyboard.is_ok() && media.is_ok() {
                info!("Report channel drained, resync host state");
                self.resync = false;
            }
        }

        for event in self.dispatcher.drain_output() {
            let Some(report) = self.hid.apply(event) else {
                continue;
            };
            // Never wait inside a tick
            if self.reports.try_send(report).is_err() {
                self.dropped_reports = self.dropped_reports.wrapping_add(1);
                self.resync = true;
                warn!("Report channel is full, drop report of {:?}", event);
            }
        }
    }
}

impl<
    'a,
    M: MatrixTrait,
    E: InputDevice<Event = EncoderEvent>,
    L: LedStrip,
    D: StatusDisplay,
    const ROW: usize,
    const COL: usize,
    const NUM_LAYER: usize,
    const NUM_ENCODER: usize,
> Runnable for Macropad<'a, M, E, L, D, ROW, COL, NUM_LAYER, NUM_ENCODER>
{
    async fn run(&mut self) {
        info!("Macropad started, scan interval: {:?}", self.scan_interval);
        let mut ticker = Ticker::every(self.scan_interval);
        loop {
            self.tick(Instant::now());
            ticker.next().await;
        }
    }
}
