use embassy_time::Instant;
use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, OutputPin};

use crate::debounce::DebouncerTrait;
use crate::event::{KeyEvent, KeyPos};

/// MatrixTrait is the trait for keyboard matrix.
///
/// The matrix scans every switch once per call of `scan` and reports debounced
/// transitions in row-major position order.
pub trait MatrixTrait {
    // Matrix size
    const ROW: usize;
    const COL: usize;

    /// Scan all switches synchronously, calling `on_event` for each confirmed transition
    fn scan(&mut self, now: Instant, on_event: impl FnMut(KeyEvent));

    /// Drop the debouncer state, switches are re-learned on the next scan
    fn reset(&mut self);
}

/// Matrix is the physical pcb layout of the keyboard matrix.
///
/// With the `col2row` feature, output pins drive the columns and input pins read the rows.
/// Otherwise output pins drive the rows.
pub struct Matrix<
    In: InputPin,
    Out: OutputPin,
    D: DebouncerTrait,
    Dl: DelayNs,
    const INPUT_PIN_NUM: usize,
    const OUTPUT_PIN_NUM: usize,
> {
    /// Input pins of the pcb matrix
    input_pins: [In; INPUT_PIN_NUM],
    /// Output pins of the pcb matrix
    output_pins: [Out; OUTPUT_PIN_NUM],
    /// Debouncer
    debouncer: D,
    /// Waits for a driven line to settle before the inputs are read
    delay: Dl,
    /// Raw readings of the current scan, indexed by (out_idx, in_idx)
    raw: [[bool; INPUT_PIN_NUM]; OUTPUT_PIN_NUM],
}

impl<
    In: InputPin,
    Out: OutputPin,
    D: DebouncerTrait,
    Dl: DelayNs,
    const INPUT_PIN_NUM: usize,
    const OUTPUT_PIN_NUM: usize,
> Matrix<In, Out, D, Dl, INPUT_PIN_NUM, OUTPUT_PIN_NUM>
{
    /// Create a matrix from input and output pins.
    pub fn new(
        input_pins: [In; INPUT_PIN_NUM],
        output_pins: [Out; OUTPUT_PIN_NUM],
        debouncer: D,
        delay: Dl,
    ) -> Self {
        Matrix {
            input_pins,
            output_pins,
            debouncer,
            delay,
            raw: [[false; INPUT_PIN_NUM]; OUTPUT_PIN_NUM],
        }
    }

    /// Consumes the matrix, returning the input and output pins and the delay
    pub fn into_inner(self) -> ([In; INPUT_PIN_NUM], [Out; OUTPUT_PIN_NUM], Dl) {
        (self.input_pins, self.output_pins, self.delay)
    }

    /// Map a position to (out_idx, in_idx)
    fn pin_index(row: usize, col: usize) -> (usize, usize) {
        #[cfg(feature = "col2row")]
        return (col, row);
        #[cfg(not(feature = "col2row"))]
        return (row, col);
    }

    fn read_raw(&mut self) {
        for (out_idx, out_pin) in self.output_pins.iter_mut().enumerate() {
            out_pin.set_high().ok();
            self.delay.delay_us(1);
            for (in_idx, in_pin) in self.input_pins.iter_mut().enumerate() {
                // A read error counts as an open switch
                self.raw[out_idx][in_idx] = in_pin.is_high().unwrap_or_default();
            }
            out_pin.set_low().ok();
        }
    }
}

impl<
    In: InputPin,
    Out: OutputPin,
    D: DebouncerTrait,
    Dl: DelayNs,
    const INPUT_PIN_NUM: usize,
    const OUTPUT_PIN_NUM: usize,
> MatrixTrait for Matrix<In, Out, D, Dl, INPUT_PIN_NUM, OUTPUT_PIN_NUM>
{
    #[cfg(feature = "col2row")]
    const ROW: usize = INPUT_PIN_NUM;
    #[cfg(feature = "col2row")]
    const COL: usize = OUTPUT_PIN_NUM;
    #[cfg(not(feature = "col2row"))]
    const ROW: usize = OUTPUT_PIN_NUM;
    #[cfg(not(feature = "col2row"))]
    const COL: usize = INPUT_PIN_NUM;

    fn scan(&mut self, now: Instant, mut on_event: impl FnMut(KeyEvent)) {
        self.read_raw();
        for row in 0..Self::ROW {
            for col in 0..Self::COL {
                let (out_idx, in_idx) = Self::pin_index(row, col);
                let pos = KeyPos::new(row as u8, col as u8);
                if let Some(event) = self.debouncer.process(pos, self.raw[out_idx][in_idx], now) {
                    debug!("Key event: {:?}", event);
                    on_event(event);
                }
            }
        }
    }

    fn reset(&mut self) {
        self.debouncer.reset();
    }
}
