// Copyright (C) 2026 Michael Wilson <mike@mdwn.dev>
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free Software
// Foundation, version 3.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with
// this program. If not, see <https://www.gnu.org/licenses/>.
//

//! Column drive through two daisy-chained 74HC595 shift registers.
//!
//! The registers hold 16 active-low outputs, 11 of which are wired to the
//! matrix columns. Columns 0 to 7 live on the left register and columns 8 to
//! 10 on the right one. The right register's byte is shifted first so that it
//! ends up at the far end of the chain.

use embedded_hal::digital::{Error as _, ErrorKind, OutputPin, PinState};
use tracing::warn;

use super::{ColumnDriver, COLS};

/// All outputs of one register inactive.
const IDLE: u8 = 0xFF;

/// Drives the matrix columns through a pair of 74HC595 shift registers.
pub struct ShiftRegisterColumns<D, C, L> {
    data: D,
    clock: C,
    latch: L,
}

impl<D, C, L> ShiftRegisterColumns<D, C, L>
where
    D: OutputPin,
    C: OutputPin,
    L: OutputPin,
{
    /// Creates a new column driver from the serial data, shift clock and storage latch pins.
    pub fn new(data: D, clock: C, latch: L) -> ShiftRegisterColumns<D, C, L> {
        ShiftRegisterColumns { data, clock, latch }
    }

    /// The two bytes to shift out, in order, to activate the given column.
    pub fn column_bytes(col: usize) -> [u8; 2] {
        debug_assert!(col < COLS);
        if col < 8 {
            [IDLE, !(0x80u8 >> col)]
        } else {
            [!(0x80u8 >> (col - 8)), IDLE]
        }
    }

    /// Shifts a byte out MSB first, clocking each bit on the rising edge.
    fn shift_out(&mut self, byte: u8) -> Result<(), ErrorKind> {
        for bit in (0..8).rev() {
            self.data
                .set_state(PinState::from(byte & (1 << bit) != 0))
                .map_err(|e| e.kind())?;
            self.clock.set_high().map_err(|e| e.kind())?;
            self.clock.set_low().map_err(|e| e.kind())?;
        }
        Ok(())
    }

    fn write(&mut self, bytes: [u8; 2]) -> Result<(), ErrorKind> {
        self.latch.set_low().map_err(|e| e.kind())?;
        for byte in bytes {
            self.shift_out(byte)?;
        }
        self.latch.set_high().map_err(|e| e.kind())
    }
}

impl<D, C, L> ColumnDriver for ShiftRegisterColumns<D, C, L>
where
    D: OutputPin,
    C: OutputPin,
    L: OutputPin,
{
    fn select(&mut self, col: usize) {
        if let Err(kind) = self.write(Self::column_bytes(col)) {
            warn!(col, err = ?kind, "Unable to drive column");
        }
    }
}

#[cfg(test)]
mod test {
    use std::{cell::RefCell, convert::Infallible, rc::Rc};

    use embedded_hal::digital::{ErrorType, OutputPin};

    use crate::matrix::{ColumnDriver, COLS};

    use super::ShiftRegisterColumns;

    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    enum Line {
        Data,
        Clock,
        Latch,
    }

    type Trace = Rc<RefCell<Vec<(Line, bool)>>>;

    struct Pin {
        line: Line,
        trace: Trace,
    }

    impl ErrorType for Pin {
        type Error = Infallible;
    }

    impl OutputPin for Pin {
        fn set_low(&mut self) -> Result<(), Self::Error> {
            self.trace.borrow_mut().push((self.line, false));
            Ok(())
        }

        fn set_high(&mut self) -> Result<(), Self::Error> {
            self.trace.borrow_mut().push((self.line, true));
            Ok(())
        }
    }

    fn driver(trace: &Trace) -> ShiftRegisterColumns<Pin, Pin, Pin> {
        let pin = |line| Pin {
            line,
            trace: trace.clone(),
        };
        ShiftRegisterColumns::new(pin(Line::Data), pin(Line::Clock), pin(Line::Latch))
    }

    /// Replays the pin trace the way the register chain would and returns the
    /// bits latched, in the order they were clocked in.
    fn clocked_bits(trace: &[(Line, bool)]) -> Vec<bool> {
        let mut data = false;
        let mut bits = Vec::new();
        for (line, level) in trace {
            match line {
                Line::Data => data = *level,
                Line::Clock if *level => bits.push(data),
                _ => {}
            }
        }
        bits
    }

    #[test]
    fn test_column_bytes() {
        type Driver = ShiftRegisterColumns<Pin, Pin, Pin>;
        assert_eq!([0xFF, 0b0111_1111], Driver::column_bytes(0));
        assert_eq!([0xFF, 0b1111_1110], Driver::column_bytes(7));
        assert_eq!([0b0111_1111, 0xFF], Driver::column_bytes(8));
        assert_eq!([0b1101_1111, 0xFF], Driver::column_bytes(10));
    }

    #[test]
    fn test_exactly_one_output_active() {
        type Driver = ShiftRegisterColumns<Pin, Pin, Pin>;
        for col in 0..COLS {
            let bytes = Driver::column_bytes(col);
            let active: u32 = bytes.iter().map(|b| b.count_zeros()).sum();
            assert_eq!(1, active, "column {} should drive one line low", col);
        }
    }

    #[test]
    fn test_select_shifts_and_latches() {
        let trace: Trace = Rc::new(RefCell::new(Vec::new()));
        let mut columns = driver(&trace);
        columns.select(9);

        let trace = trace.borrow();
        assert_eq!(Some(&(Line::Latch, false)), trace.first());
        assert_eq!(Some(&(Line::Latch, true)), trace.last());

        let bits = clocked_bits(&trace);
        assert_eq!(16, bits.len());
        let byte = |bits: &[bool]| bits.iter().fold(0u8, |acc, bit| (acc << 1) | *bit as u8);
        assert_eq!(0b1011_1111, byte(&bits[..8]));
        assert_eq!(0xFF, byte(&bits[8..]));
    }
}
