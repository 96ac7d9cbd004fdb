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
use embedded_hal::digital::{Error as _, InputPin, PinState};
use tracing::warn;

use super::{RowSense, ROWS};

/// Row sense lines backed by embedded-hal input pins.
pub struct PinRows<P> {
    pins: [P; ROWS],
}

impl<P> PinRows<P>
where
    P: InputPin,
{
    /// Creates the row lines, ordered from the first row to the last.
    pub fn new(pins: [P; ROWS]) -> PinRows<P> {
        PinRows { pins }
    }
}

impl<P> RowSense for PinRows<P>
where
    P: InputPin,
{
    fn level(&mut self, row: usize) -> PinState {
        match self.pins[row].is_high() {
            Ok(true) => PinState::High,
            Ok(false) => PinState::Low,
            Err(e) => {
                // An unreadable row behaves like an open switch.
                warn!(row, err = ?e.kind(), "Unable to read row line");
                PinState::High
            }
        }
    }
}

#[cfg(test)]
mod test {
    use embedded_hal::digital::{ErrorKind, ErrorType, InputPin, PinState};

    use crate::matrix::RowSense;

    use super::PinRows;

    #[derive(Debug)]
    struct BrokenWire;

    impl embedded_hal::digital::Error for BrokenWire {
        fn kind(&self) -> ErrorKind {
            ErrorKind::Other
        }
    }

    enum Pin {
        Level(bool),
        Broken,
    }

    impl ErrorType for Pin {
        type Error = BrokenWire;
    }

    impl InputPin for Pin {
        fn is_high(&mut self) -> Result<bool, Self::Error> {
            match self {
                Pin::Level(high) => Ok(*high),
                Pin::Broken => Err(BrokenWire),
            }
        }

        fn is_low(&mut self) -> Result<bool, Self::Error> {
            self.is_high().map(|high| !high)
        }
    }

    #[test]
    fn test_pin_levels() {
        let mut rows = PinRows::new([
            Pin::Level(true),
            Pin::Level(false),
            Pin::Broken,
            Pin::Level(true),
            Pin::Level(true),
            Pin::Level(false),
        ]);

        assert_eq!(PinState::High, rows.level(0));
        assert_eq!(PinState::Low, rows.level(1));
        assert_eq!(PinState::High, rows.level(2), "broken rows read as open");
        assert_eq!(PinState::Low, rows.level(5));
    }
}
