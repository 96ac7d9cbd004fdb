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

//! Key matrix geometry and scanning.
//!
//! The keyboard is wired as a grid of switches. One column line is driven at a
//! time and every row line is sampled while it is active, which detects all
//! keys with `ROWS + COLS` wires. Row lines are pulled up, so a closed switch
//! on the active column reads low.

use std::fmt;

use embedded_hal::digital::PinState;

pub mod pins;
pub mod shift_register;

/// The number of row sense lines.
pub const ROWS: usize = 6;

/// The number of column drive lines.
pub const COLS: usize = 11;

/// The pressed state of every key, indexed as `[row][col]`.
pub type KeyMatrix = [[bool; COLS]; ROWS];

/// A single switch in the key matrix.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Key {
    row: u8,
    col: u8,
}

impl Key {
    /// Creates a key if the row and column fall inside the matrix.
    pub fn new(row: usize, col: usize) -> Option<Key> {
        if row < ROWS && col < COLS {
            Some(Key::at(row, col))
        } else {
            None
        }
    }

    /// Creates a key from indices already known to be inside the matrix.
    pub(crate) fn at(row: usize, col: usize) -> Key {
        debug_assert!(row < ROWS && col < COLS);
        Key {
            row: row as u8,
            col: col as u8,
        }
    }

    /// The row of the key.
    pub fn row(&self) -> usize {
        usize::from(self.row)
    }

    /// The column of the key.
    pub fn col(&self) -> usize {
        usize::from(self.col)
    }

    /// Every key in scan order: column by column, rows within each column.
    pub fn all() -> impl Iterator<Item = Key> {
        (0..COLS).flat_map(|col| (0..ROWS).map(move |row| Key::at(row, col)))
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "r{}c{}", self.row, self.col)
    }
}

/// Energizes one column line of the matrix at a time.
pub trait ColumnDriver {
    /// Activates the given column and deactivates all others.
    fn select(&mut self, col: usize);
}

/// Samples the row lines of the matrix.
pub trait RowSense {
    /// Returns the electrical level of the given row line.
    fn level(&mut self, row: usize) -> PinState;
}

/// Walks the column driver across the matrix and reads the rows for each column.
pub struct MatrixScanner<D, S> {
    columns: D,
    rows: S,
}

impl<D, S> MatrixScanner<D, S>
where
    D: ColumnDriver,
    S: RowSense,
{
    /// Creates a new scanner from a column driver and the row lines.
    pub fn new(columns: D, rows: S) -> MatrixScanner<D, S> {
        MatrixScanner { columns, rows }
    }

    /// Activates the given column and returns the pressed state of each row.
    /// A row that never pulls low, including a disconnected one, reads as not pressed.
    pub fn scan_column(&mut self, col: usize) -> [bool; ROWS] {
        self.columns.select(col);

        let mut pressed = [false; ROWS];
        for (row, pressed) in pressed.iter_mut().enumerate() {
            *pressed = self.rows.level(row) == PinState::Low;
        }
        pressed
    }

    /// Scans the full matrix, one column at a time.
    pub fn scan(&mut self) -> KeyMatrix {
        let mut matrix = [[false; COLS]; ROWS];
        for col in 0..COLS {
            let pressed = self.scan_column(col);
            for (row, pressed) in pressed.into_iter().enumerate() {
                matrix[row][col] = pressed;
            }
        }
        matrix
    }
}
