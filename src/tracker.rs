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

//! Per-key pressed state and edge detection.
//!
//! Each key keeps its accepted pressed state plus a count of consecutive raw
//! reads that disagree with it. An edge is reported once the disagreement has
//! been confirmed by the configured number of reads.

use crate::matrix::{Key, KeyMatrix, COLS, ROWS};

/// A confirmed change in a key's pressed state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Edge {
    /// The key went down.
    Pressed,
    /// The key came back up.
    Released,
}

/// How many consecutive identical raw reads are needed before a change is accepted.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Debounce {
    confirmations: u8,
}

impl Debounce {
    /// Accepts a change on the first read that shows it, leaving debouncing to the scan rate.
    pub const IMMEDIATE: Debounce = Debounce { confirmations: 1 };

    /// Creates a debounce policy. Zero confirmations is not a meaningful policy.
    pub fn new(confirmations: u8) -> Option<Debounce> {
        (confirmations > 0).then_some(Debounce { confirmations })
    }

    /// The number of confirming reads.
    pub fn confirmations(&self) -> u8 {
        self.confirmations
    }
}

impl Default for Debounce {
    fn default() -> Self {
        Debounce::IMMEDIATE
    }
}

/// Tracks the debounced pressed state of every key in the matrix.
pub struct KeyStateTracker {
    debounce: Debounce,
    pressed: KeyMatrix,
    pending: [[u8; COLS]; ROWS],
}

impl KeyStateTracker {
    /// Creates a tracker with every key released.
    pub fn new(debounce: Debounce) -> KeyStateTracker {
        KeyStateTracker {
            debounce,
            pressed: [[false; COLS]; ROWS],
            pending: [[0; COLS]; ROWS],
        }
    }

    /// Feeds a raw read for the key and returns the edge it completes, if any.
    pub fn update(&mut self, key: Key, raw_pressed: bool) -> Option<Edge> {
        let (row, col) = (key.row(), key.col());
        let pending = &mut self.pending[row][col];

        if raw_pressed == self.pressed[row][col] {
            *pending = 0;
            return None;
        }

        *pending = pending.saturating_add(1);
        if *pending < self.debounce.confirmations {
            return None;
        }

        *pending = 0;
        self.pressed[row][col] = raw_pressed;
        Some(if raw_pressed {
            Edge::Pressed
        } else {
            Edge::Released
        })
    }

    /// Returns true if the key is currently held down.
    pub fn is_pressed(&self, key: Key) -> bool {
        self.pressed[key.row()][key.col()]
    }

    /// All keys currently held down, in scan order.
    pub fn pressed_keys(&self) -> impl Iterator<Item = Key> + '_ {
        Key::all().filter(move |key| self.is_pressed(*key))
    }

    /// Forgets all key state.
    pub fn reset(&mut self) {
        self.pressed = [[false; COLS]; ROWS];
        self.pending = [[0; COLS]; ROWS];
    }
}

#[cfg(test)]
mod test {
    use crate::matrix::Key;

    use super::{Debounce, Edge, KeyStateTracker};

    #[test]
    fn test_debounce_rejects_zero() {
        assert_eq!(None, Debounce::new(0));
        assert_eq!(Some(3), Debounce::new(3).map(|d| d.confirmations()));
        assert_eq!(Debounce::IMMEDIATE, Debounce::default());
    }

    #[test]
    fn test_press_release_cycle_every_key() {
        let mut tracker = KeyStateTracker::new(Debounce::IMMEDIATE);

        for key in Key::all() {
            assert_eq!(None, tracker.update(key, false));
            assert_eq!(Some(Edge::Pressed), tracker.update(key, true));
            for _ in 0..5 {
                assert_eq!(None, tracker.update(key, true), "held key {}", key);
            }
            assert!(tracker.is_pressed(key));
            assert_eq!(Some(Edge::Released), tracker.update(key, false));
            for _ in 0..5 {
                assert_eq!(None, tracker.update(key, false), "released key {}", key);
            }
            assert!(!tracker.is_pressed(key));
        }
    }

    #[test]
    fn test_keys_are_independent() {
        let mut tracker = KeyStateTracker::new(Debounce::IMMEDIATE);
        let a = Key::new(0, 0).unwrap();
        let b = Key::new(5, 10).unwrap();

        assert_eq!(Some(Edge::Pressed), tracker.update(a, true));
        assert_eq!(Some(Edge::Pressed), tracker.update(b, true));
        assert_eq!(Some(Edge::Released), tracker.update(a, false));
        assert!(tracker.is_pressed(b));
        assert_eq!(vec![b], tracker.pressed_keys().collect::<Vec<_>>());
    }

    #[test]
    fn test_confirmation_window() {
        let mut tracker = KeyStateTracker::new(Debounce::new(3).unwrap());
        let key = Key::new(2, 3).unwrap();

        assert_eq!(None, tracker.update(key, true));
        assert_eq!(None, tracker.update(key, true));
        assert_eq!(Some(Edge::Pressed), tracker.update(key, true));
        assert_eq!(None, tracker.update(key, true));

        assert_eq!(None, tracker.update(key, false));
        assert_eq!(None, tracker.update(key, false));
        assert_eq!(Some(Edge::Released), tracker.update(key, false));
    }

    #[test]
    fn test_contact_bounce_is_ignored() {
        let mut tracker = KeyStateTracker::new(Debounce::new(3).unwrap());
        let key = Key::new(4, 7).unwrap();

        for raw in [true, false, true, true, false, true, false] {
            assert_eq!(None, tracker.update(key, raw));
        }
        assert!(!tracker.is_pressed(key));
    }

    #[test]
    fn test_reset() {
        let mut tracker = KeyStateTracker::new(Debounce::IMMEDIATE);
        let key = Key::new(1, 1).unwrap();
        tracker.update(key, true);
        tracker.reset();
        assert!(!tracker.is_pressed(key));
        assert_eq!(Some(Edge::Pressed), tracker.update(key, true));
    }
}
