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
//! Key matrix scanning and sample triggering for a WAV Trigger based Mellotron.
//!
//! The keyboard is a 6x11 button matrix whose columns are driven through a
//! pair of shift registers. Each scan turns key edges into play and stop
//! commands for the trigger board, addressed by voice, row and column. The
//! pitch and volume potentiometers are forwarded as samplerate offset and gain.

pub mod cancel;
pub mod config;
pub mod controls;
pub mod dispatch;
pub mod engine;
#[cfg(target_os = "linux")]
pub mod hardware;
pub mod keymap;
pub mod matrix;
pub mod simulator;
pub mod tracker;
pub mod trigger;
