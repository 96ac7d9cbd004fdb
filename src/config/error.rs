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
use crate::keymap::KeymapError;

/// Typed error for config load/parse failures so callers can distinguish
/// e.g. file-not-found from invalid settings without string matching.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Config load/parse error: {0}")]
    Load(#[from] config::ConfigError),
    #[error("Invalid duration for {field}: {message}")]
    Duration {
        field: &'static str,
        message: String,
    },
    #[error("Debounce must require at least one confirming read")]
    Debounce,
    #[error("The {0} mapping has a zero divisor")]
    Divisor(&'static str),
    #[error("Expected {expected} pins for {field}, found {found}")]
    PinCount {
        field: &'static str,
        expected: usize,
        found: usize,
    },
    #[error("Invalid key mapping: {0}")]
    Keymap(#[from] KeymapError),
}
