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
use serde::Deserialize;

use crate::{
    controls::VoicePriority,
    keymap::{IdEncoding, KeyIdMapper, Voice},
    tracker::Debounce,
};

use super::ConfigError;

/// The note number given to the first key in scan order.
const DEFAULT_BASE_NOTE: u8 = 31;

/// The voice used until the voice switch is first read.
const DEFAULT_INITIAL_VOICE: u8 = 1;

/// A YAML representation of the keyboard configuration.
#[derive(Deserialize, Clone, Default)]
pub struct Keyboard {
    /// Consecutive identical reads needed before a key change is accepted (default: 1).
    debounce: Option<u8>,

    /// How sample ids are packed into track numbers (default: fixed_width).
    id_encoding: Option<IdEncoding>,

    /// The note number of the first key (default: 31).
    base_note: Option<u8>,

    /// The voice in effect before the switch reports one (default: 1).
    initial_voice: Option<u8>,

    /// What to do when more than one voice switch line is high (default: last_wins).
    voice_priority: Option<VoicePriority>,
}

impl Keyboard {
    /// Returns the debounce policy.
    pub fn debounce(&self) -> Result<Debounce, ConfigError> {
        match self.debounce {
            Some(confirmations) => Debounce::new(confirmations).ok_or(ConfigError::Debounce),
            None => Ok(Debounce::IMMEDIATE),
        }
    }

    /// Returns the sample id encoding.
    pub fn id_encoding(&self) -> IdEncoding {
        self.id_encoding.unwrap_or_default()
    }

    /// Returns the note number of the first key.
    pub fn base_note(&self) -> u8 {
        self.base_note.unwrap_or(DEFAULT_BASE_NOTE)
    }

    /// Returns the initial voice.
    pub fn initial_voice(&self) -> Result<Voice, ConfigError> {
        Ok(Voice::try_from(
            self.initial_voice.unwrap_or(DEFAULT_INITIAL_VOICE),
        )?)
    }

    /// Returns the voice switch priority rule.
    pub fn voice_priority(&self) -> VoicePriority {
        self.voice_priority.unwrap_or_default()
    }

    /// Builds the key mapper described by this configuration.
    pub fn mapper(&self) -> Result<KeyIdMapper, ConfigError> {
        Ok(KeyIdMapper::new(self.id_encoding(), self.base_note())?)
    }
}
