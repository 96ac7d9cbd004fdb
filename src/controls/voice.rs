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
use embedded_hal::digital::PinState;
use serde::Deserialize;
use tracing::warn;

use crate::keymap::Voice;

/// How to resolve more than one voice switch line reading high at once.
///
/// A break-before-make switch never does this, but a worn or miswired one can.
#[derive(Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum VoicePriority {
    /// The highest numbered voice wins.
    #[default]
    LastWins,
    /// The lowest numbered voice wins.
    FirstWins,
    /// Treat the reading as a fault and keep the current voice.
    Fault,
}

/// Tracks the active voice from the 3-position voice switch.
pub struct VoiceSelector {
    priority: VoicePriority,
    current: Voice,
    faulted: bool,
}

impl VoiceSelector {
    pub fn new(priority: VoicePriority, initial: Voice) -> VoiceSelector {
        VoiceSelector {
            priority,
            current: initial,
            faulted: false,
        }
    }

    /// The active voice.
    pub fn current(&self) -> Voice {
        self.current
    }

    /// Reads the switch lines and returns the new voice if it changed.
    /// With no line high the current voice is kept.
    pub fn poll(&mut self, lines: [PinState; 3]) -> Option<Voice> {
        let mut high = Voice::ALL
            .into_iter()
            .zip(lines)
            .filter(|(_, level)| *level == PinState::High)
            .map(|(voice, _)| voice);

        let selected = match self.priority {
            VoicePriority::LastWins => high.last(),
            VoicePriority::FirstWins => high.next(),
            VoicePriority::Fault => {
                let first = high.next();
                let conflict = high.next().is_some();
                if conflict && !self.faulted {
                    warn!(lines = ?lines, "Voice switch has more than one line high.");
                }
                self.faulted = conflict;
                first.filter(|_| !conflict)
            }
        };

        match selected {
            Some(voice) if voice != self.current => {
                self.current = voice;
                Some(voice)
            }
            _ => None,
        }
    }
}
