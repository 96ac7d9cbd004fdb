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
use tracing::debug;

use crate::{
    keymap::{KeyIdMapper, SampleId, Voice},
    matrix::{Key, COLS, ROWS},
    tracker::Edge,
    trigger::AudioTrigger,
};

/// Turns key edges into play and stop commands.
pub struct EventDispatcher {
    mapper: KeyIdMapper,
    /// The sample started by each held key, so the release stops the same
    /// sample even if the voice changed while the key was down.
    sounding: [[Option<SampleId>; COLS]; ROWS],
}

impl EventDispatcher {
    /// Creates a new dispatcher with no keys sounding.
    pub fn new(mapper: KeyIdMapper) -> EventDispatcher {
        EventDispatcher {
            mapper,
            sounding: [[None; COLS]; ROWS],
        }
    }

    /// The key mapping in use.
    pub fn mapper(&self) -> &KeyIdMapper {
        &self.mapper
    }

    /// Sends the command for a key edge to the trigger.
    pub fn dispatch<T: AudioTrigger + ?Sized>(
        &mut self,
        trigger: &mut T,
        key: Key,
        edge: Edge,
        voice: Voice,
    ) {
        let sounding = &mut self.sounding[key.row()][key.col()];
        match edge {
            Edge::Pressed => {
                let id = self.mapper.resolve(voice, key);
                debug!(key = %key, id = %id, "Key pressed.");
                trigger.play_sample(id.track());
                *sounding = Some(id);
            }
            Edge::Released => {
                let id = sounding
                    .take()
                    .unwrap_or_else(|| self.mapper.resolve(voice, key));
                debug!(key = %key, id = %id, "Key released.");
                trigger.stop_sample(id.track());
            }
        }
    }
}
