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
use std::{fmt, sync::Arc};

use parking_lot::Mutex;
use tracing::info;

use super::{AudioTrigger, Command};

/// A mock trigger. Doesn't play anything, but records and logs every command.
#[derive(Clone)]
pub struct Device {
    name: String,
    commands: Arc<Mutex<Vec<Command>>>,
}

impl Device {
    /// Gets the given mock device.
    pub fn get(name: &str) -> Device {
        Device {
            name: name.to_string(),
            commands: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Returns every command received so far.
    pub fn commands(&self) -> Vec<Command> {
        self.commands.lock().clone()
    }

    /// Returns every command received so far and clears the record.
    pub fn take_commands(&self) -> Vec<Command> {
        std::mem::take(&mut *self.commands.lock())
    }

    fn record(&mut self, command: Command) {
        info!(device = self.name, command = %command, "Command received.");
        self.commands.lock().push(command);
    }
}

impl AudioTrigger for Device {
    fn play_sample(&mut self, track: u16) {
        self.record(Command::Play(track));
    }

    fn stop_sample(&mut self, track: u16) {
        self.record(Command::Stop(track));
    }

    fn set_pitch_offset(&mut self, offset: i16) {
        self.record(Command::PitchOffset(offset));
    }

    fn set_gain(&mut self, gain: i16) {
        self.record(Command::Gain(gain));
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (Mock)", self.name)
    }
}
