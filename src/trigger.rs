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
use std::fmt;

pub mod mock;
pub mod wavtrigger;

/// The lowest samplerate offset the device accepts.
pub const PITCH_OFFSET_MIN: i16 = -32767;
/// The highest samplerate offset the device accepts.
pub const PITCH_OFFSET_MAX: i16 = 32767;
/// The lowest master gain in dB.
pub const GAIN_MIN: i16 = -70;
/// The highest master gain in dB.
pub const GAIN_MAX: i16 = 4;

/// An external device that plays pre-recorded samples by track number.
///
/// Commands are fire-and-forget. Implementations deal with their own transport
/// failures; nothing is reported back to the scan loop.
pub trait AudioTrigger {
    /// Starts the given track. Tracks already playing keep playing.
    fn play_sample(&mut self, track: u16);

    /// Stops the given track if it is playing.
    fn stop_sample(&mut self, track: u16);

    /// Sets the global playback samplerate offset.
    fn set_pitch_offset(&mut self, offset: i16);

    /// Sets the global output gain in dB.
    fn set_gain(&mut self, gain: i16);
}

impl<T: AudioTrigger + ?Sized> AudioTrigger for Box<T> {
    fn play_sample(&mut self, track: u16) {
        (**self).play_sample(track)
    }

    fn stop_sample(&mut self, track: u16) {
        (**self).stop_sample(track)
    }

    fn set_pitch_offset(&mut self, offset: i16) {
        (**self).set_pitch_offset(offset)
    }

    fn set_gain(&mut self, gain: i16) {
        (**self).set_gain(gain)
    }
}

/// A single command issued to an audio trigger.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    Play(u16),
    Stop(u16),
    PitchOffset(i16),
    Gain(i16),
}

impl Command {
    /// Sends the command to the given trigger.
    pub fn send_to<T: AudioTrigger + ?Sized>(self, trigger: &mut T) {
        match self {
            Command::Play(track) => trigger.play_sample(track),
            Command::Stop(track) => trigger.stop_sample(track),
            Command::PitchOffset(offset) => trigger.set_pitch_offset(offset),
            Command::Gain(gain) => trigger.set_gain(gain),
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::Play(track) => write!(f, "play {}", track),
            Command::Stop(track) => write!(f, "stop {}", track),
            Command::PitchOffset(offset) => write!(f, "pitch offset {}", offset),
            Command::Gain(gain) => write!(f, "gain {} dB", gain),
        }
    }
}
