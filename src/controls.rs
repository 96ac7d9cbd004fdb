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

//! Analog control smoothing and mapping.
//!
//! The pitch and volume potentiometers are sampled by a 10-bit ADC. Each
//! reading is mapped linearly into device units, but only forwarded when it
//! has moved further than the dead-band from the last reading that was sent,
//! so ADC noise does not flood the device with updates.

use embedded_hal::digital::PinState;

use crate::trigger::{GAIN_MAX, GAIN_MIN, PITCH_OFFSET_MAX, PITCH_OFFSET_MIN};

pub mod panel;
pub mod voice;

pub use panel::{AdcPanel, Mcp3008};
pub use voice::{VoicePriority, VoiceSelector};

/// The default minimum raw change, exclusive, that triggers an update.
pub const DEFAULT_DEAD_BAND: u16 = 2;

/// The front panel controls other than the keys.
pub trait Panel {
    /// Reads the raw pitch potentiometer.
    fn pitch(&mut self) -> u16;

    /// Reads the raw volume potentiometer.
    fn volume(&mut self) -> u16;

    /// Reads the three voice switch lines, in switch order.
    fn voice_lines(&mut self) -> [PinState; 3];
}

/// Maps a raw reading with `raw * scale / divisor + offset`, using integer division.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LinearMapping {
    scale: i32,
    divisor: i32,
    offset: i32,
}

impl LinearMapping {
    /// The default pitch mapping: 0..=1023 to -32767..=32705.
    pub const PITCH: LinearMapping = LinearMapping {
        scale: 64,
        divisor: 1,
        offset: -32767,
    };

    /// The default gain mapping: 0..=1023 to -70..=3 dB.
    pub const GAIN: LinearMapping = LinearMapping {
        scale: 1,
        divisor: 14,
        offset: -70,
    };

    /// Creates a mapping. A zero divisor is rejected.
    pub fn new(scale: i32, divisor: i32, offset: i32) -> Option<LinearMapping> {
        (divisor != 0).then_some(LinearMapping {
            scale,
            divisor,
            offset,
        })
    }

    /// The multiplier applied to the raw reading.
    pub fn scale(&self) -> i32 {
        self.scale
    }

    /// The divisor applied after scaling.
    pub fn divisor(&self) -> i32 {
        self.divisor
    }

    /// The constant added last.
    pub fn offset(&self) -> i32 {
        self.offset
    }

    /// Applies the mapping to a raw reading. The arithmetic is done in 64 bits,
    /// which holds any 16-bit reading times any 32-bit scale.
    pub fn apply(&self, raw: u16) -> i64 {
        i64::from(raw) * i64::from(self.scale) / i64::from(self.divisor) + i64::from(self.offset)
    }
}

/// Suppresses changes that are within the threshold of the last admitted reading.
#[derive(Clone, Copy, Debug)]
pub struct DeadBand {
    threshold: u16,
    last: Option<u16>,
}

impl DeadBand {
    /// Creates a dead-band that has not admitted any reading yet.
    pub fn new(threshold: u16) -> DeadBand {
        DeadBand {
            threshold,
            last: None,
        }
    }

    /// Returns true and remembers the reading if it should be forwarded.
    /// The first reading is always forwarded.
    pub fn admit(&mut self, raw: u16) -> bool {
        match self.last {
            Some(last) if raw.abs_diff(last) <= self.threshold => false,
            _ => {
                self.last = Some(raw);
                true
            }
        }
    }
}

/// One potentiometer: its dead-band, its mapping and the range the device accepts.
#[derive(Clone, Copy, Debug)]
struct Control {
    band: DeadBand,
    mapping: LinearMapping,
    min: i16,
    max: i16,
}

impl Control {
    fn observe(&mut self, raw: u16) -> Option<i16> {
        self.band.admit(raw).then(|| {
            self.mapping
                .apply(raw)
                .clamp(i64::from(self.min), i64::from(self.max)) as i16
        })
    }
}

/// The tunable parts of the control mapping.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ControlSettings {
    pub dead_band: u16,
    pub pitch: LinearMapping,
    pub gain: LinearMapping,
}

impl Default for ControlSettings {
    fn default() -> Self {
        ControlSettings {
            dead_band: DEFAULT_DEAD_BAND,
            pitch: LinearMapping::PITCH,
            gain: LinearMapping::GAIN,
        }
    }
}

/// The device values to send after a control observation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ControlUpdate {
    pub pitch: Option<i16>,
    pub gain: Option<i16>,
}

/// Converts raw potentiometer readings into pitch offset and gain commands.
pub struct ControlMapper {
    pitch: Control,
    gain: Control,
}

impl ControlMapper {
    /// Creates a new mapper. Both controls report on their first observation.
    pub fn new(settings: ControlSettings) -> ControlMapper {
        ControlMapper {
            pitch: Control {
                band: DeadBand::new(settings.dead_band),
                mapping: settings.pitch,
                min: PITCH_OFFSET_MIN,
                max: PITCH_OFFSET_MAX,
            },
            gain: Control {
                band: DeadBand::new(settings.dead_band),
                mapping: settings.gain,
                min: GAIN_MIN,
                max: GAIN_MAX,
            },
        }
    }

    /// Observes a pair of raw readings. Each control is reported independently,
    /// only when it moved past the dead-band.
    pub fn observe(&mut self, raw_pitch: u16, raw_volume: u16) -> ControlUpdate {
        ControlUpdate {
            pitch: self.pitch.observe(raw_pitch),
            gain: self.gain.observe(raw_volume),
        }
    }
}
