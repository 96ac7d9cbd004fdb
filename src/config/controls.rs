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

use crate::controls::{ControlSettings, LinearMapping, DEFAULT_DEAD_BAND};

use super::ConfigError;

/// A YAML representation of a linear mapping. Fields left out keep the
/// stock value for that control.
#[derive(Deserialize, Clone, Copy, Default)]
pub struct Mapping {
    scale: Option<i32>,
    divisor: Option<i32>,
    offset: Option<i32>,
}

impl Mapping {
    fn resolve(
        &self,
        name: &'static str,
        stock: LinearMapping,
    ) -> Result<LinearMapping, ConfigError> {
        LinearMapping::new(
            self.scale.unwrap_or(stock.scale()),
            self.divisor.unwrap_or(stock.divisor()),
            self.offset.unwrap_or(stock.offset()),
        )
        .ok_or(ConfigError::Divisor(name))
    }
}

/// A YAML representation of the potentiometer configuration.
#[derive(Deserialize, Clone, Default)]
pub struct Controls {
    /// Raw ADC change, exclusive, needed before a new value is sent (default: 2).
    dead_band: Option<u16>,

    /// Raw pitch reading to samplerate offset (default: `raw * 64 - 32767`).
    pitch: Option<Mapping>,

    /// Raw volume reading to gain in dB (default: `raw / 14 - 70`).
    gain: Option<Mapping>,
}

impl Controls {
    /// Returns the dead-band.
    pub fn dead_band(&self) -> u16 {
        self.dead_band.unwrap_or(DEFAULT_DEAD_BAND)
    }

    /// Returns the pitch mapping.
    pub fn pitch(&self) -> Result<LinearMapping, ConfigError> {
        self.pitch
            .unwrap_or_default()
            .resolve("pitch", LinearMapping::PITCH)
    }

    /// Returns the gain mapping.
    pub fn gain(&self) -> Result<LinearMapping, ConfigError> {
        self.gain
            .unwrap_or_default()
            .resolve("gain", LinearMapping::GAIN)
    }

    /// Returns the full control settings.
    pub fn settings(&self) -> Result<ControlSettings, ConfigError> {
        Ok(ControlSettings {
            dead_band: self.dead_band(),
            pitch: self.pitch()?,
            gain: self.gain()?,
        })
    }
}
