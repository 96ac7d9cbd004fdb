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
use std::{path::Path, time::Duration};

use ::config::{File, FileFormat};
use duration_string::DurationString;
use serde::Deserialize;

mod controls;
mod device;
mod error;
mod keyboard;
mod pins;

pub use self::controls::{Controls, Mapping};
pub use self::device::Device;
pub use self::error::ConfigError;
pub use self::keyboard::Keyboard;
pub use self::pins::Pins;

const DEFAULT_SCAN_PERIOD: Duration = Duration::from_millis(1);

/// The configuration for the instrument. Every section is optional; anything
/// left out takes the behavior of the stock instrument.
#[derive(Deserialize, Clone, Default)]
pub struct Config {
    /// Key scanning and sample addressing.
    keyboard: Option<Keyboard>,
    /// Pitch and volume potentiometers.
    controls: Option<Controls>,
    /// The WAV Trigger board.
    device: Option<Device>,
    /// Where the keyboard and panel are wired on the host.
    pins: Option<Pins>,
    /// How often the matrix is scanned (default: 1ms).
    scan_period: Option<String>,
}

impl Config {
    /// Loads and validates the configuration from a YAML file.
    pub fn load(path: &Path) -> Result<Config, ConfigError> {
        Self::build(File::new(&path.to_string_lossy(), FileFormat::Yaml))
    }

    /// Parses and validates the configuration from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Config, ConfigError> {
        Self::build(File::from_str(yaml, FileFormat::Yaml))
    }

    fn build<S>(source: S) -> Result<Config, ConfigError>
    where
        S: ::config::Source + Send + Sync + 'static,
    {
        let config: Config = ::config::Config::builder()
            .add_source(source)
            .build()?
            .try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Checks every setting that can be invalid, so that problems surface at
    /// start up rather than while playing.
    fn validate(&self) -> Result<(), ConfigError> {
        let keyboard = self.keyboard();
        keyboard.debounce()?;
        keyboard.initial_voice()?;
        keyboard.mapper()?;
        self.controls().settings()?;
        self.device().startup_delay()?;
        self.device().timeout()?;
        self.pins().rows()?;
        self.pins().voice()?;
        self.scan_period()?;
        Ok(())
    }

    /// Returns the keyboard configuration.
    pub fn keyboard(&self) -> Keyboard {
        self.keyboard.clone().unwrap_or_default()
    }

    /// Returns the controls configuration.
    pub fn controls(&self) -> Controls {
        self.controls.clone().unwrap_or_default()
    }

    /// Returns the device configuration.
    pub fn device(&self) -> Device {
        self.device.clone().unwrap_or_default()
    }

    /// Returns the pin assignments.
    pub fn pins(&self) -> Pins {
        self.pins.clone().unwrap_or_default()
    }

    /// Returns the scan period.
    pub fn scan_period(&self) -> Result<Duration, ConfigError> {
        parse_duration("scan_period", self.scan_period.as_ref(), DEFAULT_SCAN_PERIOD)
    }
}

/// Parses an optional duration string such as `100ms`.
fn parse_duration(
    field: &'static str,
    value: Option<&String>,
    default: Duration,
) -> Result<Duration, ConfigError> {
    match value {
        Some(value) => DurationString::from_string(value.clone())
            .map(Into::into)
            .map_err(|e| ConfigError::Duration {
                field,
                message: e.to_string(),
            }),
        None => Ok(default),
    }
}
