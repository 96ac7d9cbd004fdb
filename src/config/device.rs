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
use std::time::Duration;

use serde::Deserialize;

use super::{parse_duration, ConfigError};

const DEFAULT_STARTUP_DELAY: Duration = Duration::from_millis(100);

/// The WAV Trigger's fixed serial rate.
const DEFAULT_BAUD: u32 = 57600;

const DEFAULT_TIMEOUT: Duration = Duration::from_millis(500);

/// A YAML representation of the WAV Trigger configuration.
#[derive(Deserialize, Clone, Default)]
pub struct Device {
    /// The serial port the board is attached to.
    port: Option<String>,

    /// The serial rate (default: 57600). The line is always 8N1.
    baud: Option<u32>,

    /// How long a read from the port waits for the board (default: 500ms).
    timeout: Option<String>,

    /// Whether the board should report track starts and stops (default: true).
    reporting: Option<bool>,

    /// How long to give the board after reset before asking for its version (default: 100ms).
    startup_delay: Option<String>,
}

impl Device {
    /// Returns the serial port, if one is configured.
    pub fn port(&self) -> Option<&str> {
        self.port.as_deref()
    }

    /// Returns the serial rate.
    pub fn baud(&self) -> u32 {
        self.baud.unwrap_or(DEFAULT_BAUD)
    }

    /// Returns the serial read timeout.
    pub fn timeout(&self) -> Result<Duration, ConfigError> {
        parse_duration("timeout", self.timeout.as_ref(), DEFAULT_TIMEOUT)
    }

    /// Returns whether track reporting should be enabled.
    pub fn reporting(&self) -> bool {
        self.reporting.unwrap_or(true)
    }

    /// Returns the start up delay.
    pub fn startup_delay(&self) -> Result<Duration, ConfigError> {
        parse_duration(
            "startup_delay",
            self.startup_delay.as_ref(),
            DEFAULT_STARTUP_DELAY,
        )
    }
}
