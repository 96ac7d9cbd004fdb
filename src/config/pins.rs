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

use crate::matrix::ROWS;

use super::ConfigError;

const DEFAULT_GPIO_CHIP: &str = "/dev/gpiochip0";
const DEFAULT_DATA: u32 = 17;
const DEFAULT_CLOCK: u32 = 27;
const DEFAULT_LATCH: u32 = 22;
const DEFAULT_ROWS: [u32; ROWS] = [5, 6, 13, 19, 26, 21];
const DEFAULT_VOICE: [u32; 3] = [16, 20, 12];
const DEFAULT_SPI: &str = "/dev/spidev0.0";
const DEFAULT_PITCH_CHANNEL: u8 = 0;
const DEFAULT_VOLUME_CHANNEL: u8 = 1;

/// A YAML representation of how the keyboard is wired to the host. Line
/// numbers are offsets on the GPIO chip. The defaults suit a Raspberry Pi with
/// an MCP3008 on the first SPI bus.
#[derive(Deserialize, Clone, Default)]
pub struct Pins {
    /// The GPIO character device (default: /dev/gpiochip0).
    gpio_chip: Option<String>,

    /// Shift register serial data (default: 17).
    data: Option<u32>,

    /// Shift register clock (default: 27).
    clock: Option<u32>,

    /// Shift register storage latch (default: 22).
    latch: Option<u32>,

    /// The six row sense lines, first row first. Rows need pull-ups.
    rows: Option<Vec<u32>>,

    /// The three voice switch lines, voice 1 first.
    voice: Option<Vec<u32>>,

    /// The SPI device of the potentiometer ADC (default: /dev/spidev0.0).
    spi: Option<String>,

    /// ADC channel of the pitch potentiometer (default: 0).
    pitch_channel: Option<u8>,

    /// ADC channel of the volume potentiometer (default: 1).
    volume_channel: Option<u8>,
}

impl Pins {
    pub fn gpio_chip(&self) -> &str {
        self.gpio_chip.as_deref().unwrap_or(DEFAULT_GPIO_CHIP)
    }

    pub fn data(&self) -> u32 {
        self.data.unwrap_or(DEFAULT_DATA)
    }

    pub fn clock(&self) -> u32 {
        self.clock.unwrap_or(DEFAULT_CLOCK)
    }

    pub fn latch(&self) -> u32 {
        self.latch.unwrap_or(DEFAULT_LATCH)
    }

    /// Returns the row lines, which must number exactly one per matrix row.
    pub fn rows(&self) -> Result<[u32; ROWS], ConfigError> {
        lines("rows", self.rows.as_ref(), DEFAULT_ROWS)
    }

    /// Returns the voice switch lines.
    pub fn voice(&self) -> Result<[u32; 3], ConfigError> {
        lines("voice", self.voice.as_ref(), DEFAULT_VOICE)
    }

    pub fn spi(&self) -> &str {
        self.spi.as_deref().unwrap_or(DEFAULT_SPI)
    }

    pub fn pitch_channel(&self) -> u8 {
        self.pitch_channel.unwrap_or(DEFAULT_PITCH_CHANNEL)
    }

    pub fn volume_channel(&self) -> u8 {
        self.volume_channel.unwrap_or(DEFAULT_VOLUME_CHANNEL)
    }
}

fn lines<const N: usize>(
    field: &'static str,
    value: Option<&Vec<u32>>,
    default: [u32; N],
) -> Result<[u32; N], ConfigError> {
    match value {
        Some(lines) => lines
            .as_slice()
            .try_into()
            .map_err(|_| ConfigError::PinCount {
                field,
                expected: N,
                found: lines.len(),
            }),
        None => Ok(default),
    }
}
