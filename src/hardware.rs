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
//! Binds the keyboard to a Linux host: GPIO lines through the character
//! device and the potentiometer ADC through spidev.

use std::io;

use linux_embedded_hal::{
    gpio_cdev::{errors::Error as GpioError, Chip, LineRequestFlags},
    spidev::{SpiModeFlags, Spidev, SpidevOptions},
    CdevPin, SpidevDevice,
};
use tracing::info;

use crate::{
    config::{ConfigError, Pins},
    controls::{AdcPanel, Mcp3008},
    matrix::{pins::PinRows, shift_register::ShiftRegisterColumns, MatrixScanner},
};

/// The label the GPIO lines are requested under.
const CONSUMER: &str = "mellotron";

/// The MCP3008 is rated for 1.35MHz at 2.7V.
const SPI_SPEED_HZ: u32 = 1_000_000;

pub type Columns = ShiftRegisterColumns<CdevPin, CdevPin, CdevPin>;
pub type HardwareScanner = MatrixScanner<Columns, PinRows<CdevPin>>;
pub type HardwarePanel = AdcPanel<SpidevDevice, CdevPin>;

#[derive(Debug, thiserror::Error)]
pub enum HardwareError {
    #[error("GPIO error: {0}")]
    Gpio(#[from] GpioError),
    #[error("SPI error: {0}")]
    Spi(#[from] io::Error),
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Requests every line named in the pin configuration and opens the ADC.
pub fn open(pins: &Pins) -> Result<(HardwareScanner, HardwarePanel), HardwareError> {
    let mut chip = Chip::new(pins.gpio_chip())?;
    info!(
        chip = pins.gpio_chip(),
        spi = pins.spi(),
        "Opening keyboard hardware."
    );

    let columns = ShiftRegisterColumns::new(
        output(&mut chip, pins.data())?,
        output(&mut chip, pins.clock())?,
        output(&mut chip, pins.latch())?,
    );

    let [r0, r1, r2, r3, r4, r5] = pins.rows()?;
    let rows = PinRows::new([
        input(&mut chip, r0)?,
        input(&mut chip, r1)?,
        input(&mut chip, r2)?,
        input(&mut chip, r3)?,
        input(&mut chip, r4)?,
        input(&mut chip, r5)?,
    ]);

    let [v1, v2, v3] = pins.voice()?;
    let voice = [
        input(&mut chip, v1)?,
        input(&mut chip, v2)?,
        input(&mut chip, v3)?,
    ];

    let mut spi = Spidev::open(pins.spi())?;
    spi.configure(
        &SpidevOptions::new()
            .bits_per_word(8)
            .max_speed_hz(SPI_SPEED_HZ)
            .mode(SpiModeFlags::SPI_MODE_0)
            .build(),
    )?;
    let panel = AdcPanel::new(
        Mcp3008::new(SpidevDevice(spi)),
        pins.pitch_channel(),
        pins.volume_channel(),
        voice,
    );

    Ok((MatrixScanner::new(columns, rows), panel))
}

fn output(chip: &mut Chip, line: u32) -> Result<CdevPin, GpioError> {
    // Columns are active-low, so every line starts high.
    let handle = chip
        .get_line(line)?
        .request(LineRequestFlags::OUTPUT, 1, CONSUMER)?;
    CdevPin::new(handle)
}

fn input(chip: &mut Chip, line: u32) -> Result<CdevPin, GpioError> {
    let handle = chip
        .get_line(line)?
        .request(LineRequestFlags::INPUT, 0, CONSUMER)?;
    CdevPin::new(handle)
}
