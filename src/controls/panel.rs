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
use embedded_hal::{
    digital::{Error as _, InputPin, PinState},
    spi::{Error as _, ErrorKind, SpiDevice},
};
use tracing::warn;

use super::Panel;

/// An MCP3008 8-channel 10-bit ADC.
pub struct Mcp3008<SPI> {
    spi: SPI,
}

impl<SPI> Mcp3008<SPI>
where
    SPI: SpiDevice,
{
    /// Creates a new ADC on the given SPI device.
    pub fn new(spi: SPI) -> Mcp3008<SPI> {
        Mcp3008 { spi }
    }

    /// Reads a single-ended channel (0 to 7).
    pub fn read(&mut self, channel: u8) -> Result<u16, ErrorKind> {
        // Start bit, then single-ended mode and the channel number. The result
        // comes back in the low 10 bits of the last two bytes.
        let mut buf = [0x01, (0x08 | (channel & 0x07)) << 4, 0x00];
        self.spi
            .transfer_in_place(&mut buf)
            .map_err(|e| e.kind())?;
        Ok((u16::from(buf[1] & 0x03) << 8) | u16::from(buf[2]))
    }
}

/// The front panel read through an MCP3008 and three input pins.
pub struct AdcPanel<SPI, P> {
    adc: Mcp3008<SPI>,
    pitch_channel: u8,
    volume_channel: u8,
    voice: [P; 3],
    last_pitch: u16,
    last_volume: u16,
}

impl<SPI, P> AdcPanel<SPI, P>
where
    SPI: SpiDevice,
    P: InputPin,
{
    /// Creates a new panel. The voice lines are ordered voice 1 first.
    pub fn new(
        adc: Mcp3008<SPI>,
        pitch_channel: u8,
        volume_channel: u8,
        voice: [P; 3],
    ) -> AdcPanel<SPI, P> {
        AdcPanel {
            adc,
            pitch_channel,
            volume_channel,
            voice,
            last_pitch: 0,
            last_volume: 0,
        }
    }
}

/// Reads a channel, falling back to the last good reading so a bus error
/// isn't mistaken for a turn of the knob.
fn read_channel<SPI: SpiDevice>(adc: &mut Mcp3008<SPI>, channel: u8, last: &mut u16) -> u16 {
    match adc.read(channel) {
        Ok(raw) => *last = raw,
        Err(kind) => warn!(channel, err = ?kind, "Unable to read potentiometer"),
    }
    *last
}

impl<SPI, P> Panel for AdcPanel<SPI, P>
where
    SPI: SpiDevice,
    P: InputPin,
{
    fn pitch(&mut self) -> u16 {
        read_channel(&mut self.adc, self.pitch_channel, &mut self.last_pitch)
    }

    fn volume(&mut self) -> u16 {
        read_channel(&mut self.adc, self.volume_channel, &mut self.last_volume)
    }

    fn voice_lines(&mut self) -> [PinState; 3] {
        let mut lines = [PinState::Low; 3];
        for (line, pin) in lines.iter_mut().zip(self.voice.iter_mut()) {
            *line = match pin.is_high() {
                Ok(high) => PinState::from(high),
                Err(e) => {
                    warn!(err = ?e.kind(), "Unable to read voice switch line");
                    PinState::Low
                }
            };
        }
        lines
    }
}

#[cfg(test)]
mod test {
    use std::collections::VecDeque;

    use embedded_hal::{
        digital::{self, InputPin, PinState},
        spi::{self, ErrorType, Operation, SpiDevice},
    };

    use crate::controls::Panel;

    use super::{AdcPanel, Mcp3008};

    /// Answers each transfer with the next queued reading, recording the
    /// request bytes.
    #[derive(Default)]
    struct Adc {
        readings: VecDeque<Option<u16>>,
        requests: Vec<[u8; 3]>,
    }

    impl ErrorType for Adc {
        type Error = spi::ErrorKind;
    }

    impl SpiDevice for Adc {
        fn transaction(&mut self, operations: &mut [Operation<'_, u8>]) -> Result<(), Self::Error> {
            for operation in operations {
                if let Operation::TransferInPlace(buf) = operation {
                    self.requests.push([buf[0], buf[1], buf[2]]);
                    let reading = self
                        .readings
                        .pop_front()
                        .flatten()
                        .ok_or(spi::ErrorKind::Other)?;
                    buf[0] = 0xFF;
                    buf[1] = 0xF8 | (reading >> 8) as u8;
                    buf[2] = reading as u8;
                }
            }
            Ok(())
        }
    }

    struct Line(Result<bool, digital::ErrorKind>);

    impl digital::ErrorType for Line {
        type Error = digital::ErrorKind;
    }

    impl InputPin for Line {
        fn is_high(&mut self) -> Result<bool, Self::Error> {
            self.0
        }

        fn is_low(&mut self) -> Result<bool, Self::Error> {
            self.0.map(|high| !high)
        }
    }

    #[test]
    fn test_adc_read() {
        let mut adc = Mcp3008::new(Adc {
            readings: VecDeque::from([Some(1023), Some(0), Some(0x2A5)]),
            ..Default::default()
        });
        assert_eq!(Ok(1023), adc.read(0));
        assert_eq!(Ok(0), adc.read(1));
        assert_eq!(Ok(0x2A5), adc.read(7));
        assert_eq!(
            vec![[0x01, 0x80, 0x00], [0x01, 0x90, 0x00], [0x01, 0xF0, 0x00]],
            adc.spi.requests
        );
    }

    #[test]
    fn test_panel_keeps_last_reading_on_error() {
        let adc = Mcp3008::new(Adc {
            readings: VecDeque::from([Some(512), Some(300), None, None]),
            ..Default::default()
        });
        let mut panel = AdcPanel::new(
            adc,
            0,
            1,
            [
                Line(Ok(false)),
                Line(Ok(true)),
                Line(Err(digital::ErrorKind::Other)),
            ],
        );

        assert_eq!(512, panel.pitch());
        assert_eq!(300, panel.volume());
        assert_eq!(512, panel.pitch());
        assert_eq!(300, panel.volume());
        assert_eq!(
            [PinState::Low, PinState::High, PinState::Low],
            panel.voice_lines()
        );
    }
}
