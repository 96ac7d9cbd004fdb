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

//! The serial protocol of the WAV Trigger polyphonic audio player board.
//!
//! Every message in either direction is framed as
//! `0xF0 0xAA <len> <code> <data...> 0x55`, where `len` counts every byte of
//! the frame. Multi-byte values are little endian. Tracks are addressed by the
//! number prefix of their file name on the board's SD card.

use std::{
    fmt,
    io::{self, ErrorKind, Read, Write},
    time::Duration,
};

use tracing::{debug, error, info, span, warn, Level};

use super::{AudioTrigger, Command};

const SOM1: u8 = 0xF0;
const SOM2: u8 = 0xAA;
const EOM: u8 = 0x55;

/// Start markers, length, code and end marker.
const FRAME_OVERHEAD: usize = 5;
const MAX_MESSAGE_LEN: usize = 32;

const CMD_GET_VERSION: u8 = 1;
const CMD_GET_SYS_INFO: u8 = 2;
const CMD_TRACK_CONTROL: u8 = 3;
const CMD_STOP_ALL: u8 = 4;
const CMD_MASTER_VOLUME: u8 = 5;
const CMD_SAMPLERATE_OFFSET: u8 = 12;
const CMD_SET_REPORTING: u8 = 13;

const RSP_VERSION_STRING: u8 = 129;
const RSP_SYSTEM_INFO: u8 = 130;
const RSP_TRACK_REPORT: u8 = 132;

/// The number of characters in the firmware version string.
pub const VERSION_STRING_LEN: usize = 20;

/// Per-track transport operations.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TrackControl {
    /// Stop everything else and play the track.
    PlaySolo = 0,
    /// Play the track alongside whatever is already playing.
    PlayPoly = 1,
    Pause = 2,
    Resume = 3,
    Stop = 4,
    LoopOn = 5,
    LoopOff = 6,
    /// Load the track paused, ready to be resumed.
    Load = 7,
}

/// A message sent to the board.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Request {
    GetVersion,
    GetSystemInfo,
    Track { track: u16, control: TrackControl },
    StopAll,
    MasterGain(i16),
    SamplerateOffset(i16),
    SetReporting(bool),
}

impl Request {
    /// Encodes the request as a complete frame.
    pub fn encode(&self) -> Vec<u8> {
        let (code, data): (u8, Vec<u8>) = match *self {
            Request::GetVersion => (CMD_GET_VERSION, Vec::new()),
            Request::GetSystemInfo => (CMD_GET_SYS_INFO, Vec::new()),
            Request::Track { track, control } => {
                let [lo, hi] = track.to_le_bytes();
                (CMD_TRACK_CONTROL, vec![control as u8, lo, hi])
            }
            Request::StopAll => (CMD_STOP_ALL, Vec::new()),
            Request::MasterGain(gain) => (CMD_MASTER_VOLUME, gain.to_le_bytes().to_vec()),
            Request::SamplerateOffset(offset) => {
                (CMD_SAMPLERATE_OFFSET, offset.to_le_bytes().to_vec())
            }
            Request::SetReporting(enabled) => (CMD_SET_REPORTING, vec![u8::from(enabled)]),
        };

        let len = data.len() + FRAME_OVERHEAD;
        let mut frame = Vec::with_capacity(len);
        frame.extend_from_slice(&[SOM1, SOM2, len as u8, code]);
        frame.extend_from_slice(&data);
        frame.push(EOM);
        frame
    }
}

impl From<Command> for Request {
    fn from(command: Command) -> Self {
        match command {
            Command::Play(track) => Request::Track {
                track,
                control: TrackControl::PlayPoly,
            },
            Command::Stop(track) => Request::Track {
                track,
                control: TrackControl::Stop,
            },
            Command::PitchOffset(offset) => Request::SamplerateOffset(offset),
            Command::Gain(gain) => Request::MasterGain(gain),
        }
    }
}

/// A message received from the board.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Response {
    Version(String),
    SystemInfo { voices: u8, tracks: u16 },
    TrackReport { track: u16, voice: u8, playing: bool },
}

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum ProtocolError {
    #[error("Invalid message length {0}")]
    Length(u8),
    #[error("Message is missing its end marker")]
    MissingEom,
    #[error("Unknown response code {0}")]
    UnknownCode(u8),
    #[error("Response {code} has an unexpected {len} byte payload")]
    Payload { code: u8, len: usize },
}

enum ParseState {
    Som1,
    Som2,
    Length,
    Body { expected: usize },
}

/// Decodes responses from the board one byte at a time.
pub struct ResponseParser {
    state: ParseState,
    body: Vec<u8>,
}

impl ResponseParser {
    /// Creates a parser waiting for the start of a frame.
    pub fn new() -> ResponseParser {
        ResponseParser {
            state: ParseState::Som1,
            body: Vec::with_capacity(MAX_MESSAGE_LEN),
        }
    }

    /// Feeds a byte. Returns a result once a complete frame has been seen.
    pub fn push(&mut self, byte: u8) -> Option<Result<Response, ProtocolError>> {
        match self.state {
            ParseState::Som1 => {
                if byte == SOM1 {
                    self.state = ParseState::Som2;
                }
                None
            }
            ParseState::Som2 => {
                self.state = match byte {
                    SOM2 => ParseState::Length,
                    SOM1 => ParseState::Som2,
                    _ => ParseState::Som1,
                };
                None
            }
            ParseState::Length => {
                let len = usize::from(byte);
                if !(FRAME_OVERHEAD..=MAX_MESSAGE_LEN).contains(&len) {
                    self.state = ParseState::Som1;
                    return Some(Err(ProtocolError::Length(byte)));
                }
                self.body.clear();
                // The code, the payload and the end marker are still to come.
                self.state = ParseState::Body { expected: len - 3 };
                None
            }
            ParseState::Body { expected } => {
                self.body.push(byte);
                if self.body.len() < expected {
                    return None;
                }
                self.state = ParseState::Som1;
                if byte != EOM {
                    return Some(Err(ProtocolError::MissingEom));
                }
                Some(decode(self.body[0], &self.body[1..expected - 1]))
            }
        }
    }
}

impl Default for ResponseParser {
    fn default() -> Self {
        Self::new()
    }
}

fn decode(code: u8, payload: &[u8]) -> Result<Response, ProtocolError> {
    match (code, payload) {
        (RSP_VERSION_STRING, version) => Ok(Response::Version(
            String::from_utf8_lossy(&version[..version.len().min(VERSION_STRING_LEN)])
                .trim_end_matches(|c: char| c == '\0' || c.is_whitespace())
                .to_string(),
        )),
        (RSP_SYSTEM_INFO, [voices, lo, hi]) => Ok(Response::SystemInfo {
            voices: *voices,
            tracks: u16::from_le_bytes([*lo, *hi]),
        }),
        (RSP_TRACK_REPORT, [lo, hi, voice, state]) => Ok(Response::TrackReport {
            track: u16::from_le_bytes([*lo, *hi]),
            voice: *voice,
            playing: *state != 0,
        }),
        (RSP_SYSTEM_INFO | RSP_TRACK_REPORT, payload) => Err(ProtocolError::Payload {
            code,
            len: payload.len(),
        }),
        _ => Err(ProtocolError::UnknownCode(code)),
    }
}

/// What the board reports about itself during start up.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeviceInfo {
    pub version: String,
    pub voices: u8,
    pub tracks: u16,
}

/// A WAV Trigger board on a serial port.
pub struct WavTrigger<W> {
    name: String,
    port: W,
}

impl<W> WavTrigger<W>
where
    W: Write,
{
    /// Creates a new device that writes frames to the given port.
    pub fn new(name: &str, port: W) -> WavTrigger<W> {
        WavTrigger {
            name: name.to_string(),
            port,
        }
    }

    /// Sends a request to the board.
    pub fn send(&mut self, request: Request) -> io::Result<()> {
        self.port.write_all(&request.encode())?;
        self.port.flush()
    }

    /// Brings the board into a known state and asks it to identify itself.
    ///
    /// Anything left playing from before a reset is stopped and the samplerate
    /// offset is cleared. After `delay`, the version and system information are
    /// requested and read back from `responses`. A board that is wired for
    /// transmit only never answers; that is logged and `None` is returned.
    pub fn start<R: Read>(
        &mut self,
        responses: &mut R,
        reporting: bool,
        delay: Duration,
    ) -> io::Result<Option<DeviceInfo>> {
        let span = span!(Level::INFO, "wav trigger start");
        let _enter = span.enter();

        self.send(Request::StopAll)?;
        self.send(Request::SamplerateOffset(0))?;
        self.send(Request::SetReporting(reporting))?;

        if !delay.is_zero() {
            spin_sleep::sleep(delay);
        }

        self.send(Request::GetVersion)?;
        self.send(Request::GetSystemInfo)?;

        let info = read_device_info(responses)?;
        match &info {
            Some(info) => info!(
                device = self.name,
                version = info.version,
                voices = info.voices,
                tracks = info.tracks,
                "WAV Trigger ready."
            ),
            None => warn!(device = self.name, "WAV Trigger response not available."),
        }
        Ok(info)
    }

    /// Consumes the device and returns the port.
    pub fn into_inner(self) -> W {
        self.port
    }

    fn send_command(&mut self, command: Command) {
        if let Err(e) = self.send(command.into()) {
            error!(
                device = self.name,
                command = %command,
                err = %e,
                "Error sending command to WAV Trigger."
            );
        }
    }
}

/// Reads responses until both the version and the system information have
/// arrived, or until the port has nothing more to give.
fn read_device_info<R: Read>(responses: &mut R) -> io::Result<Option<DeviceInfo>> {
    let mut parser = ResponseParser::new();
    let mut version: Option<String> = None;
    let mut system: Option<(u8, u16)> = None;
    let mut buf = [0u8; 64];

    loop {
        let read = match responses.read(&mut buf) {
            Ok(0) => return Ok(None),
            Ok(read) => read,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => {
                return Ok(None)
            }
            Err(e) => return Err(e),
        };

        for byte in &buf[..read] {
            match parser.push(*byte) {
                Some(Ok(Response::Version(v))) => version = Some(v),
                Some(Ok(Response::SystemInfo { voices, tracks })) => {
                    system = Some((voices, tracks))
                }
                Some(Ok(response)) => debug!(?response, "Ignoring response during start."),
                Some(Err(e)) => warn!(err = %e, "Discarding malformed response."),
                None => {}
            }
        }

        if let (Some(version), Some((voices, tracks))) = (&version, system) {
            return Ok(Some(DeviceInfo {
                version: version.clone(),
                voices,
                tracks,
            }));
        }
    }
}

impl<W> AudioTrigger for WavTrigger<W>
where
    W: Write,
{
    fn play_sample(&mut self, track: u16) {
        self.send_command(Command::Play(track));
    }

    fn stop_sample(&mut self, track: u16) {
        self.send_command(Command::Stop(track));
    }

    fn set_pitch_offset(&mut self, offset: i16) {
        self.send_command(Command::PitchOffset(offset));
    }

    fn set_gain(&mut self, gain: i16) {
        self.send_command(Command::Gain(gain));
    }
}

impl<W> fmt::Display for WavTrigger<W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (WAV Trigger)", self.name)
    }
}
