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
use std::{fs, io, path::Path, sync::Arc, time::Duration};

use embedded_hal::digital::PinState;
use parking_lot::Mutex;
use serde::Deserialize;
use tracing::{debug, info, span, Level};

use crate::{
    controls::Panel,
    engine::{Engine, Ticker},
    matrix::{ColumnDriver, Key, KeyMatrix, RowSense, COLS, ROWS},
    trigger::AudioTrigger,
};

#[derive(Debug, thiserror::Error)]
pub enum SimulatorError {
    #[error("Unable to read script: {0}")]
    Io(#[from] io::Error),
    #[error("Unable to parse script: {0}")]
    Parse(#[from] serde_yml::Error),
    #[error("Frame {frame}: key ({row}, {col}) is outside the {ROWS}x{COLS} matrix")]
    Key { frame: usize, row: usize, col: usize },
    #[error("Frame {frame}: voice {voice} is not a switch position (0-3)")]
    Voice { frame: usize, voice: u8 },
}

/// The state of the board for one or more polls of the engine.
#[derive(Deserialize, Clone, Debug, Default)]
pub struct Frame {
    /// Keys held down, as `[row, col]`. Keys not listed are up.
    #[serde(default)]
    keys: Vec<(usize, usize)>,

    /// Raw pitch reading. Unchanged if left out.
    pitch: Option<u16>,

    /// Raw volume reading. Unchanged if left out.
    volume: Option<u16>,

    /// Voice switch position, 1 to 3, or 0 for between positions.
    voice: Option<u8>,

    /// The raw voice switch lines. Takes precedence over `voice`.
    voice_lines: Option<[bool; 3]>,

    /// How many polls the frame is held for (default: 1).
    repeat: Option<usize>,
}

impl Frame {
    /// Returns how many polls the frame is held for.
    pub fn repeat(&self) -> usize {
        self.repeat.unwrap_or(1)
    }

    fn validate(&self, frame: usize) -> Result<(), SimulatorError> {
        for &(row, col) in self.keys.iter() {
            if Key::new(row, col).is_none() {
                return Err(SimulatorError::Key { frame, row, col });
            }
        }
        match self.voice {
            Some(voice) if voice > 3 => Err(SimulatorError::Voice { frame, voice }),
            _ => Ok(()),
        }
    }

    fn lines(&self) -> Option<[PinState; 3]> {
        if let Some(lines) = self.voice_lines {
            return Some(lines.map(PinState::from));
        }
        self.voice.map(|voice| {
            let mut lines = [PinState::Low; 3];
            let line = voice.checked_sub(1).map(usize::from);
            if let Some(line) = line.and_then(|line| lines.get_mut(line)) {
                *line = PinState::High;
            }
            lines
        })
    }
}

/// A scripted performance.
#[derive(Deserialize, Clone, Debug, Default)]
pub struct Script {
    frames: Vec<Frame>,
}

impl Script {
    /// Loads a script from a YAML file.
    pub fn load(path: &Path) -> Result<Script, SimulatorError> {
        Self::from_yaml(&fs::read_to_string(path)?)
    }

    /// Parses a script from YAML.
    pub fn from_yaml(yaml: &str) -> Result<Script, SimulatorError> {
        let script: Script = serde_yml::from_str(yaml)?;
        for (index, frame) in script.frames.iter().enumerate() {
            frame.validate(index)?;
        }
        Ok(script)
    }

    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }
}

struct BoardState {
    held: KeyMatrix,
    active: Option<usize>,
    pitch: u16,
    volume: u16,
    voice_lines: [PinState; 3],
}

/// A board that stands in for the keyboard hardware. Clones share the same
/// state, so one clone can drive the columns while another reads the rows.
#[derive(Clone)]
pub struct Board {
    state: Arc<Mutex<BoardState>>,
}

impl Board {
    /// Creates a board with no keys held, both pots at zero and the voice
    /// switch between positions.
    pub fn new() -> Board {
        Board {
            state: Arc::new(Mutex::new(BoardState {
                held: [[false; COLS]; ROWS],
                active: None,
                pitch: 0,
                volume: 0,
                voice_lines: [PinState::Low; 3],
            })),
        }
    }

    pub fn press(&self, key: Key) {
        self.state.lock().held[key.row()][key.col()] = true;
    }

    pub fn release(&self, key: Key) {
        self.state.lock().held[key.row()][key.col()] = false;
    }

    pub fn set_pitch(&self, raw: u16) {
        self.state.lock().pitch = raw;
    }

    pub fn set_volume(&self, raw: u16) {
        self.state.lock().volume = raw;
    }

    pub fn set_voice_lines(&self, lines: [PinState; 3]) {
        self.state.lock().voice_lines = lines;
    }

    /// Puts the board into the state described by the frame.
    pub fn apply(&self, frame: &Frame) {
        let mut state = self.state.lock();
        state.held = [[false; COLS]; ROWS];
        for key in frame.keys.iter().filter_map(|&(row, col)| Key::new(row, col)) {
            state.held[key.row()][key.col()] = true;
        }
        if let Some(pitch) = frame.pitch {
            state.pitch = pitch;
        }
        if let Some(volume) = frame.volume {
            state.volume = volume;
        }
        if let Some(lines) = frame.lines() {
            state.voice_lines = lines;
        }
    }
}

impl Default for Board {
    fn default() -> Self {
        Board::new()
    }
}

impl ColumnDriver for Board {
    fn select(&mut self, col: usize) {
        self.state.lock().active = Some(col);
    }
}

impl RowSense for Board {
    fn level(&mut self, row: usize) -> PinState {
        let state = self.state.lock();
        match state.active {
            Some(col) if state.held[row][col] => PinState::Low,
            _ => PinState::High,
        }
    }
}

impl Panel for Board {
    fn pitch(&mut self) -> u16 {
        self.state.lock().pitch
    }

    fn volume(&mut self) -> u16 {
        self.state.lock().volume
    }

    fn voice_lines(&mut self) -> [PinState; 3] {
        self.state.lock().voice_lines
    }
}

/// Plays the script on the board, polling the engine once per repeat of each
/// frame. With pacing set, polls are spaced by that period. Returns the number
/// of polls.
pub fn run<D, S, P, T>(
    script: &Script,
    board: &Board,
    engine: &mut Engine<D, S, P, T>,
    pacing: Option<Duration>,
) -> usize
where
    D: ColumnDriver,
    S: RowSense,
    P: Panel,
    T: AudioTrigger,
{
    let span = span!(Level::INFO, "simulate");
    let _enter = span.enter();

    let mut ticker = pacing.map(Ticker::new);
    let mut polls = 0;
    for (index, frame) in script.frames().iter().enumerate() {
        debug!(
            frame = index,
            keys = frame.keys.len(),
            repeat = frame.repeat(),
            "Applying frame."
        );
        board.apply(frame);
        for _ in 0..frame.repeat() {
            engine.poll();
            polls += 1;
            if let Some(ticker) = ticker.as_mut() {
                ticker.wait();
            }
        }
    }

    info!(frames = script.frames().len(), polls, "Simulation finished.");
    polls
}
