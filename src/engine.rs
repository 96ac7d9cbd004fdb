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
use std::time::{Duration, Instant};

use tracing::{debug, info, span, Level};

use crate::{
    cancel::CancelHandle,
    config::{Config, ConfigError},
    controls::{ControlMapper, Panel, VoiceSelector},
    dispatch::EventDispatcher,
    keymap::Voice,
    matrix::{ColumnDriver, Key, MatrixScanner, RowSense, COLS, ROWS},
    tracker::{Edge, KeyStateTracker},
    trigger::AudioTrigger,
};

/// The engine owns the whole instrument: the key matrix, the panel and the
/// trigger device. Each call to `poll` is one pass of the scan loop.
pub struct Engine<D, S, P, T> {
    scanner: MatrixScanner<D, S>,
    panel: P,
    trigger: T,
    tracker: KeyStateTracker,
    dispatcher: EventDispatcher,
    controls: ControlMapper,
    voices: VoiceSelector,
}

impl<D, S, P, T> Engine<D, S, P, T>
where
    D: ColumnDriver,
    S: RowSense,
    P: Panel,
    T: AudioTrigger,
{
    /// Creates a new engine from its hardware and configuration.
    pub fn new(
        scanner: MatrixScanner<D, S>,
        panel: P,
        trigger: T,
        config: &Config,
    ) -> Result<Engine<D, S, P, T>, ConfigError> {
        let keyboard = config.keyboard();
        Ok(Engine {
            scanner,
            panel,
            trigger,
            tracker: KeyStateTracker::new(keyboard.debounce()?),
            dispatcher: EventDispatcher::new(keyboard.mapper()?),
            controls: ControlMapper::new(config.controls().settings()?),
            voices: VoiceSelector::new(keyboard.voice_priority(), keyboard.initial_voice()?),
        })
    }

    /// Runs one iteration of the scan loop.
    pub fn poll(&mut self) {
        let voice = self.voices.current();
        for col in 0..COLS {
            let pressed = self.scanner.scan_column(col);

            let mut edges = [None; ROWS];
            for (row, raw) in pressed.into_iter().enumerate() {
                edges[row] = self.tracker.update(Key::at(row, col), raw);
            }

            // Presses go out before releases within a column.
            for wanted in [Edge::Pressed, Edge::Released] {
                for (row, edge) in edges.iter().enumerate() {
                    if *edge == Some(wanted) {
                        self.dispatcher.dispatch(
                            &mut self.trigger,
                            Key::at(row, col),
                            wanted,
                            voice,
                        );
                    }
                }
            }
        }

        if let Some(voice) = self.voices.poll(self.panel.voice_lines()) {
            info!(voice = %voice, "Voice changed.");
        }

        let update = self
            .controls
            .observe(self.panel.pitch(), self.panel.volume());
        if let Some(pitch) = update.pitch {
            debug!(pitch, "Pitch changed.");
            self.trigger.set_pitch_offset(pitch);
        }
        if let Some(gain) = update.gain {
            debug!(gain, "Volume changed.");
            self.trigger.set_gain(gain);
        }
    }

    /// Polls once per period until cancelled.
    pub fn run(&mut self, cancel: &CancelHandle, period: Duration) {
        let span = span!(Level::INFO, "scan loop");
        let _enter = span.enter();

        info!(period = ?period, voice = %self.voice(), "Scanning.");
        let mut ticker = Ticker::new(period);
        while !cancel.is_cancelled() {
            self.poll();
            ticker.wait();
        }
        info!("Scan loop stopped.");
    }

    /// Returns the trigger device.
    pub fn trigger(&self) -> &T {
        &self.trigger
    }

    /// Returns the voice currently in effect.
    pub fn voice(&self) -> Voice {
        self.voices.current()
    }

    /// Returns the key state tracker.
    pub fn tracker(&self) -> &KeyStateTracker {
        &self.tracker
    }
}

/// Paces a loop against absolute deadlines so that time spent in the loop body
/// doesn't accumulate as drift.
pub struct Ticker {
    period: Duration,
    deadline: Instant,
}

impl Ticker {
    pub fn new(period: Duration) -> Ticker {
        Ticker {
            period,
            deadline: Instant::now(),
        }
    }

    /// Sleeps until the next deadline. If the deadline has already passed the
    /// schedule restarts from now instead of trying to catch up.
    pub fn wait(&mut self) {
        self.deadline += self.period;
        let now = Instant::now();
        if self.deadline <= now {
            debug!(behind = ?(now - self.deadline), "Loop overran its period.");
            self.deadline = now;
            return;
        }
        spin_sleep::sleep(self.deadline - now);
    }
}

#[cfg(test)]
mod test {
    use std::{
        error::Error,
        thread,
        time::{Duration, Instant},
    };

    use embedded_hal::digital::PinState;

    use crate::{
        cancel::CancelHandle,
        config::Config,
        keymap::Voice,
        matrix::{Key, MatrixScanner},
        simulator::Board,
        trigger::{mock, Command},
    };

    use super::{Engine, Ticker};

    type TestEngine = Engine<Board, Board, Board, mock::Device>;

    fn engine(board: &Board, yaml: &str) -> Result<(TestEngine, mock::Device), Box<dyn Error>> {
        let device = mock::Device::get("mock-trigger");
        let engine = Engine::new(
            MatrixScanner::new(board.clone(), board.clone()),
            board.clone(),
            device.clone(),
            &Config::from_yaml(yaml)?,
        )?;
        Ok((engine, device))
    }

    fn key(row: usize, col: usize) -> Key {
        Key::new(row, col).unwrap()
    }

    #[test]
    fn test_first_poll_syncs_controls() -> Result<(), Box<dyn Error>> {
        let board = Board::new();
        board.set_pitch(0);
        board.set_volume(1023);
        let (mut engine, device) = engine(&board, "")?;

        engine.poll();
        assert_eq!(
            vec![Command::PitchOffset(-32767), Command::Gain(3)],
            device.take_commands()
        );

        engine.poll();
        assert!(device.take_commands().is_empty());
        Ok(())
    }

    #[test]
    fn test_press_and_release() -> Result<(), Box<dyn Error>> {
        let board = Board::new();
        let (mut engine, device) = engine(&board, "")?;
        engine.poll();
        device.take_commands();

        board.press(key(2, 3));
        engine.poll();
        assert_eq!(vec![Command::Play(1203)], device.take_commands());
        assert!(engine.tracker().is_pressed(key(2, 3)));

        // Holding the key is not an edge.
        engine.poll();
        assert!(device.take_commands().is_empty());

        board.release(key(2, 3));
        engine.poll();
        assert_eq!(vec![Command::Stop(1203)], device.take_commands());
        assert!(!engine.tracker().is_pressed(key(2, 3)));
        Ok(())
    }

    #[test]
    fn test_presses_before_releases() -> Result<(), Box<dyn Error>> {
        let board = Board::new();
        let (mut engine, device) = engine(&board, "")?;
        board.press(key(0, 4));
        engine.poll();
        device.take_commands();

        board.release(key(0, 4));
        board.press(key(5, 4));
        board.press(key(1, 7));
        engine.poll();
        assert_eq!(
            vec![Command::Play(1504), Command::Stop(1004), Command::Play(1107)],
            device.take_commands()
        );
        Ok(())
    }

    #[test]
    fn test_pitch_dead_band() -> Result<(), Box<dyn Error>> {
        let board = Board::new();
        board.set_pitch(500);
        let (mut engine, device) = engine(&board, "")?;
        engine.poll();
        assert_eq!(
            Some(&Command::PitchOffset(500 * 64 - 32767)),
            device.take_commands().first()
        );

        board.set_pitch(501);
        engine.poll();
        assert!(device.take_commands().is_empty());

        board.set_pitch(504);
        engine.poll();
        assert_eq!(
            vec![Command::PitchOffset(504 * 64 - 32767)],
            device.take_commands()
        );
        Ok(())
    }

    #[test]
    fn test_voice_change_while_held() -> Result<(), Box<dyn Error>> {
        let board = Board::new();
        let (mut engine, device) = engine(&board, "")?;
        assert_eq!(Voice::One, engine.voice());

        board.press(key(2, 3));
        engine.poll();
        board.set_voice_lines([PinState::Low, PinState::Low, PinState::High]);
        engine.poll();
        assert_eq!(Voice::Three, engine.voice());

        board.press(key(4, 10));
        board.release(key(2, 3));
        engine.poll();

        let commands: Vec<Command> = device
            .take_commands()
            .into_iter()
            .filter(|command| matches!(command, Command::Play(_) | Command::Stop(_)))
            .collect();
        assert_eq!(
            vec![Command::Play(1203), Command::Stop(1203), Command::Play(3410)],
            commands
        );
        Ok(())
    }

    #[test]
    fn test_debounce_from_config() -> Result<(), Box<dyn Error>> {
        let board = Board::new();
        let (mut engine, device) = engine(&board, "keyboard:\n  debounce: 2\n")?;
        engine.poll();
        device.take_commands();

        board.press(key(1, 1));
        engine.poll();
        assert!(device.take_commands().is_empty());
        engine.poll();
        assert_eq!(vec![Command::Play(1101)], device.take_commands());
        Ok(())
    }

    #[test]
    fn test_run_until_cancelled() -> Result<(), Box<dyn Error>> {
        let board = Board::new();
        board.press(key(0, 0));
        let (mut engine, device) = engine(&board, "")?;

        let cancel = CancelHandle::new();
        let join = {
            let cancel = cancel.clone();
            thread::spawn(move || {
                thread::sleep(Duration::from_millis(20));
                cancel.cancel();
            })
        };
        engine.run(&cancel, Duration::from_millis(1));
        assert!(join.join().is_ok());

        assert_eq!(Some(&Command::Play(1000)), device.commands().first());
        assert!(engine.tracker().is_pressed(key(0, 0)));
        Ok(())
    }

    #[test]
    fn test_ticker_paces() {
        let period = Duration::from_millis(5);
        let mut ticker = Ticker::new(period);
        let start = Instant::now();
        for _ in 0..4 {
            ticker.wait();
        }
        assert!(start.elapsed() >= Duration::from_millis(19));
    }
}
