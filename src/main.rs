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
use std::error::Error;
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{crate_version, Parser, Subcommand};
#[cfg(target_os = "linux")]
use mellotron::cancel::CancelHandle;
use mellotron::config::Config;
use mellotron::engine::Engine;
#[cfg(target_os = "linux")]
use mellotron::hardware;
use mellotron::keymap::{note_name, Voice};
use mellotron::matrix::MatrixScanner;
use mellotron::simulator::{self, Board, Script};
use mellotron::trigger::mock;
use mellotron::trigger::wavtrigger::WavTrigger;
use mellotron::trigger::AudioTrigger;
#[cfg(target_os = "linux")]
use serialport::{DataBits, Parity, StopBits};

#[derive(Parser)]
#[clap(
    author = "Michael Wilson",
    version = crate_version!(),
    about = "A Mellotron style sample keyboard for the WAV Trigger."
)]
struct Cli {
    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Prints the sample id for every key, for naming the files on the SD card.
    Ids {
        /// The path to the config.
        #[arg(short, long)]
        config: Option<String>,
        /// Only print the given voice (1-3).
        #[arg(short, long)]
        voice: Option<u8>,
    },
    /// Plays a scripted performance through the engine without any hardware.
    Simulate {
        /// The path to the script.
        script: String,
        /// The path to the config.
        #[arg(short, long)]
        config: Option<String>,
        /// Writes WAV Trigger frames to this path instead of logging commands.
        #[arg(short, long)]
        output: Option<String>,
        /// Paces the script at the configured scan period.
        #[arg(short, long)]
        realtime: bool,
    },
    /// Start will bring up the WAV Trigger and play the keyboard until interrupted.
    Start {
        /// The path to the config.
        config_path: String,
    },
}

fn load_config(path: Option<&String>) -> Result<Config, Box<dyn Error>> {
    Ok(match path {
        Some(path) => Config::load(&PathBuf::from(path))?,
        None => Config::default(),
    })
}

/// Brings up the WAV Trigger, then scans the keyboard until interrupted.
#[cfg(target_os = "linux")]
fn start(config_path: &Path) -> Result<(), Box<dyn Error>> {
    let config = Config::load(config_path)?;
    let device_config = config.device();
    let port = device_config
        .port()
        .ok_or("No serial port configured for the device.")?;

    let serial = serialport::new(port, device_config.baud())
        .data_bits(DataBits::Eight)
        .parity(Parity::None)
        .stop_bits(StopBits::One)
        .timeout(device_config.timeout()?)
        .open()?;
    let mut responses = serial.try_clone()?;
    let mut device = WavTrigger::new(port, serial);
    match device.start(
        &mut responses,
        device_config.reporting(),
        device_config.startup_delay()?,
    )? {
        Some(info) => println!(
            "{} on {}: {} voices, {} tracks.",
            info.version, port, info.voices, info.tracks
        ),
        None => println!("{} on {}: response not available.", device, port),
    }

    let (scanner, panel) = hardware::open(&config.pins())?;
    let mut engine = Engine::new(scanner, panel, device, &config)?;

    let cancel = CancelHandle::new();
    {
        let cancel = cancel.clone();
        ctrlc::set_handler(move || cancel.cancel())?;
    }
    engine.run(&cancel, config.scan_period()?);

    Ok(())
}

#[cfg(not(target_os = "linux"))]
fn start(_config_path: &Path) -> Result<(), Box<dyn Error>> {
    Err("Scanning the keyboard hardware is only supported on Linux.".into())
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Ids { config, voice } => {
            let config = load_config(config.as_ref())?;
            let mapper = config.keyboard().mapper()?;
            let voices = match voice {
                Some(voice) => vec![Voice::try_from(voice)?],
                None => Voice::ALL.to_vec(),
            };

            for voice in voices {
                println!("Voice {} ({:?} ids):", voice, mapper.encoding());
                for entry in mapper.catalog(voice) {
                    println!(
                        "- {:<6} {:<4} {:>4}",
                        entry.key.to_string(),
                        note_name(entry.note),
                        entry.id.track()
                    );
                }
            }
        }
        Commands::Simulate {
            script,
            config,
            output,
            realtime,
        } => {
            let config = load_config(config.as_ref())?;
            let script = Script::load(&PathBuf::from(script))?;

            let trigger: Box<dyn AudioTrigger> = match output {
                Some(output) => {
                    let mut device = WavTrigger::new(&output, File::create(&output)?);
                    let device_config = config.device();
                    device.start(
                        &mut io::empty(),
                        device_config.reporting(),
                        Duration::ZERO,
                    )?;
                    Box::new(device)
                }
                None => Box::new(mock::Device::get("mock-trigger")),
            };

            let board = Board::new();
            let mut engine = Engine::new(
                MatrixScanner::new(board.clone(), board.clone()),
                board.clone(),
                trigger,
                &config,
            )?;
            let pacing = if realtime {
                Some(config.scan_period()?)
            } else {
                None
            };

            let polls = simulator::run(&script, &board, &mut engine, pacing);
            println!(
                "Played {} frames over {} scans, ending on voice {}.",
                script.frames().len(),
                polls,
                engine.voice()
            );
        }
        Commands::Start { config_path } => start(&PathBuf::from(config_path))?,
    }

    Ok(())
}
