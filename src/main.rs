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
use std::fs;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use clap::{crate_version, Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use spatialmix::util::{duration_minutes_seconds, filename_display, parse_point};
use spatialmix::{audio, config, samples, SoundEngine, VoiceFlags};

#[derive(Parser)]
#[clap(
    author = "Michael Wilson",
    version = crate_version!(),
    about = "A spatial audio mixer."
)]
struct Cli {
    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Lists the available audio output devices.
    Devices {},
    /// Decodes a sound file and prints its format.
    Info {
        /// The path to the sound file.
        path: PathBuf,
    },
    /// Plays a sound file through the mixer.
    Play {
        /// The path to the sound file.
        path: PathBuf,
        /// The path to the sound config. Without one, defaults and SPATIALMIX_ environment
        /// variables are used.
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Loop the sound until --seconds have passed.
        #[arg(short, long = "loop")]
        looping: bool,
        /// Position the sound at x,y.
        #[arg(short, long, allow_hyphen_values = true)]
        at: Option<String>,
        /// The listener position as x,y.
        #[arg(long, allow_hyphen_values = true)]
        listener: Option<String>,
        /// Voice volume in [0.0, 1.0].
        #[arg(short, long)]
        volume: Option<f32>,
        /// Fraction of the voice radius heard at full volume.
        #[arg(short, long)]
        falloff: Option<f32>,
        /// The mixing channel to play on.
        #[arg(long, default_value_t = 0)]
        channel: usize,
        /// How long a looping sound plays, in seconds.
        #[arg(short, long, default_value_t = 5.0)]
        seconds: f32,
    },
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Devices {} => {
            let devices = audio::list_devices()?;

            if devices.is_empty() {
                println!("No devices found.");
                return Ok(());
            }

            println!("Devices:");
            for device in devices {
                println!("- {}", device);
            }
        }
        Commands::Info { path } => {
            let sample = samples::decode(&fs::read(&path)?)?;
            println!("{}:", filename_display(&path));
            println!("- channels: {}", sample.channels());
            println!("- frames: {}", sample.frames());
            println!("- sample rate: {}", sample.rate());
            println!(
                "- duration: {}",
                duration_minutes_seconds(Duration::from_secs_f32(sample.duration_secs()))
            );
        }
        Commands::Play {
            path,
            config: config_path,
            looping,
            at,
            listener,
            volume,
            falloff,
            channel,
            seconds,
        } => {
            let config = match config_path {
                Some(config_path) => config::load(&config_path)?,
                None => config::from_env()?,
            };
            let mut engine = SoundEngine::from_config(&config)?;

            let id = engine.load_file(&path)?;
            if let Some(listener) = listener {
                let (x, y) = parse_point(&listener)?;
                engine.set_listener_pos(x, y);
            }

            let flags = if looping {
                VoiceFlags::LOOP
            } else {
                VoiceFlags::empty()
            };
            let handle = match at {
                Some(at) => {
                    let (x, y) = parse_point(&at)?;
                    engine.set_channel_panning(channel, true);
                    engine.play_at(channel, id, flags, x, y)
                }
                None => engine.play(channel, id, flags),
            };
            if !handle.is_valid() {
                return Err(format!("unable to play {}", filename_display(&path)).into());
            }
            if let Some(volume) = volume {
                engine.set_voice_volume(handle, volume);
            }
            if let Some(falloff) = falloff {
                engine.set_voice_falloff(handle, falloff);
            }

            info!(
                file = filename_display(&path),
                duration = engine.sample_duration(id),
                looping,
                "Playing"
            );

            let interval = config.tick_interval();
            let limit = Duration::from_secs_f32(seconds.max(0.0));
            let start = Instant::now();
            loop {
                engine.update();
                if !engine.is_active(handle) {
                    break;
                }
                if looping && start.elapsed() >= limit {
                    engine.stop_voice(handle);
                    break;
                }
                spin_sleep::sleep(interval);
            }

            engine.shutdown();
        }
    }

    Ok(())
}
