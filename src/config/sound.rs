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

const DEFAULT_DEVICE: &str = "default";
const DEFAULT_SAMPLE_RATE: u32 = 48000;
const DEFAULT_TICK_RATE: u32 = 100;
const DEFAULT_MASTER_VOLUME: u32 = 100;

/// Initial settings for one mixing channel.
#[derive(Deserialize, Clone, Debug, PartialEq)]
pub struct Channel {
    /// The channel index.
    pub id: usize,

    /// Volume in [0.0, 1.0] (default: 1.0)
    #[serde(default = "default_channel_volume")]
    pub volume: f32,

    /// Any positive value enables panning (default: 0.0)
    #[serde(default)]
    pub pan: f32,
}

fn default_channel_volume() -> f32 {
    1.0
}

/// A YAML representation of the sound configuration.
#[derive(Deserialize, Clone, Debug)]
pub struct Sound {
    /// Whether sound is enabled at all (default: true)
    enabled: Option<bool>,

    /// The output device. Names starting with "mock" select the mock device.
    device: Option<String>,

    /// Mixing and output rate in Hz (default: 48000)
    sample_rate: Option<u32>,

    /// How often the engine is ticked, in Hz (default: 100)
    tick_rate: Option<u32>,

    /// Master volume, 0 - 100 (default: 100)
    master_volume: Option<u32>,

    /// Channel settings applied when the engine starts.
    #[serde(default)]
    channels: Vec<Channel>,
}

impl Sound {
    /// New will create a new sound configuration for the given device.
    pub fn new(device: &str) -> Sound {
        Sound {
            enabled: None,
            device: Some(device.to_string()),
            sample_rate: None,
            tick_rate: None,
            master_volume: None,
            channels: Vec::new(),
        }
    }

    pub fn enabled(&self) -> bool {
        self.enabled.unwrap_or(true)
    }

    /// Returns the device from the configuration.
    pub fn device(&self) -> &str {
        self.device.as_deref().unwrap_or(DEFAULT_DEVICE)
    }

    /// Returns the mixing rate (default: 48000). A zero rate falls back to the default.
    pub fn sample_rate(&self) -> u32 {
        match self.sample_rate {
            Some(0) | None => DEFAULT_SAMPLE_RATE,
            Some(rate) => rate,
        }
    }

    pub fn tick_rate(&self) -> u32 {
        match self.tick_rate {
            Some(0) | None => DEFAULT_TICK_RATE,
            Some(rate) => rate,
        }
    }

    /// Time between engine ticks.
    pub fn tick_interval(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.tick_rate() as f64)
    }

    /// Returns the master volume as a fraction in [0.0, 1.0].
    pub fn master_volume(&self) -> f32 {
        self.master_volume.unwrap_or(DEFAULT_MASTER_VOLUME).min(100) as f32 / 100.0
    }

    pub fn channels(&self) -> &[Channel] {
        &self.channels
    }

    pub fn with_enabled(mut self, enabled: bool) -> Sound {
        self.enabled = Some(enabled);
        self
    }

    pub fn with_sample_rate(mut self, sample_rate: u32) -> Sound {
        self.sample_rate = Some(sample_rate);
        self
    }

    pub fn with_channel(mut self, channel: Channel) -> Sound {
        self.channels.push(channel);
        self
    }
}

impl Default for Sound {
    fn default() -> Self {
        Sound::new(DEFAULT_DEVICE)
    }
}
