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
use std::{
    fmt,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};

use tracing::{debug, info};

use super::mixer::ChannelMixer;
use super::WaveBuffer;
use crate::samples::PcmFormat;
use crate::voices::MAX_VOICES;

/// A mock device. Doesn't produce any sound, and only moves forward when told to.
#[derive(Clone)]
pub struct Device {
    name: String,
    mixer: ChannelMixer,
    is_shutdown: Arc<AtomicBool>,
}

impl Device {
    /// Gets the given mock device.
    pub fn get(name: &str, sample_rate: u32) -> Device {
        info!(device = name, sample_rate, "Using mock audio device");
        Device {
            name: name.to_string(),
            mixer: ChannelMixer::new(MAX_VOICES, sample_rate),
            is_shutdown: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Plays `frames` output frames on every channel.
    pub fn advance(&self, frames: usize) {
        self.mixer.advance(frames);
    }

    /// Current gains of a channel.
    pub fn mix(&self, channel: usize) -> Option<(f32, f32)> {
        self.mixer.mix(channel)
    }

    /// Current read position of a channel, in frames.
    pub fn position(&self, channel: usize) -> Option<usize> {
        self.mixer.position(channel)
    }

    /// Format and rate of the last reset on a channel.
    pub fn format(&self, channel: usize) -> Option<(PcmFormat, u32)> {
        self.mixer.format(channel)
    }

    /// Buffers queued on a channel since its last reset.
    pub fn submissions(&self, channel: usize) -> usize {
        self.mixer.submissions(channel)
    }

    /// Renders output frames the way a real device would.
    pub fn render(&self, frames: usize) -> Vec<f32> {
        let mut output = vec![0.0; frames * 2];
        self.mixer.process_into(&mut output, 2);
        output
    }

    pub fn is_shutdown(&self) -> bool {
        self.is_shutdown.load(Ordering::Relaxed)
    }
}

impl super::Device for Device {
    fn channel_count(&self) -> usize {
        self.mixer.num_channels()
    }

    fn sample_rate(&self) -> u32 {
        self.mixer.sample_rate()
    }

    fn reset_channel(&self, channel: usize, format: PcmFormat, rate: u32) {
        self.mixer.reset(channel, format, rate);
    }

    fn set_mix(&self, channel: usize, left: f32, right: f32) {
        self.mixer.set_mix(channel, left, right);
    }

    fn queue_buffer(&self, channel: usize, buffer: WaveBuffer) {
        if self.is_shutdown() {
            return;
        }
        debug!(
            device = self.name,
            channel,
            frames = buffer.frames,
            looping = buffer.looping,
            "Queued buffer"
        );
        self.mixer.queue(channel, buffer);
    }

    fn clear_buffers(&self, channel: usize) {
        self.mixer.clear(channel);
    }

    fn is_playing(&self, channel: usize) -> bool {
        self.mixer.is_playing(channel)
    }

    fn shutdown(&self) {
        self.is_shutdown.store(true, Ordering::Relaxed);
        for channel in 0..self.mixer.num_channels() {
            self.mixer.clear(channel);
        }
    }

    #[cfg(test)]
    fn to_mock(&self) -> Result<Arc<Device>, Box<dyn std::error::Error>> {
        Ok(Arc::new(self.clone()))
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (Mock)", self.name)
    }
}
