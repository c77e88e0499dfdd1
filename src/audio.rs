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
use std::{any::Any, error::Error, fmt, sync::Arc};

use crate::config;
use crate::samples::PcmFormat;

pub mod cpal;
pub mod mixer;
pub mod mock;

/// A block of interleaved PCM handed to a hardware channel. The data is shared with the
/// sample it came from, so queuing never copies audio.
#[derive(Clone)]
pub struct WaveBuffer {
    pub data: Arc<[i16]>,
    pub frames: usize,
    pub channels: u16,
    pub looping: bool,
}

impl fmt::Debug for WaveBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WaveBuffer")
            .field("frames", &self.frames)
            .field("channels", &self.channels)
            .field("looping", &self.looping)
            .finish()
    }
}

/// A playback device exposing one hardware channel per voice.
///
/// Channel indices out of range are ignored.
pub trait Device: Any + fmt::Display + std::marker::Send + std::marker::Sync {
    /// Number of hardware channels.
    fn channel_count(&self) -> usize;

    /// The rate the device mixes at.
    fn sample_rate(&self) -> u32;

    /// Stops a channel and prepares it for audio in the given format.
    fn reset_channel(&self, channel: usize, format: PcmFormat, rate: u32);

    /// Sets the left and right gains of a channel. Gains are in [0.0, 1.0].
    fn set_mix(&self, channel: usize, left: f32, right: f32);

    /// Starts playing a buffer on a channel.
    fn queue_buffer(&self, channel: usize, buffer: WaveBuffer);

    /// Drops any buffer queued on a channel.
    fn clear_buffers(&self, channel: usize);

    /// Returns true while a channel still has audio to play.
    fn is_playing(&self, channel: usize) -> bool;

    /// Releases the output stream. Further calls are ignored.
    fn shutdown(&self) {}

    #[cfg(test)]
    fn to_mock(&self) -> Result<Arc<mock::Device>, Box<dyn Error>>;
}

/// Lists devices known to cpal.
pub fn list_devices() -> Result<Vec<Box<dyn Device>>, Box<dyn Error>> {
    cpal::Device::list()
}

/// Gets the device named in the configuration. Names starting with "mock" give a mock device.
pub fn get_device(config: &config::Sound) -> Result<Arc<dyn Device>, Box<dyn Error>> {
    let device = config.device();
    if device.starts_with("mock") {
        return Ok(Arc::new(mock::Device::get(device, config.sample_rate())));
    };

    Ok(Arc::new(cpal::Device::get(config)?))
}
