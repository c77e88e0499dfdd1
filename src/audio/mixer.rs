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
// Hardware channel bank shared by the cpal and mock devices.
use std::sync::Arc;

use parking_lot::Mutex;

use super::WaveBuffer;
use crate::samples::PcmFormat;

/// One hardware playback channel.
struct HardwareChannel {
    format: PcmFormat,
    rate: u32,
    left: f32,
    right: f32,
    buffer: Option<WaveBuffer>,
    /// Read position in source frames.
    position: f64,
    /// Number of buffers queued since the last reset.
    submissions: usize,
}

impl HardwareChannel {
    fn new(sample_rate: u32) -> Self {
        Self {
            format: PcmFormat::Mono16,
            rate: sample_rate,
            left: 0.0,
            right: 0.0,
            buffer: None,
            position: 0.0,
            submissions: 0,
        }
    }

    fn reset(&mut self, format: PcmFormat, rate: u32) {
        self.format = format;
        self.rate = rate;
        self.left = 0.0;
        self.right = 0.0;
        self.buffer = None;
        self.position = 0.0;
        self.submissions = 0;
    }

    fn is_playing(&self) -> bool {
        match &self.buffer {
            Some(buffer) if buffer.looping => buffer.frames > 0,
            Some(buffer) => (self.position as usize) < buffer.frames,
            None => false,
        }
    }

    /// Moves the read position forward, dropping a finished one-shot buffer.
    fn step(&mut self, frames: f64) {
        let Some(buffer) = &self.buffer else {
            return;
        };
        let length = buffer.frames as f64;
        let looping = buffer.looping && buffer.frames > 0;

        self.position += frames;
        if self.position >= length {
            if looping {
                self.position %= length;
            } else {
                self.buffer = None;
                self.position = 0.0;
            }
        }
    }

    /// The current frame scaled by the channel gains, as normalized floats.
    fn frame(&self) -> (f32, f32) {
        let Some(buffer) = &self.buffer else {
            return (0.0, 0.0);
        };
        let index = self.position as usize;
        if index >= buffer.frames {
            return (0.0, 0.0);
        }

        let (left, right) = if buffer.channels == 1 {
            let value = buffer.data[index] as f32 / 32768.0;
            (value, value)
        } else {
            let base = index * buffer.channels as usize;
            (
                buffer.data[base] as f32 / 32768.0,
                buffer.data[base + 1] as f32 / 32768.0,
            )
        };
        (left * self.left, right * self.right)
    }
}

/// A bank of hardware channels mixed down to one stereo stream.
#[derive(Clone)]
pub struct ChannelMixer {
    channels: Arc<Mutex<Vec<HardwareChannel>>>,
    sample_rate: u32,
}

impl ChannelMixer {
    pub fn new(num_channels: usize, sample_rate: u32) -> Self {
        Self {
            channels: Arc::new(Mutex::new(
                (0..num_channels)
                    .map(|_| HardwareChannel::new(sample_rate))
                    .collect(),
            )),
            sample_rate,
        }
    }

    pub fn num_channels(&self) -> usize {
        self.channels.lock().len()
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn with_channel<R, F>(&self, channel: usize, f: F) -> Option<R>
    where
        F: FnOnce(&mut HardwareChannel) -> R,
    {
        self.channels.lock().get_mut(channel).map(f)
    }

    pub fn reset(&self, channel: usize, format: PcmFormat, rate: u32) {
        self.with_channel(channel, |c| c.reset(format, rate));
    }

    pub fn set_mix(&self, channel: usize, left: f32, right: f32) {
        self.with_channel(channel, |c| {
            c.left = left;
            c.right = right;
        });
    }

    pub fn queue(&self, channel: usize, buffer: WaveBuffer) {
        self.with_channel(channel, |c| {
            c.buffer = Some(buffer);
            c.position = 0.0;
            c.submissions += 1;
        });
    }

    pub fn clear(&self, channel: usize) {
        self.with_channel(channel, |c| {
            c.buffer = None;
            c.position = 0.0;
        });
    }

    pub fn is_playing(&self, channel: usize) -> bool {
        self.with_channel(channel, |c| c.is_playing())
            .unwrap_or(false)
    }

    /// Current gains of a channel.
    pub fn mix(&self, channel: usize) -> Option<(f32, f32)> {
        self.with_channel(channel, |c| (c.left, c.right))
    }

    /// Current read position of a channel in whole source frames.
    pub fn position(&self, channel: usize) -> Option<usize> {
        self.with_channel(channel, |c| c.position as usize)
    }

    pub fn format(&self, channel: usize) -> Option<(PcmFormat, u32)> {
        self.with_channel(channel, |c| (c.format, c.rate))
    }

    pub fn submissions(&self, channel: usize) -> usize {
        self.with_channel(channel, |c| c.submissions).unwrap_or(0)
    }

    fn step_for(&self, channel: &HardwareChannel) -> f64 {
        channel.rate as f64 / self.sample_rate as f64
    }

    /// Consumes `frames` output frames without producing audio.
    pub fn advance(&self, frames: usize) {
        let mut channels = self.channels.lock();
        for channel in channels.iter_mut() {
            let step = self.step_for(channel);
            channel.step(step * frames as f64);
        }
    }

    /// Mixes every playing channel into an interleaved output buffer. The stereo mix goes to
    /// the first two output channels and any others are left silent.
    pub fn process_into(&self, output: &mut [f32], output_channels: u16) {
        output.fill(0.0);
        let output_channels = output_channels.max(1) as usize;

        let mut channels = self.channels.lock();
        for frame in output.chunks_mut(output_channels) {
            for channel in channels.iter_mut().filter(|c| c.buffer.is_some()) {
                let (left, right) = channel.frame();
                if output_channels == 1 {
                    frame[0] += (left + right) / 2.0;
                } else {
                    frame[0] += left;
                    frame[1] += right;
                }
                let step = self.step_for(channel);
                channel.step(step);
            }
        }
        drop(channels);

        for sample in output.iter_mut() {
            *sample = sample.clamp(-1.0, 1.0);
        }
    }
}
