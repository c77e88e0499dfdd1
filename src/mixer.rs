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

//! The per-tick spatial mixer.
//!
//! Every tick each active voice gets a left and right gain computed from its channel, its own
//! volume and, for positional voices, its offset from the listener. The gains are pushed to
//! the voice's hardware channel, and voices whose hardware channel went idle are started,
//! looped or retired.

use tracing::{debug, warn};

use crate::audio::{Device, WaveBuffer};
use crate::channels::{Channel, ChannelTable};
use crate::samples::SampleStore;
use crate::voices::{Voice, VoiceFlags, VoicePool, VoiceShape};

/// Left and right gains for a voice on the 0 - 255 scale.
pub fn spatial_gains(voice: &Voice, channel: &Channel, listener: (f32, f32)) -> (f32, f32) {
    let base = channel.volume() as f32 * (voice.volume() as f32 / 255.0);
    let (mut left, mut right) = (base, base);

    if !voice.flags().contains(VoiceFlags::POSITIONAL) || !channel.panning() {
        return (left, right);
    }

    let (x, y) = voice.position();
    let dx = x - listener.0;
    let dy = y - listener.1;
    let shape = voice.shape();

    let Some((falloff_x, falloff_y)) = attenuation(shape, voice.falloff(), dx, dy) else {
        return (0.0, 0.0);
    };

    if !voice.flags().contains(VoiceFlags::NO_PANNING) {
        let range = shape.range_x();
        if range > 0.0 {
            let pan = ((range - dx.abs()) / range).max(0.0);
            // The ear facing away from the sound is the one turned down.
            if dx > 0.0 {
                left *= pan;
            } else {
                right *= pan;
            }
        }
    }

    (left * falloff_x, right * falloff_y)
}

/// Distance attenuation for each axis, or None if the offset lies outside the shape.
fn attenuation(shape: VoiceShape, falloff: f32, dx: f32, dy: f32) -> Option<(f32, f32)> {
    match shape {
        VoiceShape::Circle { radius } => {
            let dist = (dx * dx + dy * dy).sqrt();
            if dist >= radius {
                return None;
            }
            let factor = edge_falloff(dist, radius, falloff);
            Some((factor, factor))
        }
        VoiceShape::Rectangle { width, height } => {
            let (half_width, half_height) = (width / 2.0, height / 2.0);
            let (abs_dx, abs_dy) = (dx.abs(), dy.abs());
            if abs_dx >= half_width || abs_dy >= half_height {
                return None;
            }
            Some((
                edge_falloff(abs_dx, half_width, falloff),
                edge_falloff(abs_dy, half_height, falloff),
            ))
        }
    }
}

/// Full volume up to `extent * falloff`, then linear down to zero at `extent`.
fn edge_falloff(distance: f32, extent: f32, falloff: f32) -> f32 {
    let full = extent * falloff;
    if distance > full {
        (extent - distance) / (extent - full)
    } else {
        1.0
    }
}

/// Drives voices onto the hardware once per tick.
#[derive(Debug, Clone)]
pub struct Mixer {
    listener: (f32, f32),
    /// [0.0, 1.0]
    master_volume: f32,
}

impl Mixer {
    pub fn new() -> Self {
        Self {
            listener: (0.0, 0.0),
            master_volume: 1.0,
        }
    }

    pub fn listener(&self) -> (f32, f32) {
        self.listener
    }

    pub fn set_listener(&mut self, x: f32, y: f32) {
        self.listener = (x, y);
    }

    pub fn master_volume(&self) -> f32 {
        self.master_volume
    }

    /// Scales every gain sent to the hardware. Clamped to [0.0, 1.0].
    pub fn set_master_volume(&mut self, volume: f32) {
        self.master_volume = volume.clamp(0.0, 1.0);
    }

    /// Runs one tick over every active voice.
    pub fn update(
        &self,
        voices: &mut VoicePool,
        samples: &SampleStore,
        channels: &ChannelTable,
        device: &dyn Device,
    ) {
        for (slot, voice) in voices.active_mut() {
            let channel = channels.get(voice.channel()).copied().unwrap_or_default();
            let (left, right) = spatial_gains(voice, &channel, self.listener);
            device.set_mix(
                slot,
                left / 255.0 * self.master_volume,
                right / 255.0 * self.master_volume,
            );

            if !device.is_playing(slot) {
                if voice.tick() == 0 {
                    submit(slot, voice, samples, device);
                } else if voice.is_looping() {
                    voice.set_tick(0);
                    submit(slot, voice, samples, device);
                } else {
                    debug!(voice = slot, ticks = voice.tick(), "Voice finished");
                    voice.finish();
                }
            }

            voice.advance_tick();
        }
    }
}

impl Default for Mixer {
    fn default() -> Self {
        Self::new()
    }
}

/// Queues the voice's whole sample on its hardware channel.
fn submit(slot: usize, voice: &mut Voice, samples: &SampleStore, device: &dyn Device) {
    let Some(sample) = voice.sample().and_then(|id| samples.get(id)) else {
        warn!(voice = slot, "Voice refers to a missing sample, retiring it");
        voice.finish();
        return;
    };

    device.queue_buffer(
        slot,
        WaveBuffer {
            data: sample.data().clone(),
            frames: sample.frames(),
            channels: sample.channels(),
            looping: voice.is_looping(),
        },
    );
}
