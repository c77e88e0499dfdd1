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
use crate::samples::{SampleId, SampleStore};

/// Radius given to every freshly acquired voice.
pub const DEFAULT_RADIUS: f32 = 1500.0;

bitflags::bitflags! {
    /// Per-voice playback flags.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct VoiceFlags: u8 {
        /// Restart the sample when it reaches the end.
        const LOOP = 0b0000_0001;
        /// Attenuate by distance from the listener.
        const POSITIONAL = 0b0000_0010;
        /// Skip left/right balancing for positional voices.
        const NO_PANNING = 0b0000_0100;
    }
}

/// The area in which a positional voice can be heard.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum VoiceShape {
    Circle { radius: f32 },
    Rectangle { width: f32, height: f32 },
}

impl VoiceShape {
    /// Half of the horizontal extent. Used as the panning range.
    pub fn range_x(&self) -> f32 {
        match *self {
            VoiceShape::Circle { radius } => radius,
            VoiceShape::Rectangle { width, .. } => width / 2.0,
        }
    }
}

impl Default for VoiceShape {
    fn default() -> Self {
        VoiceShape::Circle {
            radius: DEFAULT_RADIUS,
        }
    }
}

/// One slot in the voice table. A voice without a sample is free.
#[derive(Debug, Clone)]
pub struct Voice {
    sample: Option<SampleId>,
    channel: usize,
    /// Increases every time the slot is freed.
    age: u64,
    tick: u64,
    /// 0 - 255
    volume: u8,
    flags: VoiceFlags,
    x: f32,
    y: f32,
    /// [0.0, 1.0]
    falloff: f32,
    shape: VoiceShape,
}

impl Voice {
    pub(super) fn new() -> Self {
        Self {
            sample: None,
            channel: 0,
            age: 0,
            tick: 0,
            volume: u8::MAX,
            flags: VoiceFlags::empty(),
            x: 0.0,
            y: 0.0,
            falloff: 0.0,
            shape: VoiceShape::default(),
        }
    }

    /// Binds the slot to a sample and resets every per-voice parameter.
    pub(super) fn start(
        &mut self,
        channel: usize,
        sample: SampleId,
        flags: VoiceFlags,
        x: f32,
        y: f32,
    ) {
        self.sample = Some(sample);
        self.channel = channel;
        self.tick = 0;
        self.volume = u8::MAX;
        self.flags = flags;
        self.x = x;
        self.y = y;
        self.falloff = 0.0;
        self.shape = VoiceShape::default();
    }

    /// Frees a voice that was stopped on purpose, remembering where a looping voice was.
    pub(super) fn release(&mut self, samples: &mut SampleStore) -> bool {
        let Some(id) = self.sample else {
            return false;
        };
        if let Some(sample) = samples.get_mut(id) {
            let paused_at = if self.is_looping() { self.tick } else { 0 };
            sample.set_paused_at(paused_at);
        }
        self.free();
        true
    }

    /// Frees a voice whose sample ran out.
    pub(crate) fn finish(&mut self) {
        if self.sample.is_some() {
            self.free();
        }
    }

    fn free(&mut self) {
        self.sample = None;
        self.age = self.age.wrapping_add(1);
    }

    pub fn sample(&self) -> Option<SampleId> {
        self.sample
    }

    pub fn is_free(&self) -> bool {
        self.sample.is_none()
    }

    pub fn channel(&self) -> usize {
        self.channel
    }

    pub fn age(&self) -> u64 {
        self.age
    }

    /// Number of mixer ticks since the voice started (or last looped).
    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub(crate) fn set_tick(&mut self, tick: u64) {
        self.tick = tick;
    }

    pub(crate) fn advance_tick(&mut self) {
        self.tick = self.tick.wrapping_add(1);
    }

    pub fn volume(&self) -> u8 {
        self.volume
    }

    pub(super) fn set_volume(&mut self, volume: f32) {
        self.volume = (volume.clamp(0.0, 1.0) * 255.0) as u8;
    }

    pub fn flags(&self) -> VoiceFlags {
        self.flags
    }

    pub fn is_looping(&self) -> bool {
        self.flags.contains(VoiceFlags::LOOP)
    }

    pub fn position(&self) -> (f32, f32) {
        (self.x, self.y)
    }

    pub(super) fn set_position(&mut self, x: f32, y: f32) {
        self.x = x;
        self.y = y;
    }

    pub fn falloff(&self) -> f32 {
        self.falloff
    }

    pub(super) fn set_falloff(&mut self, falloff: f32) {
        self.falloff = falloff.clamp(0.0, 1.0);
    }

    pub fn shape(&self) -> VoiceShape {
        self.shape
    }

    pub(super) fn set_shape(&mut self, shape: VoiceShape) {
        self.shape = match shape {
            VoiceShape::Circle { radius } => VoiceShape::Circle {
                radius: radius.max(0.0),
            },
            VoiceShape::Rectangle { width, height } => VoiceShape::Rectangle {
                width: width.max(0.0),
                height: height.max(0.0),
            },
        };
    }
}
