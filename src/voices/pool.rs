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
use std::fmt;

use tracing::{debug, warn};

use super::handle::VoiceHandle;
use super::voice::{Voice, VoiceFlags, VoiceShape};
use crate::error::{Pool, SoundError};
use crate::samples::{SampleId, SampleStore};

/// Number of simultaneously playing voices. Each voice owns one hardware channel.
pub const MAX_VOICES: usize = 24;

/// A fixed table of voices handed out round-robin.
pub struct VoicePool {
    voices: Vec<Voice>,
    /// Where the next free-slot search starts.
    next: usize,
}

impl VoicePool {
    pub fn new() -> Self {
        Self::with_capacity(MAX_VOICES)
    }

    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            voices: (0..capacity).map(|_| Voice::new()).collect(),
            next: 0,
        }
    }

    /// Grants a free voice, searching forward from the slot after the last grant.
    /// Returns [`VoiceHandle::INVALID`] if every voice is busy.
    pub fn acquire(
        &mut self,
        channel: usize,
        sample: SampleId,
        flags: VoiceFlags,
        x: f32,
        y: f32,
    ) -> VoiceHandle {
        let capacity = self.voices.len();
        for offset in 0..capacity {
            let id = (self.next + offset) % capacity;
            let voice = &mut self.voices[id];
            if !voice.is_free() {
                continue;
            }

            voice.start(channel, sample, flags, x, y);
            self.next = (id + 1) % capacity;
            debug!(voice = id, age = voice.age(), %sample, channel, "Acquired voice");
            return VoiceHandle::new(id, voice.age());
        }

        warn!(
            capacity,
            err = %SoundError::NoFreeSlots(Pool::Voices),
            "Unable to acquire voice"
        );
        VoiceHandle::INVALID
    }

    /// Resolves a handle to its slot index if the handle is still current.
    fn resolve(&self, handle: VoiceHandle) -> Option<usize> {
        let id = handle.id()?;
        let voice = self.voices.get(id)?;
        (voice.age() == handle.age()).then_some(id)
    }

    fn voice_mut(&mut self, handle: VoiceHandle) -> Option<&mut Voice> {
        let id = self.resolve(handle)?;
        self.voices.get_mut(id)
    }

    /// Returns the voice behind a current handle. Free voices are still returned, since a
    /// handle stays current until its voice is released.
    pub fn get(&self, handle: VoiceHandle) -> Option<&Voice> {
        self.resolve(handle).map(|id| &self.voices[id])
    }

    /// Returns true if the handle is current and its voice is playing.
    pub fn is_active(&self, handle: VoiceHandle) -> bool {
        self.get(handle).is_some_and(|voice| !voice.is_free())
    }

    /// Number of voices currently bound to a sample.
    pub fn active_count(&self) -> usize {
        self.voices.iter().filter(|voice| !voice.is_free()).count()
    }

    pub fn capacity(&self) -> usize {
        self.voices.len()
    }

    /// Stops the voice behind a handle. Returns the freed slot so the caller can clear the
    /// matching hardware channel.
    pub fn release(&mut self, handle: VoiceHandle, samples: &mut SampleStore) -> Option<usize> {
        let id = self.resolve(handle)?;
        self.release_slot(id, samples).then_some(id)
    }

    /// Stops every voice playing the given sample.
    pub fn release_sample(&mut self, sample: SampleId, samples: &mut SampleStore) -> Vec<usize> {
        self.release_where(|voice| voice.sample() == Some(sample), samples)
    }

    /// Stops every voice.
    pub fn release_all(&mut self, samples: &mut SampleStore) -> Vec<usize> {
        self.release_where(|voice| !voice.is_free(), samples)
    }

    fn release_where<F>(&mut self, predicate: F, samples: &mut SampleStore) -> Vec<usize>
    where
        F: Fn(&Voice) -> bool,
    {
        let matching: Vec<usize> = self
            .voices
            .iter()
            .enumerate()
            .filter(|(_, voice)| predicate(voice))
            .map(|(id, _)| id)
            .collect();
        matching
            .into_iter()
            .filter(|id| self.release_slot(*id, samples))
            .collect()
    }

    fn release_slot(&mut self, id: usize, samples: &mut SampleStore) -> bool {
        let released = self.voices[id].release(samples);
        if released {
            debug!(voice = id, age = self.voices[id].age(), "Released voice");
        }
        released
    }

    /// Sets the volume of a voice. `volume` is clamped to [0.0, 1.0].
    pub fn set_volume(&mut self, handle: VoiceHandle, volume: f32) -> bool {
        self.update(handle, |voice| voice.set_volume(volume))
    }

    /// Sets how far into the shape full volume extends. Clamped to [0.0, 1.0].
    pub fn set_falloff(&mut self, handle: VoiceHandle, falloff: f32) -> bool {
        self.update(handle, |voice| voice.set_falloff(falloff))
    }

    pub fn set_location(&mut self, handle: VoiceHandle, x: f32, y: f32) -> bool {
        self.update(handle, |voice| voice.set_position(x, y))
    }

    /// Makes the voice audible within a circle. Negative radii become 0.
    pub fn set_circle(&mut self, handle: VoiceHandle, radius: f32) -> bool {
        self.update(handle, |voice| voice.set_shape(VoiceShape::Circle { radius }))
    }

    /// Makes the voice audible within an axis-aligned rectangle. Negative sizes become 0.
    pub fn set_rectangle(&mut self, handle: VoiceHandle, width: f32, height: f32) -> bool {
        self.update(handle, |voice| {
            voice.set_shape(VoiceShape::Rectangle { width, height })
        })
    }

    fn update<F>(&mut self, handle: VoiceHandle, f: F) -> bool
    where
        F: FnOnce(&mut Voice),
    {
        match self.voice_mut(handle) {
            Some(voice) => {
                f(voice);
                true
            }
            None => false,
        }
    }

    /// Iterates the voices that are bound to a sample, along with their slot index.
    pub(crate) fn active_mut(&mut self) -> impl Iterator<Item = (usize, &mut Voice)> {
        self.voices
            .iter_mut()
            .enumerate()
            .filter(|(_, voice)| !voice.is_free())
    }

    /// Iterates every voice slot.
    pub fn iter(&self) -> impl Iterator<Item = &Voice> {
        self.voices.iter()
    }
}

impl Default for VoicePool {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for VoicePool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VoicePool")
            .field("capacity", &self.voices.len())
            .field("active", &self.active_count())
            .field("next", &self.next)
            .finish()
    }
}
