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

//! The fixed-size sample table.

use tracing::debug;

use super::sample::{Sample, SampleId};
use crate::error::{Pool, SoundError};

/// Number of sample slots.
pub const MAX_SAMPLES: usize = 512;

/// Holds decoded samples in fixed slots. Slot ids never move while a sample is loaded.
pub struct SampleStore {
    slots: Vec<Option<Sample>>,
}

impl SampleStore {
    /// Creates an empty store with [`MAX_SAMPLES`] slots.
    pub fn new() -> Self {
        Self::with_capacity(MAX_SAMPLES)
    }

    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: (0..capacity).map(|_| None).collect(),
        }
    }

    /// Finds the first empty slot.
    pub fn allocate(&self) -> Result<SampleId, SoundError> {
        // TODO: keep a free list if the table ever grows past a few hundred slots.
        self.slots
            .iter()
            .position(Option::is_none)
            .map(SampleId)
            .ok_or(SoundError::NoFreeSlots(Pool::Samples))
    }

    /// Stores a sample in a slot previously returned by [`SampleStore::allocate`].
    /// Returns false if the id is out of range.
    pub fn insert(&mut self, id: SampleId, sample: Sample) -> bool {
        match self.slots.get_mut(id.index()) {
            Some(slot) => {
                debug_assert!(slot.is_none(), "sample slot {} already occupied", id);
                *slot = Some(sample);
                true
            }
            None => false,
        }
    }

    /// Empties the slot, returning the sample that was in it.
    pub fn remove(&mut self, id: SampleId) -> Option<Sample> {
        let removed = self.slots.get_mut(id.index()).and_then(Option::take);
        if removed.is_some() {
            debug!(sample = id.index(), "Sample slot released");
        }
        removed
    }

    pub fn get(&self, id: SampleId) -> Option<&Sample> {
        self.slots.get(id.index()).and_then(Option::as_ref)
    }

    pub fn get_mut(&mut self, id: SampleId) -> Option<&mut Sample> {
        self.slots.get_mut(id.index()).and_then(Option::as_mut)
    }

    /// Returns true if the id refers to a loaded sample.
    pub fn contains(&self, id: SampleId) -> bool {
        self.get(id).is_some()
    }

    /// Returns the duration of the sample in seconds, or 0 for an invalid id.
    pub fn duration(&self, id: SampleId) -> f32 {
        self.get(id).map_or(0.0, Sample::duration_secs)
    }

    /// Returns the number of loaded samples.
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the slot count.
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Returns the total memory held by loaded PCM data.
    pub fn memory_usage(&self) -> usize {
        self.slots.iter().flatten().map(Sample::memory_size).sum()
    }
}

impl Default for SampleStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for SampleStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SampleStore")
            .field("loaded_samples", &self.len())
            .field("capacity", &self.capacity())
            .field("total_memory_kb", &(self.memory_usage() / 1024))
            .finish()
    }
}
