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

/// A capability token for one playing voice.
///
/// A handle does not keep the voice alive. Once the voice is stopped or finishes on its own,
/// the slot's age moves on and the handle silently stops referring to anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VoiceHandle {
    id: Option<usize>,
    age: u64,
}

impl VoiceHandle {
    /// A handle that refers to no slot. Returned when the voice pool is full.
    pub const INVALID: VoiceHandle = VoiceHandle { id: None, age: 0 };

    pub(crate) fn new(id: usize, age: u64) -> VoiceHandle {
        VoiceHandle { id: Some(id), age }
    }

    /// Returns true if the handle was issued for a real slot. A valid handle may still be
    /// stale.
    pub fn is_valid(&self) -> bool {
        self.id.is_some()
    }

    /// The slot index, if any.
    pub fn id(&self) -> Option<usize> {
        self.id
    }

    /// The slot age at the time the handle was issued.
    pub fn age(&self) -> u64 {
        self.age
    }
}

impl Default for VoiceHandle {
    fn default() -> Self {
        VoiceHandle::INVALID
    }
}

impl fmt::Display for VoiceHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.id {
            Some(id) => write!(f, "voice {}@{}", id, self.age),
            None => write!(f, "voice <invalid>"),
        }
    }
}
