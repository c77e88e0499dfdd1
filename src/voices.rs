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

//! Voice management for polyphonic sample playback.
//!
//! Voices live in a fixed table. Callers hold [`VoiceHandle`]s, which pair a slot index with
//! the slot's age at the time the voice was granted. Every time a slot is freed its age
//! increases, so handles to a recycled voice stop matching and all calls on them do nothing.

mod handle;
mod pool;
mod voice;

pub use handle::VoiceHandle;
pub use pool::{VoicePool, MAX_VOICES};
pub use voice::{Voice, VoiceFlags, VoiceShape, DEFAULT_RADIUS};
