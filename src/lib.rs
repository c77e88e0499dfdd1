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

//! A fixed-pool spatial audio mixing engine.
//!
//! Samples are decoded into a fixed table, converted to the mixing rate, and played through a
//! fixed set of voices. Each voice belongs to a logical channel and may be positioned in 2D
//! space; once per tick the engine turns voice and listener positions into left/right gains
//! and drives one hardware channel per voice.

pub mod audio;
pub mod channels;
pub mod config;
pub mod engine;
pub mod error;
pub mod mixer;
pub mod samples;
pub mod util;
pub mod voices;

#[cfg(test)]
mod testutil;

pub use engine::SoundEngine;
pub use error::SoundError;
pub use samples::SampleId;
pub use voices::{VoiceFlags, VoiceHandle};
