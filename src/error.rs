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

//! Errors surfaced by the sound engine.
//!
//! Operations on a stale voice handle are silent no-ops and have no error variant.

use std::fmt;

/// The fixed-size table that ran out of slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pool {
    Samples,
    Voices,
}

impl fmt::Display for Pool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Pool::Samples => write!(f, "sample"),
            Pool::Voices => write!(f, "voice"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SoundError {
    #[error("No free {0} slots")]
    NoFreeSlots(Pool),

    #[error("Unsupported channel layout: {0} channels (only mono and stereo are supported)")]
    UnsupportedChannelLayout(u16),

    #[error("Unsupported bit depth: {0} bits per sample (expected 16)")]
    UnsupportedBitDepth(u16),

    #[error("Decode failed: {0}")]
    DecodeFailed(String),

    #[error("Sound is disabled")]
    Disabled,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

// Decoders only ever read from memory, so a hound IO error means truncated input.
impl From<hound::Error> for SoundError {
    fn from(e: hound::Error) -> Self {
        SoundError::DecodeFailed(e.to_string())
    }
}

impl From<symphonia::core::errors::Error> for SoundError {
    fn from(e: symphonia::core::errors::Error) -> Self {
        SoundError::DecodeFailed(e.to_string())
    }
}
