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

//! Decoded sample storage.
//!
//! This module provides:
//! - The fixed-size sample table with linear-scan slot allocation
//! - Decoder adapters producing interleaved 16-bit PCM
//! - Nearest-neighbor rate conversion to the engine's mixing rate

mod compressed;
mod decoder;
mod resample;
mod sample;
mod store;
mod wav;

pub use compressed::CompressedDecoder;
pub use decoder::{decode, decoder_for, Decoder};
pub use resample::resample;
pub use sample::{PcmFormat, Sample, SampleId};
pub use store::{SampleStore, MAX_SAMPLES};
pub use wav::WavDecoder;
