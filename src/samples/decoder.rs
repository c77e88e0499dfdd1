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
use super::compressed::CompressedDecoder;
use super::sample::Sample;
use super::wav::WavDecoder;
use crate::error::SoundError;

/// Turns an encoded byte buffer into a fully decoded [`Sample`].
///
/// Implementations drain the whole stream into one interleaved 16-bit buffer; there is no
/// partial or streaming decode.
pub trait Decoder: Send + Sync {
    /// A short name for logging.
    fn name(&self) -> &'static str;

    /// Decodes the given bytes.
    fn decode(&self, bytes: &[u8]) -> Result<Sample, SoundError>;
}

/// Returns true if the bytes start with a RIFF/WAVE header.
fn is_wav(bytes: &[u8]) -> bool {
    bytes.len() >= 12 && &bytes[0..4] == b"RIFF" && &bytes[8..12] == b"WAVE"
}

/// Picks a decoder for the given bytes by sniffing the header.
pub fn decoder_for(bytes: &[u8]) -> Box<dyn Decoder> {
    if is_wav(bytes) {
        Box::new(WavDecoder)
    } else {
        Box::new(CompressedDecoder)
    }
}

/// Decodes the given bytes with whichever decoder matches them.
pub fn decode(bytes: &[u8]) -> Result<Sample, SoundError> {
    if bytes.is_empty() {
        return Err(SoundError::DecodeFailed("no data".to_string()));
    }
    decoder_for(bytes).decode(bytes)
}
