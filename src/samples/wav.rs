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
use std::io::Cursor;

use hound::WavReader;
use tracing::warn;

use super::decoder::Decoder;
use super::sample::Sample;
use crate::error::SoundError;

/// Strict PCM decoder: RIFF/WAVE files holding 16-bit integer samples only.
pub struct WavDecoder;

impl Decoder for WavDecoder {
    fn name(&self) -> &'static str {
        "wav"
    }

    fn decode(&self, bytes: &[u8]) -> Result<Sample, SoundError> {
        let reader = WavReader::new(Cursor::new(bytes))?;
        let spec = reader.spec();

        if spec.channels > 2 {
            warn!(channels = spec.channels, "WAV file is not mono or stereo");
            return Err(SoundError::UnsupportedChannelLayout(spec.channels));
        }

        if spec.sample_format != hound::SampleFormat::Int || spec.bits_per_sample != 16 {
            warn!(
                bits_per_sample = spec.bits_per_sample,
                "WAV file is not 16-bit integer PCM"
            );
            return Err(SoundError::UnsupportedBitDepth(spec.bits_per_sample));
        }

        let data = reader
            .into_samples::<i16>()
            .collect::<Result<Vec<i16>, hound::Error>>()?;

        Sample::from_pcm(data, spec.channels, spec.sample_rate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::samples::PcmFormat;
    use crate::testutil::{wav_bytes, wav_bytes_with_bits};

    #[test]
    fn test_decode_stereo() {
        let bytes = wav_bytes(vec![vec![1i16, 2, 3], vec![-1i16, -2, -3]], 22050).unwrap();
        let sample = WavDecoder.decode(&bytes).unwrap();

        assert_eq!(sample.frames(), 3);
        assert_eq!(sample.rate(), 22050);
        assert_eq!(sample.format(), PcmFormat::Stereo16);
        assert_eq!(&sample.data()[..], &[1, -1, 2, -2, 3, -3]);
        assert_eq!(sample.loop_points(), (-1, -1));
        assert_eq!(sample.paused_at(), 0);
    }

    #[test]
    fn test_reject_three_channels() {
        let bytes = wav_bytes(vec![vec![0i16; 4]; 3], 48000).unwrap();
        assert!(matches!(
            WavDecoder.decode(&bytes),
            Err(SoundError::UnsupportedChannelLayout(3))
        ));
    }

    #[test]
    fn test_reject_32_bit() {
        let bytes = wav_bytes_with_bits(vec![vec![0i32; 4]], 48000, 32).unwrap();
        assert!(matches!(
            WavDecoder.decode(&bytes),
            Err(SoundError::UnsupportedBitDepth(32))
        ));
    }

    #[test]
    fn test_reject_float() {
        let bytes = wav_bytes_with_bits(vec![vec![0.5f32; 4]], 48000, 32).unwrap();
        assert!(matches!(
            WavDecoder.decode(&bytes),
            Err(SoundError::UnsupportedBitDepth(32))
        ));
    }

    #[test]
    fn test_truncated() {
        let bytes = wav_bytes(vec![vec![7i16; 64]], 48000).unwrap();
        assert!(matches!(
            WavDecoder.decode(&bytes[..20]),
            Err(SoundError::DecodeFailed(_))
        ));
    }
}
