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
use std::{
    any::TypeId,
    error::Error,
    f32::consts::PI,
    fs,
    io::{Cursor, Seek, Write},
    path::Path,
};

use hound::{SampleFormat, WavSpec, WavWriter};

/// Encodes per-channel samples as a 16-bit WAV file in memory.
pub fn wav_bytes<S: hound::Sample + Copy + 'static>(
    samples: Vec<Vec<S>>,
    sample_rate: u32,
) -> Result<Vec<u8>, Box<dyn Error>> {
    wav_bytes_with_bits(samples, sample_rate, 16)
}

/// Encodes per-channel samples as a WAV file in memory with the given bit depth.
pub fn wav_bytes_with_bits<S: hound::Sample + Copy + 'static>(
    samples: Vec<Vec<S>>,
    sample_rate: u32,
    bits_per_sample: u16,
) -> Result<Vec<u8>, Box<dyn Error>> {
    let mut bytes = Vec::new();
    write_interleaved(Cursor::new(&mut bytes), samples, sample_rate, bits_per_sample)?;
    Ok(bytes)
}

/// Writes a 16-bit WAV file to disk.
pub fn write_wav<S: hound::Sample + Copy + 'static>(
    path: &Path,
    samples: Vec<Vec<S>>,
    sample_rate: u32,
) -> Result<(), Box<dyn Error>> {
    fs::write(path, wav_bytes(samples, sample_rate)?)?;
    Ok(())
}

fn write_interleaved<W, S>(
    writer: W,
    samples: Vec<Vec<S>>,
    sample_rate: u32,
    bits_per_sample: u16,
) -> Result<(), Box<dyn Error>>
where
    W: Write + Seek,
    S: hound::Sample + Copy + 'static,
{
    // Determine sample format based on the type
    let sample_format = if TypeId::of::<S>() == TypeId::of::<f32>() {
        SampleFormat::Float
    } else if TypeId::of::<S>() == TypeId::of::<i32>() || TypeId::of::<S>() == TypeId::of::<i16>()
    {
        SampleFormat::Int
    } else {
        return Err("Unsupported sample format".into());
    };

    let num_channels = samples.len();
    assert!(num_channels <= u16::MAX.into(), "Too many channels!");
    let frames = samples.iter().map(Vec::len).min().unwrap_or(0);

    let mut writer = WavWriter::new(
        writer,
        WavSpec {
            channels: num_channels as u16,
            sample_rate,
            bits_per_sample,
            sample_format,
        },
    )?;
    for frame in 0..frames {
        for channel in &samples {
            writer.write_sample(channel[frame])?;
        }
    }
    writer.finalize()?;

    Ok(())
}

/// A mono sine tone at half scale.
pub fn tone(frequency: f32, sample_rate: u32, frames: usize) -> Vec<i16> {
    (0..frames)
        .map(|i| {
            let t = i as f32 / sample_rate as f32;
            ((2.0 * PI * frequency * t).sin() * i16::MAX as f32 / 2.0) as i16
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wav_bytes_interleaves() {
        let bytes = wav_bytes(vec![vec![1i16, 2], vec![-1i16, -2]], 8000).unwrap();
        let mut reader = hound::WavReader::new(Cursor::new(bytes)).unwrap();
        let samples: Vec<i16> = reader.samples::<i16>().map(|s| s.unwrap()).collect();
        assert_eq!(samples, vec![1, -1, 2, -2]);
    }

    #[test]
    fn test_tone_bounds() {
        let samples = tone(440.0, 48000, 480);
        assert_eq!(samples.len(), 480);
        assert_eq!(samples[0], 0);
        assert!(samples.iter().all(|s| s.unsigned_abs() <= i16::MAX as u16 / 2 + 1));
    }
}
