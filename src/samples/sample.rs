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
use std::sync::Arc;

use crate::error::SoundError;

/// Marker value for an unset loop point.
pub const NO_LOOP: i32 = -1;

/// Identifies a slot in the sample store. Stable for the lifetime of the loaded sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SampleId(pub usize);

impl SampleId {
    /// Returns the slot index.
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for SampleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The PCM layout handed to the hardware when a sample is played.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PcmFormat {
    Mono16,
    Stereo16,
}

impl PcmFormat {
    /// Gets the format for the given channel count. Only mono and stereo are supported.
    pub fn from_channels(channels: u16) -> Result<PcmFormat, SoundError> {
        match channels {
            1 => Ok(PcmFormat::Mono16),
            2 => Ok(PcmFormat::Stereo16),
            _ => Err(SoundError::UnsupportedChannelLayout(channels)),
        }
    }

    /// Returns the number of interleaved channels in this format.
    pub fn channel_count(self) -> u16 {
        match self {
            PcmFormat::Mono16 => 1,
            PcmFormat::Stereo16 => 2,
        }
    }
}

/// A decoded sample: interleaved signed 16-bit PCM plus the metadata needed to play it.
///
/// The PCM data is shared through an [`Arc`] so the hardware layer can hold on to a buffer it
/// is consuming without copying it. The store remains the only owner that can replace or
/// release it.
#[derive(Clone)]
pub struct Sample {
    data: Arc<[i16]>,
    frames: usize,
    rate: u32,
    format: PcmFormat,
    /// Reserved loop markers. Playback does not read them yet.
    loop_start: i32,
    loop_end: i32,
    /// Tick at which the last looping voice of this sample was stopped.
    paused_at: u64,
}

impl Sample {
    /// Creates a sample from interleaved PCM data. Any trailing partial frame is dropped.
    pub fn from_pcm(mut data: Vec<i16>, channels: u16, rate: u32) -> Result<Sample, SoundError> {
        let format = PcmFormat::from_channels(channels)?;
        if rate == 0 {
            return Err(SoundError::DecodeFailed("sample rate is zero".to_string()));
        }

        let frames = data.len() / channels as usize;
        data.truncate(frames * channels as usize);

        Ok(Sample {
            data: data.into(),
            frames,
            rate,
            format,
            loop_start: NO_LOOP,
            loop_end: NO_LOOP,
            paused_at: 0,
        })
    }

    /// Returns the interleaved PCM data.
    pub fn data(&self) -> &Arc<[i16]> {
        &self.data
    }

    /// Returns the number of frames (samples per channel).
    pub fn frames(&self) -> usize {
        self.frames
    }

    /// Returns the number of channels.
    pub fn channels(&self) -> u16 {
        self.format.channel_count()
    }

    /// Returns the sample rate of the PCM data.
    pub fn rate(&self) -> u32 {
        self.rate
    }

    pub fn format(&self) -> PcmFormat {
        self.format
    }

    pub fn loop_points(&self) -> (i32, i32) {
        (self.loop_start, self.loop_end)
    }

    pub fn paused_at(&self) -> u64 {
        self.paused_at
    }

    pub(crate) fn set_paused_at(&mut self, tick: u64) {
        self.paused_at = tick;
    }

    /// Returns true if the sample holds no PCM data.
    pub fn is_empty(&self) -> bool {
        self.frames == 0
    }

    /// Returns the duration in seconds.
    pub fn duration_secs(&self) -> f32 {
        self.frames as f32 / self.rate as f32
    }

    /// Returns the memory size of the PCM data in bytes.
    pub fn memory_size(&self) -> usize {
        self.data.len() * std::mem::size_of::<i16>()
    }

    /// Swaps in fully converted PCM data at a new rate.
    pub(super) fn replace_data(&mut self, data: Vec<i16>, frames: usize, rate: u32) {
        self.data = data.into();
        self.frames = frames;
        self.rate = rate;
    }
}

impl fmt::Debug for Sample {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sample")
            .field("frames", &self.frames)
            .field("channels", &self.channels())
            .field("rate", &self.rate)
            .field("loop_start", &self.loop_start)
            .field("loop_end", &self.loop_end)
            .field("paused_at", &self.paused_at)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_pcm_stereo() {
        let sample = Sample::from_pcm(vec![1, -1, 2, -2, 3, -3], 2, 44100).unwrap();
        assert_eq!(sample.frames(), 3);
        assert_eq!(sample.channels(), 2);
        assert_eq!(sample.format(), PcmFormat::Stereo16);
        assert_eq!(sample.loop_points(), (NO_LOOP, NO_LOOP));
        assert_eq!(sample.paused_at(), 0);
        assert_eq!(sample.memory_size(), 12);
    }

    #[test]
    fn test_from_pcm_drops_partial_frame() {
        let sample = Sample::from_pcm(vec![1, 2, 3], 2, 48000).unwrap();
        assert_eq!(sample.frames(), 1);
        assert_eq!(sample.data().len(), 2);
    }

    #[test]
    fn test_from_pcm_rejects_surround() {
        assert!(matches!(
            Sample::from_pcm(vec![0; 6], 6, 48000),
            Err(SoundError::UnsupportedChannelLayout(6))
        ));
        assert!(matches!(
            Sample::from_pcm(vec![], 0, 48000),
            Err(SoundError::UnsupportedChannelLayout(0))
        ));
    }

    #[test]
    fn test_duration() {
        let sample = Sample::from_pcm(vec![0; 24000], 1, 48000).unwrap();
        assert_eq!(sample.duration_secs(), 0.5);
    }
}
