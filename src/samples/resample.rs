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
use tracing::debug;

use super::sample::Sample;

/// Converts a sample to the target rate in place using nearest-neighbor lookup.
///
/// Output frame `i` copies source frame `floor(i / out_frames * frames)`, so every output
/// value is a verbatim input value. Does nothing if the sample is empty or already at the
/// target rate.
pub fn resample(sample: &mut Sample, target_rate: u32) {
    if sample.is_empty() || target_rate == 0 || sample.rate() == target_rate {
        return;
    }

    let frames = sample.frames();
    let channels = sample.channels() as usize;
    let out_frames =
        (frames as f64 * target_rate as f64 / sample.rate() as f64).round() as usize;

    let source = sample.data();
    let mut converted = Vec::with_capacity(out_frames * channels);
    for i in 0..out_frames {
        // floor(i / out_frames * frames), kept in integers so it is exact.
        let f = (i * frames / out_frames).min(frames - 1);
        converted.extend_from_slice(&source[f * channels..(f + 1) * channels]);
    }

    debug!(
        source_rate = sample.rate(),
        target_rate,
        frames,
        out_frames,
        "Resampled sample"
    );
    sample.replace_data(converted, out_frames, target_rate);
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    fn ramp(frames: usize, channels: u16, rate: u32) -> Sample {
        let data = (0..frames * channels as usize).map(|i| i as i16).collect();
        Sample::from_pcm(data, channels, rate).unwrap()
    }

    #[test]
    fn test_same_rate_is_noop() {
        let mut sample = ramp(100, 1, 48000);
        let before = sample.data().clone();
        resample(&mut sample, 48000);
        assert!(Arc::ptr_eq(&before, sample.data()));
        assert_eq!(sample.frames(), 100);
    }

    #[test]
    fn test_empty_is_noop() {
        let mut sample = Sample::from_pcm(vec![], 1, 22050).unwrap();
        resample(&mut sample, 48000);
        assert_eq!(sample.rate(), 22050);
        assert_eq!(sample.frames(), 0);
    }

    #[test]
    fn test_upsample_doubles_frames() {
        let mut sample = Sample::from_pcm(vec![10, 20, 30, 40], 1, 24000).unwrap();
        resample(&mut sample, 48000);

        assert_eq!(sample.rate(), 48000);
        assert_eq!(sample.frames(), 8);
        assert_eq!(&sample.data()[..], &[10, 10, 20, 20, 30, 30, 40, 40]);
    }

    #[test]
    fn test_downsample_picks_nearest_frames() {
        let mut sample = Sample::from_pcm(vec![1, 2, 3, 4, 5, 6], 1, 48000).unwrap();
        resample(&mut sample, 24000);

        assert_eq!(sample.frames(), 3);
        assert_eq!(&sample.data()[..], &[1, 3, 5]);
    }

    #[test]
    fn test_stereo_frames_stay_together() {
        let mut sample = Sample::from_pcm(vec![1, -1, 2, -2], 2, 22050).unwrap();
        resample(&mut sample, 44100);

        assert_eq!(sample.frames(), 4);
        assert_eq!(&sample.data()[..], &[1, -1, 1, -1, 2, -2, 2, -2]);
    }

    #[test]
    fn test_round_trip_frame_count() {
        let cases = [(100, 44100, 48000), (96000, 48000, 44100), (333, 22050, 48000)];
        for (frames, from, to) in cases {
            let mut sample = ramp(frames, 2, from);
            resample(&mut sample, to);
            resample(&mut sample, from);
            let diff = (sample.frames() as i64 - frames as i64).abs();
            assert!(diff <= 1, "{} frames became {}", frames, sample.frames());
            assert_eq!(sample.rate(), from);
        }
    }

    #[test]
    fn test_output_values_come_from_source() {
        let mut sample = ramp(1000, 1, 44100);
        resample(&mut sample, 48000);
        assert!(sample.data().iter().all(|v| (0..1000).contains(&(*v as i32))));
        assert_eq!(sample.data()[0], 0);
        assert_eq!(*sample.data().last().unwrap(), 999);
    }
}
