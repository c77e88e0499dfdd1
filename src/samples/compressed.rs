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

use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::{FormatOptions, Packet};
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use symphonia::default::{get_codecs, get_probe};
use tracing::{debug, warn};

use super::decoder::Decoder;
use super::sample::Sample;
use crate::error::SoundError;

/// Decoder for compressed formats (Ogg Vorbis, FLAC, MP3, ...) backed by symphonia.
/// Output is always converted to interleaved 16-bit PCM.
pub struct CompressedDecoder;

/// Reads the next packet. `Ok(None)` signals the end of the stream.
fn next_packet(
    format_reader: &mut dyn symphonia::core::formats::FormatReader,
) -> Result<Option<Packet>, SoundError> {
    match format_reader.next_packet() {
        Ok(packet) => Ok(Some(packet)),
        Err(SymphoniaError::IoError(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
            Ok(None)
        }
        Err(e) => Err(e.into()),
    }
}

impl Decoder for CompressedDecoder {
    fn name(&self) -> &'static str {
        "compressed"
    }

    fn decode(&self, bytes: &[u8]) -> Result<Sample, SoundError> {
        let mss = MediaSourceStream::new(Box::new(Cursor::new(bytes.to_vec())), Default::default());

        let meta_opts: MetadataOptions = Default::default();
        let fmt_opts: FormatOptions = Default::default();
        let probed = get_probe()
            .format(&Hint::new(), mss, &fmt_opts, &meta_opts)
            .map_err(|e| SoundError::DecodeFailed(format!("unrecognized stream: {}", e)))?;
        let mut format_reader = probed.format;

        let track = format_reader
            .tracks()
            .iter()
            .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
            .ok_or_else(|| SoundError::DecodeFailed("no audio track found".to_string()))?;
        let track_id = track.id;
        let params = track.codec_params.clone();

        let sample_rate = params
            .sample_rate
            .ok_or_else(|| SoundError::DecodeFailed("sample rate not specified".to_string()))?;

        // Containers usually report the layout up front; reject surround before decoding.
        let mut channels = params.channels.map(|c| c.count() as u16).unwrap_or(0);
        if channels > 2 {
            warn!(channels, "Compressed stream is not mono or stereo");
            return Err(SoundError::UnsupportedChannelLayout(channels));
        }

        let decoder_opts: DecoderOptions = Default::default();
        let mut decoder = get_codecs().make(&params, &decoder_opts)?;

        let mut data: Vec<i16> = match params.n_frames {
            Some(n_frames) if channels > 0 => {
                Vec::with_capacity(n_frames as usize * channels as usize)
            }
            _ => Vec::new(),
        };

        loop {
            let packet = match next_packet(format_reader.as_mut()) {
                Ok(Some(packet)) => packet,
                Ok(None) => break,
                Err(SoundError::DecodeFailed(_)) if !data.is_empty() => {
                    // Trailing garbage after valid audio. Keep what we have.
                    debug!(frames = data.len(), "Stopping decode at unreadable packet");
                    break;
                }
                Err(e) => return Err(e),
            };
            if packet.track_id() != track_id {
                continue;
            }

            let decoded = match decoder.decode(&packet) {
                Ok(decoded) => decoded,
                Err(SymphoniaError::ResetRequired) => {
                    decoder.reset();
                    continue;
                }
                Err(SymphoniaError::DecodeError(e)) => {
                    debug!(err = e, "Skipping corrupt packet");
                    continue;
                }
                Err(e) => return Err(e.into()),
            };

            let spec = *decoded.spec();
            let packet_channels = spec.channels.count() as u16;
            if packet_channels > 2 {
                return Err(SoundError::UnsupportedChannelLayout(packet_channels));
            }
            if channels == 0 {
                channels = packet_channels;
            }

            let mut buffer = SampleBuffer::<i16>::new(decoded.capacity() as u64, spec);
            buffer.copy_interleaved_ref(decoded);
            data.extend_from_slice(buffer.samples());
        }

        if channels == 0 {
            return Err(SoundError::DecodeFailed(
                "unable to determine channel count".to_string(),
            ));
        }

        Sample::from_pcm(data, channels, sample_rate)
    }
}
