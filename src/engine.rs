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
use std::{error::Error, fmt, fs, path::Path, sync::Arc};

use tracing::{debug, info, warn};

use crate::audio::{self, Device};
use crate::channels::ChannelTable;
use crate::config;
use crate::error::SoundError;
use crate::mixer::Mixer;
use crate::samples::{decode, resample, Sample, SampleId, SampleStore};
use crate::util::filename_display;
use crate::voices::{Voice, VoiceFlags, VoiceHandle, VoicePool};

/// The sound engine: a sample store, a voice pool and a channel table driven onto a device.
///
/// The engine has a single owner. Every call that changes state takes `&mut self`, and the
/// owner is expected to call [`SoundEngine::update`] at a steady rate.
pub struct SoundEngine {
    enabled: bool,
    /// Every loaded sample is converted to this rate.
    mixing_rate: u32,
    samples: SampleStore,
    voices: VoicePool,
    channels: ChannelTable,
    mixer: Mixer,
    device: Arc<dyn Device>,
    is_shutdown: bool,
}

impl SoundEngine {
    /// Creates an engine on the given device, applying the configured channels and master
    /// volume.
    pub fn new(device: Arc<dyn Device>, config: &config::Sound) -> SoundEngine {
        let mut engine = SoundEngine {
            enabled: config.enabled(),
            mixing_rate: device.sample_rate(),
            samples: SampleStore::new(),
            voices: VoicePool::new(),
            channels: ChannelTable::new(),
            mixer: Mixer::new(),
            device,
            is_shutdown: false,
        };

        if engine.device.channel_count() < engine.voices.capacity() {
            warn!(
                device = engine.device.to_string(),
                hardware_channels = engine.device.channel_count(),
                voices = engine.voices.capacity(),
                "Device has fewer channels than voices; extra voices will be silent"
            );
        }

        engine.mixer.set_master_volume(config.master_volume());
        for channel in config.channels() {
            engine.set_channel(channel.id, channel.volume, channel.pan);
        }

        info!(
            device = engine.device.to_string(),
            enabled = engine.enabled,
            mixing_rate = engine.mixing_rate,
            "Sound engine started"
        );
        engine
    }

    /// Creates an engine on the device named in the configuration.
    pub fn from_config(config: &config::Sound) -> Result<SoundEngine, Box<dyn Error>> {
        let device = audio::get_device(config)?;
        Ok(SoundEngine::new(device, config))
    }

    /// Decodes, converts and stores a sample.
    pub fn load(&mut self, bytes: &[u8]) -> Result<SampleId, SoundError> {
        if !self.enabled {
            return Err(SoundError::Disabled);
        }

        let id = self
            .samples
            .allocate()
            .inspect_err(|e| warn!(err = %e, "Unable to load sample"))?;
        let mut sample =
            decode(bytes).inspect_err(|e| warn!(err = %e, "Failed to decode sample"))?;

        let native_rate = sample.rate();
        resample(&mut sample, self.mixing_rate);

        info!(
            sample = %id,
            channels = sample.channels(),
            native_rate,
            frames = sample.frames(),
            memory = sample.memory_size(),
            "Loaded sample"
        );
        self.samples.insert(id, sample);
        Ok(id)
    }

    /// Reads a file and loads it as a sample.
    pub fn load_file(&mut self, path: &Path) -> Result<SampleId, SoundError> {
        if !self.enabled {
            return Err(SoundError::Disabled);
        }

        let bytes = fs::read(path).inspect_err(|e| {
            warn!(
                file = filename_display(path),
                err = %e,
                "Unable to read sample file"
            )
        })?;
        debug!(file = filename_display(path), bytes = bytes.len(), "Read sample file");
        self.load(&bytes)
    }

    /// Stops every voice playing the sample and frees its slot.
    pub fn unload(&mut self, id: SampleId) {
        if !self.samples.contains(id) {
            return;
        }
        self.stop(id);
        self.samples.remove(id);
    }

    /// Length of a sample in seconds, or 0 for an unknown id.
    pub fn sample_duration(&self, id: SampleId) -> f32 {
        self.samples.duration(id)
    }

    pub fn sample(&self, id: SampleId) -> Option<&Sample> {
        self.samples.get(id)
    }

    /// Starts a sample on a channel at full volume.
    pub fn play(&mut self, channel: usize, sample: SampleId, flags: VoiceFlags) -> VoiceHandle {
        self.start(channel, sample, flags, 0.0, 0.0)
    }

    /// Starts a positional sample at the given location.
    pub fn play_at(
        &mut self,
        channel: usize,
        sample: SampleId,
        flags: VoiceFlags,
        x: f32,
        y: f32,
    ) -> VoiceHandle {
        self.start(channel, sample, flags | VoiceFlags::POSITIONAL, x, y)
    }

    fn start(
        &mut self,
        channel: usize,
        id: SampleId,
        flags: VoiceFlags,
        x: f32,
        y: f32,
    ) -> VoiceHandle {
        if self.is_shutdown {
            return VoiceHandle::INVALID;
        }
        if !self.channels.contains(channel) {
            warn!(channel, "Unable to play on unknown channel");
            return VoiceHandle::INVALID;
        }
        let Some(sample) = self.samples.get(id) else {
            warn!(sample = %id, "Unable to play unloaded sample");
            return VoiceHandle::INVALID;
        };
        if sample.is_empty() {
            warn!(sample = %id, "Unable to play empty sample");
            return VoiceHandle::INVALID;
        }
        let (format, rate) = (sample.format(), sample.rate());

        let handle = self.voices.acquire(channel, id, flags, x, y);
        if let Some(slot) = handle.id() {
            self.device.reset_channel(slot, format, rate);
        }
        handle
    }

    /// Stops every voice playing the sample.
    pub fn stop(&mut self, id: SampleId) {
        let freed = self.voices.release_sample(id, &mut self.samples);
        self.clear_slots(&freed);
    }

    /// Stops every voice.
    pub fn stop_all(&mut self) {
        let freed = self.voices.release_all(&mut self.samples);
        self.clear_slots(&freed);
    }

    /// Stops one voice. Stale handles are ignored.
    pub fn stop_voice(&mut self, handle: VoiceHandle) {
        if let Some(slot) = self.voices.release(handle, &mut self.samples) {
            self.clear_slots(&[slot]);
        }
    }

    fn clear_slots(&self, slots: &[usize]) {
        for slot in slots {
            self.device.clear_buffers(*slot);
        }
    }

    pub fn set_voice_volume(&mut self, handle: VoiceHandle, volume: f32) {
        self.voices.set_volume(handle, volume);
    }

    pub fn set_voice_falloff(&mut self, handle: VoiceHandle, falloff: f32) {
        self.voices.set_falloff(handle, falloff);
    }

    pub fn set_voice_location(&mut self, handle: VoiceHandle, x: f32, y: f32) {
        self.voices.set_location(handle, x, y);
    }

    pub fn set_voice_circle(&mut self, handle: VoiceHandle, radius: f32) {
        self.voices.set_circle(handle, radius);
    }

    pub fn set_voice_rectangle(&mut self, handle: VoiceHandle, width: f32, height: f32) {
        self.voices.set_rectangle(handle, width, height);
    }

    /// Sets a channel's volume and panning. Any positive `pan` enables panning.
    pub fn set_channel(&mut self, id: usize, volume: f32, pan: f32) {
        self.channels.set(id, volume, pan);
    }

    /// Turns panning on or off for a channel without touching its volume.
    pub fn set_channel_panning(&mut self, id: usize, panning: bool) {
        self.channels.set_panning(id, panning);
    }

    pub fn set_listener_pos(&mut self, x: f32, y: f32) {
        self.mixer.set_listener(x, y);
    }

    /// Scales every voice. Clamped to [0.0, 1.0].
    pub fn set_master_volume(&mut self, volume: f32) {
        self.mixer.set_master_volume(volume);
    }

    /// Runs one mixer tick.
    pub fn update(&mut self) {
        if self.is_shutdown {
            return;
        }
        self.mixer.update(
            &mut self.voices,
            &self.samples,
            &self.channels,
            self.device.as_ref(),
        );
    }

    /// Stops every voice and releases the device. Later calls to play or update do nothing.
    pub fn shutdown(&mut self) {
        if self.is_shutdown {
            return;
        }
        self.stop_all();
        self.device.shutdown();
        self.is_shutdown = true;
        info!(device = self.device.to_string(), "Sound engine shut down");
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn mixing_rate(&self) -> u32 {
        self.mixing_rate
    }

    /// Returns true if the handle is current and its voice is playing.
    pub fn is_active(&self, handle: VoiceHandle) -> bool {
        self.voices.is_active(handle)
    }

    pub fn active_count(&self) -> usize {
        self.voices.active_count()
    }

    /// The voice behind a current handle.
    pub fn voice(&self, handle: VoiceHandle) -> Option<&Voice> {
        self.voices.get(handle)
    }

    pub fn samples(&self) -> &SampleStore {
        &self.samples
    }

    pub fn voices(&self) -> &VoicePool {
        &self.voices
    }

    pub fn channels(&self) -> &ChannelTable {
        &self.channels
    }

    pub fn mixer(&self) -> &Mixer {
        &self.mixer
    }

    pub fn device(&self) -> &Arc<dyn Device> {
        &self.device
    }
}

impl fmt::Debug for SoundEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SoundEngine")
            .field("device", &self.device.to_string())
            .field("enabled", &self.enabled)
            .field("mixing_rate", &self.mixing_rate)
            .field("samples", &self.samples.len())
            .field("voices", &self.voices)
            .field("is_shutdown", &self.is_shutdown)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::mock;
    use crate::samples::MAX_SAMPLES;
    use crate::testutil::{tone, wav_bytes, write_wav};
    use crate::voices::{VoiceShape, MAX_VOICES};

    fn engine_with(config: config::Sound) -> (SoundEngine, Arc<mock::Device>) {
        let device = Arc::new(mock::Device::get(config.device(), config.sample_rate()));
        let engine = SoundEngine::new(device.clone(), &config);
        (engine, device)
    }

    fn engine() -> (SoundEngine, Arc<mock::Device>) {
        engine_with(config::Sound::new("mock"))
    }

    fn mono(frames: usize, rate: u32) -> Vec<u8> {
        wav_bytes(vec![tone(440.0, rate, frames)], rate).unwrap()
    }

    #[test]
    fn test_load_and_duration() {
        let (mut engine, _) = engine();
        let id = engine.load(&mono(96000, 48000)).unwrap();
        assert_eq!(engine.sample_duration(id), 2.0);
        assert_eq!(engine.sample(id).unwrap().frames(), 96000);
        assert_eq!(engine.sample_duration(SampleId(MAX_SAMPLES + 1)), 0.0);
    }

    #[test]
    fn test_load_resamples_to_mixing_rate() {
        let (mut engine, _) = engine();
        let id = engine.load(&mono(2400, 24000)).unwrap();
        let sample = engine.sample(id).unwrap();
        assert_eq!(sample.rate(), 48000);
        assert_eq!(sample.frames(), 4800);
        assert_eq!(engine.sample_duration(id), 0.1);
    }

    #[test]
    fn test_load_failure_keeps_slot_free() {
        let (mut engine, _) = engine();
        assert!(matches!(
            engine.load(b"RIFF\x04\x00\x00\x00WAVE"),
            Err(SoundError::DecodeFailed(_))
        ));
        assert!(matches!(engine.load(&[]), Err(SoundError::DecodeFailed(_))));
        assert!(engine.samples().is_empty());

        let id = engine.load(&mono(10, 48000)).unwrap();
        assert_eq!(id, SampleId(0));
    }

    #[test]
    fn test_load_disabled() {
        let (mut engine, _) = engine_with(config::Sound::new("mock").with_enabled(false));
        assert!(!engine.is_enabled());
        assert!(matches!(
            engine.load(&mono(10, 48000)),
            Err(SoundError::Disabled)
        ));
    }

    #[test]
    fn test_load_file() {
        let (mut engine, _) = engine();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tone.wav");
        write_wav(&path, vec![tone(220.0, 44100, 441), tone(440.0, 44100, 441)], 44100).unwrap();

        let id = engine.load_file(&path).unwrap();
        let sample = engine.sample(id).unwrap();
        assert_eq!(sample.channels(), 2);
        assert_eq!(sample.frames(), 480);

        assert!(matches!(
            engine.load_file(&dir.path().join("missing.wav")),
            Err(SoundError::Io(_))
        ));
    }

    #[test]
    fn test_voice_finishes_after_its_length() {
        let (mut engine, device) = engine();
        let id = engine.load(&mono(96000, 48000)).unwrap();
        let handle = engine.play(0, id, VoiceFlags::empty());
        let slot = handle.id().unwrap();

        engine.update();
        assert!(device.is_playing(slot));

        device.advance(95999);
        engine.update();
        assert!(engine.is_active(handle));

        device.advance(1);
        engine.update();
        assert!(!engine.is_active(handle));
        assert_eq!(engine.active_count(), 0);
        let voice = engine.voices().iter().nth(slot).unwrap();
        assert_eq!(voice.age(), handle.age() + 1);
    }

    #[test]
    fn test_looping_voice_keeps_playing() {
        let (mut engine, device) = engine();
        let id = engine.load(&mono(100, 48000)).unwrap();
        let handle = engine.play(0, id, VoiceFlags::LOOP);

        for _ in 0..5 {
            engine.update();
            device.advance(100);
        }
        assert!(engine.is_active(handle));
        assert_eq!(engine.voice(handle).unwrap().tick(), 5);

        engine.stop_voice(handle);
        assert!(!engine.is_active(handle));
        assert!(!device.is_playing(handle.id().unwrap()));
        assert_eq!(engine.sample(id).unwrap().paused_at(), 5);
    }

    #[test]
    fn test_stale_handle_after_reuse() {
        let (mut engine, _) = engine();
        let id = engine.load(&mono(100, 48000)).unwrap();

        let old = engine.play(0, id, VoiceFlags::empty());
        engine.stop_voice(old);
        for _ in 1..MAX_VOICES {
            engine.play(0, id, VoiceFlags::empty());
        }
        let new = engine.play(0, id, VoiceFlags::empty());
        assert_eq!(new.id(), old.id());
        assert_eq!(new.age(), old.age() + 1);

        engine.set_voice_volume(old, 0.1);
        engine.set_voice_location(old, 99.0, 99.0);
        engine.set_voice_falloff(old, 0.5);
        engine.set_voice_circle(old, 1.0);
        engine.stop_voice(old);

        let voice = engine.voice(new).unwrap();
        assert_eq!(voice.volume(), 255);
        assert_eq!(voice.position(), (0.0, 0.0));
        assert_eq!(voice.falloff(), 0.0);
        assert!(engine.is_active(new));
    }

    #[test]
    fn test_stale_handle_after_natural_finish() {
        let (mut engine, device) = engine();
        let id = engine.load(&mono(100, 48000)).unwrap();

        let old = engine.play(0, id, VoiceFlags::empty());
        engine.update();
        device.advance(100);
        engine.update();
        assert!(!engine.is_active(old));

        for _ in 1..MAX_VOICES {
            engine.play(0, id, VoiceFlags::empty());
        }
        let new = engine.play(0, id, VoiceFlags::empty());
        assert_eq!(new.id(), old.id());
        assert_eq!(new.age(), old.age() + 1);

        engine.set_voice_volume(old, 0.1);
        engine.set_voice_location(old, 99.0, 99.0);
        engine.set_voice_rectangle(old, 10.0, 10.0);
        engine.stop_voice(old);

        let voice = engine.voice(new).unwrap();
        assert_eq!(voice.volume(), 255);
        assert_eq!(voice.position(), (0.0, 0.0));
        assert_eq!(voice.shape(), VoiceShape::default());
        assert!(engine.is_active(new));
        assert_eq!(engine.active_count(), MAX_VOICES);
    }

    #[test]
    fn test_voice_exhaustion() {
        let (mut engine, _) = engine();
        let id = engine.load(&mono(100, 48000)).unwrap();
        let handles: Vec<VoiceHandle> = (0..MAX_VOICES)
            .map(|_| engine.play(0, id, VoiceFlags::empty()))
            .collect();
        assert!(handles.iter().all(|h| h.is_valid()));

        let overflow = engine.play(0, id, VoiceFlags::empty());
        assert!(!overflow.is_valid());
        engine.set_voice_volume(overflow, 0.0);
        engine.stop_voice(overflow);
        assert_eq!(engine.active_count(), MAX_VOICES);
        assert!(handles
            .iter()
            .all(|h| engine.voice(*h).unwrap().volume() == 255));
    }

    #[test]
    fn test_play_rejects_bad_input() {
        let (mut engine, _) = engine();
        let id = engine.load(&mono(100, 48000)).unwrap();
        let empty = engine.load(&wav_bytes(vec![Vec::<i16>::new()], 48000).unwrap()).unwrap();

        assert!(!engine.play(16, id, VoiceFlags::empty()).is_valid());
        assert!(!engine.play(0, SampleId(7), VoiceFlags::empty()).is_valid());
        assert!(!engine.play(0, SampleId(MAX_SAMPLES), VoiceFlags::empty()).is_valid());
        assert!(!engine.play(0, empty, VoiceFlags::empty()).is_valid());
        assert_eq!(engine.active_count(), 0);
    }

    #[test]
    fn test_panning_end_to_end() {
        let (mut engine, device) = engine();
        let id = engine.load(&mono(48000, 48000)).unwrap();
        engine.set_channel(0, 0.5, 1.0);

        let handle = engine.play_at(0, id, VoiceFlags::empty(), -500.0, 0.0);
        assert!(engine
            .voice(handle)
            .unwrap()
            .flags()
            .contains(VoiceFlags::POSITIONAL));
        engine.set_voice_circle(handle, 1000.0);
        engine.set_voice_falloff(handle, 1.0);
        engine.update();

        let (left, right) = device.mix(handle.id().unwrap()).unwrap();
        assert_eq!(left, 127.0 / 255.0);
        assert!((right - 63.5 / 255.0).abs() < 1e-6);

        // Moving the listener onto the sound centers it.
        engine.set_listener_pos(-500.0, 0.0);
        engine.update();
        let (left, right) = device.mix(handle.id().unwrap()).unwrap();
        assert_eq!(left, right);
    }

    #[test]
    fn test_panning_without_falloff_band() {
        let (mut engine, device) = engine();
        let id = engine.load(&mono(48000, 48000)).unwrap();
        engine.set_channel(0, 0.5, 1.0);

        let handle = engine.play_at(0, id, VoiceFlags::empty(), -500.0, 0.0);
        engine.set_voice_circle(handle, 1000.0);
        engine.set_voice_falloff(handle, 0.0);
        engine.update();

        // Halfway to the edge halves both sides; panning halves the far side again.
        let (left, right) = device.mix(handle.id().unwrap()).unwrap();
        assert!((left - 63.5 / 255.0).abs() < 1e-6);
        assert!((right - 31.75 / 255.0).abs() < 1e-6);
    }

    #[test]
    fn test_channel_panning_keeps_configured_volume() {
        let config = config::Sound::new("mock").with_channel(config::Channel {
            id: 3,
            volume: 0.5,
            pan: 0.0,
        });
        let (mut engine, device) = engine_with(config);
        let id = engine.load(&mono(48000, 48000)).unwrap();

        engine.set_channel_panning(3, true);
        let channel = engine.channels().get(3).unwrap();
        assert_eq!(channel.volume(), 127);
        assert!(channel.panning());

        let handle = engine.play_at(3, id, VoiceFlags::empty(), 0.0, 0.0);
        engine.update();
        assert_eq!(
            device.mix(handle.id().unwrap()),
            Some((127.0 / 255.0, 127.0 / 255.0))
        );
    }

    #[test]
    fn test_master_volume() {
        let (mut engine, device) =
            engine_with(config::Sound::new("mock").with_channel(config::Channel {
                id: 1,
                volume: 1.0,
                pan: 0.0,
            }));
        let id = engine.load(&mono(100, 48000)).unwrap();
        engine.set_master_volume(0.25);
        let handle = engine.play(1, id, VoiceFlags::empty());
        engine.update();
        assert_eq!(device.mix(handle.id().unwrap()), Some((0.25, 0.25)));
    }

    #[test]
    fn test_configured_channels() {
        let config = config::Sound::new("mock").with_channel(config::Channel {
            id: 2,
            volume: 0.5,
            pan: 1.0,
        });
        let (engine, _) = engine_with(config);
        let channel = engine.channels().get(2).unwrap();
        assert_eq!(channel.volume(), 127);
        assert!(channel.panning());
        assert!(!engine.channels().get(0).unwrap().panning());
    }

    #[test]
    fn test_stop_and_unload() {
        let (mut engine, device) = engine();
        let a = engine.load(&mono(100, 48000)).unwrap();
        let b = engine.load(&mono(100, 48000)).unwrap();
        let a1 = engine.play(0, a, VoiceFlags::empty());
        let b1 = engine.play(0, b, VoiceFlags::empty());
        let a2 = engine.play(1, a, VoiceFlags::LOOP);
        engine.update();

        engine.unload(a);
        assert!(!engine.is_active(a1));
        assert!(!engine.is_active(a2));
        assert!(engine.is_active(b1));
        assert!(!device.is_playing(a1.id().unwrap()));
        assert!(device.is_playing(b1.id().unwrap()));
        assert!(engine.sample(a).is_none());
        assert!(!engine.play(0, a, VoiceFlags::empty()).is_valid());

        // The freed slot is reused by the next load.
        let c = engine.load(&mono(10, 48000)).unwrap();
        assert_eq!(c, a);

        engine.stop(b);
        assert_eq!(engine.active_count(), 0);
    }

    #[test]
    fn test_stop_all() {
        let (mut engine, device) = engine();
        let id = engine.load(&mono(100, 48000)).unwrap();
        let handles: Vec<VoiceHandle> = (0..3)
            .map(|_| engine.play(0, id, VoiceFlags::LOOP))
            .collect();
        engine.update();

        engine.stop_all();
        assert_eq!(engine.active_count(), 0);
        for handle in handles {
            assert!(!device.is_playing(handle.id().unwrap()));
        }
    }

    #[test]
    fn test_shutdown() {
        let (mut engine, device) = engine();
        let id = engine.load(&mono(100, 48000)).unwrap();
        let handle = engine.play(0, id, VoiceFlags::LOOP);
        engine.update();

        engine.shutdown();
        assert!(device.is_shutdown());
        assert!(!engine.is_active(handle));
        assert!(!engine.play(0, id, VoiceFlags::empty()).is_valid());
        engine.update();
        engine.shutdown();
        assert!(!device.is_playing(handle.id().unwrap()));
    }

    #[test]
    fn test_configured_sample_rate() {
        let (mut engine, device) =
            engine_with(config::Sound::new("mock").with_sample_rate(24000));
        assert_eq!(engine.mixing_rate(), 24000);
        assert_eq!(device.sample_rate(), 24000);

        let id = engine.load(&mono(4800, 48000)).unwrap();
        let sample = engine.sample(id).unwrap();
        assert_eq!(sample.rate(), 24000);
        assert_eq!(sample.frames(), 2400);
    }

    #[test]
    fn test_device_through_trait() {
        let (engine, _) = engine();
        assert!(engine.device().to_mock().is_ok());
        assert_eq!(engine.mixing_rate(), 48000);
    }
}
