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
    error::Error,
    fmt,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    thread,
    time::Duration,
};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use parking_lot::Mutex;
use tracing::{error, info, span, Level};

use super::mixer::ChannelMixer;
use super::{Device as AudioDevice, WaveBuffer};
use crate::config;
use crate::samples::PcmFormat;
use crate::voices::MAX_VOICES;

/// A small wrapper around a cpal::Device that mixes one hardware channel per voice.
pub struct Device {
    /// The name of the device.
    name: String,
    /// The maximum number of output channels the device supports.
    max_channels: u16,
    /// The host ID of the device.
    host_id: cpal::HostId,
    /// The underlying cpal device.
    device: cpal::Device,
    /// Hardware channels mixed by the output stream.
    mixer: ChannelMixer,
    /// The output stream thread, if started.
    output: Mutex<Option<OutputThread>>,
}

/// Owns the thread keeping the cpal stream alive. Dropping it stops the stream.
struct OutputThread {
    stop: Arc<AtomicBool>,
    handle: Option<thread::JoinHandle<()>>,
}

impl Drop for OutputThread {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                error!("Output thread panicked");
            }
        }
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (Channels={}) ({})",
            self.name,
            self.max_channels,
            self.host_id.name()
        )
    }
}

/// Builds a callback that mixes the hardware channels into the device's sample type.
fn create_callback<T>(
    mixer: ChannelMixer,
    output_channels: u16,
) -> impl FnMut(&mut [T], &cpal::OutputCallbackInfo) + Send + 'static
where
    T: cpal::SizedSample + cpal::FromSample<f32>,
{
    let mut scratch: Vec<f32> = Vec::new();
    move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
        scratch.resize(data.len(), 0.0);
        mixer.process_into(&mut scratch, output_channels);
        for (dst, src) in data.iter_mut().zip(scratch.iter()) {
            *dst = T::from_sample(*src);
        }
    }
}

fn build_stream<T>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    mixer: ChannelMixer,
) -> Result<cpal::Stream, cpal::BuildStreamError>
where
    T: cpal::SizedSample + cpal::FromSample<f32>,
{
    device.build_output_stream(
        config,
        create_callback::<T>(mixer, config.channels),
        |err| error!("CPAL output stream error: {}", err),
        None,
    )
}

impl Device {
    /// Lists cpal devices and produces the Device trait.
    pub fn list() -> Result<Vec<Box<dyn AudioDevice>>, Box<dyn Error>> {
        Ok(Device::list_cpal_devices()?
            .into_iter()
            .map(|device| {
                let device: Box<dyn AudioDevice> = Box::new(device);
                device
            })
            .collect())
    }

    /// Lists cpal devices.
    fn list_cpal_devices() -> Result<Vec<Device>, Box<dyn Error>> {
        // Suppress noisy output here.
        let _shh_stdout = shh::stdout()?;
        let _shh_stderr = shh::stderr()?;

        let mut devices: Vec<Device> = Vec::new();
        for host_id in cpal::available_hosts() {
            let host_devices = match cpal::host_from_id(host_id)?.devices() {
                Ok(host_devices) => host_devices,
                Err(e) => {
                    error!(
                        err = e.to_string(),
                        host = host_id.name(),
                        "Unable to list devices for host"
                    );
                    continue;
                }
            };

            for device in host_devices {
                let Ok(output_configs) = device.supported_output_configs() else {
                    continue;
                };
                let max_channels = output_configs
                    .map(|output_config| output_config.channels())
                    .max()
                    .unwrap_or(0);

                if max_channels > 0 {
                    let name = device.name()?;
                    devices.push(Device::new(name, max_channels, host_id, device, 48000));
                }
            }
        }

        devices.sort_by_key(|device| device.name.to_string());
        Ok(devices)
    }

    fn new(
        name: String,
        max_channels: u16,
        host_id: cpal::HostId,
        device: cpal::Device,
        sample_rate: u32,
    ) -> Device {
        Device {
            name,
            max_channels,
            host_id,
            device,
            mixer: ChannelMixer::new(MAX_VOICES, sample_rate),
            output: Mutex::new(None),
        }
    }

    /// Gets the given cpal device and starts its output stream. The name "default" picks the
    /// default output device of the default host.
    pub fn get(config: &config::Sound) -> Result<Device, Box<dyn Error>> {
        let name = config.device();
        let device = if name == "default" {
            let host = cpal::default_host();
            let device = host
                .default_output_device()
                .ok_or("no default output device")?;
            let max_channels = device.default_output_config()?.channels();
            let name = device.name()?;
            Device::new(name, max_channels, host.id(), device, config.sample_rate())
        } else {
            let found = Device::list_cpal_devices()?
                .into_iter()
                .find(|device| device.name.trim() == name)
                .ok_or_else(|| format!("no device found with name {}", name))?;
            Device::new(
                found.name,
                found.max_channels,
                found.host_id,
                found.device,
                config.sample_rate(),
            )
        };

        device.start_output_thread()?;
        Ok(device)
    }

    /// Starts the output thread that creates and owns the cpal stream.
    fn start_output_thread(&self) -> Result<(), Box<dyn Error>> {
        let sample_format = self.device.default_output_config()?.sample_format();
        let config = cpal::StreamConfig {
            channels: self.max_channels.min(2),
            sample_rate: cpal::SampleRate(self.mixer.sample_rate()),
            buffer_size: cpal::BufferSize::Default,
        };

        let device = self.device.clone();
        let mixer = self.mixer.clone();
        let stop = Arc::new(AtomicBool::new(false));
        let thread_stop = stop.clone();
        let name = self.name.clone();

        // Streams aren't Send on every platform, so the stream lives entirely on this thread.
        let handle = thread::spawn(move || {
            let span = span!(Level::INFO, "output stream (cpal)");
            let _enter = span.enter();

            let stream_result = match sample_format {
                cpal::SampleFormat::F32 => build_stream::<f32>(&device, &config, mixer),
                cpal::SampleFormat::I16 => build_stream::<i16>(&device, &config, mixer),
                cpal::SampleFormat::I32 => build_stream::<i32>(&device, &config, mixer),
                cpal::SampleFormat::U16 => build_stream::<u16>(&device, &config, mixer),
                other => {
                    error!(format = ?other, "Unsupported output sample format");
                    return;
                }
            };

            let stream = match stream_result {
                Ok(stream) => stream,
                Err(e) => {
                    error!("Failed to create CPAL stream: {}", e);
                    return;
                }
            };
            if let Err(e) = stream.play() {
                error!("Failed to start CPAL stream: {}", e);
                return;
            }
            info!(
                device = name,
                sample_rate = config.sample_rate.0,
                channels = config.channels,
                "CPAL output stream started"
            );

            while !thread_stop.load(Ordering::Relaxed) {
                thread::sleep(Duration::from_millis(50));
            }
            info!(device = name, "CPAL output stream stopped");
        });

        *self.output.lock() = Some(OutputThread {
            stop,
            handle: Some(handle),
        });
        Ok(())
    }
}

impl AudioDevice for Device {
    fn channel_count(&self) -> usize {
        self.mixer.num_channels()
    }

    fn sample_rate(&self) -> u32 {
        self.mixer.sample_rate()
    }

    fn reset_channel(&self, channel: usize, format: PcmFormat, rate: u32) {
        self.mixer.reset(channel, format, rate);
    }

    fn set_mix(&self, channel: usize, left: f32, right: f32) {
        self.mixer.set_mix(channel, left, right);
    }

    fn queue_buffer(&self, channel: usize, buffer: WaveBuffer) {
        self.mixer.queue(channel, buffer);
    }

    fn clear_buffers(&self, channel: usize) {
        self.mixer.clear(channel);
    }

    fn is_playing(&self, channel: usize) -> bool {
        self.mixer.is_playing(channel)
    }

    fn shutdown(&self) {
        for channel in 0..self.mixer.num_channels() {
            self.mixer.clear(channel);
        }
        let output = self.output.lock().take();
        if output.is_some() {
            info!(device = self.name, "Shutting down output stream");
        }
        drop(output);
    }

    #[cfg(test)]
    fn to_mock(&self) -> Result<Arc<super::mock::Device>, Box<dyn Error>> {
        Err("not a mock".into())
    }
}
