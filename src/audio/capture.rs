//! Live audio capture via `cpal`.
//!
//! [`LiveCapture`] wraps the cpal host/device/stream lifecycle behind the
//! [`AudioSource`] pull contract.  The cpal callback runs on its own audio
//! thread and only forwards converted chunks over an mpsc channel; all
//! decoding stays on the caller's thread.  Dropping a `LiveCapture` stops
//! the underlying hardware stream.
//!
//! Device resolution policy:
//! - [`SourceSpec::Microphone`] — the platform default capture device.
//! - [`SourceSpec::SystemMonitor`] — the first capture device whose name
//!   ends in [`MONITOR_SUFFIX`]; the absence of one is an error that lists
//!   every device that was inspected, never a silent microphone fallback.
//! - [`SourceSpec::NamedDevice`] — exact name match only.

use std::sync::mpsc;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};

use crate::audio::resample::{downmix_to_mono, resample};
use crate::audio::source::{AudioSource, SourceError, SourceSpec};

/// Name suffix that designates a loopback/monitor capture device.
pub const MONITOR_SUFFIX: &str = ".monitor";

// ---------------------------------------------------------------------------
// Device listing / resolution
// ---------------------------------------------------------------------------

/// Names of every capture-capable device on the default host.
///
/// Used both for `system` source resolution and to make open failures
/// actionable (the error message lists what exists).
pub fn list_input_devices() -> Vec<String> {
    let host = cpal::default_host();
    let devices = match host.input_devices() {
        Ok(devices) => devices,
        Err(e) => {
            log::warn!("couldn't enumerate capture devices: {e}");
            return Vec::new();
        }
    };
    devices.filter_map(|d| d.name().ok()).collect()
}

fn resolve_device(spec: &SourceSpec) -> Result<(cpal::Device, String), SourceError> {
    let host = cpal::default_host();
    match spec {
        SourceSpec::Microphone => {
            let device = host
                .default_input_device()
                .ok_or_else(|| SourceError::NoDefaultDevice {
                    available: list_input_devices(),
                })?;
            let name = device.name().unwrap_or_else(|_| "default".to_string());
            Ok((device, name))
        }

        SourceSpec::SystemMonitor => {
            let mut inspected = Vec::new();
            let devices = host.input_devices().map_err(|e| SourceError::Open {
                name: "system".to_string(),
                reason: e.to_string(),
            })?;
            for device in devices {
                let Ok(name) = device.name() else { continue };
                if name.ends_with(MONITOR_SUFFIX) {
                    return Ok((device, name));
                }
                inspected.push(name);
            }
            Err(SourceError::NoMonitorDevice {
                suffix: MONITOR_SUFFIX,
                inspected,
            })
        }

        SourceSpec::NamedDevice(wanted) => {
            let devices = host.input_devices().map_err(|e| SourceError::Open {
                name: wanted.clone(),
                reason: e.to_string(),
            })?;
            for device in devices {
                if device.name().is_ok_and(|n| &n == wanted) {
                    return Ok((device, wanted.clone()));
                }
            }
            Err(SourceError::DeviceNotFound {
                name: wanted.clone(),
                available: list_input_devices(),
            })
        }

        SourceSpec::FileList(_) => Err(SourceError::NotLive(spec.clone())),
    }
}

// ---------------------------------------------------------------------------
// LiveCapture
// ---------------------------------------------------------------------------

/// Chunks crossing from the cpal callback thread: converted samples, or the
/// stream error that ended capture.
type ChunkResult = Result<Vec<i16>, String>;

/// An open live capture stream delivering engine-rate mono `i16` samples.
pub struct LiveCapture {
    rx: mpsc::Receiver<ChunkResult>,
    /// Samples received but not yet handed out by `pull`.
    pending: Vec<i16>,
    /// Keeps the hardware stream alive; dropped (and stopped) with `self`.
    _stream: cpal::Stream,
}

impl LiveCapture {
    /// Resolve `spec` to a device and start capturing at `engine_rate` Hz.
    ///
    /// The device runs at its own preferred rate and channel count; the
    /// callback downmixes and resamples before forwarding, so `pull`
    /// always yields mono samples at the engine rate.
    pub fn open(spec: &SourceSpec, engine_rate: u32) -> Result<Self, SourceError> {
        let (device, name) = resolve_device(spec)?;

        let supported = device
            .default_input_config()
            .map_err(|e| SourceError::Open {
                name: name.clone(),
                reason: e.to_string(),
            })?;
        let channels = supported.channels();
        let device_rate = supported.sample_rate().0;
        let sample_format = supported.sample_format();
        let config: cpal::StreamConfig = supported.into();

        log::info!(
            "capture open: '{name}' ({device_rate} Hz, {channels} ch, {sample_format:?})"
        );

        let (tx, rx) = mpsc::channel::<ChunkResult>();
        let err_tx = tx.clone();
        let on_error = move |err: cpal::StreamError| {
            // Receiver may be gone during teardown; nothing to do then.
            let _ = err_tx.send(Err(err.to_string()));
        };

        let stream = match sample_format {
            cpal::SampleFormat::I16 => device.build_input_stream(
                &config,
                move |data: &[i16], _: &cpal::InputCallbackInfo| {
                    let _ = tx.send(Ok(convert_chunk(data, channels, device_rate, engine_rate)));
                },
                on_error,
                None,
            ),
            cpal::SampleFormat::F32 => device.build_input_stream(
                &config,
                move |data: &[f32], _: &cpal::InputCallbackInfo| {
                    let quantized: Vec<i16> = data
                        .iter()
                        .map(|&s| (s * 32_767.0).clamp(-32_768.0, 32_767.0) as i16)
                        .collect();
                    let _ = tx.send(Ok(convert_chunk(
                        &quantized,
                        channels,
                        device_rate,
                        engine_rate,
                    )));
                },
                on_error,
                None,
            ),
            other => {
                return Err(SourceError::Open {
                    name,
                    reason: format!("unsupported sample format {other:?}"),
                })
            }
        }
        .map_err(|e| SourceError::Open {
            name: name.clone(),
            reason: e.to_string(),
        })?;

        stream.play().map_err(|e| SourceError::Open {
            name,
            reason: e.to_string(),
        })?;

        Ok(Self {
            rx,
            pending: Vec::new(),
            _stream: stream,
        })
    }
}

/// Downmix and resample one hardware chunk to mono at the engine rate.
fn convert_chunk(data: &[i16], channels: u16, device_rate: u32, engine_rate: u32) -> Vec<i16> {
    let mono = downmix_to_mono(data, channels);
    resample(&mono, device_rate, engine_rate)
}

impl AudioSource for LiveCapture {
    /// Block until the whole window is filled or the device fails.
    ///
    /// Live capture never ends on its own, so this never returns `Ok(0)`;
    /// termination is always a device error (or an external duration limit
    /// enforced by the decode loop).
    fn pull(&mut self, window: &mut [i16]) -> Result<usize, SourceError> {
        while self.pending.len() < window.len() {
            match self.rx.recv() {
                Ok(Ok(chunk)) => self.pending.extend_from_slice(&chunk),
                Ok(Err(reason)) => return Err(SourceError::Read(reason)),
                Err(_) => {
                    return Err(SourceError::Read(
                        "capture stream closed unexpectedly".to_string(),
                    ))
                }
            }
        }
        window.copy_from_slice(&self.pending[..window.len()]);
        self.pending.drain(..window.len());
        Ok(window.len())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn convert_chunk_stereo_48k_to_mono_16k() {
        // 480 stereo frames at 48 kHz = 10 ms → 160 mono samples at 16 kHz.
        let mut data = Vec::with_capacity(960);
        for _ in 0..480 {
            data.push(1_000i16);
            data.push(3_000i16);
        }
        let out = convert_chunk(&data, 2, 48_000, 16_000);
        assert_eq!(out.len(), 160);
        for &s in &out {
            assert!((s - 2_000).abs() <= 1);
        }
    }

    #[test]
    fn convert_chunk_mono_engine_rate_passthrough() {
        let data: Vec<i16> = (0..160).collect();
        assert_eq!(convert_chunk(&data, 1, 16_000, 16_000), data);
    }

    #[test]
    fn file_list_spec_is_rejected_as_live() {
        let spec = SourceSpec::FileList(vec!["a.wav".into()]);
        let err = match resolve_device(&spec) {
            Ok(_) => panic!("must not resolve"),
            Err(e) => e,
        };
        assert!(matches!(err, SourceError::NotLive(_)));
    }
}
