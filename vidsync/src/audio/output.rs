use cpal::{
    BufferSize, SampleRate, Stream, StreamConfig,
    traits::{DeviceTrait, HostTrait, StreamTrait},
};
use thiserror::Error;
use tracing::{info, warn};

use super::bridge::AudioRingBridge;

#[derive(Debug, Error)]
pub enum AudioError {
    #[error("no audio output device found")]
    NoDevice,
    #[error("audio device error: {0}")]
    Device(String),
    #[error("audio stream error: {0}")]
    Stream(String),
}

/**
    The default output device, playing whatever the bridge produces.
    Playback stops when this is dropped.
*/
pub struct AudioOutput {
    _stream: Stream,
}

impl AudioOutput {
    pub fn open(bridge: AudioRingBridge) -> Result<Self, AudioError> {
        let host = cpal::default_host();
        let device = host.default_output_device().ok_or(AudioError::NoDevice)?;
        let name = device
            .name()
            .map_err(|e| AudioError::Device(e.to_string()))?;

        let spec = bridge.spec();
        let config = StreamConfig {
            channels: spec.channels,
            sample_rate: SampleRate(spec.sample_rate),
            buffer_size: BufferSize::Default,
        };
        info!(device = %name, channels = spec.channels, sample_rate = spec.sample_rate, "opening audio output");

        let stream = device
            .build_output_stream(
                &config,
                move |data: &mut [i16], _: &cpal::OutputCallbackInfo| {
                    bridge.fill(bytemuck::cast_slice_mut(data));
                },
                |err| {
                    warn!(error = %err, "audio stream error");
                },
                None,
            )
            .map_err(|e| AudioError::Stream(e.to_string()))?;

        stream
            .play()
            .map_err(|e| AudioError::Stream(e.to_string()))?;

        Ok(Self { _stream: stream })
    }
}
