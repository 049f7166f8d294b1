/*!
    Pure Rust conversion of decoded audio to interleaved S16.
*/

use ffmpeg_types::{AudioFrame, Error, Result, SampleFormat};

use crate::backend::{AudioConverter, AudioOutputSpec};

/**
    Converts sample formats and mixes channels but does not resample.
    Frames at another rate than the output are rejected.

    Mono is spread to every output channel and anything is averaged down
    to mono. Other channel count changes are unsupported.
*/
#[derive(Debug, Clone)]
pub struct PcmConverter {
    spec: AudioOutputSpec,
}

impl PcmConverter {
    pub fn new(spec: AudioOutputSpec) -> Self {
        Self { spec }
    }

    pub fn spec(&self) -> AudioOutputSpec {
        self.spec
    }
}

fn to_s16(format: SampleFormat, bytes: &[u8]) -> i16 {
    match format {
        SampleFormat::U8 => (bytes[0] as i16 - 128) << 8,
        SampleFormat::S16 => bytemuck::pod_read_unaligned(bytes),
        SampleFormat::S32 => (bytemuck::pod_read_unaligned::<i32>(bytes) >> 16) as i16,
        SampleFormat::F32 => {
            let v: f32 = bytemuck::pod_read_unaligned(bytes);
            (v.clamp(-1.0, 1.0) * i16::MAX as f32) as i16
        }
        SampleFormat::F64 => {
            let v: f64 = bytemuck::pod_read_unaligned(bytes);
            (v.clamp(-1.0, 1.0) * i16::MAX as f64) as i16
        }
    }
}

impl AudioConverter for PcmConverter {
    fn convert(&mut self, frame: &AudioFrame) -> Result<Vec<u8>> {
        if frame.sample_rate != self.spec.sample_rate {
            return Err(Error::unsupported_format(format!(
                "cannot resample {} Hz to {} Hz",
                frame.sample_rate, self.spec.sample_rate
            )));
        }
        let in_channels = frame.channels as usize;
        let out_channels = self.spec.channels as usize;
        if in_channels == 0 || out_channels == 0 {
            return Err(Error::invalid_data("audio frame has no channels"));
        }
        if in_channels != out_channels && in_channels != 1 && out_channels != 1 {
            return Err(Error::unsupported_format(format!(
                "cannot mix {in_channels} channels to {out_channels}"
            )));
        }
        let len = frame.expected_data_len();
        let data = frame
            .data
            .get(..len)
            .ok_or_else(|| Error::invalid_data("audio frame is truncated"))?;

        let width = frame.format.bytes_per_sample();
        let mut output = Vec::with_capacity(frame.samples * out_channels);
        for sample_frame in data.chunks_exact(width * in_channels) {
            let mut inputs = sample_frame.chunks_exact(width).map(|s| to_s16(frame.format, s));
            if in_channels == out_channels {
                output.extend(inputs);
            } else if in_channels == 1 {
                let value = inputs.next().unwrap_or_default();
                output.extend(std::iter::repeat_n(value, out_channels));
            } else {
                let sum: i32 = inputs.map(i32::from).sum();
                output.push((sum / in_channels as i32) as i16);
            }
        }

        Ok(bytemuck::cast_slice(&output).to_vec())
    }

    fn reset(&mut self) {}
}
