/*!
    Audio sample format, rate and channel conversion.
*/

use ffmpeg_next::{
    ChannelLayout as FFmpegChannelLayout,
    software::resampling::context::Context as ResamplerContext,
    util::frame::audio::Audio as AudioFrameFFmpeg,
};

use ffmpeg_source::convert::sample_format_to_ffmpeg;
use ffmpeg_types::{AudioFrame, Error, Result, SampleFormat};

/**
    Target format of an [`AudioResampler`].
*/
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AudioResamplerConfig {
    pub sample_rate: u32,
    pub channels: u16,
    pub format: SampleFormat,
}

impl AudioResamplerConfig {
    /**
        Signed 16-bit interleaved output at 44.1 kHz.
    */
    pub fn s16(channels: u16) -> Self {
        Self {
            sample_rate: 44100,
            channels,
            format: SampleFormat::S16,
        }
    }
}

/**
    Converts decoded audio frames to a fixed output format.

    The swresample context is created on first use and rebuilt whenever the
    input format changes. Resampling is stateful, so frames must be passed
    in order and [`AudioResampler::reset`] called after a seek.
*/
pub struct AudioResampler {
    config: AudioResamplerConfig,
    state: Option<ResamplerState>,
}

struct ResamplerState {
    context: ResamplerContext,
    src_sample_rate: u32,
    src_channels: u16,
    src_format: SampleFormat,
}

impl AudioResampler {
    pub fn new(config: AudioResamplerConfig) -> Result<Self> {
        channel_layout_for(config.channels)?;
        Ok(Self {
            config,
            state: None,
        })
    }

    pub fn config(&self) -> &AudioResamplerConfig {
        &self.config
    }

    /**
        Convert one frame. Timestamps are carried over unchanged.
    */
    pub fn convert(&mut self, frame: &AudioFrame) -> Result<AudioFrame> {
        if frame.samples == 0 || frame.data.is_empty() {
            return Err(Error::invalid_data("input frame has no samples"));
        }
        if frame.data.len() < frame.expected_data_len() {
            return Err(Error::invalid_data("input frame is truncated"));
        }

        let needs_init = match &self.state {
            None => true,
            Some(state) => {
                state.src_sample_rate != frame.sample_rate
                    || state.src_channels != frame.channels
                    || state.src_format != frame.format
            }
        };
        if needs_init {
            self.state = Some(self.create_state(frame)?);
        }
        let Some(state) = self.state.as_mut() else {
            return Err(Error::codec("resampler not initialized"));
        };

        let src_layout = channel_layout_for(frame.channels)?;
        let mut src_frame =
            AudioFrameFFmpeg::new(sample_format_to_ffmpeg(frame.format), frame.samples, src_layout);
        src_frame.set_rate(frame.sample_rate);
        let total_bytes = frame.expected_data_len();
        src_frame
            .data_mut(0)
            .get_mut(..total_bytes)
            .ok_or_else(|| Error::invalid_data("resampler input frame too small"))?
            .copy_from_slice(&frame.data[..total_bytes]);

        // Leave headroom for samples the resampler carries over between calls
        let output_samples = if frame.sample_rate == self.config.sample_rate {
            frame.samples + 64
        } else {
            (frame.samples as u64 * self.config.sample_rate as u64 / frame.sample_rate as u64
                + 64) as usize
        };
        let mut dst_frame = AudioFrameFFmpeg::new(
            sample_format_to_ffmpeg(self.config.format),
            output_samples,
            channel_layout_for(self.config.channels)?,
        );
        dst_frame.set_rate(self.config.sample_rate);

        state
            .context
            .run(&src_frame, &mut dst_frame)
            .map_err(|e| Error::codec(format!("resampling failed: {e}")))?;

        let samples = dst_frame.samples();
        let len = samples * self.config.channels as usize * self.config.format.bytes_per_sample();
        let data = dst_frame
            .data(0)
            .get(..len)
            .map(<[u8]>::to_vec)
            .ok_or_else(|| Error::invalid_data("resampler output is truncated"))?;

        Ok(AudioFrame::new(
            data,
            samples,
            self.config.sample_rate,
            self.config.channels,
            self.config.format,
            frame.time_base,
        )
        .with_timestamps(frame.pts, frame.dts))
    }

    /**
        Drop buffered samples. The context is rebuilt on the next frame.
    */
    pub fn reset(&mut self) {
        self.state = None;
    }

    fn create_state(&self, frame: &AudioFrame) -> Result<ResamplerState> {
        let context = ResamplerContext::get(
            sample_format_to_ffmpeg(frame.format),
            channel_layout_for(frame.channels)?,
            frame.sample_rate,
            sample_format_to_ffmpeg(self.config.format),
            channel_layout_for(self.config.channels)?,
            self.config.sample_rate,
        )
        .map_err(|e| Error::codec(format!("failed to create resampler: {e}")))?;

        Ok(ResamplerState {
            context,
            src_sample_rate: frame.sample_rate,
            src_channels: frame.channels,
            src_format: frame.format,
        })
    }
}

fn channel_layout_for(channels: u16) -> Result<FFmpegChannelLayout> {
    match channels {
        1 => Ok(FFmpegChannelLayout::MONO),
        2 => Ok(FFmpegChannelLayout::STEREO),
        6 => Ok(FFmpegChannelLayout::_5POINT1),
        8 => Ok(FFmpegChannelLayout::_7POINT1),
        n => Err(Error::unsupported_format(format!(
            "no channel layout for {n} channels"
        ))),
    }
}

// SAFETY: the swresample context is owned exclusively by the resampler and
// only used through `&mut self`.
unsafe impl Send for AudioResampler {}

impl std::fmt::Debug for AudioResampler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AudioResampler")
            .field("config", &self.config)
            .field("initialized", &self.state.is_some())
            .finish()
    }
}
