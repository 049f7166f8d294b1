/*!
    Audio decoder implementation.
*/

use ffmpeg_next::{codec, codec::decoder::Audio as AudioDecoderFFmpeg, util::frame::audio::Audio as AudioFrameFFmpeg};

use ffmpeg_source::{CodecConfig, convert::sample_format_from_ffmpeg};
use ffmpeg_types::{AudioFrame, Error, Packet, Pts, Rational, Result, SampleFormat};

use crate::config::DecoderConfig;
use crate::status::{frame_dts, map_codec_error, to_ffmpeg_packet};

/**
    Audio decoder for one stream. Frames come out interleaved whatever
    layout the codec produces.
*/
pub struct AudioDecoder {
    decoder: AudioDecoderFFmpeg,
    time_base: Rational,
    scratch: AudioFrameFFmpeg,
}

impl AudioDecoder {
    pub fn new(codec_config: CodecConfig, config: DecoderConfig) -> Result<Self> {
        ffmpeg_next::init().map_err(|e| Error::codec(e.to_string()))?;

        let time_base = codec_config.time_base();
        let mut decoder_ctx = codec::context::Context::from_parameters(codec_config.into_parameters())
            .map_err(|e| Error::codec(e.to_string()))?;
        config.apply(&mut decoder_ctx);

        let decoder = decoder_ctx
            .decoder()
            .audio()
            .map_err(|e| Error::unsupported_format(e.to_string()))?;
        tracing::debug!(rate = decoder.rate(), "opened audio decoder");

        Ok(Self {
            decoder,
            time_base,
            scratch: AudioFrameFFmpeg::empty(),
        })
    }

    pub fn time_base(&self) -> Rational {
        self.time_base
    }

    pub fn sample_rate(&self) -> u32 {
        self.decoder.rate()
    }

    pub fn channels(&self) -> u16 {
        self.decoder.channels() as u16
    }

    pub fn send_packet(&mut self, packet: &Packet) -> Result<()> {
        self.decoder
            .send_packet(&to_ffmpeg_packet(packet))
            .map_err(map_codec_error)
    }

    pub fn send_eof(&mut self) -> Result<()> {
        self.decoder.send_eof().map_err(map_codec_error)
    }

    pub fn receive_frame(&mut self) -> Result<AudioFrame> {
        self.decoder
            .receive_frame(&mut self.scratch)
            .map_err(map_codec_error)?;
        self.convert_frame()
    }

    pub fn reset(&mut self) {
        self.decoder.flush();
    }

    fn convert_frame(&self) -> Result<AudioFrame> {
        let frame = &self.scratch;
        let samples = frame.samples();
        if samples == 0 {
            return Err(Error::invalid_data("audio frame has zero samples"));
        }

        let ffmpeg_format = frame.format();
        let format = sample_format_from_ffmpeg(ffmpeg_format).ok_or_else(|| {
            Error::unsupported_format(format!("unsupported sample format: {ffmpeg_format:?}"))
        })?;
        let channels = frame.channels() as u16;

        let data = copy_audio_data(frame, format, samples, channels)?;
        let pts = frame.pts().or_else(|| frame.timestamp()).map(Pts);

        Ok(
            AudioFrame::new(data, samples, frame.rate(), channels, format, self.time_base)
                .with_timestamps(pts, frame_dts(frame)),
        )
    }
}

/**
    Copy sample data out of an FFmpeg frame, interleaving planar layouts.
*/
fn copy_audio_data(
    frame: &AudioFrameFFmpeg,
    format: SampleFormat,
    samples: usize,
    channels: u16,
) -> Result<Vec<u8>> {
    let bytes_per_sample = format.bytes_per_sample();
    let channels = channels as usize;
    let total_bytes = samples * channels * bytes_per_sample;

    if !frame.is_planar() {
        return frame
            .data(0)
            .get(..total_bytes)
            .map(<[u8]>::to_vec)
            .ok_or_else(|| Error::invalid_data("audio frame is truncated"));
    }

    let mut output = vec![0u8; total_bytes];
    for ch in 0..channels {
        let plane = frame.data(ch);
        if plane.len() < samples * bytes_per_sample {
            return Err(Error::invalid_data(format!("audio plane {ch} is truncated")));
        }
        for (s, sample) in plane.chunks_exact(bytes_per_sample).take(samples).enumerate() {
            let dst = (s * channels + ch) * bytes_per_sample;
            output[dst..dst + bytes_per_sample].copy_from_slice(sample);
        }
    }

    Ok(output)
}

// SAFETY: the codec context and scratch frame are owned by the decoder and
// only touched through `&mut self`.
unsafe impl Send for AudioDecoder {}

impl std::fmt::Debug for AudioDecoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AudioDecoder")
            .field("time_base", &self.time_base)
            .field("sample_rate", &self.decoder.rate())
            .field("channels", &self.decoder.channels())
            .finish_non_exhaustive()
    }
}
