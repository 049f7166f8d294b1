/*!
    Media backend built on the `ffmpeg-*` crates.
*/

use std::path::Path;

use ffmpeg_decode::{AudioDecoder, DecoderConfig, VideoDecoder};
use ffmpeg_source::Source;
use ffmpeg_transform::{AudioResampler, AudioResamplerConfig, ScalingAlgorithm, VideoScaler};
use ffmpeg_types::{
    AudioFrame, Error, Frame, MediaInfo, Packet, Pts, Result, SampleFormat, StreamType, VideoFrame,
};

use crate::backend::{
    AudioConverter, AudioOutputSpec, MediaBackend, PacketSource, RescaleKey, ScaleBackend,
    ScaleContext, StreamDecoder,
};

/**
    Software decoding through FFmpeg.
*/
#[derive(Debug, Clone, Default)]
pub struct FfmpegBackend {
    pub decoder_config: DecoderConfig,
    pub scaling: ScalingAlgorithm,
}

impl MediaBackend for FfmpegBackend {
    fn open(&self, path: &Path) -> Result<Box<dyn PacketSource>> {
        Ok(Box::new(FfmpegSource {
            source: Source::open(path)?,
            decoder_config: self.decoder_config.clone(),
        }))
    }

    fn scaler(&self) -> Box<dyn ScaleBackend> {
        Box::new(FfmpegScaler {
            algorithm: self.scaling,
        })
    }

    fn audio_converter(&self, spec: AudioOutputSpec) -> Result<Box<dyn AudioConverter>> {
        let resampler = AudioResampler::new(AudioResamplerConfig {
            sample_rate: spec.sample_rate,
            channels: spec.channels,
            format: SampleFormat::S16,
        })?;
        Ok(Box::new(resampler))
    }
}

struct FfmpegSource {
    source: Source,
    decoder_config: DecoderConfig,
}

impl PacketSource for FfmpegSource {
    fn media_info(&self) -> &MediaInfo {
        self.source.media_info()
    }

    fn best_stream(&self, kind: StreamType) -> Option<usize> {
        self.source.best_stream(kind)
    }

    fn read_packet(&mut self) -> Result<Option<Packet>> {
        self.source.read_packet()
    }

    fn seek(&mut self, stream_index: usize, timestamp: Pts, backward: bool) -> Result<()> {
        self.source.seek_stream(stream_index, timestamp, backward)
    }

    fn open_decoder(&self, stream_index: usize) -> Result<Box<dyn StreamDecoder>> {
        let kind = self
            .source
            .streams()
            .get(stream_index)
            .and_then(|s| s.stream_type())
            .ok_or_else(|| Error::unsupported_format(format!("stream {stream_index} is not audio or video")))?;
        let codec_config = self
            .source
            .codec_config(stream_index)
            .ok_or_else(|| Error::invalid_data(format!("no codec parameters for stream {stream_index}")))?;

        let decoder: Box<dyn StreamDecoder> = match kind {
            StreamType::Video => Box::new(VideoDecoder::new(codec_config, self.decoder_config.clone())?),
            StreamType::Audio => Box::new(AudioDecoder::new(codec_config, self.decoder_config.clone())?),
        };
        Ok(decoder)
    }
}

impl StreamDecoder for VideoDecoder {
    fn send_packet(&mut self, packet: &Packet) -> Result<()> {
        VideoDecoder::send_packet(self, packet)
    }

    fn send_eof(&mut self) -> Result<()> {
        VideoDecoder::send_eof(self)
    }

    fn receive_frame(&mut self) -> Result<Frame> {
        VideoDecoder::receive_frame(self).map(Frame::Video)
    }

    fn reset(&mut self) {
        VideoDecoder::reset(self);
    }
}

impl StreamDecoder for AudioDecoder {
    fn send_packet(&mut self, packet: &Packet) -> Result<()> {
        AudioDecoder::send_packet(self, packet)
    }

    fn send_eof(&mut self) -> Result<()> {
        AudioDecoder::send_eof(self)
    }

    fn receive_frame(&mut self) -> Result<Frame> {
        AudioDecoder::receive_frame(self).map(Frame::Audio)
    }

    fn reset(&mut self) {
        AudioDecoder::reset(self);
    }
}

struct FfmpegScaler {
    algorithm: ScalingAlgorithm,
}

impl ScaleBackend for FfmpegScaler {
    fn create_context(&self, key: &RescaleKey) -> Result<Box<dyn ScaleContext>> {
        let scaler = VideoScaler::new(
            key.src_format,
            key.src_width,
            key.src_height,
            key.dst_format,
            key.dst_width,
            key.dst_height,
            self.algorithm,
        )?;
        Ok(Box::new(scaler))
    }
}

impl ScaleContext for VideoScaler {
    fn scale(&mut self, frame: &VideoFrame, dst: &mut [u8]) -> Result<()> {
        self.scale_into(frame, dst)
    }
}

impl AudioConverter for AudioResampler {
    fn convert(&mut self, frame: &AudioFrame) -> Result<Vec<u8>> {
        AudioResampler::convert(self, frame).map(|converted| converted.data)
    }

    fn reset(&mut self) {
        AudioResampler::reset(self);
    }
}
