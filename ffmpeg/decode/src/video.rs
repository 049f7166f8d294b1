/*!
    Video decoder implementation.
*/

use ffmpeg_next::{codec, codec::decoder::Video as VideoDecoderFFmpeg, util::frame::video::Video as VideoFrameFFmpeg};

use ffmpeg_source::{CodecConfig, convert::pixel_format_from_ffmpeg};
use ffmpeg_types::{Error, Packet, PixelFormat, Pts, Rational, Result, VideoFrame};

use crate::config::DecoderConfig;
use crate::status::{frame_dts, map_codec_error, to_ffmpeg_packet};

/**
    Software video decoder for one stream.
*/
pub struct VideoDecoder {
    decoder: VideoDecoderFFmpeg,
    time_base: Rational,
    scratch: VideoFrameFFmpeg,
}

impl VideoDecoder {
    pub fn new(codec_config: CodecConfig, config: DecoderConfig) -> Result<Self> {
        ffmpeg_next::init().map_err(|e| Error::codec(e.to_string()))?;

        let time_base = codec_config.time_base();
        let mut decoder_ctx = codec::context::Context::from_parameters(codec_config.into_parameters())
            .map_err(|e| Error::codec(e.to_string()))?;
        config.apply(&mut decoder_ctx);

        let decoder = decoder_ctx
            .decoder()
            .video()
            .map_err(|e| Error::unsupported_format(e.to_string()))?;
        tracing::debug!(
            width = decoder.width(),
            height = decoder.height(),
            "opened video decoder"
        );

        Ok(Self {
            decoder,
            time_base,
            scratch: VideoFrameFFmpeg::empty(),
        })
    }

    pub fn time_base(&self) -> Rational {
        self.time_base
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.decoder.width(), self.decoder.height())
    }

    /**
        Submit one packet.

        Returns [`Error::Again`] when the decoder holds frames that must be
        received first.
    */
    pub fn send_packet(&mut self, packet: &Packet) -> Result<()> {
        self.decoder
            .send_packet(&to_ffmpeg_packet(packet))
            .map_err(map_codec_error)
    }

    /**
        Signal end of input so buffered frames can be drained.
    */
    pub fn send_eof(&mut self) -> Result<()> {
        self.decoder.send_eof().map_err(map_codec_error)
    }

    /**
        Take one finished frame.

        Returns [`Error::Again`] when the decoder needs another packet and
        [`Error::Eof`] once it has been fully drained.
    */
    pub fn receive_frame(&mut self) -> Result<VideoFrame> {
        self.decoder
            .receive_frame(&mut self.scratch)
            .map_err(map_codec_error)?;
        self.convert_frame()
    }

    /**
        Discard buffered packets and frames, e.g. after a seek.
    */
    pub fn reset(&mut self) {
        self.decoder.flush();
    }

    fn convert_frame(&self) -> Result<VideoFrame> {
        let frame = &self.scratch;
        let (width, height) = (frame.width(), frame.height());
        if width == 0 || height == 0 {
            return Err(Error::invalid_data("frame has zero dimensions"));
        }

        let ffmpeg_format = frame.format();
        let format = pixel_format_from_ffmpeg(ffmpeg_format).ok_or_else(|| {
            Error::unsupported_format(format!("unsupported pixel format: {ffmpeg_format:?}"))
        })?;

        let data = copy_frame_data(frame, format)?;
        let pts = frame.pts().or_else(|| frame.timestamp()).map(Pts);

        Ok(VideoFrame::new(data, width, height, format, self.time_base)
            .with_timestamps(pts, frame_dts(frame)))
    }
}

/**
    Copy every plane of an FFmpeg frame into one tightly packed buffer,
    dropping the per-row stride padding.
*/
fn copy_frame_data(frame: &VideoFrameFFmpeg, format: PixelFormat) -> Result<Vec<u8>> {
    let size = format
        .frame_size(frame.width(), frame.height())
        .ok_or_else(|| Error::invalid_data("frame size overflows"))?;
    let mut output = Vec::with_capacity(size);

    for plane in 0..format.plane_count() {
        let (row_bytes, rows) = format
            .plane_dimensions(plane, frame.width(), frame.height())
            .ok_or_else(|| Error::invalid_data(format!("missing plane {plane}")))?;
        let stride = frame.stride(plane);
        let data = frame.data(plane);

        for y in 0..rows {
            let start = y * stride;
            let row = data
                .get(start..start + row_bytes)
                .ok_or_else(|| Error::invalid_data(format!("plane {plane} is truncated")))?;
            output.extend_from_slice(row);
        }
    }

    Ok(output)
}

// SAFETY: the codec context and scratch frame are owned by the decoder and
// only touched through `&mut self`.
unsafe impl Send for VideoDecoder {}

impl std::fmt::Debug for VideoDecoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VideoDecoder")
            .field("time_base", &self.time_base)
            .field("width", &self.decoder.width())
            .field("height", &self.decoder.height())
            .finish_non_exhaustive()
    }
}
