/*!
    Seams between the playback core and the codec library.

    The core only ever talks to these traits. [`crate::FfmpegBackend`]
    implements them on top of the `ffmpeg-*` crates; tests drive the core
    with scripted implementations.
*/

use std::path::Path;
use std::time::Duration;

use ffmpeg_types::{AudioFrame, Frame, MediaInfo, Packet, PixelFormat, Pts, Result, StreamInfo, StreamType, VideoFrame};

/**
    An open container with one shared read cursor.
*/
pub trait PacketSource: Send {
    fn media_info(&self) -> &MediaInfo;

    fn streams(&self) -> &[StreamInfo] {
        &self.media_info().streams
    }

    fn best_stream(&self, kind: StreamType) -> Option<usize>;

    fn duration(&self) -> Option<Duration> {
        self.media_info().duration
    }

    /**
        Read the next packet of any stream. `Ok(None)` means end of input.
    */
    fn read_packet(&mut self) -> Result<Option<Packet>>;

    /**
        Move the shared cursor to `timestamp`, expressed in the time base of
        `stream_index`.
    */
    fn seek(&mut self, stream_index: usize, timestamp: Pts, backward: bool) -> Result<()>;

    fn open_decoder(&self, stream_index: usize) -> Result<Box<dyn StreamDecoder>>;
}

/**
    Send/receive decoder state for one stream.

    Status is reported through [`ffmpeg_types::Error`]: `Again` asks for
    more input (or for frames to be drained before more input), `Eof`
    means fully drained, `InvalidData` means the input was rejected.
*/
pub trait StreamDecoder: Send {
    fn send_packet(&mut self, packet: &Packet) -> Result<()>;

    fn send_eof(&mut self) -> Result<()>;

    fn receive_frame(&mut self) -> Result<Frame>;

    /// Drop every buffered packet and frame.
    fn reset(&mut self);
}

/**
    Source and target geometry of one video conversion.
*/
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RescaleKey {
    pub src_format: PixelFormat,
    pub src_width: u32,
    pub src_height: u32,
    pub dst_format: PixelFormat,
    pub dst_width: u32,
    pub dst_height: u32,
}

impl RescaleKey {
    pub fn for_frame(frame: &VideoFrame, dst_format: PixelFormat, width: u32, height: u32) -> Self {
        Self {
            src_format: frame.format,
            src_width: frame.width,
            src_height: frame.height,
            dst_format,
            dst_width: width,
            dst_height: height,
        }
    }

    pub fn is_identity(&self) -> bool {
        self.src_format == self.dst_format
            && self.src_width == self.dst_width
            && self.src_height == self.dst_height
    }
}

pub trait ScaleBackend: Send {
    fn create_context(&self, key: &RescaleKey) -> Result<Box<dyn ScaleContext>>;
}

pub trait ScaleContext: Send {
    /**
        Convert `frame` into `dst`, which is exactly the packed size of the
        target geometry.
    */
    fn scale(&mut self, frame: &VideoFrame, dst: &mut [u8]) -> Result<()>;
}

/**
    Format the audio device is opened with.
*/
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AudioOutputSpec {
    pub sample_rate: u32,
    pub channels: u16,
}

impl AudioOutputSpec {
    /// Bytes per interleaved S16 sample frame.
    pub fn bytes_per_frame(&self) -> usize {
        self.channels as usize * 2
    }
}

/**
    Converts decoded audio to interleaved S16 in the output spec.
*/
pub trait AudioConverter: Send {
    fn convert(&mut self, frame: &AudioFrame) -> Result<Vec<u8>>;

    fn reset(&mut self);
}

pub trait MediaBackend {
    fn open(&self, path: &Path) -> Result<Box<dyn PacketSource>>;

    fn scaler(&self) -> Box<dyn ScaleBackend>;

    fn audio_converter(&self, spec: AudioOutputSpec) -> Result<Box<dyn AudioConverter>>;
}
