/*!
    State shared between the render loop and the audio device callback.
*/

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use ffmpeg_types::{AudioFrame, Result, StreamType, VideoFrame};
use parking_lot::Mutex;
use ringbuf::{HeapRb, traits::{Consumer, Observer, Producer}};
use tracing::warn;

use crate::backend::{AudioConverter, PacketSource};
use crate::broker::PacketBroker;
use crate::decoder::FrameDecoder;
use crate::rescale::FrameRescaler;

struct AtomicF64 {
    inner: AtomicU64,
}

impl AtomicF64 {
    fn new(value: f64) -> Self {
        Self {
            inner: AtomicU64::new(value.to_bits()),
        }
    }

    fn load(&self, ordering: Ordering) -> f64 {
        f64::from_bits(self.inner.load(ordering))
    }

    fn store(&self, value: f64, ordering: Ordering) {
        self.inner.store(value.to_bits(), ordering);
    }
}

/**
    Everything that decodes. Fields drop in declaration order, so the
    decoders are released before the container they read from.
*/
pub(crate) struct Pipeline {
    pub video: Option<FrameDecoder>,
    pub audio: Option<FrameDecoder>,
    pub converter: Option<Box<dyn AudioConverter>>,
    pub rescaler: FrameRescaler,
    /// Frame currently on screen.
    pub display: Option<VideoFrame>,
    /// Decoded frame whose conversion failed, retried on the next tick.
    pub unscaled: Option<VideoFrame>,
    /// Converted audio not yet handed to the device.
    pub overflow: HeapRb<u8>,
    /// Size of one interleaved sample frame of converted audio.
    pub audio_frame_bytes: usize,
    pub broker: PacketBroker,
    pub source: Box<dyn PacketSource>,
}

impl Pipeline {
    pub fn decoder(&self, kind: StreamType) -> Option<&FrameDecoder> {
        match kind {
            StreamType::Video => self.video.as_ref(),
            StreamType::Audio => self.audio.as_ref(),
        }
    }

    pub fn clear_overflow(&mut self) {
        let stored = self.overflow.occupied_len();
        self.overflow.skip(stored);
    }
}

/**
    How much of one converted audio frame went into the overflow buffer.
*/
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Queued {
    pub converted: usize,
    pub kept: usize,
}

/**
    Convert `frame` and append it to `overflow`.

    When the buffer cannot take all of it, only whole sample frames are kept
    so the channels stay aligned.
*/
pub(crate) fn queue_audio(
    converter: &mut dyn AudioConverter,
    overflow: &mut HeapRb<u8>,
    frame_bytes: usize,
    frame: &AudioFrame,
) -> Result<Queued> {
    let bytes = converter.convert(frame)?;
    let room = overflow.vacant_len();
    let keep = bytes.len().min(room - room % frame_bytes.max(1));
    overflow.push_slice(&bytes[..keep]);
    if keep < bytes.len() {
        warn!(
            dropped = bytes.len() - keep,
            capacity = overflow.capacity().get(),
            "audio overflow buffer full, truncating frame"
        );
    }
    Ok(Queued {
        converted: bytes.len(),
        kept: keep,
    })
}

/**
    The pipeline behind a mutex plus the clock values the audio thread
    reads without taking it.
*/
pub(crate) struct Shared {
    pub pipeline: Mutex<Option<Pipeline>>,
    current_time: AtomicF64,
    seeked_backward: [AtomicBool; 2],
    paused: AtomicBool,
}

fn flag_index(kind: StreamType) -> usize {
    match kind {
        StreamType::Video => 0,
        StreamType::Audio => 1,
    }
}

impl Shared {
    pub fn new(pipeline: Pipeline) -> Self {
        Self {
            pipeline: Mutex::new(Some(pipeline)),
            current_time: AtomicF64::new(0.0),
            seeked_backward: [AtomicBool::new(false), AtomicBool::new(false)],
            paused: AtomicBool::new(false),
        }
    }

    pub fn current_time(&self) -> f64 {
        self.current_time.load(Ordering::Acquire)
    }

    pub fn set_current_time(&self, seconds: f64) {
        self.current_time.store(seconds, Ordering::Release);
    }

    pub fn seeked_backward(&self, kind: StreamType) -> bool {
        self.seeked_backward[flag_index(kind)].load(Ordering::Acquire)
    }

    pub fn set_seeked_backward(&self, kind: StreamType, value: bool) {
        self.seeked_backward[flag_index(kind)].store(value, Ordering::Release);
    }

    pub fn seek_pending(&self) -> bool {
        self.seeked_backward(StreamType::Video) || self.seeked_backward(StreamType::Audio)
    }

    pub fn is_paused(&self) -> bool {
        self.paused.load(Ordering::Acquire)
    }

    pub fn set_paused(&self, paused: bool) {
        self.paused.store(paused, Ordering::Release);
    }
}

static_assertions::assert_impl_all!(Shared: Send, Sync);
