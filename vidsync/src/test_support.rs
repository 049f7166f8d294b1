//! Scripted backend used by the unit tests.

use std::collections::VecDeque;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use ffmpeg_types::{
    AudioFrame, AudioParameters, CodecId, Error, Frame, MediaDuration, MediaInfo, Packet,
    PixelFormat, Pts, Rational, Result, SampleFormat, StreamInfo, StreamParameters, StreamType,
    VideoFrame, VideoParameters,
};

use crate::audio::PcmConverter;
use crate::backend::{
    AudioConverter, AudioOutputSpec, MediaBackend, PacketSource, RescaleKey, ScaleBackend,
    ScaleContext, StreamDecoder,
};

pub(crate) const VIDEO: usize = 0;
pub(crate) const AUDIO: usize = 1;
pub(crate) const VIDEO_TB: Rational = Rational::new(1, 30);
pub(crate) const AUDIO_TB: Rational = Rational::new(1, 44100);
pub(crate) const SAMPLES_PER_PACKET: usize = 1470;
pub(crate) const FRAME_WIDTH: u32 = 64;
pub(crate) const FRAME_HEIGHT: u32 = 36;
pub(crate) const KEYFRAME_INTERVAL: i64 = 30;
/// Value of every S16 sample the fake audio decoder produces.
pub(crate) const SAMPLE_VALUE: i16 = 1000;

/**
    Counters shared between a scripted media file and the test that drives it.
*/
#[derive(Debug, Default)]
pub(crate) struct Counters {
    pub reads: AtomicUsize,
    pub seeks: AtomicUsize,
    pub video_sends: AtomicUsize,
    pub video_frames: AtomicUsize,
    pub audio_sends: AtomicUsize,
    pub audio_frames: AtomicUsize,
}

impl Counters {
    pub fn get(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }
}

/**
    Description of a synthetic container: a 30 fps video stream at index 0
    and a 44.1 kHz stereo audio stream at index 1, both ten seconds long.
    A missing stream is replaced by a data track so indices stay put.
*/
#[derive(Debug, Clone)]
pub(crate) struct ScriptedMedia {
    pub video: bool,
    pub audio: bool,
    pub packets_per_stream: i64,
    pub corrupt_video: bool,
    pub unsupported: Vec<usize>,
    /// Read calls (1-based) that fail once with an I/O error.
    pub failing_reads: Vec<usize>,
    pub counters: Arc<Counters>,
}

impl ScriptedMedia {
    pub fn av() -> Self {
        Self {
            video: true,
            audio: true,
            packets_per_stream: 300,
            corrupt_video: false,
            unsupported: Vec::new(),
            failing_reads: Vec::new(),
            counters: Arc::new(Counters::default()),
        }
    }

    pub fn video_only() -> Self {
        Self {
            audio: false,
            ..Self::av()
        }
    }

    pub fn audio_only() -> Self {
        Self {
            video: false,
            ..Self::av()
        }
    }

    pub fn with_packets(mut self, packets_per_stream: i64) -> Self {
        self.packets_per_stream = packets_per_stream;
        self
    }

    pub fn media_info(&self) -> MediaInfo {
        let n = self.packets_per_stream;
        let video = if self.video {
            StreamInfo {
                index: VIDEO,
                codec_id: CodecId::H264,
                time_base: VIDEO_TB,
                duration: Some(MediaDuration(n)),
                bitrate: Some(800_000),
                parameters: StreamParameters::Video(VideoParameters {
                    width: FRAME_WIDTH,
                    height: FRAME_HEIGHT,
                    pixel_format: Some(PixelFormat::Yuv420p),
                    frame_rate: Some(Rational::new(30, 1)),
                }),
            }
        } else {
            data_track(VIDEO)
        };
        let audio = if self.audio {
            StreamInfo {
                index: AUDIO,
                codec_id: CodecId::Aac,
                time_base: AUDIO_TB,
                duration: Some(MediaDuration(n * SAMPLES_PER_PACKET as i64)),
                bitrate: None,
                parameters: StreamParameters::Audio(AudioParameters {
                    sample_rate: 44100,
                    channels: 2,
                    sample_format: Some(SampleFormat::S16),
                }),
            }
        } else {
            data_track(AUDIO)
        };
        MediaInfo {
            format_name: "scripted".to_string(),
            duration: Some(Duration::from_secs_f64(n as f64 / 30.0)),
            streams: vec![video, audio],
        }
    }

    /**
        Packets in container order: audio first when both streams share a
        timestamp in seconds.
    */
    fn packets(&self) -> Vec<Packet> {
        let mut packets = Vec::new();
        for k in 0..self.packets_per_stream {
            if self.audio {
                let pts = Pts(k * SAMPLES_PER_PACKET as i64);
                packets.push(
                    Packet::new(vec![1; 8], AUDIO, AUDIO_TB)
                        .with_timestamps(Some(pts), Some(pts))
                        .with_duration(MediaDuration(SAMPLES_PER_PACKET as i64))
                        .with_keyframe(true),
                );
            }
            if self.video {
                packets.push(
                    Packet::new(vec![0; 16], VIDEO, VIDEO_TB)
                        .with_timestamps(Some(Pts(k)), Some(Pts(k)))
                        .with_duration(MediaDuration(1))
                        .with_keyframe(k % KEYFRAME_INTERVAL == 0),
                );
            }
        }
        packets
    }

    pub fn source(&self) -> ScriptedSource {
        ScriptedSource {
            info: self.media_info(),
            packets: self.packets(),
            cursor: 0,
            failing_reads: self.failing_reads.clone(),
            media: self.clone(),
        }
    }
}

fn data_track(index: usize) -> StreamInfo {
    StreamInfo {
        index,
        codec_id: CodecId::Other("bin_data".to_string()),
        time_base: Rational::new(1, 1000),
        duration: None,
        bitrate: None,
        parameters: StreamParameters::Other,
    }
}

pub(crate) struct ScriptedSource {
    info: MediaInfo,
    packets: Vec<Packet>,
    cursor: usize,
    failing_reads: Vec<usize>,
    media: ScriptedMedia,
}

impl PacketSource for ScriptedSource {
    fn media_info(&self) -> &MediaInfo {
        &self.info
    }

    fn best_stream(&self, kind: StreamType) -> Option<usize> {
        self.info
            .streams
            .iter()
            .find(|s| s.stream_type() == Some(kind))
            .map(|s| s.index)
    }

    fn read_packet(&mut self) -> Result<Option<Packet>> {
        let read = self.media.counters.reads.fetch_add(1, Ordering::SeqCst) + 1;
        if let Some(pos) = self.failing_reads.iter().position(|&r| r == read) {
            self.failing_reads.remove(pos);
            return Err(Error::Io(std::io::Error::other("scripted read failure")));
        }
        let packet = self.packets.get(self.cursor).cloned();
        if packet.is_some() {
            self.cursor += 1;
        }
        Ok(packet)
    }

    fn seek(&mut self, stream_index: usize, timestamp: Pts, backward: bool) -> Result<()> {
        self.media.counters.seeks.fetch_add(1, Ordering::SeqCst);
        let mut keyframes = self
            .packets
            .iter()
            .filter(|p| p.stream_index == stream_index && p.is_keyframe);
        let landing = if backward {
            keyframes.filter(|p| p.pts <= Some(timestamp)).last()
        } else {
            keyframes.find(|p| p.pts >= Some(timestamp))
        };
        let seconds = landing
            .and_then(Packet::presentation_seconds)
            .ok_or_else(|| Error::codec("no keyframe to seek to"))?;
        self.cursor = self
            .packets
            .iter()
            .position(|p| p.presentation_seconds().is_some_and(|s| s >= seconds - 1e-9))
            .unwrap_or(self.packets.len());
        Ok(())
    }

    fn open_decoder(&self, stream_index: usize) -> Result<Box<dyn StreamDecoder>> {
        if self.media.unsupported.contains(&stream_index) {
            return Err(Error::unsupported_format("scripted codec is unsupported"));
        }
        let kind = self
            .info
            .streams
            .get(stream_index)
            .and_then(StreamInfo::stream_type)
            .ok_or_else(|| Error::unsupported_format("not a media stream"))?;
        Ok(Box::new(FakeDecoder {
            kind,
            corrupt: kind == StreamType::Video && self.media.corrupt_video,
            queued: VecDeque::new(),
            draining: false,
            counters: Arc::clone(&self.media.counters),
        }))
    }
}

/**
    One packet in, one frame out. Refuses a packet while a frame is still
    waiting to be received.
*/
struct FakeDecoder {
    kind: StreamType,
    corrupt: bool,
    queued: VecDeque<Frame>,
    draining: bool,
    counters: Arc<Counters>,
}

impl StreamDecoder for FakeDecoder {
    fn send_packet(&mut self, packet: &Packet) -> Result<()> {
        match self.kind {
            StreamType::Video => self.counters.video_sends.fetch_add(1, Ordering::SeqCst),
            StreamType::Audio => self.counters.audio_sends.fetch_add(1, Ordering::SeqCst),
        };
        if self.draining {
            return Err(Error::Eof);
        }
        if self.corrupt {
            return Err(Error::invalid_data("scripted corruption"));
        }
        if !self.queued.is_empty() {
            return Err(Error::Again);
        }
        self.queued.push_back(fake_frame(self.kind, packet));
        Ok(())
    }

    fn send_eof(&mut self) -> Result<()> {
        self.draining = true;
        Ok(())
    }

    fn receive_frame(&mut self) -> Result<Frame> {
        match self.queued.pop_front() {
            Some(frame) => {
                match self.kind {
                    StreamType::Video => self.counters.video_frames.fetch_add(1, Ordering::SeqCst),
                    StreamType::Audio => self.counters.audio_frames.fetch_add(1, Ordering::SeqCst),
                };
                Ok(frame)
            }
            None if self.draining => Err(Error::Eof),
            None => Err(Error::Again),
        }
    }

    fn reset(&mut self) {
        self.queued.clear();
        self.draining = false;
    }
}

fn fake_frame(kind: StreamType, packet: &Packet) -> Frame {
    match kind {
        StreamType::Video => {
            let size = PixelFormat::Yuv420p
                .frame_size(FRAME_WIDTH, FRAME_HEIGHT)
                .unwrap_or_default();
            let fill = packet.pts.map_or(0, |p| p.0 as u8);
            Frame::Video(
                VideoFrame::new(
                    vec![fill; size],
                    FRAME_WIDTH,
                    FRAME_HEIGHT,
                    PixelFormat::Yuv420p,
                    packet.time_base,
                )
                .with_timestamps(packet.pts, packet.dts),
            )
        }
        StreamType::Audio => {
            let samples = vec![SAMPLE_VALUE; SAMPLES_PER_PACKET * 2];
            Frame::Audio(
                AudioFrame::new(
                    bytemuck::cast_slice(&samples).to_vec(),
                    SAMPLES_PER_PACKET,
                    44100,
                    2,
                    SampleFormat::S16,
                    packet.time_base,
                )
                .with_timestamps(packet.pts, packet.dts),
            )
        }
    }
}

/**
    Scaler that fills the target with the first source byte and counts how
    many contexts it built.
*/
#[derive(Debug, Clone, Default)]
pub(crate) struct CountingScaler {
    pub contexts: Arc<AtomicUsize>,
    pub fail_create: Arc<AtomicBool>,
}

impl ScaleBackend for CountingScaler {
    fn create_context(&self, key: &RescaleKey) -> Result<Box<dyn ScaleContext>> {
        if self.fail_create.load(Ordering::SeqCst) {
            return Err(Error::codec("scripted context failure"));
        }
        self.contexts.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(FillContext { key: *key }))
    }
}

struct FillContext {
    key: RescaleKey,
}

impl ScaleContext for FillContext {
    fn scale(&mut self, frame: &VideoFrame, dst: &mut [u8]) -> Result<()> {
        if frame.width != self.key.src_width || frame.height != self.key.src_height {
            return Err(Error::invalid_data("frame does not match context"));
        }
        dst.fill(frame.data.first().copied().unwrap_or_default());
        Ok(())
    }
}

/**
    Backend over [`ScriptedMedia`]. The paths "missing" and "garbage" fail
    to open.
*/
#[derive(Debug, Clone)]
pub(crate) struct TestBackend {
    pub media: ScriptedMedia,
    pub scaler: CountingScaler,
}

impl TestBackend {
    pub fn new(media: ScriptedMedia) -> Self {
        Self {
            media,
            scaler: CountingScaler::default(),
        }
    }
}

impl MediaBackend for TestBackend {
    fn open(&self, path: &Path) -> Result<Box<dyn PacketSource>> {
        match path.to_str() {
            Some("missing") => Err(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "No such file or directory",
            )
            .into()),
            Some("garbage") => Err(Error::invalid_data("could not find stream info")),
            _ => Ok(Box::new(self.media.source())),
        }
    }

    fn scaler(&self) -> Box<dyn ScaleBackend> {
        Box::new(self.scaler.clone())
    }

    fn audio_converter(&self, spec: AudioOutputSpec) -> Result<Box<dyn AudioConverter>> {
        Ok(Box::new(PcmConverter::new(spec)))
    }
}
