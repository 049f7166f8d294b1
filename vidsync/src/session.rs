/*!
    One open media file and everything decoding it.
*/

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use ffmpeg_types::{MediaInfo, StreamInfo, StreamType, VideoFrame};
use ringbuf::HeapRb;
use tracing::{info, warn};

use crate::audio::AudioRingBridge;
use crate::backend::{AudioOutputSpec, MediaBackend, PacketSource};
use crate::broker::PacketBroker;
use crate::clock::{PlaybackClock, SeekOutcome, TickReport};
use crate::config::PlaybackConfig;
use crate::decoder::{DecoderState, FrameDecoder};
use crate::error::OpenError;
use crate::pipeline::{Pipeline, Shared};
use crate::rescale::{FrameRescaler, Rect};
use crate::retry::RetryPolicy;

/**
    A playback session over one media file.

    Owns the container, the decoders for its best video and audio streams,
    and the clock that schedules them. The audio device is fed from another
    thread through [`MediaSession::audio_bridge`].
*/
pub struct MediaSession {
    path: PathBuf,
    info: MediaInfo,
    video_index: Option<usize>,
    audio_index: Option<usize>,
    unsupported: Vec<usize>,
    audio_spec: Option<AudioOutputSpec>,
    audio_retry: RetryPolicy,
    shared: Arc<Shared>,
    clock: PlaybackClock,
    closed: bool,
}

impl MediaSession {
    /**
        Open a media file with the FFmpeg backend.
    */
    #[cfg(feature = "ffmpeg")]
    pub fn open<P: AsRef<Path>>(path: P, config: PlaybackConfig) -> Result<Self, OpenError> {
        Self::open_with(&crate::ffmpeg::FfmpegBackend::default(), path, config)
    }

    /**
        Open a media file with any backend.

        A stream whose decoder cannot be built is skipped and listed in
        [`MediaSession::unsupported_streams`]. Opening only fails with
        [`OpenError::CodecUnsupported`] when neither stream is usable.
    */
    pub fn open_with<P: AsRef<Path>>(
        backend: &dyn MediaBackend,
        path: P,
        config: PlaybackConfig,
    ) -> Result<Self, OpenError> {
        let path = path.as_ref();
        let source = backend
            .open(path)
            .map_err(|e| OpenError::from_backend(path, e))?;
        let info = source.media_info().clone();

        let best_video = source.best_stream(StreamType::Video);
        let best_audio = source.best_stream(StreamType::Audio);
        if best_video.is_none() && best_audio.is_none() {
            return Err(OpenError::Unreadable {
                reason: "no audio or video streams".to_string(),
            });
        }

        let mut unsupported = Vec::new();
        let video = best_video
            .and_then(|index| open_decoder(&*source, index, StreamType::Video, &mut unsupported));
        let mut audio = best_audio
            .and_then(|index| open_decoder(&*source, index, StreamType::Audio, &mut unsupported));

        let mut audio_spec = None;
        let mut converter = None;
        if let Some(decoder) = &audio {
            let channels = info
                .streams
                .get(decoder.stream_index())
                .and_then(StreamInfo::audio)
                .map(|a| a.channels)
                .filter(|&c| c > 0)
                .unwrap_or(2);
            let spec = AudioOutputSpec {
                sample_rate: config.audio_sample_rate,
                channels,
            };
            match backend.audio_converter(spec) {
                Ok(c) => {
                    converter = Some(c);
                    audio_spec = Some(spec);
                }
                Err(e) => {
                    warn!(stream = decoder.stream_index(), error = %e, "no audio converter, dropping audio");
                    unsupported.push(decoder.stream_index());
                    audio = None;
                }
            }
        }

        if video.is_none() && audio.is_none() {
            return Err(OpenError::CodecUnsupported {
                streams: unsupported,
            });
        }

        let mut broker = PacketBroker::new(config.packet_high_water_mark);
        for decoder in [video.as_ref(), audio.as_ref()].into_iter().flatten() {
            broker.set_interest(decoder.stream_index(), true);
        }

        let video_index = video.as_ref().map(FrameDecoder::stream_index);
        let audio_index = audio.as_ref().map(FrameDecoder::stream_index);
        let pipeline = Pipeline {
            video,
            audio,
            converter,
            rescaler: FrameRescaler::new(backend.scaler(), config.output_pixel_format.into()),
            display: None,
            unscaled: None,
            overflow: HeapRb::new(config.overflow_capacity.max(1)),
            audio_frame_bytes: audio_spec.map_or(4, |spec| spec.bytes_per_frame()),
            broker,
            source,
        };
        let shared = Arc::new(Shared::new(pipeline));
        let clock = PlaybackClock::new(Arc::clone(&shared), &config);

        info!(
            path = %path.display(),
            ?video_index,
            ?audio_index,
            ?unsupported,
            "opened media session"
        );

        Ok(Self {
            path: path.to_path_buf(),
            info,
            video_index,
            audio_index,
            unsupported,
            audio_spec,
            audio_retry: config.audio_retry(),
            shared,
            clock,
            closed: false,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn media_info(&self) -> &MediaInfo {
        &self.info
    }

    pub fn streams(&self) -> &[StreamInfo] {
        &self.info.streams
    }

    /// Container index of the video stream being decoded.
    pub fn video_index(&self) -> Option<usize> {
        self.video_index
    }

    /// Container index of the audio stream being decoded.
    pub fn audio_index(&self) -> Option<usize> {
        self.audio_index
    }

    /// Streams that were skipped because no decoder could be built.
    pub fn unsupported_streams(&self) -> &[usize] {
        &self.unsupported
    }

    pub fn video_dimensions(&self) -> Option<(u32, u32)> {
        let video = self.info.streams.get(self.video_index?)?.video()?;
        Some((video.width, video.height))
    }

    pub fn duration(&self) -> Option<Duration> {
        self.info.duration
    }

    /// Output format for the audio device, if the session plays audio.
    pub fn audio_spec(&self) -> Option<AudioOutputSpec> {
        self.audio_spec
    }

    /**
        Handle for the audio device callback, if the session plays audio.
    */
    pub fn audio_bridge(&self) -> Option<AudioRingBridge> {
        let spec = self.audio_spec?;
        Some(AudioRingBridge::new(
            Arc::clone(&self.shared),
            spec,
            self.audio_retry,
        ))
    }

    pub fn stream_state(&self, kind: StreamType) -> Option<DecoderState> {
        let guard = self.shared.pipeline.lock();
        guard.as_ref()?.decoder(kind).map(FrameDecoder::state)
    }

    pub fn tick(&mut self) -> TickReport {
        self.clock.tick()
    }

    pub fn tick_by(&mut self, elapsed: Duration) -> TickReport {
        self.clock.tick_by(elapsed)
    }

    pub fn seek(&mut self, offset_seconds: f64) -> SeekOutcome {
        self.clock.seek(offset_seconds)
    }

    pub fn pause(&self) {
        self.clock.pause();
    }

    pub fn resume(&self) {
        self.clock.resume();
    }

    pub fn is_paused(&self) -> bool {
        self.clock.is_paused()
    }

    pub fn current_time(&self) -> f64 {
        self.clock.current_time()
    }

    pub fn is_finished(&self) -> bool {
        self.clock.is_finished()
    }

    pub fn set_target_size(&mut self, size: Option<(u32, u32)>) {
        self.clock.set_target_size(size);
    }

    /**
        Fit video into `bounds` and return the rectangle to draw it in.
    */
    pub fn set_display_bounds(&mut self, bounds: Rect, true_size: bool) -> Option<Rect> {
        self.clock.set_display_bounds(bounds, true_size)
    }

    /**
        Run `f` on the frame currently on screen.

        The frame stays locked for the duration of the call, so the render
        sink never sees it change underneath it.
    */
    pub fn with_video_frame<R>(&self, f: impl FnOnce(&VideoFrame) -> R) -> Option<R> {
        let guard = self.shared.pipeline.lock();
        guard.as_ref()?.display.as_ref().map(f)
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /**
        Release the decoders, then the container. Calling it again does
        nothing.
    */
    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        let pipeline = self.shared.pipeline.lock().take();
        if let Some(pipeline) = pipeline {
            let Pipeline {
                video,
                audio,
                source,
                ..
            } = pipeline;
            drop(video);
            drop(audio);
            drop(source);
        }
        info!(path = %self.path.display(), "closed media session");
    }
}

impl Drop for MediaSession {
    fn drop(&mut self) {
        self.close();
    }
}

impl std::fmt::Debug for MediaSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MediaSession")
            .field("path", &self.path)
            .field("video_index", &self.video_index)
            .field("audio_index", &self.audio_index)
            .field("closed", &self.closed)
            .finish_non_exhaustive()
    }
}

fn open_decoder(
    source: &dyn PacketSource,
    index: usize,
    kind: StreamType,
    unsupported: &mut Vec<usize>,
) -> Option<FrameDecoder> {
    let time_base = source.streams().get(index)?.time_base;
    match source.open_decoder(index) {
        Ok(codec) => Some(FrameDecoder::new(index, kind, time_base, codec)),
        Err(e) => {
            warn!(stream = index, ?kind, error = %e, "no decoder for stream");
            unsupported.push(index);
            None
        }
    }
}
