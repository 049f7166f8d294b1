/*!
    Playback time, per-tick frame scheduling and seeking.
*/

use std::sync::Arc;
use std::time::{Duration, Instant};

use ffmpeg_types::{Frame, Pts, StreamType, VideoFrame};
use tracing::{debug, info, warn};

use crate::config::PlaybackConfig;
use crate::decoder::FrameDecoder;
use crate::error::DecodeError;
use crate::pipeline::{Pipeline, Shared, queue_audio};
use crate::rescale::{Rect, fit_rect};
use crate::retry::{RetryError, RetryPolicy};

/**
    Result of a call to [`PlaybackClock::seek`].
*/
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeekOutcome {
    /// The cursor moved and playback continues from the target.
    Moved,
    /// The target was before the start of the media.
    NegativeTarget,
    /// The target was past the end of at least one stream.
    BeyondDuration,
    /// No stream could be moved to the target.
    Rejected,
}

impl SeekOutcome {
    pub fn moved(self) -> bool {
        self == Self::Moved
    }
}

/**
    What one tick did.
*/
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TickReport {
    pub video_fetched: bool,
    pub audio_fetched: bool,
    /// Playback time after the tick, in seconds.
    pub current_time: f64,
}

const STREAMS: [StreamType; 2] = [StreamType::Video, StreamType::Audio];

/**
    Owns the playback time and decides, once per rendered frame, which
    streams need a new frame.
*/
pub struct PlaybackClock {
    shared: Arc<Shared>,
    video_retry: RetryPolicy,
    speed: f64,
    max_tick_delta: Duration,
    last_tick: Option<Instant>,
    target_size: Option<(u32, u32)>,
}

impl PlaybackClock {
    pub(crate) fn new(shared: Arc<Shared>, config: &PlaybackConfig) -> Self {
        Self {
            shared,
            video_retry: config.video_retry(),
            speed: config.speed,
            max_tick_delta: config.max_tick_delta(),
            last_tick: None,
            target_size: None,
        }
    }

    pub fn current_time(&self) -> f64 {
        self.shared.current_time()
    }

    pub fn pause(&self) {
        self.shared.set_paused(true);
    }

    pub fn resume(&self) {
        self.shared.set_paused(false);
    }

    pub fn is_paused(&self) -> bool {
        self.shared.is_paused()
    }

    /**
        Size video frames are converted to. `None` keeps the native size.
    */
    pub fn set_target_size(&mut self, size: Option<(u32, u32)>) {
        self.target_size = size.filter(|&(w, h)| w > 0 && h > 0);
    }

    pub fn target_size(&self) -> Option<(u32, u32)> {
        self.target_size
    }

    /**
        Size video frames to fit `bounds` and return where to draw them.
    */
    pub fn set_display_bounds(&mut self, bounds: Rect, true_size: bool) -> Option<Rect> {
        let guard = self.shared.pipeline.lock();
        let decoder = guard.as_ref()?.decoder(StreamType::Video)?;
        let params = guard
            .as_ref()?
            .source
            .streams()
            .get(decoder.stream_index())?
            .video()?
            .clone();
        drop(guard);

        let rect = fit_rect(params.width, params.height, bounds, true_size);
        self.set_target_size(Some((rect.width, rect.height)));
        Some(rect)
    }

    /**
        Run one step using the wall time since the previous call.
    */
    pub fn tick(&mut self) -> TickReport {
        let now = Instant::now();
        let elapsed = self
            .last_tick
            .map_or(Duration::ZERO, |last| now.saturating_duration_since(last));
        self.last_tick = Some(now);
        self.tick_by(elapsed)
    }

    /**
        Run one step as if `elapsed` wall time had passed.

        Streams whose last frame is behind the clock, or that were just
        seeked backward, get a new frame. When both streams have a frame
        the clock is pulled back to the slower one, then it advances by
        `elapsed` scaled by the playback speed.
    */
    pub fn tick_by(&mut self, elapsed: Duration) -> TickReport {
        let mut report = TickReport {
            current_time: self.current_time(),
            ..TickReport::default()
        };
        if self.is_paused() {
            return report;
        }

        let mut guard = self.shared.pipeline.lock();
        let Some(pipeline) = guard.as_mut() else {
            return report;
        };

        let seek_pending = self.shared.seek_pending();
        let mut now = self.shared.current_time();

        for kind in STREAMS {
            let fetched = self.fetch(pipeline, kind, now);
            match kind {
                StreamType::Video => report.video_fetched = fetched,
                StreamType::Audio => report.audio_fetched = fetched,
            }
        }
        if !report.video_fetched {
            if let Some(frame) = pipeline.unscaled.take() {
                self.present(pipeline, frame);
            }
        }

        let video_time = sync_time(pipeline.video.as_ref());
        let audio_time = sync_time(pipeline.audio.as_ref());
        if let (Some(video), Some(audio)) = (video_time, audio_time) {
            now = video.min(audio);
        }

        if !seek_pending && elapsed < self.max_tick_delta {
            now += elapsed.as_secs_f64() * self.speed;
        } else if elapsed >= self.max_tick_delta {
            debug!(elapsed_ms = elapsed.as_millis() as u64, "ignoring stalled tick");
        }

        self.shared.set_current_time(now);
        report.current_time = now;
        report
    }

    fn fetch(&self, pipeline: &mut Pipeline, kind: StreamType, now: f64) -> bool {
        let Pipeline {
            video,
            audio,
            converter,
            overflow,
            audio_frame_bytes,
            broker,
            source,
            ..
        } = &mut *pipeline;
        let slot = match kind {
            StreamType::Video => video,
            StreamType::Audio => audio,
        };
        let Some(decoder) = slot.as_mut().filter(|d| d.is_enabled() && !d.is_ended()) else {
            // Nothing will be fetched for this stream until the next seek
            self.shared.set_seeked_backward(kind, false);
            return false;
        };

        let seeked_backward = self.shared.seeked_backward(kind);
        let behind = decoder.presentation_time().is_none_or(|t| t < now);
        if !(behind || seeked_backward) {
            return false;
        }

        // The device has not collected the previous audio frame yet
        if kind == StreamType::Audio {
            if let (Some(Frame::Audio(held)), Some(converter)) =
                (decoder.take_frame(), converter.as_deref_mut())
            {
                if let Err(e) = queue_audio(converter, overflow, *audio_frame_bytes, &held) {
                    warn!(error = %e, "failed to convert audio frame");
                }
            }
        }

        let decoded = self.video_retry.run(
            || decoder.decode(broker, &mut **source).map(|_| ()),
            DecodeError::is_retryable,
        );
        match decoded {
            Ok(()) => {
                self.shared.set_seeked_backward(kind, false);
            }
            Err(RetryError::Exhausted { attempts, .. }) => {
                debug!(?kind, attempts, "no frame this tick");
                return false;
            }
            Err(RetryError::Fatal(DecodeError::EndOfStream)) => {
                info!(?kind, "stream finished");
                self.shared.set_seeked_backward(kind, false);
                return false;
            }
            Err(RetryError::Fatal(e)) => {
                warn!(?kind, error = %e, "stream stopped decoding");
                self.shared.set_seeked_backward(kind, false);
                return false;
            }
        }

        if kind == StreamType::Video {
            if let Some(Frame::Video(frame)) = decoder.take_frame() {
                self.present(pipeline, frame);
            }
        }
        true
    }

    fn present(&self, pipeline: &mut Pipeline, mut frame: VideoFrame) {
        let (width, height) = self.target_size.unwrap_or((frame.width, frame.height));
        match pipeline.rescaler.rescale(&mut frame, width, height) {
            Ok(()) => {
                pipeline.display = Some(frame);
                pipeline.unscaled = None;
            }
            Err(e) => {
                warn!(error = %e, "failed to convert video frame, keeping previous");
                pipeline.unscaled = Some(frame);
            }
        }
    }

    /**
        Jump by `offset` seconds from the current time.

        The seek is all or nothing: unless the outcome is
        [`SeekOutcome::Moved`] neither the clock nor any decoder changed.
    */
    pub fn seek(&mut self, offset: f64) -> SeekOutcome {
        let mut guard = self.shared.pipeline.lock();
        let Some(pipeline) = guard.as_mut() else {
            return SeekOutcome::Rejected;
        };

        let target = self.shared.current_time() + offset;
        if target.is_nan() || target < 0.0 {
            debug!(offset, target, "seek before start ignored");
            return SeekOutcome::NegativeTarget;
        }

        let container_duration = pipeline.source.duration();
        let mut targets = Vec::with_capacity(2);
        for decoder in [pipeline.video.as_ref(), pipeline.audio.as_ref()].into_iter().flatten() {
            let index = decoder.stream_index();
            let time_base = decoder.time_base();
            let ticks = Pts::from_seconds(target, time_base);
            let limit = pipeline
                .source
                .streams()
                .get(index)
                .and_then(|s| s.duration)
                .map(|d| d.0)
                .or_else(|| {
                    container_duration.map(|d| Pts::from_seconds(d.as_secs_f64(), time_base).0)
                });
            if limit.is_some_and(|limit| ticks.0 > limit) {
                debug!(offset, target, stream = index, "seek past end ignored");
                return SeekOutcome::BeyondDuration;
            }
            targets.push((index, ticks));
        }

        let backward = offset < 0.0;
        let mut moved = 0;
        for (index, ticks) in targets {
            match pipeline.source.seek(index, ticks, backward) {
                Ok(()) => moved += 1,
                Err(e) => warn!(stream = index, error = %e, "stream seek failed"),
            }
        }
        if moved == 0 {
            return SeekOutcome::Rejected;
        }

        self.shared.set_current_time(target);
        pipeline.broker.flush();
        for decoder in [pipeline.video.as_mut(), pipeline.audio.as_mut()].into_iter().flatten() {
            decoder.reset();
        }
        if let Some(converter) = pipeline.converter.as_mut() {
            converter.reset();
        }
        pipeline.clear_overflow();
        pipeline.unscaled = None;
        if backward {
            for kind in STREAMS {
                if pipeline.decoder(kind).is_some_and(FrameDecoder::is_enabled) {
                    self.shared.set_seeked_backward(kind, true);
                }
            }
        }

        info!(offset, target, "seeked");
        SeekOutcome::Moved
    }

    /**
        True once the clock passed the end of the media, or no stream has
        anything left to decode.
    */
    pub fn is_finished(&self) -> bool {
        let guard = self.shared.pipeline.lock();
        let Some(pipeline) = guard.as_ref() else {
            return true;
        };
        if pipeline
            .source
            .duration()
            .is_some_and(|d| self.current_time() >= d.as_secs_f64())
        {
            return true;
        }
        [pipeline.video.as_ref(), pipeline.audio.as_ref()]
            .into_iter()
            .flatten()
            .filter(|d| d.is_enabled())
            .all(FrameDecoder::is_ended)
    }
}

/// Presentation time of a stream that can still take part in syncing.
fn sync_time(decoder: Option<&FrameDecoder>) -> Option<f64> {
    decoder
        .filter(|d| d.is_enabled() && !d.is_ended())
        .and_then(FrameDecoder::presentation_time)
        .filter(|&t| t != 0.0)
}

impl std::fmt::Debug for PlaybackClock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlaybackClock")
            .field("current_time", &self.current_time())
            .field("paused", &self.is_paused())
            .field("target_size", &self.target_size)
            .finish_non_exhaustive()
    }
}
