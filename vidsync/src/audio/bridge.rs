/*!
    Pull-driven feed from the decode pipeline to the audio device.
*/

use std::sync::Arc;

use ffmpeg_types::Frame;
use ringbuf::traits::Consumer;
use tracing::{debug, warn};

use crate::backend::AudioOutputSpec;
use crate::error::DecodeError;
use crate::pipeline::{Pipeline, Shared, queue_audio};
use crate::retry::{RetryError, RetryPolicy};

/// Frames in a row that may convert to nothing before a pull gives up.
const MAX_EMPTY_FRAMES: usize = 8;

/**
    Handle given to the audio device callback.

    Each call to [`AudioRingBridge::fill`] writes exactly as many bytes as
    the device asked for, decoding more audio on demand and parking any
    surplus in the overflow buffer for the next call. Cloning is cheap and
    every clone feeds the same session.
*/
#[derive(Clone)]
pub struct AudioRingBridge {
    shared: Arc<Shared>,
    spec: AudioOutputSpec,
    policy: RetryPolicy,
}

impl AudioRingBridge {
    pub(crate) fn new(shared: Arc<Shared>, spec: AudioOutputSpec, policy: RetryPolicy) -> Self {
        Self {
            shared,
            spec,
            policy,
        }
    }

    /// Output format the device must be opened with.
    pub fn spec(&self) -> AudioOutputSpec {
        self.spec
    }

    /**
        Fill `out` with interleaved S16 samples.

        Whatever cannot be filled with audio is silence. Returns how many
        bytes came from the stream.
    */
    pub fn fill(&self, out: &mut [u8]) -> usize {
        out.fill(0);
        if out.is_empty() || self.shared.is_paused() {
            return 0;
        }

        let mut guard = self.shared.pipeline.lock();
        let Some(pipeline) = guard.as_mut() else {
            return 0;
        };
        let Some(audio_time) = pipeline.audio.as_ref().map(|a| a.presentation_time()) else {
            return 0;
        };
        if audio_time.is_some_and(|t| t > self.shared.current_time()) {
            return 0;
        }

        self.fill_from(pipeline, out)
    }

    fn fill_from(&self, pipeline: &mut Pipeline, out: &mut [u8]) -> usize {
        let Pipeline {
            audio,
            converter,
            overflow,
            audio_frame_bytes,
            broker,
            source,
            ..
        } = pipeline;
        let (Some(decoder), Some(converter)) = (audio.as_mut(), converter.as_deref_mut()) else {
            return 0;
        };

        let mut written = 0;
        let mut empty_frames = 0;
        loop {
            written += overflow.pop_slice(&mut out[written..]);
            if written == out.len() {
                break;
            }

            let frame = match decoder.take_frame() {
                Some(frame) => frame,
                None => {
                    let decoded = self.policy.run(
                        || decoder.decode(broker, &mut **source).map(|_| ()),
                        DecodeError::is_retryable,
                    );
                    match decoded {
                        Ok(()) => match decoder.take_frame() {
                            Some(frame) => frame,
                            None => break,
                        },
                        Err(RetryError::Exhausted { attempts, .. }) => {
                            debug!(attempts, "no audio available for device");
                            break;
                        }
                        Err(RetryError::Fatal(e)) => {
                            debug!(error = %e, "audio stream stopped");
                            break;
                        }
                    }
                }
            };
            let Frame::Audio(frame) = frame else {
                break;
            };

            let queued = match queue_audio(converter, overflow, *audio_frame_bytes, &frame) {
                Ok(queued) => queued,
                Err(e) => {
                    warn!(error = %e, "failed to convert audio frame");
                    break;
                }
            };
            if queued.converted == 0 {
                empty_frames += 1;
                if empty_frames >= MAX_EMPTY_FRAMES {
                    break;
                }
                continue;
            }
            empty_frames = 0;
            if queued.kept == 0 {
                break;
            }
        }
        written
    }
}

impl std::fmt::Debug for AudioRingBridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AudioRingBridge")
            .field("spec", &self.spec)
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

static_assertions::assert_impl_all!(AudioRingBridge: Send, Sync, Clone);

#[cfg(test)]
mod tests {
    use crate::config::PlaybackConfig;
    use crate::session::MediaSession;
    use crate::test_support::{SAMPLE_VALUE, SAMPLES_PER_PACKET, ScriptedMedia, TestBackend};

    const PACKET_BYTES: usize = SAMPLES_PER_PACKET * 4;

    fn open(media: ScriptedMedia, config: PlaybackConfig) -> MediaSession {
        MediaSession::open_with(&TestBackend::new(media), "clip.mp4", config).unwrap()
    }

    fn samples(bytes: &[u8]) -> Vec<i16> {
        bytes
            .chunks_exact(2)
            .map(bytemuck::pod_read_unaligned)
            .collect()
    }

    #[test]
    fn fills_whole_request_across_frames() {
        let session = open(ScriptedMedia::av(), PlaybackConfig::default());
        let bridge = session.audio_bridge().unwrap();

        let mut first = vec![0u8; 4096];
        assert_eq!(bridge.fill(&mut first), 4096);
        assert!(samples(&first).iter().all(|&s| s == SAMPLE_VALUE));

        // The rest of the first packet comes out of the overflow buffer
        let mut second = vec![0u8; PACKET_BYTES];
        assert_eq!(bridge.fill(&mut second), PACKET_BYTES);
        assert!(samples(&second).iter().all(|&s| s == SAMPLE_VALUE));
    }

    #[test]
    fn any_length_is_filled_exactly() {
        let session = open(ScriptedMedia::av(), PlaybackConfig::default());
        let bridge = session.audio_bridge().unwrap();

        for n in [0usize, 1, 3, 64, 4097] {
            let mut out = vec![0xAAu8; n];
            let produced = bridge.fill(&mut out);
            assert_eq!(out.len(), n);
            assert!(produced <= n);
            assert!(out[produced..].iter().all(|&b| b == 0));
        }
    }

    #[test]
    fn audio_ahead_of_clock_is_silent() {
        let session = open(ScriptedMedia::av(), PlaybackConfig::default());
        let bridge = session.audio_bridge().unwrap();

        let mut out = vec![0u8; PACKET_BYTES * 3];
        assert_eq!(bridge.fill(&mut out), out.len());

        // The stream is now a few frames past a clock still at zero
        let mut out = vec![0xAAu8; 256];
        assert_eq!(bridge.fill(&mut out), 0);
        assert!(out.iter().all(|&b| b == 0));
    }

    #[test]
    fn paused_is_silent() {
        let session = open(ScriptedMedia::av(), PlaybackConfig::default());
        let bridge = session.audio_bridge().unwrap();
        session.pause();

        let mut out = vec![0xAAu8; 512];
        assert_eq!(bridge.fill(&mut out), 0);
        assert!(out.iter().all(|&b| b == 0));
    }

    #[test]
    fn end_of_stream_leaves_silence() {
        let session = open(ScriptedMedia::audio_only().with_packets(2), PlaybackConfig::default());
        let bridge = session.audio_bridge().unwrap();

        let mut out = vec![0xAAu8; PACKET_BYTES * 4];
        assert_eq!(bridge.fill(&mut out), PACKET_BYTES * 2);
        assert!(out[PACKET_BYTES * 2..].iter().all(|&b| b == 0));
    }

    #[test]
    fn small_overflow_truncates_frames() {
        let config = PlaybackConfig {
            overflow_capacity: 1000,
            ..PlaybackConfig::default()
        };
        let session = open(ScriptedMedia::av(), config);
        let bridge = session.audio_bridge().unwrap();

        let mut out = vec![0u8; 4000];
        assert_eq!(bridge.fill(&mut out), 4000);
    }

    #[test]
    fn device_thread_runs_alongside_ticks() {
        let mut session = open(ScriptedMedia::av(), PlaybackConfig::default());
        let bridge = session.audio_bridge().unwrap();

        std::thread::scope(|scope| {
            scope.spawn(move || {
                let mut out = vec![0u8; 1024];
                for _ in 0..200 {
                    bridge.fill(&mut out);
                }
            });
            for _ in 0..300 {
                session.tick_by(std::time::Duration::from_secs_f64(1.0 / 30.0));
            }
        });

        assert!(session.current_time() > 9.0);
    }
}
