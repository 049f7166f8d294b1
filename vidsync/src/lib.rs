/*!
    Demux, decode and A/V synchronization for one playback session.

    A [`MediaSession`] reads one container through a single cursor and
    shares its packets between a video and an audio [`FrameDecoder`]
    with a [`PacketBroker`]. The [`PlaybackClock`] inside the session
    decides on every render tick which stream needs a new frame, converts
    video frames with the [`FrameRescaler`] and handles seeking. The audio
    device pulls samples from its own thread through an [`AudioRingBridge`].

    # Example

    ```ignore
    use vidsync::{MediaSession, PlaybackConfig};

    let mut session = MediaSession::open("video.mp4", PlaybackConfig::load())?;
    let _output = vidsync::AudioOutput::open(session.audio_bridge().unwrap())?;

    while !session.is_finished() {
        session.tick();
        session.with_video_frame(|frame| {
            // draw frame
        });
    }
    ```

    # Features

    - `ffmpeg` (default) - [`FfmpegBackend`] and [`MediaSession::open`]
    - `output` - [`AudioOutput`], playback on the default cpal device
*/

mod audio;
mod backend;
mod broker;
mod clock;
mod config;
mod decoder;
mod error;
#[cfg(feature = "ffmpeg")]
mod ffmpeg;
mod pipeline;
mod rescale;
mod retry;
mod session;

#[cfg(test)]
mod test_support;

pub use audio::{AudioRingBridge, PcmConverter};
#[cfg(feature = "output")]
pub use audio::{AudioError, AudioOutput};
pub use backend::{
    AudioConverter, AudioOutputSpec, MediaBackend, PacketSource, RescaleKey, ScaleBackend,
    ScaleContext, StreamDecoder,
};
pub use broker::{NoPacket, PacketBroker};
pub use clock::{PlaybackClock, SeekOutcome, TickReport};
pub use config::{OutputPixelFormat, PlaybackConfig};
pub use decoder::{DecoderState, FrameDecoder};
pub use error::{ConfigError, DecodeError, OpenError, RescaleError};
#[cfg(feature = "ffmpeg")]
pub use ffmpeg::FfmpegBackend;
pub use rescale::{FrameRescaler, Rect, fit_rect};
pub use retry::{RetryError, RetryPolicy};
pub use session::MediaSession;

pub use ffmpeg_types::{AudioFrame, Frame, MediaInfo, Packet, PixelFormat, StreamInfo, StreamType, VideoFrame};
