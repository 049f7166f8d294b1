/*!
    Shared types for the ffmpeg crate ecosystem.

    The types here cross crate boundaries between the source, decode and
    transform crates and the playback core. Nothing in this crate links
    against FFmpeg, so the playback core can be built and tested against
    scripted backends without the native libraries.

    # Core Types

    - [`Rational`] - Time bases and frame rates
    - [`Pts`] and [`MediaDuration`] - Timestamps in time base units
    - [`Packet`] - Compressed data for one container stream
    - [`VideoFrame`], [`AudioFrame`] and [`Frame`] - Decoded data

    # Stream Information

    - [`StreamInfo`] - One entry per container stream
    - [`MediaInfo`] - Container summary
*/

mod codec;
mod error;
mod format;
mod frame;
mod packet;
mod rational;
mod stream;
mod timestamp;

pub use codec::CodecId;
pub use error::{Error, Result};
pub use format::{PixelFormat, SampleFormat};
pub use frame::{AudioFrame, Frame, VideoFrame};
pub use packet::{Packet, StreamType};
pub use rational::Rational;
pub use stream::{AudioParameters, MediaInfo, StreamInfo, StreamParameters, VideoParameters};
pub use timestamp::{MediaDuration, Pts};
