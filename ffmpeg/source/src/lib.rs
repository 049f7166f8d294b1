/*!
    Media source and demuxing for the ffmpeg crate ecosystem.

    Opens a container file, describes its streams and reads compressed
    packets from its single read cursor, in container order, for every
    stream. Deciding which consumer a packet belongs to is left to the
    caller.
*/

mod codec_config;
pub mod convert;
mod probe;
mod source;

pub use codec_config::CodecConfig;
pub use probe::probe;
pub use source::Source;

pub use ffmpeg_types::{Error, MediaInfo, Packet, Result, StreamInfo, StreamType};
