/*!
    Media decoding for the ffmpeg crate ecosystem.

    Decoders follow FFmpeg's send/receive model one call at a time, so the
    caller decides when to feed packets and when to pull frames. Codec
    status comes back as [`Error`] values:

    - [`Error::Again`] - send more input (from `receive_frame`), or drain
      frames before sending more (from `send_packet`)
    - [`Error::Eof`] - the decoder has been fully drained
    - [`Error::InvalidData`] - the packet was rejected as corrupt

    # Example

    ```ignore
    use ffmpeg_decode::{DecoderConfig, VideoDecoder};

    let mut source = ffmpeg_source::Source::open("video.mp4")?;
    let index = source.best_stream(StreamType::Video).unwrap();
    let mut decoder = VideoDecoder::new(source.codec_config(index).unwrap(), DecoderConfig::default())?;

    while let Some(packet) = source.read_packet()? {
        if packet.stream_index != index {
            continue;
        }
        decoder.send_packet(&packet)?;
        while let Ok(frame) = decoder.receive_frame() {
            // present frame
        }
    }
    ```
*/

pub use ffmpeg_source::CodecConfig;
pub use ffmpeg_types::{AudioFrame, Error, Packet, Result, VideoFrame};

mod audio;
mod config;
mod status;
mod video;

pub use audio::AudioDecoder;
pub use config::DecoderConfig;
pub use video::VideoDecoder;
