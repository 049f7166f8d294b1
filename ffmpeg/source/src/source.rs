/*!
    Media source implementation.
*/

use std::path::Path;

use ffmpeg_next::{ffi, format::context::Input as InputContext, media::Type};
use tracing::debug;

use ffmpeg_types::{Error, MediaDuration, MediaInfo, Packet, Pts, Result, StreamInfo, StreamType};

use crate::codec_config::CodecConfig;
use crate::convert::{open_error_from_ffmpeg, pts_from_ffmpeg};
use crate::probe::extract_media_info;

/**
    An open container that produces compressed packets.

    All streams share one read cursor. [`Source::read_packet`] returns
    packets of every stream in container order; callers that decode more
    than one stream must route packets themselves.
*/
pub struct Source {
    input: InputContext,
    media_info: MediaInfo,
    best_video: Option<usize>,
    best_audio: Option<usize>,
}

impl Source {
    /**
        Open a media file and probe its streams.

        A missing file is reported as an [`Error::Io`] with
        [`std::io::ErrorKind::NotFound`]; a file that exists but cannot be
        probed is a codec or invalid data error.
    */
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        ffmpeg_next::init().map_err(|e| Error::codec(e.to_string()))?;

        let input = ffmpeg_next::format::input(&path).map_err(open_error_from_ffmpeg)?;
        let media_info = extract_media_info(&input)?;

        let best_video = input.streams().best(Type::Video).map(|s| s.index());
        let best_audio = input.streams().best(Type::Audio).map(|s| s.index());

        debug!(
            path = %path.as_ref().display(),
            streams = media_info.streams.len(),
            ?best_video,
            ?best_audio,
            "opened source"
        );

        Ok(Self {
            input,
            media_info,
            best_video,
            best_audio,
        })
    }

    pub fn media_info(&self) -> &MediaInfo {
        &self.media_info
    }

    pub fn streams(&self) -> &[StreamInfo] {
        &self.media_info.streams
    }

    /**
        Index of the stream FFmpeg considers the best of the given kind.
    */
    pub fn best_stream(&self, kind: StreamType) -> Option<usize> {
        match kind {
            StreamType::Video => self.best_video,
            StreamType::Audio => self.best_audio,
        }
    }

    /**
        Codec configuration for a stream, used to build its decoder.
    */
    pub fn codec_config(&self, stream_index: usize) -> Option<CodecConfig> {
        let info = self.media_info.streams.get(stream_index)?;
        let stream = self.input.stream(stream_index)?;
        Some(CodecConfig::new(stream.parameters(), info.time_base))
    }

    /**
        Read the next packet from the container, whatever stream it
        belongs to.

        Returns `Ok(None)` at end of input. Read failures other than end of
        input are returned as [`Error::Io`] so callers can tell the two apart.
    */
    pub fn read_packet(&mut self) -> Result<Option<Packet>> {
        let mut ffmpeg_packet = ffmpeg_next::Packet::empty();
        match ffmpeg_packet.read(&mut self.input) {
            Ok(()) => {}
            Err(ffmpeg_next::Error::Eof) => return Ok(None),
            Err(e) => return Err(Error::Io(std::io::Error::other(e.to_string()))),
        }

        let stream_index = ffmpeg_packet.stream();
        let time_base = self
            .media_info
            .streams
            .get(stream_index)
            .map(|s| s.time_base)
            .ok_or_else(|| {
                Error::invalid_data(format!("packet for unknown stream {stream_index}"))
            })?;

        let data = ffmpeg_packet.data().map(<[u8]>::to_vec).unwrap_or_default();

        Ok(Some(
            Packet::new(data, stream_index, time_base)
                .with_timestamps(
                    pts_from_ffmpeg(ffmpeg_packet.pts()),
                    pts_from_ffmpeg(ffmpeg_packet.dts()),
                )
                .with_duration(MediaDuration(ffmpeg_packet.duration()))
                .with_keyframe(ffmpeg_packet.is_key()),
        ))
    }

    /**
        Seek the shared cursor using one stream's timestamp scale.

        With `backward` set the cursor lands on a keyframe at or before
        `timestamp`, otherwise on the nearest keyframe FFmpeg finds at or
        after it. Decoders fed from this source must be reset afterwards.
    */
    pub fn seek_stream(&mut self, stream_index: usize, timestamp: Pts, backward: bool) -> Result<()> {
        if stream_index >= self.media_info.streams.len() {
            return Err(Error::invalid_data(format!(
                "cannot seek unknown stream {stream_index}"
            )));
        }
        let index = i32::try_from(stream_index)
            .map_err(|_| Error::invalid_data("stream index out of range"))?;
        let flags = if backward {
            ffi::AVSEEK_FLAG_BACKWARD as i32
        } else {
            0
        };

        // SAFETY: the format context is owned by `self.input` and stays
        // valid for the duration of the call.
        let ret = unsafe { ffi::av_seek_frame(self.input.as_mut_ptr(), index, timestamp.0, flags) };
        if ret < 0 {
            return Err(Error::codec(format!(
                "seek on stream {stream_index} to {} failed: {}",
                timestamp.0,
                ffmpeg_next::Error::from(ret)
            )));
        }

        debug!(stream_index, timestamp = timestamp.0, backward, "seeked source");
        Ok(())
    }
}

// SAFETY: the format context is owned by the source and every read or seek
// goes through `&mut self`.
unsafe impl Send for Source {}

impl std::fmt::Debug for Source {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Source")
            .field("format", &self.media_info.format_name)
            .field("streams", &self.media_info.streams.len())
            .finish_non_exhaustive()
    }
}
