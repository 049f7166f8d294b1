/*!
    Probing functionality for extracting media metadata.
*/

use std::path::Path;
use std::time::Duration;

use ffmpeg_next::{format::context::Input as InputContext, format::stream::Stream, media::Type};

use ffmpeg_types::{
    AudioParameters, Error, MediaDuration, MediaInfo, Result, StreamInfo,
    StreamParameters, VideoParameters,
};

use crate::convert::{
    codec_id_from_ffmpeg, open_error_from_ffmpeg, pixel_format_from_ffmpeg, rational_from_ffmpeg,
    sample_format_from_ffmpeg,
};

/**
    Probe a media file and describe its streams without reading packets.

    # Example

    ```ignore
    let info = ffmpeg_source::probe("video.mp4")?;
    print!("{info}");
    ```
*/
pub fn probe<P: AsRef<Path>>(path: P) -> Result<MediaInfo> {
    ffmpeg_next::init().map_err(|e| Error::codec(e.to_string()))?;

    let input_ctx = ffmpeg_next::format::input(&path).map_err(open_error_from_ffmpeg)?;

    extract_media_info(&input_ctx)
}

/**
    Describe every stream of an already opened input, in container order.
*/
pub(crate) fn extract_media_info(input_ctx: &InputContext) -> Result<MediaInfo> {
    let streams = input_ctx
        .streams()
        .map(|stream| stream_info(&stream))
        .collect::<Result<Vec<_>>>()?;

    // AV_NOPTS_VALUE and zero both mean "unknown" at the container level
    let duration = if input_ctx.duration() > 0 {
        Some(Duration::from_micros(input_ctx.duration() as u64))
    } else {
        streams
            .iter()
            .filter_map(|s| s.duration_seconds())
            .reduce(f64::max)
            .map(Duration::from_secs_f64)
    };

    Ok(MediaInfo {
        format_name: input_ctx.format().description().to_owned(),
        duration,
        streams,
    })
}

fn stream_info(stream: &Stream) -> Result<StreamInfo> {
    let time_base = rational_from_ffmpeg(stream.time_base())
        .filter(|tb| tb.is_valid_time_base())
        .ok_or_else(|| {
            Error::invalid_data(format!("stream {} has no usable time base", stream.index()))
        })?;

    let parameters = stream.parameters();
    let codec_id = codec_id_from_ffmpeg(parameters.id());

    // SAFETY: the parameters pointer is owned by the open input context,
    // which outlives this borrow.
    let bit_rate = unsafe { (*parameters.as_ptr()).bit_rate };
    let bitrate = (bit_rate > 0).then_some(bit_rate as u64);

    let duration = (stream.duration() > 0).then(|| MediaDuration(stream.duration()));

    let parameters = match parameters.medium() {
        Type::Video => video_parameters(stream)
            .map(StreamParameters::Video)
            .unwrap_or(StreamParameters::Other),
        Type::Audio => audio_parameters(stream)
            .map(StreamParameters::Audio)
            .unwrap_or(StreamParameters::Other),
        _ => StreamParameters::Other,
    };

    Ok(StreamInfo {
        index: stream.index(),
        codec_id,
        time_base,
        duration,
        bitrate,
        parameters,
    })
}

fn video_parameters(stream: &Stream) -> Option<VideoParameters> {
    // Dimensions and format are only reliably exposed through a decoder context
    let context = ffmpeg_next::codec::context::Context::from_parameters(stream.parameters()).ok()?;
    let decoder = context.decoder().video().ok()?;

    let frame_rate = rational_from_ffmpeg(stream.avg_frame_rate())
        .or_else(|| rational_from_ffmpeg(stream.rate()))
        .filter(|r| r.num > 0);

    Some(VideoParameters {
        width: decoder.width(),
        height: decoder.height(),
        pixel_format: pixel_format_from_ffmpeg(decoder.format()),
        frame_rate,
    })
}

fn audio_parameters(stream: &Stream) -> Option<AudioParameters> {
    let context = ffmpeg_next::codec::context::Context::from_parameters(stream.parameters()).ok()?;
    let decoder = context.decoder().audio().ok()?;

    Some(AudioParameters {
        sample_rate: decoder.rate(),
        channels: decoder.channels() as u16,
        sample_format: sample_format_from_ffmpeg(decoder.format()),
    })
}
