/*!
    Conversion utilities between ffmpeg-next types and ffmpeg-types.
*/

use ffmpeg_next::{codec::Id, format::Pixel, format::Sample};

use ffmpeg_types::{CodecId, Error, PixelFormat, Pts, Rational, SampleFormat};

/**
    Convert an ffmpeg-next rational to ours.

    Returns `None` for a zero denominator, which FFmpeg uses for "unknown".
*/
pub fn rational_from_ffmpeg(r: ffmpeg_next::Rational) -> Option<Rational> {
    (r.denominator() != 0).then(|| Rational::new(r.numerator(), r.denominator()))
}

pub fn pixel_format_from_ffmpeg(format: Pixel) -> Option<PixelFormat> {
    match format {
        Pixel::YUV420P => Some(PixelFormat::Yuv420p),
        Pixel::NV12 => Some(PixelFormat::Nv12),
        Pixel::YUV422P => Some(PixelFormat::Yuv422p),
        Pixel::YUV444P => Some(PixelFormat::Yuv444p),
        Pixel::RGB24 => Some(PixelFormat::Rgb24),
        Pixel::BGR24 => Some(PixelFormat::Bgr24),
        Pixel::RGBA => Some(PixelFormat::Rgba),
        Pixel::BGRA => Some(PixelFormat::Bgra),
        _ => None,
    }
}

pub fn pixel_format_to_ffmpeg(format: PixelFormat) -> Pixel {
    match format {
        PixelFormat::Yuv420p => Pixel::YUV420P,
        PixelFormat::Nv12 => Pixel::NV12,
        PixelFormat::Yuv422p => Pixel::YUV422P,
        PixelFormat::Yuv444p => Pixel::YUV444P,
        PixelFormat::Rgb24 => Pixel::RGB24,
        PixelFormat::Bgr24 => Pixel::BGR24,
        PixelFormat::Rgba => Pixel::RGBA,
        PixelFormat::Bgra => Pixel::BGRA,
    }
}

/**
    Map an ffmpeg-next sample format to ours, ignoring planarity.
*/
pub fn sample_format_from_ffmpeg(format: Sample) -> Option<SampleFormat> {
    match format {
        Sample::U8(_) => Some(SampleFormat::U8),
        Sample::I16(_) => Some(SampleFormat::S16),
        Sample::I32(_) => Some(SampleFormat::S32),
        Sample::F32(_) => Some(SampleFormat::F32),
        Sample::F64(_) => Some(SampleFormat::F64),
        _ => None,
    }
}

/**
    Interleaved ffmpeg-next sample format for one of ours.
*/
pub fn sample_format_to_ffmpeg(format: SampleFormat) -> Sample {
    use ffmpeg_next::format::sample::Type::Packed;

    match format {
        SampleFormat::U8 => Sample::U8(Packed),
        SampleFormat::S16 => Sample::I16(Packed),
        SampleFormat::S32 => Sample::I32(Packed),
        SampleFormat::F32 => Sample::F32(Packed),
        SampleFormat::F64 => Sample::F64(Packed),
    }
}

pub fn codec_id_from_ffmpeg(id: Id) -> CodecId {
    match id {
        Id::H264 => CodecId::H264,
        Id::HEVC => CodecId::H265,
        Id::VP8 => CodecId::Vp8,
        Id::VP9 => CodecId::Vp9,
        Id::AV1 => CodecId::Av1,
        Id::MPEG4 => CodecId::Mpeg4,
        Id::MPEG2VIDEO => CodecId::Mpeg2Video,
        Id::AAC => CodecId::Aac,
        Id::OPUS => CodecId::Opus,
        Id::MP3 => CodecId::Mp3,
        Id::VORBIS => CodecId::Vorbis,
        Id::FLAC => CodecId::Flac,
        Id::AC3 => CodecId::Ac3,
        Id::PCM_S16LE => CodecId::PcmS16Le,
        Id::PCM_F32LE => CodecId::PcmF32Le,
        other => CodecId::Other(other.name().to_owned()),
    }
}

/**
    FFmpeg reports a missing timestamp as `None`; anything else is kept.
*/
pub fn pts_from_ffmpeg(ts: Option<i64>) -> Option<Pts> {
    ts.map(Pts)
}

/**
    Map an ffmpeg-next error that happened while opening an input.
*/
pub fn open_error_from_ffmpeg(e: ffmpeg_next::Error) -> Error {
    let message = e.to_string();
    if message.contains("No such file") {
        Error::Io(std::io::Error::new(std::io::ErrorKind::NotFound, message))
    } else {
        Error::codec(message)
    }
}
