/*!
    Video frame scaling and pixel format conversion.
*/

use ffmpeg_next::{
    software::scaling::{context::Context as ScalerContext, flag::Flags as ScalerFlags},
    util::frame::video::Video as VideoFrameFFmpeg,
};

use ffmpeg_source::convert::pixel_format_to_ffmpeg;
use ffmpeg_types::{Error, PixelFormat, Result, VideoFrame};

/**
    Scaling algorithm for video resizing.
*/
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ScalingAlgorithm {
    /// Nearest neighbor - fastest, lowest quality.
    Nearest,
    #[default]
    Bilinear,
    Bicubic,
    /// Lanczos resampling - slowest, highest quality.
    Lanczos,
}

impl ScalingAlgorithm {
    fn to_ffmpeg_flags(self) -> ScalerFlags {
        match self {
            Self::Nearest => ScalerFlags::POINT,
            Self::Bilinear => ScalerFlags::BILINEAR,
            Self::Bicubic => ScalerFlags::BICUBIC,
            Self::Lanczos => ScalerFlags::LANCZOS,
        }
    }
}

/**
    A swscale context bound to one source geometry and one target geometry.

    Creating the context is the expensive part; callers that convert many
    frames of the same size should keep the scaler around and only build a
    new one when either side changes.
*/
pub struct VideoScaler {
    context: ScalerContext,
    src_format: PixelFormat,
    src_width: u32,
    src_height: u32,
    dst_format: PixelFormat,
    dst_width: u32,
    dst_height: u32,
    src_frame: VideoFrameFFmpeg,
    dst_frame: VideoFrameFFmpeg,
}

impl VideoScaler {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        src_format: PixelFormat,
        src_width: u32,
        src_height: u32,
        dst_format: PixelFormat,
        dst_width: u32,
        dst_height: u32,
        algorithm: ScalingAlgorithm,
    ) -> Result<Self> {
        if src_width == 0 || src_height == 0 || dst_width == 0 || dst_height == 0 {
            return Err(Error::invalid_data("scaler dimensions must be non-zero"));
        }

        let src_pixel = pixel_format_to_ffmpeg(src_format);
        let dst_pixel = pixel_format_to_ffmpeg(dst_format);

        let context = ScalerContext::get(
            src_pixel,
            src_width,
            src_height,
            dst_pixel,
            dst_width,
            dst_height,
            algorithm.to_ffmpeg_flags(),
        )
        .map_err(|e| Error::codec(format!("failed to create scaler: {e}")))?;

        Ok(Self {
            context,
            src_format,
            src_width,
            src_height,
            dst_format,
            dst_width,
            dst_height,
            src_frame: VideoFrameFFmpeg::new(src_pixel, src_width, src_height),
            dst_frame: VideoFrameFFmpeg::new(dst_pixel, dst_width, dst_height),
        })
    }

    pub fn target(&self) -> (PixelFormat, u32, u32) {
        (self.dst_format, self.dst_width, self.dst_height)
    }

    /**
        Convert `frame` and write the tightly packed result into `dst`.

        `dst` must be exactly `dst_format.frame_size(dst_width, dst_height)`
        bytes long, and the frame must match the source geometry the scaler
        was built for.
    */
    pub fn scale_into(&mut self, frame: &VideoFrame, dst: &mut [u8]) -> Result<()> {
        if frame.format != self.src_format
            || frame.width != self.src_width
            || frame.height != self.src_height
        {
            return Err(Error::invalid_data(format!(
                "frame is {:?} {}x{}, scaler expects {:?} {}x{}",
                frame.format,
                frame.width,
                frame.height,
                self.src_format,
                self.src_width,
                self.src_height
            )));
        }

        copy_planes_into_ffmpeg(&mut self.src_frame, frame)?;

        self.context
            .run(&self.src_frame, &mut self.dst_frame)
            .map_err(|e| Error::codec(format!("scaling failed: {e}")))?;

        copy_planes_from_ffmpeg(&self.dst_frame, self.dst_format, dst)
    }
}

/**
    Copy tightly packed planes into a strided FFmpeg frame.
*/
fn copy_planes_into_ffmpeg(dst: &mut VideoFrameFFmpeg, src: &VideoFrame) -> Result<()> {
    for plane in 0..src.format.plane_count() {
        let (row_bytes, rows) = src
            .format
            .plane_dimensions(plane, src.width, src.height)
            .ok_or_else(|| Error::invalid_data(format!("missing plane {plane}")))?;
        let range = src
            .plane_range(plane)
            .ok_or_else(|| Error::invalid_data(format!("source plane {plane} is truncated")))?;
        let src_plane = &src.data[range];

        let stride = dst.stride(plane);
        let dst_plane = dst.data_mut(plane);
        for (y, row) in src_plane.chunks_exact(row_bytes).take(rows).enumerate() {
            let start = y * stride;
            dst_plane
                .get_mut(start..start + row_bytes)
                .ok_or_else(|| Error::invalid_data("scaler input frame too small"))?
                .copy_from_slice(row);
        }
    }
    Ok(())
}

/**
    Copy a strided FFmpeg frame into a tightly packed buffer.
*/
fn copy_planes_from_ffmpeg(
    src: &VideoFrameFFmpeg,
    format: PixelFormat,
    dst: &mut [u8],
) -> Result<()> {
    let expected = format
        .frame_size(src.width(), src.height())
        .ok_or_else(|| Error::invalid_data("frame size overflows"))?;
    if dst.len() != expected {
        return Err(Error::invalid_data(format!(
            "destination is {} bytes, frame needs {expected}",
            dst.len()
        )));
    }

    let mut offset = 0;
    for plane in 0..format.plane_count() {
        let (row_bytes, rows) = format
            .plane_dimensions(plane, src.width(), src.height())
            .ok_or_else(|| Error::invalid_data(format!("missing plane {plane}")))?;
        let stride = src.stride(plane);
        let data = src.data(plane);

        for y in 0..rows {
            let start = y * stride;
            let row = data
                .get(start..start + row_bytes)
                .ok_or_else(|| Error::invalid_data(format!("plane {plane} is truncated")))?;
            dst[offset..offset + row_bytes].copy_from_slice(row);
            offset += row_bytes;
        }
    }
    Ok(())
}

// SAFETY: the swscale context and frames are owned exclusively by the
// scaler and never shared; moving them to another thread is sound as long
// as only one thread uses them at a time, which `&mut self` guarantees.
unsafe impl Send for VideoScaler {}

impl std::fmt::Debug for VideoScaler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VideoScaler")
            .field("src", &(self.src_format, self.src_width, self.src_height))
            .field("dst", &(self.dst_format, self.dst_width, self.dst_height))
            .finish_non_exhaustive()
    }
}
