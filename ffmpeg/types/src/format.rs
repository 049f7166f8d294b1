/*!
    Pixel and sample format types.
*/

/**
    Video pixel formats.

    The software formats a decoder commonly hands out, plus the packed RGB
    formats a renderer usually asks for.
*/
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PixelFormat {
    /// Planar YUV 4:2:0, 12bpp
    Yuv420p,
    /// Semi-planar YUV 4:2:0, 12bpp
    Nv12,
    /// Planar YUV 4:2:2, 16bpp
    Yuv422p,
    /// Planar YUV 4:4:4, 24bpp
    Yuv444p,
    /// Packed RGB, 24bpp
    Rgb24,
    /// Packed BGR, 24bpp
    Bgr24,
    /// Packed RGBA, 32bpp
    Rgba,
    /// Packed BGRA, 32bpp
    Bgra,
}

impl PixelFormat {
    /**
        Returns the number of bits per pixel for this format.

        For subsampled formats this is the average over the whole frame.
    */
    pub const fn bits_per_pixel(self) -> u32 {
        match self {
            Self::Yuv420p | Self::Nv12 => 12,
            Self::Yuv422p => 16,
            Self::Yuv444p | Self::Rgb24 | Self::Bgr24 => 24,
            Self::Rgba | Self::Bgra => 32,
        }
    }

    pub const fn is_planar(self) -> bool {
        !matches!(self, Self::Rgb24 | Self::Bgr24 | Self::Rgba | Self::Bgra)
    }

    /**
        Returns the number of data planes in a frame of this format.
    */
    pub const fn plane_count(self) -> usize {
        match self {
            Self::Yuv420p | Self::Yuv422p | Self::Yuv444p => 3,
            Self::Nv12 => 2,
            Self::Rgb24 | Self::Bgr24 | Self::Rgba | Self::Bgra => 1,
        }
    }

    /**
        Returns the tightly packed size of each plane for a frame of the
        given dimensions as `(bytes_per_row, rows)`.

        Chroma planes of subsampled formats round up, so odd dimensions
        still cover every pixel.
    */
    pub fn plane_dimensions(self, plane: usize, width: u32, height: u32) -> Option<(usize, usize)> {
        let w = width as usize;
        let h = height as usize;
        let half_w = w.div_ceil(2);
        let half_h = h.div_ceil(2);
        match (self, plane) {
            (Self::Yuv420p | Self::Yuv422p | Self::Yuv444p | Self::Nv12, 0) => Some((w, h)),
            (Self::Yuv420p, 1 | 2) => Some((half_w, half_h)),
            (Self::Yuv422p, 1 | 2) => Some((half_w, h)),
            (Self::Yuv444p, 1 | 2) => Some((w, h)),
            (Self::Nv12, 1) => Some((half_w.checked_mul(2)?, half_h)),
            (Self::Rgb24 | Self::Bgr24, 0) => Some((w.checked_mul(3)?, h)),
            (Self::Rgba | Self::Bgra, 0) => Some((w.checked_mul(4)?, h)),
            _ => None,
        }
    }

    /**
        Returns the tightly packed byte size of a whole frame.

        Returns `None` for a zero dimension or if the size overflows.
    */
    pub fn frame_size(self, width: u32, height: u32) -> Option<usize> {
        if width == 0 || height == 0 {
            return None;
        }
        (0..self.plane_count()).try_fold(0usize, |total, plane| {
            let (row, rows) = self.plane_dimensions(plane, width, height)?;
            total.checked_add(row.checked_mul(rows)?)
        })
    }
}

/**
    Audio sample formats.

    Frames carry samples interleaved regardless of how the codec produced
    them, so there are no planar variants here.
*/
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SampleFormat {
    /// Unsigned 8-bit integer
    U8,
    /// Signed 16-bit integer
    S16,
    /// Signed 32-bit integer
    S32,
    /// 32-bit floating point, range [-1.0, 1.0]
    F32,
    /// 64-bit floating point
    F64,
}

impl SampleFormat {
    pub const fn bytes_per_sample(self) -> usize {
        match self {
            Self::U8 => 1,
            Self::S16 => 2,
            Self::S32 | Self::F32 => 4,
            Self::F64 => 8,
        }
    }

    pub const fn is_float(self) -> bool {
        matches!(self, Self::F32 | Self::F64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pixel_format_bits_per_pixel() {
        assert_eq!(PixelFormat::Yuv420p.bits_per_pixel(), 12);
        assert_eq!(PixelFormat::Bgra.bits_per_pixel(), 32);
        assert_eq!(PixelFormat::Rgb24.bits_per_pixel(), 24);
    }

    #[test]
    fn pixel_format_is_planar() {
        assert!(PixelFormat::Yuv420p.is_planar());
        assert!(PixelFormat::Nv12.is_planar());
        assert!(!PixelFormat::Rgba.is_planar());
    }

    #[test]
    fn frame_size_yuv420p() {
        // 640x480 luma plus two quarter-size chroma planes
        assert_eq!(
            PixelFormat::Yuv420p.frame_size(640, 480),
            Some(640 * 480 + 2 * 320 * 240)
        );
    }

    #[test]
    fn frame_size_rounds_odd_chroma_up() {
        assert_eq!(PixelFormat::Yuv420p.frame_size(3, 3), Some(9 + 2 * 4));
        assert_eq!(PixelFormat::Nv12.frame_size(3, 3), Some(9 + 4 * 2));
    }

    #[test]
    fn frame_size_packed() {
        assert_eq!(PixelFormat::Rgba.frame_size(2, 2), Some(16));
        assert_eq!(PixelFormat::Bgr24.frame_size(10, 1), Some(30));
    }

    #[test]
    fn frame_size_rejects_zero_and_overflow() {
        assert_eq!(PixelFormat::Yuv420p.frame_size(0, 480), None);
        assert_eq!(PixelFormat::Rgba.frame_size(640, 0), None);
        assert_eq!(PixelFormat::Rgba.frame_size(u32::MAX, u32::MAX), None);
    }

    #[test]
    fn sample_format_bytes_per_sample() {
        assert_eq!(SampleFormat::U8.bytes_per_sample(), 1);
        assert_eq!(SampleFormat::S16.bytes_per_sample(), 2);
        assert_eq!(SampleFormat::F32.bytes_per_sample(), 4);
        assert_eq!(SampleFormat::F64.bytes_per_sample(), 8);
        assert!(SampleFormat::F64.is_float());
        assert!(!SampleFormat::S32.is_float());
    }
}
