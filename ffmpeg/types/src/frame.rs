/*!
    Decoded frame types.
*/

use crate::{PixelFormat, Pts, Rational, SampleFormat};

/**
    A decoded video frame.

    Planes are stored tightly packed one after another in `data`, in the
    order and sizes given by [`PixelFormat::plane_dimensions`].
*/
#[derive(Clone, Debug)]
pub struct VideoFrame {
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub format: PixelFormat,
    pub pts: Option<Pts>,
    pub dts: Option<Pts>,
    pub time_base: Rational,
}

impl VideoFrame {
    pub fn new(
        data: Vec<u8>,
        width: u32,
        height: u32,
        format: PixelFormat,
        time_base: Rational,
    ) -> Self {
        Self {
            data,
            width,
            height,
            format,
            pts: None,
            dts: None,
            time_base,
        }
    }

    pub fn with_timestamps(mut self, pts: Option<Pts>, dts: Option<Pts>) -> Self {
        self.pts = pts;
        self.dts = dts;
        self
    }

    /**
        Returns the byte range of plane `index` within `data`.
    */
    pub fn plane_range(&self, index: usize) -> Option<std::ops::Range<usize>> {
        let mut offset = 0usize;
        for plane in 0..self.format.plane_count() {
            let (row, rows) = self.format.plane_dimensions(plane, self.width, self.height)?;
            let len = row.checked_mul(rows)?;
            if plane == index {
                let end = offset.checked_add(len)?;
                return (end <= self.data.len()).then_some(offset..end);
            }
            offset = offset.checked_add(len)?;
        }
        None
    }
}

/**
    A decoded audio frame with interleaved samples.
*/
#[derive(Clone, Debug)]
pub struct AudioFrame {
    /**
        Sample data, interleaved by channel.

        For stereo S16: [L0, R0, L1, R1, ...] with two bytes per sample.
    */
    pub data: Vec<u8>,
    /// Samples per channel.
    pub samples: usize,
    pub sample_rate: u32,
    pub channels: u16,
    pub format: SampleFormat,
    pub pts: Option<Pts>,
    pub dts: Option<Pts>,
    pub time_base: Rational,
}

impl AudioFrame {
    pub fn new(
        data: Vec<u8>,
        samples: usize,
        sample_rate: u32,
        channels: u16,
        format: SampleFormat,
        time_base: Rational,
    ) -> Self {
        Self {
            data,
            samples,
            sample_rate,
            channels,
            format,
            pts: None,
            dts: None,
            time_base,
        }
    }

    pub fn with_timestamps(mut self, pts: Option<Pts>, dts: Option<Pts>) -> Self {
        self.pts = pts;
        self.dts = dts;
        self
    }

    /**
        Returns the expected data length in bytes.
    */
    pub fn expected_data_len(&self) -> usize {
        self.samples * self.channels as usize * self.format.bytes_per_sample()
    }
}

/**
    A decoded frame from either kind of stream.
*/
#[derive(Clone, Debug)]
pub enum Frame {
    Video(VideoFrame),
    Audio(AudioFrame),
}

impl Frame {
    pub fn pts(&self) -> Option<Pts> {
        match self {
            Self::Video(f) => f.pts,
            Self::Audio(f) => f.pts,
        }
    }

    pub fn dts(&self) -> Option<Pts> {
        match self {
            Self::Video(f) => f.dts,
            Self::Audio(f) => f.dts,
        }
    }

    pub fn time_base(&self) -> Rational {
        match self {
            Self::Video(f) => f.time_base,
            Self::Audio(f) => f.time_base,
        }
    }

    /**
        Presentation time in seconds, or `None` for frames without a PTS.
    */
    pub fn presentation_seconds(&self) -> Option<f64> {
        self.pts().map(|pts| pts.to_seconds(self.time_base()))
    }

    pub fn as_video(&self) -> Option<&VideoFrame> {
        match self {
            Self::Video(f) => Some(f),
            Self::Audio(_) => None,
        }
    }

    pub fn as_audio(&self) -> Option<&AudioFrame> {
        match self {
            Self::Audio(f) => Some(f),
            Self::Video(_) => None,
        }
    }
}

static_assertions::assert_impl_all!(VideoFrame: Send, Sync);
static_assertions::assert_impl_all!(AudioFrame: Send, Sync);
static_assertions::assert_impl_all!(Frame: Send, Sync);
