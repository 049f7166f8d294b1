/*!
    Stream information types.
*/

use std::fmt;
use std::time::Duration;

use crate::{CodecId, MediaDuration, PixelFormat, Rational, SampleFormat, StreamType};

/**
    Codec parameters of a video stream.
*/
#[derive(Clone, Debug, PartialEq)]
pub struct VideoParameters {
    pub width: u32,
    pub height: u32,
    /// `None` when the decoder would produce a format this ecosystem
    /// does not name; such frames are rejected at decode time.
    pub pixel_format: Option<PixelFormat>,
    pub frame_rate: Option<Rational>,
}

impl VideoParameters {
    pub fn aspect_ratio(&self) -> f64 {
        self.width as f64 / self.height as f64
    }
}

/**
    Codec parameters of an audio stream.
*/
#[derive(Clone, Debug, PartialEq)]
pub struct AudioParameters {
    pub sample_rate: u32,
    pub channels: u16,
    pub sample_format: Option<SampleFormat>,
}

/**
    Kind-specific stream parameters.
*/
#[derive(Clone, Debug, PartialEq)]
pub enum StreamParameters {
    Video(VideoParameters),
    Audio(AudioParameters),
    /// Subtitle, data and attachment streams.
    Other,
}

/**
    Information about one stream of a container.
*/
#[derive(Clone, Debug, PartialEq)]
pub struct StreamInfo {
    /// Index of the stream within the container.
    pub index: usize,
    pub codec_id: CodecId,
    pub time_base: Rational,
    /// Duration in `time_base` ticks, when the container records one.
    pub duration: Option<MediaDuration>,
    /// Bitrate in bits per second (if known).
    pub bitrate: Option<u64>,
    pub parameters: StreamParameters,
}

impl StreamInfo {
    pub fn stream_type(&self) -> Option<StreamType> {
        match self.parameters {
            StreamParameters::Video(_) => Some(StreamType::Video),
            StreamParameters::Audio(_) => Some(StreamType::Audio),
            StreamParameters::Other => None,
        }
    }

    pub fn video(&self) -> Option<&VideoParameters> {
        match &self.parameters {
            StreamParameters::Video(v) => Some(v),
            _ => None,
        }
    }

    pub fn audio(&self) -> Option<&AudioParameters> {
        match &self.parameters {
            StreamParameters::Audio(a) => Some(a),
            _ => None,
        }
    }

    pub fn duration_seconds(&self) -> Option<f64> {
        self.duration.map(|d| d.to_seconds(self.time_base))
    }
}

/**
    Summary of an opened container.
*/
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MediaInfo {
    /// Long name of the container format, e.g. "QuickTime / MOV".
    pub format_name: String,
    /// Container duration (may be unavailable).
    pub duration: Option<Duration>,
    pub streams: Vec<StreamInfo>,
}

impl MediaInfo {
    pub fn has_video(&self) -> bool {
        self.streams.iter().any(|s| s.video().is_some())
    }

    pub fn has_audio(&self) -> bool {
        self.streams.iter().any(|s| s.audio().is_some())
    }
}

impl fmt::Display for MediaInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Format: {}", self.format_name)?;
        match self.duration {
            Some(d) => writeln!(f, "Duration: {} secs", d.as_secs())?,
            None => writeln!(f, "Duration: unknown")?,
        }
        for stream in &self.streams {
            match &stream.parameters {
                StreamParameters::Video(v) => write!(
                    f,
                    "Stream #{}: video {} {}x{}",
                    stream.index, stream.codec_id, v.width, v.height
                )?,
                StreamParameters::Audio(a) => write!(
                    f,
                    "Stream #{}: audio {} {} channels, {} Hz",
                    stream.index, stream.codec_id, a.channels, a.sample_rate
                )?,
                StreamParameters::Other => {
                    write!(f, "Stream #{}: other {}", stream.index, stream.codec_id)?
                }
            }
            match stream.bitrate {
                Some(bitrate) => writeln!(f, ", {bitrate} b/s")?,
                None => writeln!(f)?,
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn video_stream() -> StreamInfo {
        StreamInfo {
            index: 0,
            codec_id: CodecId::H264,
            time_base: Rational::new(1, 30),
            duration: Some(MediaDuration(300)),
            bitrate: Some(800_000),
            parameters: StreamParameters::Video(VideoParameters {
                width: 1920,
                height: 1080,
                pixel_format: Some(PixelFormat::Yuv420p),
                frame_rate: Some(Rational::new(30, 1)),
            }),
        }
    }

    fn audio_stream() -> StreamInfo {
        StreamInfo {
            index: 1,
            codec_id: CodecId::Aac,
            time_base: Rational::new(1, 44100),
            duration: None,
            bitrate: None,
            parameters: StreamParameters::Audio(AudioParameters {
                sample_rate: 44100,
                channels: 2,
                sample_format: Some(SampleFormat::F32),
            }),
        }
    }

    #[test]
    fn stream_kind_accessors() {
        let video = video_stream();
        assert_eq!(video.stream_type(), Some(StreamType::Video));
        assert!(video.audio().is_none());
        assert_eq!(video.duration_seconds(), Some(10.0));
        let aspect = video.video().unwrap().aspect_ratio();
        assert!((aspect - 16.0 / 9.0).abs() < 0.01);
        assert_eq!(audio_stream().duration_seconds(), None);
    }

    #[test]
    fn media_info_presence() {
        let mut info = MediaInfo::default();
        assert!(!info.has_video());
        info.streams.push(audio_stream());
        assert!(info.has_audio());
        assert!(!info.has_video());
    }

    #[test]
    fn display_summary() {
        let info = MediaInfo {
            format_name: "QuickTime / MOV".into(),
            duration: Some(Duration::from_secs(10)),
            streams: vec![video_stream(), audio_stream()],
        };
        let text = info.to_string();
        assert!(text.contains("Duration: 10 secs"));
        assert!(text.contains("Stream #0: video h264 1920x1080, 800000 b/s"));
        assert!(text.contains("Stream #1: audio aac 2 channels, 44100 Hz\n"));
    }
}
