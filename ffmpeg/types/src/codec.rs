/*!
    Codec identification.
*/

use std::fmt;

/**
    Codec identifiers.

    Only the codecs a player commonly meets are named. Anything else
    carries the backend's own codec name so it can still be reported.
*/
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum CodecId {
    H264,
    H265,
    Vp8,
    Vp9,
    Av1,
    Mpeg4,
    Mpeg2Video,
    Aac,
    Opus,
    Mp3,
    Vorbis,
    Flac,
    Ac3,
    PcmS16Le,
    PcmF32Le,
    Other(String),
}

impl CodecId {
    pub fn is_video(&self) -> bool {
        matches!(
            self,
            Self::H264
                | Self::H265
                | Self::Vp8
                | Self::Vp9
                | Self::Av1
                | Self::Mpeg4
                | Self::Mpeg2Video
        )
    }

    pub fn is_audio(&self) -> bool {
        matches!(
            self,
            Self::Aac
                | Self::Opus
                | Self::Mp3
                | Self::Vorbis
                | Self::Flac
                | Self::Ac3
                | Self::PcmS16Le
                | Self::PcmF32Le
        )
    }
}

impl fmt::Display for CodecId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::H264 => "h264",
            Self::H265 => "hevc",
            Self::Vp8 => "vp8",
            Self::Vp9 => "vp9",
            Self::Av1 => "av1",
            Self::Mpeg4 => "mpeg4",
            Self::Mpeg2Video => "mpeg2video",
            Self::Aac => "aac",
            Self::Opus => "opus",
            Self::Mp3 => "mp3",
            Self::Vorbis => "vorbis",
            Self::Flac => "flac",
            Self::Ac3 => "ac3",
            Self::PcmS16Le => "pcm_s16le",
            Self::PcmF32Le => "pcm_f32le",
            Self::Other(name) => name,
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codec_kinds() {
        assert!(CodecId::H264.is_video());
        assert!(!CodecId::H264.is_audio());
        assert!(CodecId::Opus.is_audio());
        let other = CodecId::Other("theora".into());
        assert!(!other.is_video());
        assert!(!other.is_audio());
    }

    #[test]
    fn display_names() {
        assert_eq!(CodecId::H265.to_string(), "hevc");
        assert_eq!(CodecId::Other("theora".into()).to_string(), "theora");
    }
}
