/*!
    Error types for the playback core.
*/

use std::path::PathBuf;

use thiserror::Error;

/**
    Why a media session could not be opened.
*/
#[derive(Debug, Error)]
pub enum OpenError {
    #[error("media not found: {}", path.display())]
    NotFound { path: PathBuf },
    #[error("unable to read media: {reason}")]
    Unreadable { reason: String },
    #[error("no decoder available for streams {streams:?}")]
    CodecUnsupported { streams: Vec<usize> },
}

impl OpenError {
    pub(crate) fn from_backend(path: &std::path::Path, err: ffmpeg_types::Error) -> Self {
        if err.is_not_found() {
            Self::NotFound {
                path: path.to_path_buf(),
            }
        } else {
            Self::Unreadable {
                reason: err.to_string(),
            }
        }
    }
}

/**
    Outcome of a failed attempt to decode the next frame of a stream.
*/
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// No packet was available right now. Retrying later may succeed.
    #[error("no input available")]
    NoInput,
    /// The stream is exhausted until the next seek.
    #[error("end of stream")]
    EndOfStream,
    /// The codec rejected the stream's data. The stream stays disabled.
    #[error("corrupt stream data")]
    Corrupt,
    /// The codec failed for another reason. The stream stays disabled.
    #[error("unknown decoder failure")]
    Unknown,
}

impl DecodeError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::NoInput)
    }

    /**
        Returns true for errors that disable the stream for the rest of the
        session.
    */
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Corrupt | Self::Unknown)
    }
}

/**
    Why a video frame could not be rescaled. Both are recoverable: the
    previous frame stays on screen and the conversion is retried next tick.
*/
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RescaleError {
    #[error("failed to create conversion context: {0}")]
    ContextError(String),
    #[error("failed to allocate a {width}x{height} output frame")]
    AllocError { width: u32, height: u32 },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to access config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid config file: {0}")]
    Parse(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_errors_map_to_open_errors() {
        let path = std::path::Path::new("/media/clip.mp4");
        let missing: ffmpeg_types::Error =
            std::io::Error::new(std::io::ErrorKind::NotFound, "gone").into();
        assert!(matches!(
            OpenError::from_backend(path, missing),
            OpenError::NotFound { .. }
        ));
        assert!(matches!(
            OpenError::from_backend(path, ffmpeg_types::Error::invalid_data("moov atom missing")),
            OpenError::Unreadable { .. }
        ));
    }

    #[test]
    fn decode_error_classes() {
        assert!(DecodeError::NoInput.is_retryable());
        assert!(!DecodeError::EndOfStream.is_retryable());
        assert!(DecodeError::Corrupt.is_fatal());
        assert!(DecodeError::Unknown.is_fatal());
        assert!(!DecodeError::EndOfStream.is_fatal());
    }
}
