/*!
    Error types for the ffmpeg crate ecosystem.
*/

use thiserror::Error;

/**
    Error type shared by every backend crate.

    Decoders report their send/receive status through this type as well:
    [`Error::Again`] means the codec wants more input (or cannot take more
    input until frames are drained), [`Error::Eof`] means it has been fully
    drained and [`Error::InvalidData`] means the compressed data was rejected.
*/
#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("codec error: {message}")]
    Codec { message: String },
    #[error("invalid data: {message}")]
    InvalidData { message: String },
    #[error("unsupported format: {message}")]
    UnsupportedFormat { message: String },
    #[error("resource temporarily unavailable")]
    Again,
    #[error("end of stream")]
    Eof,
}

impl Error {
    pub fn codec(message: impl Into<String>) -> Self {
        Self::Codec {
            message: message.into(),
        }
    }

    pub fn invalid_data(message: impl Into<String>) -> Self {
        Self::InvalidData {
            message: message.into(),
        }
    }

    pub fn unsupported_format(message: impl Into<String>) -> Self {
        Self::UnsupportedFormat {
            message: message.into(),
        }
    }

    pub fn is_eof(&self) -> bool {
        matches!(self, Self::Eof)
    }

    pub fn is_again(&self) -> bool {
        matches!(self, Self::Again)
    }

    /**
        Returns true if this error means the input could not be found at all,
        as opposed to being found but unreadable.
    */
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Io(e) if e.kind() == std::io::ErrorKind::NotFound)
    }
}

pub type Result<T> = std::result::Result<T, Error>;
