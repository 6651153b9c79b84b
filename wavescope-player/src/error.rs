//! Error types for wavescope-player
//!
//! Defines module-specific error types using thiserror for clear error
//! propagation.

use thiserror::Error;

/// Main error type for wavescope-player
#[derive(Error, Debug)]
pub enum Error {
    /// Source uses an unsupported channel count, sample width or encoding
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// File open/read/seek errors
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Audio output device errors
    #[error("Audio device error: {0}")]
    Device(String),
}

impl From<hound::Error> for Error {
    fn from(err: hound::Error) -> Self {
        match err {
            hound::Error::IoError(io) => Error::Io(io),
            // A container hound cannot parse is not a supported PCM WAV
            other => Error::UnsupportedFormat(other.to_string()),
        }
    }
}

/// Convenience Result type using wavescope-player Error
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: Error = io.into();
        assert!(matches!(err, Error::Io(_)));
        assert!(err.to_string().contains("File I/O error"));
    }

    #[test]
    fn test_hound_format_error_maps_to_unsupported() {
        let err: Error = hound::Error::FormatError("no RIFF tag found").into();
        assert!(matches!(err, Error::UnsupportedFormat(_)));
    }

    #[test]
    fn test_hound_io_error_maps_to_io() {
        let io = std::io::Error::new(std::io::ErrorKind::UnexpectedEof, "eof");
        let err: Error = hound::Error::IoError(io).into();
        assert!(matches!(err, Error::Io(_)));
    }
}
