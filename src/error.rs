//! Error types for the ratchet library
//!
//! The sequencer core itself never fails: bad indices are ignored and bad
//! parameters are clamped, so the audio path has no error values at all.
//! This module covers the surfaces around it (playback engine, preset
//! persistence, export).

use std::fmt;

/// Main error type for the ratchet library
#[derive(Debug)]
pub enum RatchetError {
    /// Audio engine initialization or operation failed
    AudioEngineError(String),

    /// Invalid audio format
    InvalidAudioFormat(String),

    /// Preset could not be parsed or applied
    PresetError(String),

    /// IO error
    IoError(String),
}

impl fmt::Display for RatchetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RatchetError::AudioEngineError(msg) => {
                write!(f, "Audio engine error: {}", msg)
            }
            RatchetError::InvalidAudioFormat(msg) => {
                write!(f, "Invalid audio format: {}", msg)
            }
            RatchetError::PresetError(msg) => {
                write!(f, "Preset error: {}", msg)
            }
            RatchetError::IoError(msg) => {
                write!(f, "IO error: {}", msg)
            }
        }
    }
}

impl std::error::Error for RatchetError {}

impl From<std::io::Error> for RatchetError {
    fn from(err: std::io::Error) -> Self {
        RatchetError::IoError(err.to_string())
    }
}

impl From<serde_json::Error> for RatchetError {
    fn from(err: serde_json::Error) -> Self {
        RatchetError::PresetError(err.to_string())
    }
}

/// Result alias used throughout the library
pub type Result<T> = std::result::Result<T, RatchetError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_messages() {
        let err = RatchetError::AudioEngineError("no device".to_string());
        assert_eq!(err.to_string(), "Audio engine error: no device");

        let err = RatchetError::PresetError("bad field".to_string());
        assert_eq!(err.to_string(), "Preset error: bad field");
    }

    #[test]
    fn test_from_io_error() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: RatchetError = io.into();
        assert!(matches!(err, RatchetError::IoError(_)));
    }
}
