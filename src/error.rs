use std::path::PathBuf;
use thiserror::Error;

use crate::validation::ValidationReport;

/// The main error type for redecor operations.
#[derive(Debug, Error)]
pub enum RedecorError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse layout JSON from {path}: {source}")]
    LayoutJsonParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to write layout JSON to {path}: {source}")]
    LayoutJsonWrite {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid argument: {message}")]
    InvalidArgument { message: String },

    #[error("Validation failed with {error_count} error(s) and {warning_count} warning(s)")]
    ValidationFailed {
        error_count: usize,
        warning_count: usize,
        report: ValidationReport,
    },

    #[error("Failed to decode image {path}: {source}")]
    ImageDecode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("Failed to encode image {path}: {source}")]
    ImageEncode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("Failed to load model {path}: {message}")]
    ModelLoad { path: PathBuf, message: String },

    #[error("Checksum mismatch for model {path}: expected {expected}, got {actual}")]
    ModelChecksumMismatch {
        path: PathBuf,
        expected: String,
        actual: String,
    },

    #[error("Inference error: {0}")]
    Inference(String),

    #[error("Detector unavailable: {0}")]
    DetectorUnavailable(String),

    #[error("Failed to parse config {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Coarse classification of a [`RedecorError`].
///
/// Callers outside the library (the HTTP layer, the CLI exit path) only care
/// whether the request itself was bad or something downstream broke.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// The caller passed something unusable (e.g. `num_versions` of zero).
    InvalidArgument,
    /// A detector, I/O or codec stage failed.
    UpstreamFailure,
}

impl RedecorError {
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidArgument { .. }
            | Self::InvalidConfig(_)
            | Self::ValidationFailed { .. } => ErrorKind::InvalidArgument,
            _ => ErrorKind::UpstreamFailure,
        }
    }

    pub fn is_invalid_argument(&self) -> bool {
        self.kind() == ErrorKind::InvalidArgument
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_split_caller_mistakes_from_stage_failures() {
        assert_eq!(
            RedecorError::invalid_argument("num_versions must be positive").kind(),
            ErrorKind::InvalidArgument
        );
        assert_eq!(
            RedecorError::InvalidConfig("bad".into()).kind(),
            ErrorKind::InvalidArgument
        );
        assert_eq!(
            RedecorError::Inference("session failed".into()).kind(),
            ErrorKind::UpstreamFailure
        );
        assert_eq!(
            RedecorError::Io(std::io::Error::other("disk full")).kind(),
            ErrorKind::UpstreamFailure
        );
    }

    #[test]
    fn invalid_argument_message_is_readable() {
        let err = RedecorError::invalid_argument("num_versions must be greater than 0");
        assert_eq!(
            err.to_string(),
            "Invalid argument: num_versions must be greater than 0"
        );
    }
}
