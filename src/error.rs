// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Error types for the pose-fault pipeline.

use std::fmt;

use crate::mode::Mode;

/// Result type alias for pipeline operations.
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Identifies one frame of one session in error reports.
#[derive(Debug, Clone, Copy)]
pub struct FrameId<'a> {
    /// Session name from the recording metadata.
    pub session: &'a str,
    /// Frame ordinal within the session.
    pub ordinal: usize,
}

/// Main error type for the pose-fault pipeline.
#[derive(Debug)]
pub enum PipelineError {
    /// A frame's skeleton-error entry contains no person candidates.
    NoSkeletonDetected {
        /// Session name.
        session: String,
        /// Frame ordinal within the session.
        frame: usize,
    },
    /// The crop window could not be made square.
    UnsquareCrop {
        /// Session name.
        session: String,
        /// Frame ordinal within the session.
        frame: usize,
        /// Final window width in pixels.
        width: usize,
        /// Final window height in pixels.
        height: usize,
    },
    /// A label vector's length does not match the mode's layout.
    LabelShapeMismatch {
        /// Mode whose layout was expected.
        mode: Mode,
        /// Expected vector length.
        expected: usize,
        /// Actual vector length.
        actual: usize,
    },
    /// A class index exceeds the mode's classes-per-region.
    ClassOutOfRange {
        /// Mode whose class count was exceeded.
        mode: Mode,
        /// Region index the class belongs to.
        region: usize,
        /// Offending class index.
        class: u8,
    },
    /// The mode has no named sub-regions.
    UnsupportedMode(Mode),
    /// A flat dataset index past the end of the frame index.
    IndexOutOfRange {
        /// Requested flat index.
        index: usize,
        /// Dataset length.
        len: usize,
    },
    /// Malformed binary frame record.
    FrameFormat(String),
    /// Malformed or missing session metadata.
    Metadata(String),
    /// Missing or inconsistent skeleton-error data.
    Skeleton(String),
    /// Image encode/decode error.
    Image(String),
    /// Wrapped `std::io::Error`.
    Io(std::io::Error),
    /// Wrapped JSON parse error.
    Json(serde_json::Error),
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoSkeletonDetected { session, frame } => {
                write!(f, "No skeleton detected: session '{session}', frame {frame}")
            }
            Self::UnsquareCrop {
                session,
                frame,
                width,
                height,
            } => write!(
                f,
                "Crop window is not square ({width}x{height}): session '{session}', frame {frame}"
            ),
            Self::LabelShapeMismatch {
                mode,
                expected,
                actual,
            } => write!(
                f,
                "Label shape mismatch for {mode} mode: expected length {expected}, got {actual}"
            ),
            Self::ClassOutOfRange {
                mode,
                region,
                class,
            } => write!(
                f,
                "Class {class} out of range for {mode} mode (region {region})"
            ),
            Self::UnsupportedMode(mode) => write!(f, "No region table for {mode} mode"),
            Self::IndexOutOfRange { index, len } => {
                write!(f, "Frame index {index} out of range for dataset of length {len}")
            }
            Self::FrameFormat(msg) => write!(f, "Frame format error: {msg}"),
            Self::Metadata(msg) => write!(f, "Metadata error: {msg}"),
            Self::Skeleton(msg) => write!(f, "Skeleton data error: {msg}"),
            Self::Image(msg) => write!(f, "Image error: {msg}"),
            Self::Io(err) => write!(f, "IO error: {err}"),
            Self::Json(err) => write!(f, "JSON error: {err}"),
        }
    }
}

impl std::error::Error for PipelineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Json(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for PipelineError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<serde_json::Error> for PipelineError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err)
    }
}

impl From<image::ImageError> for PipelineError {
    fn from(err: image::ImageError) -> Self {
        Self::Image(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = PipelineError::NoSkeletonDetected {
            session: "rec_01".to_string(),
            frame: 12,
        };
        assert_eq!(
            err.to_string(),
            "No skeleton detected: session 'rec_01', frame 12"
        );

        let err = PipelineError::LabelShapeMismatch {
            mode: Mode::Joints,
            expected: 80,
            actual: 40,
        };
        assert_eq!(
            err.to_string(),
            "Label shape mismatch for joints mode: expected length 80, got 40"
        );
    }

    #[test]
    fn test_io_error_source() {
        let err = PipelineError::from(std::io::Error::new(std::io::ErrorKind::NotFound, "gone"));
        assert!(std::error::Error::source(&err).is_some());
    }
}
