//! Error taxonomy shared across the crate.
//!
//! Most fallible operations return [`anyhow::Result`]; the variants here exist for the conditions
//! a caller must tell apart, and can be recovered from an [`anyhow::Error`] via `downcast_ref`.

use std::fmt;

/// Conditions that callers need to distinguish from generic failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The camera could not be opened, or a frame read failed. Ends the current session (capture
    /// or recognition) but not the process.
    CameraUnavailable,
    /// Recognition was started without a trained classifier. Raised before any frame is read.
    ModelNotLoaded,
    /// A keypoint set with the wrong number of landmarks reached the feature normalizer. This is a
    /// contract violation between the landmark provider and the normalizer, not a runtime
    /// condition to recover from.
    InvalidInput {
        expected: usize,
        got: usize,
    },
    /// The user aborted a long-running session. A clean early exit, not a fault.
    Cancelled,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::CameraUnavailable => f.write_str("camera unavailable"),
            Error::ModelNotLoaded => f.write_str("no trained model loaded"),
            Error::InvalidInput { expected, got } => {
                write!(f, "expected {expected} hand landmarks, got {got}")
            }
            Error::Cancelled => f.write_str("cancelled by user"),
        }
    }
}

impl std::error::Error for Error {}
