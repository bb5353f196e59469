//! Error types for the speechgen fallback chain

use std::error::Error as StdError;
use std::fmt::Write as _;
use std::time::Duration;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Tool not available: {0}")]
    ToolUnavailable(String),

    #[error("{program} timed out after {}s", .limit.as_secs())]
    Timeout { program: String, limit: Duration },

    #[error("{program} exited with {status}: {stderr}")]
    ProcessFailed {
        program: String,
        status: String,
        stderr: String,
    },

    #[error("Inference error: {0}")]
    InferenceError(String),

    #[error("Conversion error: {0}")]
    ConversionError(String),

    #[error("Conversion left partial output at {path}")]
    PartialOutput {
        path: String,
        #[source]
        source: Box<Error>,
    },

    #[error("Audio error: {0}")]
    AudioError(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// True when a converter stopped after it had already started writing
    /// its output, so neither the output nor a fallback can be trusted.
    pub fn is_partial_output(&self) -> bool {
        matches!(self, Error::PartialOutput { .. })
    }

    pub fn is_unavailable(&self) -> bool {
        matches!(self, Error::ToolUnavailable(_))
    }
}

impl From<hound::Error> for Error {
    fn from(e: hound::Error) -> Self {
        match e {
            hound::Error::IoError(io) => Error::IoError(io),
            other => Error::AudioError(other.to_string()),
        }
    }
}

#[cfg(feature = "symphonia")]
impl From<symphonia::core::errors::Error> for Error {
    fn from(e: symphonia::core::errors::Error) -> Self {
        Error::AudioError(e.to_string())
    }
}

/// Render an error and its full source chain, one cause per line.
pub fn report(err: &(dyn StdError + 'static)) -> String {
    let mut out = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let _ = write!(out, "\n  caused by: {}", cause);
        source = cause.source();
    }
    out
}
