//! Request and result types exchanged with the caller

use serde::{Serialize, Serializer};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// One text-to-audio job
#[derive(Debug, Clone)]
pub struct SynthesisRequest {
    text: String,
    output_path: PathBuf,
    engine_id: String,
}

impl SynthesisRequest {
    /// Validate and build a request
    pub fn new(
        text: impl Into<String>,
        output_path: impl Into<PathBuf>,
        engine_id: impl Into<String>,
    ) -> Result<Self> {
        let text = text.into();
        let output_path = output_path.into();
        let engine_id = engine_id.into();

        if text.trim().is_empty() {
            return Err(Error::InvalidRequest("text must not be empty".to_string()));
        }
        if output_path.as_os_str().is_empty() {
            return Err(Error::InvalidRequest(
                "output path must not be empty".to_string(),
            ));
        }
        if engine_id.trim().is_empty() {
            return Err(Error::InvalidRequest(
                "engine id must not be empty".to_string(),
            ));
        }

        Ok(Self {
            text,
            output_path,
            engine_id,
        })
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn output_path(&self) -> &Path {
        &self.output_path
    }

    pub fn engine_id(&self) -> &str {
        &self.engine_id
    }
}

/// Which adapter produced the artifact
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Method {
    Primary,
    System,
}

/// Outcome of one request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SynthesisResult {
    Success {
        path: PathBuf,
        size_bytes: u64,
        method: Method,
        /// Set when the container differs from the requested one
        warning: Option<String>,
    },
    Failure {
        error: String,
        diagnostic: Option<String>,
    },
}

impl SynthesisResult {
    pub fn failure(error: impl Into<String>) -> Self {
        SynthesisResult::Failure {
            error: error.into(),
            diagnostic: None,
        }
    }

    pub fn failure_with_diagnostic(error: impl Into<String>, diagnostic: impl Into<String>) -> Self {
        SynthesisResult::Failure {
            error: error.into(),
            diagnostic: Some(diagnostic.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, SynthesisResult::Success { .. })
    }

    /// Process exit status for this outcome
    pub fn exit_code(&self) -> u8 {
        if self.is_success() {
            0
        } else {
            1
        }
    }
}

/// Flat wire shape: `{success, path?, size?, method?, warning?, error?, diagnostic?}`
#[derive(Serialize)]
struct ResultPayload<'a> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    size: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    method: Option<Method>,
    #[serde(skip_serializing_if = "Option::is_none")]
    warning: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    diagnostic: Option<&'a str>,
}

impl Serialize for SynthesisResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let payload = match self {
            SynthesisResult::Success {
                path,
                size_bytes,
                method,
                warning,
            } => ResultPayload {
                success: true,
                path: Some(path.to_string_lossy().into_owned()),
                size: Some(*size_bytes),
                method: Some(*method),
                warning: warning.as_deref(),
                error: None,
                diagnostic: None,
            },
            SynthesisResult::Failure { error, diagnostic } => ResultPayload {
                success: false,
                path: None,
                size: None,
                method: None,
                warning: None,
                error: Some(error),
                diagnostic: diagnostic.as_deref(),
            },
        };
        payload.serialize(serializer)
    }
}
