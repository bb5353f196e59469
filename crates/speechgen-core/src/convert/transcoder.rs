//! External command-line transcoders

use async_trait::async_trait;
use std::ffi::OsString;
use std::path::Path;
use std::time::Duration;

use super::{Availability, ConversionStrategy};
use crate::error::{Error, Result};
use crate::process;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TranscoderKind {
    Ffmpeg,
    Sox,
}

impl TranscoderKind {
    fn name(self) -> &'static str {
        match self {
            TranscoderKind::Ffmpeg => "ffmpeg",
            TranscoderKind::Sox => "sox",
        }
    }

    fn args(self, source: &Path, target: &Path) -> Vec<OsString> {
        match self {
            TranscoderKind::Ffmpeg => vec![
                "-hide_banner".into(),
                "-loglevel".into(),
                "error".into(),
                "-y".into(),
                "-i".into(),
                source.into(),
                target.into(),
            ],
            TranscoderKind::Sox => vec![source.into(), target.into()],
        }
    }
}

/// Converts by running an installed transcoder with a time limit
pub struct CommandTranscoder {
    kind: TranscoderKind,
    command: String,
    timeout: Duration,
}

impl CommandTranscoder {
    pub fn new(kind: TranscoderKind, command: &str, timeout: Duration) -> Self {
        Self {
            kind,
            command: command.to_string(),
            timeout,
        }
    }
}

#[async_trait]
impl ConversionStrategy for CommandTranscoder {
    fn name(&self) -> &str {
        self.kind.name()
    }

    fn availability(&self, _target: &Path) -> Availability {
        match process::locate(&self.command) {
            Some(_) => Availability::Ready,
            None => Availability::Missing(format!("{} not found", self.command)),
        }
    }

    async fn convert(&self, source: &Path, target: &Path) -> Result<()> {
        let program = process::locate(&self.command)
            .ok_or_else(|| Error::ToolUnavailable(self.command.clone()))?;
        process::run_with_timeout(&program, self.kind.args(source, target), self.timeout).await?;
        Ok(())
    }
}
