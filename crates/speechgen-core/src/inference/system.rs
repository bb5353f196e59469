//! OS speech command adapter (`say` on macOS)

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::config::SystemConfig;
use crate::convert::{FormatNormalizer, Normalized};
use crate::inference::IntermediateArtifact;
use crate::process;

/// Speaks text into a native container, then hands it to the normalizer
pub struct SystemAdapter {
    config: SystemConfig,
    normalizer: FormatNormalizer,
}

impl SystemAdapter {
    pub fn new(config: SystemConfig, normalizer: FormatNormalizer) -> Self {
        Self { config, normalizer }
    }

    pub fn normalizer(&self) -> &FormatNormalizer {
        &self.normalizer
    }

    /// Enabled for this platform and the speech command can be found.
    /// Absence is not an error, just an unavailable path.
    pub fn is_supported(&self) -> bool {
        self.config.enabled && self.executable().is_some()
    }

    fn executable(&self) -> Option<PathBuf> {
        process::locate(&self.config.command)
    }

    fn args(&self, text: &str, artifact: &Path) -> Vec<OsString> {
        let mut args: Vec<OsString> = Vec::new();
        if let Some(voice) = &self.config.voice {
            args.push("-v".into());
            args.push(voice.into());
        }
        args.push("-o".into());
        args.push(artifact.into());
        // keep text that starts with a dash from being read as a flag
        if text.starts_with('-') {
            args.push(format!(" {}", text).into());
        } else {
            args.push(text.into());
        }
        args
    }

    /// Synthesize `text` and normalize it towards `output`.
    ///
    /// Returns `None` when the speech command fails, times out, produces
    /// nothing, or when normalization ends in a definitive failure. The
    /// intermediate file never outlives this call unless it was kept as the
    /// degraded result.
    pub async fn synthesize(&self, text: &str, output: &Path) -> Option<Normalized> {
        let program = self.executable()?;
        let artifact = IntermediateArtifact::allocate(output, &self.config.native_extension);

        info!("Synthesizing with {} into {}", self.config.command, artifact.path().display());
        let run = process::run_with_timeout(
            &program,
            self.args(text, artifact.path()),
            self.config.timeout(),
        )
        .await;

        if let Err(e) = run {
            warn!("System speech failed: {}", e);
            return None;
        }

        let Some(size) = artifact.produced_size() else {
            warn!("{} exited cleanly but produced no audio", self.config.command);
            return None;
        };
        debug!("Native artifact is {} bytes", size);

        match self.normalizer.normalize(artifact, output).await {
            Normalized::Failed => None,
            outcome => Some(outcome),
        }
    }
}
