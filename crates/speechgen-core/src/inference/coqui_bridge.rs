//! Coqui TTS bridge
//! Calls the `tts` command line entry point of the Coqui package for neural synthesis

use async_trait::async_trait;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

use crate::config::PrimaryConfig;
use crate::error::{Error, Result};
use crate::inference::NeuralBackend;
use crate::process;

/// Neural backend that shells out to Coqui's `tts` command
pub struct CoquiBridge {
    command: String,
    timeout: Duration,
    use_cuda: bool,
}

impl CoquiBridge {
    /// Create a new bridge from configuration
    pub fn new(config: &PrimaryConfig) -> Self {
        Self {
            command: config.command.clone(),
            timeout: config.timeout(),
            use_cuda: config.use_cuda,
        }
    }

    /// Resolved path of the `tts` executable, if installed
    pub fn executable(&self) -> Option<PathBuf> {
        process::locate(&self.command)
    }

    fn args(&self, text: &str, model: &str, output: &Path) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec![
            "--text".into(),
            text.into(),
            "--model_name".into(),
            model.into(),
            "--out_path".into(),
            output.into(),
            "--progress_bar".into(),
            "False".into(),
        ];
        if self.use_cuda {
            args.push("--use_cuda".into());
            args.push("True".into());
        }
        args
    }
}

#[async_trait]
impl NeuralBackend for CoquiBridge {
    fn name(&self) -> &str {
        "coqui"
    }

    fn is_available(&self) -> bool {
        self.executable().is_some()
    }

    async fn synthesize(&self, text: &str, model: &str, output: &Path) -> Result<()> {
        let program = self
            .executable()
            .ok_or_else(|| Error::ToolUnavailable(self.command.clone()))?;

        info!("Calling Coqui TTS with model {}", model);
        let output_log =
            process::run_with_timeout(&program, self.args(text, model, output), self.timeout)
                .await?;
        debug!(
            "Coqui finished: {}",
            String::from_utf8_lossy(&output_log.stdout).trim()
        );

        if !output.exists() {
            return Err(Error::InferenceError(format!(
                "{} reported success but wrote no file",
                self.command
            )));
        }
        Ok(())
    }
}
