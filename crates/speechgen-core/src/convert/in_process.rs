//! Converters that run inside the process and write WAV through hound
//!
//! Decoding is blocking work, so each conversion runs on the blocking pool
//! under the configured time limit.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use super::{targets_wav, Availability, ConversionStrategy};
use crate::audio::{aiff, PcmAudio, WavEncoder};
use crate::error::{Error, Result};

/// Decodes the native container with symphonia
pub struct LibraryConverter {
    enabled: bool,
    timeout: Duration,
}

impl LibraryConverter {
    pub fn new(enabled: bool, timeout: Duration) -> Self {
        Self { enabled, timeout }
    }
}

#[async_trait]
impl ConversionStrategy for LibraryConverter {
    fn name(&self) -> &str {
        "symphonia"
    }

    fn in_process(&self) -> bool {
        true
    }

    fn availability(&self, target: &Path) -> Availability {
        if !cfg!(feature = "symphonia") {
            return Availability::Missing("built without the symphonia feature".to_string());
        }
        gate(self.enabled, target)
    }

    async fn convert(&self, source: &Path, target: &Path) -> Result<()> {
        #[cfg(feature = "symphonia")]
        {
            let source = source.to_path_buf();
            run_blocking(self.name(), self.timeout, target, move |target, cancelled| {
                let audio = crate::audio::decode::decode_file(&source).map_err(|e| {
                    Error::ConversionError(format!("symphonia could not decode: {}", e))
                })?;
                write_target(&audio, &target, cancelled)
            })
            .await
        }
        #[cfg(not(feature = "symphonia"))]
        {
            let _ = (source, target);
            Err(Error::ToolUnavailable("symphonia".to_string()))
        }
    }
}

/// Reads AIFF with the built-in parser and re-encodes the same PCM
pub struct LegacyAiffConverter {
    enabled: bool,
    timeout: Duration,
}

impl LegacyAiffConverter {
    pub fn new(enabled: bool, timeout: Duration) -> Self {
        Self { enabled, timeout }
    }
}

#[async_trait]
impl ConversionStrategy for LegacyAiffConverter {
    fn name(&self) -> &str {
        "legacy-aiff"
    }

    fn in_process(&self) -> bool {
        true
    }

    fn availability(&self, target: &Path) -> Availability {
        if !cfg!(feature = "legacy-aiff") {
            return Availability::Missing("built without the legacy-aiff feature".to_string());
        }
        gate(self.enabled, target)
    }

    async fn convert(&self, source: &Path, target: &Path) -> Result<()> {
        let source = source.to_path_buf();
        run_blocking(self.name(), self.timeout, target, move |target, cancelled| {
            let audio = aiff::read(&source)
                .map_err(|e| Error::ConversionError(format!("AIFF reader failed: {}", e)))?;
            write_target(&audio, &target, cancelled)
        })
        .await
    }
}

fn gate(enabled: bool, target: &Path) -> Availability {
    if !enabled {
        Availability::Missing("disabled by configuration".to_string())
    } else if !targets_wav(target) {
        Availability::Missing("only writes WAV".to_string())
    } else {
        Availability::Ready
    }
}

/// Run `job` on the blocking pool, giving up after `limit`.
///
/// A job that outlives the limit keeps running, but sees the cancellation
/// flag set and must not start writing the target.
async fn run_blocking<F>(name: &str, limit: Duration, target: &Path, job: F) -> Result<()>
where
    F: FnOnce(PathBuf, &AtomicBool) -> Result<()> + Send + 'static,
{
    let cancelled = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&cancelled);
    let target = target.to_path_buf();
    let handle = tokio::task::spawn_blocking(move || job(target, &flag));

    match tokio::time::timeout(limit, handle).await {
        Ok(Ok(result)) => result,
        Ok(Err(e)) => Err(Error::ConversionError(format!("{} worker stopped: {}", name, e))),
        Err(_) => {
            cancelled.store(true, Ordering::SeqCst);
            Err(Error::Timeout {
                program: name.to_string(),
                limit,
            })
        }
    }
}

/// Anything that goes wrong once the target file exists is partial output.
fn write_target(audio: &PcmAudio, target: &Path, cancelled: &AtomicBool) -> Result<()> {
    WavEncoder::check(audio).map_err(|e| Error::ConversionError(e.to_string()))?;
    if cancelled.load(Ordering::SeqCst) {
        return Err(Error::ConversionError("cancelled before writing".to_string()));
    }
    WavEncoder::encode_to_file(audio, target)
        .map(|_| ())
        .map_err(|e| Error::PartialOutput {
            path: target.display().to_string(),
            source: Box::new(e),
        })
}
