//! Top-level fallback chain: neural engine, then OS speech plus normalization

use futures::FutureExt;
use serde::Serialize;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::path::Path;
use tracing::{error, info, warn};

use crate::config::SynthConfig;
use crate::convert::{FormatNormalizer, Normalized, StrategyStatus};
use crate::error::{report, Result};
use crate::inference::{CoquiBridge, PrimaryAdapter, SystemAdapter};
use crate::request::{Method, SynthesisRequest, SynthesisResult};

pub const ALL_FAILED: &str = "All synthesis methods failed";

/// What this host can do, for operators
#[derive(Debug, Clone, Serialize)]
pub struct Capabilities {
    pub primary: bool,
    pub system: bool,
    pub conversion: Vec<StrategyStatus>,
}

pub struct Orchestrator {
    primary: PrimaryAdapter,
    system: SystemAdapter,
}

impl Orchestrator {
    /// Wire up the production adapters
    pub fn new(config: &SynthConfig) -> Self {
        let primary = PrimaryAdapter::new(
            Box::new(CoquiBridge::new(&config.primary)),
            config.primary.fallback_model.clone(),
        );
        let normalizer = FormatNormalizer::from_config(&config.conversion);
        let system = SystemAdapter::new(config.system.clone(), normalizer);
        Self::with_adapters(primary, system)
    }

    pub fn with_adapters(primary: PrimaryAdapter, system: SystemAdapter) -> Self {
        Self { primary, system }
    }

    /// Run one request. Never fails: every error becomes a `Failure`.
    pub async fn synthesize(&self, request: &SynthesisRequest) -> SynthesisResult {
        match AssertUnwindSafe(self.run(request)).catch_unwind().await {
            Ok(Ok(result)) => result,
            Ok(Err(e)) => {
                error!("Synthesis aborted: {}", e);
                SynthesisResult::failure_with_diagnostic(e.to_string(), report(&e))
            }
            Err(panic) => {
                let message = panic_message(panic.as_ref());
                error!("Synthesis panicked: {}", message);
                SynthesisResult::failure_with_diagnostic("Synthesis panicked", message)
            }
        }
    }

    async fn run(&self, request: &SynthesisRequest) -> Result<SynthesisResult> {
        let output = request.output_path();
        ensure_parent_dir(output).await?;

        if self
            .primary
            .synthesize(request.text(), request.engine_id(), output)
            .await
        {
            if let Some(size) = file_size(output).await {
                return Ok(success(output, size, Method::Primary, None));
            }
            warn!(
                "Primary engine reported success but {} does not exist",
                output.display()
            );
        }

        if !self.system.is_supported() {
            info!("System speech is not available on this host");
            return Ok(SynthesisResult::failure(ALL_FAILED));
        }

        let (path, warning) = match self.system.synthesize(request.text(), output).await {
            Some(Normalized::Converted(path)) => (path, None),
            Some(Normalized::Degraded(path)) => {
                let warning = degraded_warning(output, &path);
                (path, Some(warning))
            }
            Some(Normalized::Failed) | None => return Ok(SynthesisResult::failure(ALL_FAILED)),
        };

        match file_size(&path).await {
            Some(size) => Ok(success(&path, size, Method::System, warning)),
            None => {
                warn!("System speech reported {} but it does not exist", path.display());
                Ok(SynthesisResult::failure(ALL_FAILED))
            }
        }
    }

    /// Probe every adapter and converter without synthesizing anything
    pub fn capabilities(&self) -> Capabilities {
        Capabilities {
            primary: self.primary.is_available(),
            system: self.system.is_supported(),
            conversion: self.system.normalizer().statuses(Path::new("probe.wav")),
        }
    }
}

fn success(path: &Path, size: u64, method: Method, warning: Option<String>) -> SynthesisResult {
    info!("Produced {} ({} bytes) via {:?}", path.display(), size, method);
    SynthesisResult::Success {
        path: path.to_path_buf(),
        size_bytes: size,
        method,
        warning,
    }
}

fn degraded_warning(requested: &Path, produced: &Path) -> String {
    let ext = |p: &Path| {
        p.extension()
            .map(|e| e.to_string_lossy().to_uppercase())
            .unwrap_or_else(|| "unknown".to_string())
    };
    format!(
        "non-target container produced ({} instead of {}); browser/consumer compatibility not guaranteed",
        ext(produced),
        ext(requested)
    )
}

async fn ensure_parent_dir(output: &Path) -> Result<()> {
    match output.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => {
            tokio::fs::create_dir_all(dir).await?;
            Ok(())
        }
        _ => Ok(()),
    }
}

async fn file_size(path: &Path) -> Option<u64> {
    tokio::fs::metadata(path)
        .await
        .ok()
        .filter(|m| m.is_file())
        .map(|m| m.len())
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
