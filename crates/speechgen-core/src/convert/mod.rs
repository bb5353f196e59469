//! Format normalization
//!
//! The ladder is an ordered list of conversion strategies evaluated lazily.
//! The first strategy that is available and succeeds wins. When every
//! strategy is unavailable or fails, the native file is kept under its own
//! extension and reported as a degraded result. A strategy that fails after
//! it started writing the target aborts the ladder instead.

mod in_process;
mod transcoder;

use async_trait::async_trait;
use serde::Serialize;
use std::backtrace::Backtrace;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

use crate::config::ConversionConfig;
use crate::error::{report, Result};
use crate::inference::IntermediateArtifact;

pub use in_process::{LegacyAiffConverter, LibraryConverter};
pub use transcoder::{CommandTranscoder, TranscoderKind};

/// Whether a strategy can run on this host for a given target
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Availability {
    Ready,
    Missing(String),
}

/// One rung of the conversion ladder
#[async_trait]
pub trait ConversionStrategy: Send + Sync {
    fn name(&self) -> &str;

    /// In-process strategies get a full diagnostic trace when they fail
    fn in_process(&self) -> bool {
        false
    }

    fn availability(&self, target: &Path) -> Availability;

    /// Convert `source` into `target`. Return [`Error::PartialOutput`] if
    /// the failure happened after the target started being written.
    ///
    /// [`Error::PartialOutput`]: crate::Error::PartialOutput
    async fn convert(&self, source: &Path, target: &Path) -> Result<()>;
}

/// Result of normalizing one intermediate artifact
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Normalized {
    /// Target container written at the requested path
    Converted(PathBuf),
    /// Native container kept under its own extension
    Degraded(PathBuf),
    /// Nothing usable remains
    Failed,
}

/// Availability of a single strategy, for reporting
#[derive(Debug, Clone, Serialize)]
pub struct StrategyStatus {
    pub name: String,
    pub available: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

pub struct FormatNormalizer {
    strategies: Vec<Box<dyn ConversionStrategy>>,
}

impl FormatNormalizer {
    /// The default ladder: ffmpeg, sox, symphonia, then the built-in AIFF reader
    pub fn from_config(config: &ConversionConfig) -> Self {
        let mut strategies: Vec<Box<dyn ConversionStrategy>> = vec![
            Box::new(CommandTranscoder::new(
                TranscoderKind::Ffmpeg,
                &config.ffmpeg_command,
                config.timeout(),
            )),
            Box::new(CommandTranscoder::new(
                TranscoderKind::Sox,
                &config.sox_command,
                config.timeout(),
            )),
        ];
        strategies.push(Box::new(LibraryConverter::new(config.in_process, config.timeout())));
        strategies.push(Box::new(LegacyAiffConverter::new(config.legacy_reader, config.timeout())));
        Self::with_strategies(strategies)
    }

    pub fn with_strategies(strategies: Vec<Box<dyn ConversionStrategy>>) -> Self {
        Self { strategies }
    }

    pub fn strategy_names(&self) -> Vec<&str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    /// Report which strategies could run for `target`
    pub fn statuses(&self, target: &Path) -> Vec<StrategyStatus> {
        self.strategies
            .iter()
            .map(|s| match s.availability(target) {
                Availability::Ready => StrategyStatus {
                    name: s.name().to_string(),
                    available: true,
                    reason: None,
                },
                Availability::Missing(reason) => StrategyStatus {
                    name: s.name().to_string(),
                    available: false,
                    reason: Some(reason),
                },
            })
            .collect()
    }

    /// Turn `artifact` into `target`, consuming the artifact.
    pub async fn normalize(&self, artifact: IntermediateArtifact, target: &Path) -> Normalized {
        if same_container(artifact.extension(), target) {
            return match artifact.persist(target) {
                Ok(path) => Normalized::Converted(path),
                Err(e) => {
                    warn!("Could not move native file into place: {}", e);
                    Normalized::Failed
                }
            };
        }

        // a file already at the target was not produced by this run
        clear_target(target);

        for strategy in &self.strategies {
            match strategy.availability(target) {
                Availability::Ready => {}
                Availability::Missing(reason) => {
                    debug!("Skipping {}: {}", strategy.name(), reason);
                    continue;
                }
            }

            match strategy.convert(artifact.path(), target).await {
                Ok(()) if target.exists() => {
                    info!("Converted with {} to {}", strategy.name(), target.display());
                    artifact.discard();
                    return Normalized::Converted(target.to_path_buf());
                }
                Ok(()) => {
                    warn!("{} reported success but {} is missing", strategy.name(), target.display());
                }
                Err(e) if e.is_partial_output() => {
                    error!(
                        "{} failed mid-write, abandoning conversion: {}\n{}",
                        strategy.name(),
                        report(&e),
                        Backtrace::force_capture()
                    );
                    clear_target(target);
                    artifact.discard();
                    return Normalized::Failed;
                }
                Err(e) if strategy.in_process() => {
                    error!(
                        "{} failed: {}\n{}",
                        strategy.name(),
                        report(&e),
                        Backtrace::force_capture()
                    );
                    clear_target(target);
                }
                Err(e) if e.is_unavailable() => {
                    debug!("{} unavailable: {}", strategy.name(), e);
                }
                Err(e) => {
                    warn!("{} failed: {}", strategy.name(), e);
                    clear_target(target);
                }
            }
        }

        let fallback = target.with_extension(artifact.extension());
        match artifact.persist(&fallback) {
            Ok(path) => {
                warn!(
                    "No converter succeeded, keeping native container at {}",
                    path.display()
                );
                Normalized::Degraded(path)
            }
            Err(e) => {
                warn!("Could not keep native file: {}", e);
                Normalized::Failed
            }
        }
    }
}

fn same_container(native: &str, target: &Path) -> bool {
    target
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case(native))
}

pub(crate) fn targets_wav(target: &Path) -> bool {
    target
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("wav"))
}

fn clear_target(target: &Path) {
    match std::fs::remove_file(target) {
        Ok(()) => debug!("Removed {}", target.display()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!("Failed to remove {}: {}", target.display(), e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    enum Behaviour {
        Missing,
        Fail,
        PartialWrite,
        Copy,
        Silent,
    }

    struct FakeStrategy {
        name: &'static str,
        behaviour: Behaviour,
        runs: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl ConversionStrategy for FakeStrategy {
        fn name(&self) -> &str {
            self.name
        }

        fn availability(&self, _target: &Path) -> Availability {
            match self.behaviour {
                Behaviour::Missing => Availability::Missing("not installed".to_string()),
                _ => Availability::Ready,
            }
        }

        async fn convert(&self, source: &Path, target: &Path) -> Result<()> {
            self.runs.fetch_add(1, Ordering::SeqCst);
            match self.behaviour {
                Behaviour::Missing => unreachable!("missing strategies are never run"),
                Behaviour::Fail => {
                    std::fs::write(target, b"garbage")?;
                    Err(Error::ConversionError("bad input".to_string()))
                }
                Behaviour::PartialWrite => {
                    std::fs::write(target, b"RIFF")?;
                    Err(Error::PartialOutput {
                        path: target.display().to_string(),
                        source: Box::new(Error::AudioError("disk full".to_string())),
                    })
                }
                Behaviour::Copy => {
                    std::fs::copy(source, target)?;
                    Ok(())
                }
                Behaviour::Silent => Ok(()),
            }
        }
    }

    fn strategy(name: &'static str, behaviour: Behaviour) -> (Box<dyn ConversionStrategy>, Arc<AtomicUsize>) {
        let runs = Arc::new(AtomicUsize::new(0));
        let strategy = FakeStrategy {
            name,
            behaviour,
            runs: Arc::clone(&runs),
        };
        (Box::new(strategy), runs)
    }

    fn artifact_in(dir: &Path, target: &Path) -> (IntermediateArtifact, PathBuf) {
        let artifact = IntermediateArtifact::allocate(target, "aiff");
        std::fs::write(artifact.path(), b"FORM....AIFF").unwrap();
        assert!(artifact.path().starts_with(dir));
        let temp = artifact.path().to_path_buf();
        (artifact, temp)
    }

    #[tokio::test]
    async fn test_first_working_strategy_wins() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("out.wav");
        let (missing, missing_runs) = strategy("missing", Behaviour::Missing);
        let (failing, failing_runs) = strategy("failing", Behaviour::Fail);
        let (copy, copy_runs) = strategy("copy", Behaviour::Copy);
        let (unused, unused_runs) = strategy("unused", Behaviour::Copy);
        let normalizer = FormatNormalizer::with_strategies(vec![missing, failing, copy, unused]);

        let (artifact, temp) = artifact_in(dir.path(), &target);
        let outcome = normalizer.normalize(artifact, &target).await;

        assert_eq!(outcome, Normalized::Converted(target.clone()));
        assert_eq!(std::fs::read(&target).unwrap(), b"FORM....AIFF");
        assert!(!temp.exists());
        assert_eq!(missing_runs.load(Ordering::SeqCst), 0);
        assert_eq!(failing_runs.load(Ordering::SeqCst), 1);
        assert_eq!(copy_runs.load(Ordering::SeqCst), 1);
        assert_eq!(unused_runs.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_exhaustion_degrades_to_native_extension() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("out.wav");
        let (missing, _) = strategy("missing", Behaviour::Missing);
        let (failing, _) = strategy("failing", Behaviour::Fail);
        let normalizer = FormatNormalizer::with_strategies(vec![missing, failing]);

        let (artifact, temp) = artifact_in(dir.path(), &target);
        let outcome = normalizer.normalize(artifact, &target).await;

        let kept = dir.path().join("out.aiff");
        assert_eq!(outcome, Normalized::Degraded(kept.clone()));
        assert!(kept.exists());
        assert!(!temp.exists());
        // the failed converter's junk must not masquerade as the target
        assert!(!target.exists());
    }

    #[tokio::test]
    async fn test_partial_write_aborts_ladder() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("out.wav");
        let (partial, _) = strategy("partial", Behaviour::PartialWrite);
        let (copy, copy_runs) = strategy("copy", Behaviour::Copy);
        let normalizer = FormatNormalizer::with_strategies(vec![partial, copy]);

        let (artifact, temp) = artifact_in(dir.path(), &target);
        let outcome = normalizer.normalize(artifact, &target).await;

        assert_eq!(outcome, Normalized::Failed);
        assert_eq!(copy_runs.load(Ordering::SeqCst), 0);
        assert!(!temp.exists());
        assert!(!target.exists());
        assert!(!dir.path().join("out.aiff").exists());
    }

    #[tokio::test]
    async fn test_stale_target_is_not_taken_as_converted() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("out.wav");
        std::fs::write(&target, b"RIFF-truncated").unwrap();
        let (silent, silent_runs) = strategy("silent", Behaviour::Silent);
        let normalizer = FormatNormalizer::with_strategies(vec![silent]);

        let (artifact, _) = artifact_in(dir.path(), &target);
        let outcome = normalizer.normalize(artifact, &target).await;

        assert_eq!(silent_runs.load(Ordering::SeqCst), 1);
        assert_eq!(outcome, Normalized::Degraded(dir.path().join("out.aiff")));
        assert!(!target.exists());
    }

    #[tokio::test]
    async fn test_same_container_skips_ladder() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("out.AIFF");
        let (copy, copy_runs) = strategy("copy", Behaviour::Copy);
        let normalizer = FormatNormalizer::with_strategies(vec![copy]);

        let (artifact, temp) = artifact_in(dir.path(), &target);
        let outcome = normalizer.normalize(artifact, &target).await;

        assert_eq!(outcome, Normalized::Converted(target.clone()));
        assert_eq!(copy_runs.load(Ordering::SeqCst), 0);
        assert!(!temp.exists());
    }

    #[test]
    fn test_default_ladder_order() {
        let normalizer = FormatNormalizer::from_config(&ConversionConfig::default());
        assert_eq!(
            normalizer.strategy_names(),
            vec!["ffmpeg", "sox", "symphonia", "legacy-aiff"]
        );
    }
}
