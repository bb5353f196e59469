//! Neural synthesis with one alternate model

use std::path::Path;
use tracing::{info, warn};

use crate::inference::{IntermediateArtifact, NeuralBackend};

/// Tries the requested model, then exactly one fallback model.
pub struct PrimaryAdapter {
    backend: Box<dyn NeuralBackend>,
    fallback_model: String,
}

impl PrimaryAdapter {
    pub fn new(backend: Box<dyn NeuralBackend>, fallback_model: impl Into<String>) -> Self {
        Self {
            backend,
            fallback_model: fallback_model.into(),
        }
    }

    /// Whether the backend looks installed on this host
    pub fn is_available(&self) -> bool {
        self.backend.is_available()
    }

    /// Returns `true` when one of the two attempts produced audio at `output`.
    ///
    /// Every backend error, including engine version mismatches, is treated
    /// the same way: log it and move on to the alternate model. Each attempt
    /// writes into its own intermediate file, so a failed or interrupted
    /// attempt never leaves anything at `output`.
    pub async fn synthesize(&self, text: &str, engine_id: &str, output: &Path) -> bool {
        let attempts = [engine_id, self.fallback_model.as_str()];
        let extension = output
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("wav");

        for (attempt, model) in attempts.iter().enumerate() {
            let artifact = IntermediateArtifact::allocate(output, extension);

            if let Err(e) = self.backend.synthesize(text, model, artifact.path()).await {
                warn!(
                    "{} attempt {} with {} failed: {}",
                    self.backend.name(),
                    attempt + 1,
                    model,
                    e
                );
                continue;
            }

            if artifact.produced_size().is_none() {
                warn!(
                    "{} attempt {} with {} reported success but produced no audio",
                    self.backend.name(),
                    attempt + 1,
                    model
                );
                continue;
            }

            match artifact.persist(output) {
                Ok(path) => {
                    info!(
                        "{} synthesized {} with {}",
                        self.backend.name(),
                        path.display(),
                        model
                    );
                    return true;
                }
                Err(e) => warn!("Could not move synthesized audio into place: {}", e),
            }
        }

        false
    }
}
