//! Synthesis adapters: the neural engine first, the OS speech command second

mod artifact;
mod coqui_bridge;
mod primary;
mod system;

use async_trait::async_trait;
use std::path::Path;

use crate::error::Result;

pub use artifact::IntermediateArtifact;
pub use coqui_bridge::CoquiBridge;
pub use primary::PrimaryAdapter;
pub use system::SystemAdapter;

/// A neural text-to-speech engine that writes straight to the output path
#[async_trait]
pub trait NeuralBackend: Send + Sync {
    fn name(&self) -> &str;

    /// Cheap installation check; defaults to assuming the backend exists
    fn is_available(&self) -> bool {
        true
    }

    async fn synthesize(&self, text: &str, model: &str, output: &Path) -> Result<()>;
}
