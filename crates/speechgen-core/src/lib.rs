//! Speechgen Core - text to a playable audio file, whatever the host has installed
//!
//! A request runs through a strict fallback chain:
//! - the neural engine (Coqui `tts`), with one alternate model
//! - the OS speech command (`say`), whose native AIFF output is normalized
//!   into the requested container by ffmpeg, sox, symphonia or the built-in
//!   AIFF reader, in that order
//! - as a last resort the AIFF is kept and the result carries a warning
//!
//! # Example
//!
//! ```ignore
//! use speechgen_core::{Orchestrator, SynthConfig, SynthesisRequest};
//!
//! let config = SynthConfig::default();
//! let orchestrator = Orchestrator::new(&config);
//!
//! let request = SynthesisRequest::new("Hello, world!", "out/hello.wav", &config.primary.default_model)?;
//! let result = orchestrator.synthesize(&request).await;
//! println!("{}", serde_json::to_string(&result)?);
//! ```

pub mod audio;
pub mod config;
pub mod convert;
pub mod error;
pub mod inference;
pub mod orchestrator;
pub mod process;
pub mod request;

pub use config::{ConversionConfig, PrimaryConfig, SynthConfig, SystemConfig};
pub use convert::{Availability, ConversionStrategy, FormatNormalizer, Normalized};
pub use error::{Error, Result};
pub use inference::{CoquiBridge, IntermediateArtifact, NeuralBackend, PrimaryAdapter, SystemAdapter};
pub use orchestrator::{Capabilities, Orchestrator};
pub use request::{Method, SynthesisRequest, SynthesisResult};
