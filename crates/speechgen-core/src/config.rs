//! Configuration types for the speechgen fallback chain

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SynthConfig {
    #[serde(default)]
    pub primary: PrimaryConfig,

    #[serde(default)]
    pub system: SystemConfig,

    #[serde(default)]
    pub conversion: ConversionConfig,
}

/// Neural engine settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrimaryConfig {
    /// Coqui command line entry point
    #[serde(default = "default_primary_command")]
    pub command: String,

    /// Model used when the request does not name one
    #[serde(default = "default_model")]
    pub default_model: String,

    /// Model tried once after the requested one fails
    #[serde(default = "default_fallback_model")]
    pub fallback_model: String,

    /// Upper bound for one model attempt
    #[serde(default = "default_primary_timeout")]
    pub timeout_secs: u64,

    #[serde(default)]
    pub use_cuda: bool,
}

impl Default for PrimaryConfig {
    fn default() -> Self {
        Self {
            command: default_primary_command(),
            default_model: default_model(),
            fallback_model: default_fallback_model(),
            timeout_secs: default_primary_timeout(),
            use_cuda: false,
        }
    }
}

impl PrimaryConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// OS speech command settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemConfig {
    #[serde(default = "default_system_enabled")]
    pub enabled: bool,

    #[serde(default = "default_system_command")]
    pub command: String,

    #[serde(default = "default_voice")]
    pub voice: Option<String>,

    /// Container the speech command writes natively
    #[serde(default = "default_native_extension")]
    pub native_extension: String,

    #[serde(default = "default_system_timeout")]
    pub timeout_secs: u64,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            enabled: default_system_enabled(),
            command: default_system_command(),
            voice: default_voice(),
            native_extension: default_native_extension(),
            timeout_secs: default_system_timeout(),
        }
    }
}

impl SystemConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Format normalizer settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversionConfig {
    #[serde(default = "default_ffmpeg_command")]
    pub ffmpeg_command: String,

    #[serde(default = "default_sox_command")]
    pub sox_command: String,

    /// Upper bound for each external converter run
    #[serde(default = "default_conversion_timeout")]
    pub timeout_secs: u64,

    /// Allow the symphonia based converter (when compiled in)
    #[serde(default = "default_true")]
    pub in_process: bool,

    /// Allow the built-in AIFF reader (when compiled in)
    #[serde(default = "default_true")]
    pub legacy_reader: bool,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            ffmpeg_command: default_ffmpeg_command(),
            sox_command: default_sox_command(),
            timeout_secs: default_conversion_timeout(),
            in_process: true,
            legacy_reader: true,
        }
    }
}

impl ConversionConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn default_primary_command() -> String {
    "tts".to_string()
}

fn default_model() -> String {
    "tts_models/en/ljspeech/glow-tts".to_string()
}

fn default_fallback_model() -> String {
    "tts_models/en/ljspeech/tacotron2-DDC".to_string()
}

fn default_primary_timeout() -> u64 {
    60
}

fn default_system_enabled() -> bool {
    cfg!(target_os = "macos")
}

fn default_system_command() -> String {
    "say".to_string()
}

fn default_voice() -> Option<String> {
    Some("Samantha".to_string())
}

fn default_native_extension() -> String {
    "aiff".to_string()
}

fn default_system_timeout() -> u64 {
    30
}

fn default_ffmpeg_command() -> String {
    "ffmpeg".to_string()
}

fn default_sox_command() -> String {
    "sox".to_string()
}

fn default_conversion_timeout() -> u64 {
    10
}

fn default_true() -> bool {
    true
}
