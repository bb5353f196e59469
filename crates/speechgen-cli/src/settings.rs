//! Layered configuration loading

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use std::path::{Path, PathBuf};

use speechgen_core::SynthConfig;

const ENV_PREFIX: &str = "SPEECHGEN";

/// Per-user config file, if the platform has a config directory
pub fn user_config_file() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("speechgen").join("config.toml"))
}

/// Defaults, then the user file, then `explicit`, then the environment.
pub fn load(explicit: Option<&Path>) -> Result<SynthConfig> {
    load_from(user_config_file().as_deref(), explicit)
}

fn load_from(user_file: Option<&Path>, explicit: Option<&Path>) -> Result<SynthConfig> {
    let mut builder = Config::builder();

    if let Some(path) = user_file {
        builder = builder.add_source(File::from(path).required(false));
    }
    if let Some(path) = explicit {
        builder = builder.add_source(File::from(path).required(true));
    }

    builder = builder.add_source(
        Environment::with_prefix(ENV_PREFIX)
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true),
    );

    let settings = builder.build().context("Failed to read configuration")?;
    settings
        .try_deserialize::<SynthConfig>()
        .context("Invalid configuration")
}
