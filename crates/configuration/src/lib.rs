//! # Anthropo Configuration
//!
//! Loads and validates the application settings, and owns the logging bootstrap.
//!
//! Settings are layered: built-in defaults, then `config.toml` (optional), then
//! environment variables prefixed with `ANTHROPO` using `__` as the section
//! separator (e.g. `ANTHROPO__ENGINE__ADJUSTMENT_FACTOR=0.94`).

use crate::error::ConfigError;
use std::path::Path;

// Declare the modules that make up this crate.
pub mod error;
pub mod logging;
pub mod settings;

// Re-export the core types to provide a clean public API.
pub use logging::init_tracing;
pub use settings::{
    Config, DEFAULT_ADJUSTMENT_FACTOR, DatabaseSettings, EngineSettings,
    LoggingSettings, MAX_ADJUSTMENT_FACTOR, PopulationStatSettings, ReferenceSettings,
};

/// Loads the application configuration from `config.toml` in the working directory.
///
/// A missing file is not an error; the defaults apply.
pub fn load_config() -> Result<Config, ConfigError> {
    build(config::File::with_name("config").required(false))
}

/// Loads the application configuration from an explicit file, which must exist.
pub fn load_config_from(path: impl AsRef<Path>) -> Result<Config, ConfigError> {
    build(config::File::from(path.as_ref()).required(true))
}

fn build<S>(file: S) -> Result<Config, ConfigError>
where
    S: config::Source + Send + Sync + 'static,
{
    let builder = config::Config::builder()
        .add_source(file)
        .add_source(
            config::Environment::with_prefix("ANTHROPO")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    // Attempt to deserialize the entire configuration into our `Config` struct
    let config = builder.try_deserialize::<Config>()?;
    config.validate()?;

    Ok(config)
}
