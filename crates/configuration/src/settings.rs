use crate::error::ConfigError;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::PathBuf;

/// Instrument/compressibility correction applied to skinfolds, perimeters and diameters.
pub const DEFAULT_ADJUSTMENT_FACTOR: f64 = 0.935;

/// Upper bound (inclusive) for the correction factor.
pub const MAX_ADJUSTMENT_FACTOR: f64 = 2.0;

/// The root configuration structure for the entire application.
///
/// Every section has defaults, so a missing `config.toml` still yields a
/// usable configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub engine: EngineSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
    #[serde(default)]
    pub reference: ReferenceSettings,
    #[serde(default)]
    pub database: DatabaseSettings,
}

/// Parameters of the composition engine itself.
#[derive(Debug, Clone, Deserialize)]
pub struct EngineSettings {
    /// Multiplier applied to every non-basic reading to produce its adjusted value.
    #[serde(default = "default_adjustment_factor")]
    pub adjustment_factor: f64,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            adjustment_factor: DEFAULT_ADJUSTMENT_FACTOR,
        }
    }
}

/// Where and how verbosely to log.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    /// An `EnvFilter` directive, used when `RUST_LOG` is not set.
    #[serde(default = "default_log_level")]
    pub level: String,
    /// When set, logs are also written to a daily-rolling file in this directory.
    #[serde(default)]
    pub directory: Option<PathBuf>,
    #[serde(default = "default_file_prefix")]
    pub file_prefix: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            directory: None,
            file_prefix: default_file_prefix(),
        }
    }
}

/// Per-field overrides of the built-in reference tables, keyed by field key.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReferenceSettings {
    /// %ETM overrides.
    #[serde(default)]
    pub etm: HashMap<String, f64>,
    /// Population mean/SD overrides.
    #[serde(default)]
    pub population: HashMap<String, PopulationStatSettings>,
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct PopulationStatSettings {
    pub mean: f64,
    pub sd: f64,
}

/// Connection pool tuning. The URL itself comes from `DATABASE_URL`.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_acquire_timeout_secs")]
    pub acquire_timeout_secs: u64,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            max_connections: default_max_connections(),
            acquire_timeout_secs: default_acquire_timeout_secs(),
        }
    }
}

fn default_adjustment_factor() -> f64 {
    DEFAULT_ADJUSTMENT_FACTOR
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_file_prefix() -> String {
    "anthropo.log".to_string()
}

fn default_max_connections() -> u32 {
    10
}

fn default_acquire_timeout_secs() -> u64 {
    5
}

impl Config {
    /// Checks the values that serde cannot: numeric ranges and finiteness.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let factor = self.engine.adjustment_factor;
        if !factor.is_finite() || factor <= 0.0 || factor > MAX_ADJUSTMENT_FACTOR {
            return Err(ConfigError::ValidationError(format!(
                "engine.adjustment_factor must be in (0, {}], got {}",
                MAX_ADJUSTMENT_FACTOR, factor
            )));
        }

        for (key, etm) in &self.reference.etm {
            if !etm.is_finite() || *etm < 0.0 {
                return Err(ConfigError::ValidationError(format!(
                    "reference.etm.{} must be a non-negative number, got {}",
                    key, etm
                )));
            }
        }

        for (key, stat) in &self.reference.population {
            if !stat.mean.is_finite() {
                return Err(ConfigError::ValidationError(format!(
                    "reference.population.{}.mean must be finite, got {}",
                    key, stat.mean
                )));
            }
            if !stat.sd.is_finite() || stat.sd < 0.0 {
                return Err(ConfigError::ValidationError(format!(
                    "reference.population.{}.sd must be a non-negative number, got {}",
                    key, stat.sd
                )));
            }
        }

        if self.database.max_connections == 0 {
            return Err(ConfigError::ValidationError(
                "database.max_connections must be at least 1".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = Config::default();
        assert_eq!(config.engine.adjustment_factor, DEFAULT_ADJUSTMENT_FACTOR);
        assert_eq!(config.logging.level, "info");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn rejects_out_of_range_factor() {
        let mut config = Config::default();
        config.engine.adjustment_factor = 0.0;
        assert!(matches!(config.validate(), Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn rejects_negative_sd() {
        let mut config = Config::default();
        config
            .reference
            .population
            .insert("skinfold_triceps".to_string(), PopulationStatSettings { mean: 9.8, sd: -1.0 });
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("skinfold_triceps"));
    }
}
