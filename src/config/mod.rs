//! Application configuration.
//!
//! Loaded from YAML files and environment variables into a single
//! [`Config`].

use std::path::{Path, PathBuf};

use api_updates_core::Policy;
use serde::Deserialize;

/// Default configuration file name.
pub const DEFAULT_CONFIG_FILE: &str = "api-updates.yaml";
/// Environment variable for configuration file path.
pub const CONFIG_ENV_VAR: &str = "API_UPDATES_CONFIG";
/// Prefix for configuration environment variables.
pub const CONFIG_ENV_PREFIX: &str = "API_UPDATES";
/// Environment variable for logging configuration.
pub const LOG_ENV_VAR: &str = "API_UPDATES_LOG";

/// Configuration loading errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] ::config::ConfigError),

    #[error("baseline manifest `{0}` does not exist")]
    MissingBaseline(PathBuf),
}

/// Main application configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Enforcement policy for compatibility checks.
    pub policy: Policy,
    /// Published manifest to compare the current surface against.
    pub baseline_manifest: Option<PathBuf>,
    /// Inputs for the demo run.
    pub demo: DemoConfig,
}

/// Values the demo passes through the exported entry points.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DemoConfig {
    pub name: String,
    pub internal_value: i32,
    pub some_class_a: i32,
    pub some_class_b: i32,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            name: "John".to_string(),
            internal_value: 25,
            some_class_a: 5,
            some_class_b: 6,
        }
    }
}

impl Config {
    /// Load configuration from file and environment.
    ///
    /// Configuration sources (in order of priority, later overrides earlier):
    /// 1. `api-updates.yaml` in current directory (if exists)
    /// 2. File specified by `path` argument (if provided)
    /// 3. File specified by `CONFIG_ENV_VAR` environment variable (if set)
    /// 4. Environment variables with `CONFIG_ENV_PREFIX` prefix
    pub fn load(path: Option<&str>) -> Result<Self, ConfigError> {
        use ::config::{Config as ConfigLib, Environment, File, FileFormat};

        let mut builder = ConfigLib::builder()
            .add_source(File::new(DEFAULT_CONFIG_FILE, FileFormat::Yaml).required(false));

        if let Some(config_path) = path {
            builder = builder.add_source(File::new(config_path, FileFormat::Yaml).required(true));
        }

        if let Ok(config_path) = std::env::var(CONFIG_ENV_VAR) {
            builder = builder.add_source(File::new(&config_path, FileFormat::Yaml).required(true));
        }

        let config = builder
            .add_source(
                Environment::with_prefix(CONFIG_ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: Config = config.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        match self.baseline_path(&config_base_dir()) {
            Some(path) if !path.exists() => Err(ConfigError::MissingBaseline(path)),
            _ => Ok(()),
        }
    }

    /// Baseline manifest path resolved against `base`.
    pub fn baseline_path(&self, base: &Path) -> Option<PathBuf> {
        self.baseline_manifest.as_ref().map(|p| {
            if p.is_absolute() {
                p.clone()
            } else {
                base.join(p)
            }
        })
    }
}

/// Get the base directory for resolving file references in configs.
///
/// Returns the parent directory of CONFIG_ENV_VAR if set, otherwise current directory.
pub fn config_base_dir() -> PathBuf {
    if let Ok(config_path) = std::env::var(CONFIG_ENV_VAR) {
        Path::new(&config_path)
            .parent()
            .map(|p| p.to_path_buf())
            .unwrap_or_else(|| PathBuf::from("."))
    } else {
        PathBuf::from(".")
    }
}
