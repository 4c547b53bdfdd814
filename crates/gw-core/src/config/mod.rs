//! Solver configuration loading and validation for gw-core.
//!
//! This module handles:
//! - Loading the solver JSON file
//! - Config resolution order (CLI > env > defaults)
//! - Schema version check
//! - Semantic validation (positive tolerances, non-zero iteration caps)

use std::path::{Path, PathBuf};

use gw_math::{FixedPointTolerance, RootSolverOptions};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::exit_codes::ExitCode;

/// Schema version for configuration files.
pub const CONFIG_SCHEMA_VERSION: &str = "1.0.0";

/// Environment variable naming a config file.
pub const CONFIG_ENV_VAR: &str = "GW_CONFIG";

/// Errors that can occur during config loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config file not found: {path}")]
    NotFound { path: PathBuf },

    #[error("Invalid JSON in config file {path}: {source}")]
    ParseError {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("I/O error reading {path}: {source}")]
    IoError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Schema version mismatch: expected {expected}, got {actual}")]
    VersionMismatch { expected: String, actual: String },

    #[error("Semantic validation failed in {section}: {source}")]
    ValidationError {
        section: &'static str,
        #[source]
        source: gw_math::Error,
    },
}

impl ConfigError {
    pub fn exit_code(&self) -> ExitCode {
        match self {
            ConfigError::IoError { .. } => ExitCode::IoError,
            _ => ExitCode::ConfigError,
        }
    }
}

/// Numerical options shared by every command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    pub schema_version: String,
    /// Extinction-probability fixed-point iteration.
    pub fixed_point: FixedPointTolerance,
    /// Growth-rate root search.
    pub root_solver: RootSolverOptions,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            schema_version: CONFIG_SCHEMA_VERSION.to_string(),
            fixed_point: FixedPointTolerance::default(),
            root_solver: RootSolverOptions::default(),
        }
    }
}

impl SolverConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.fixed_point
            .validate()
            .map_err(|source| ConfigError::ValidationError {
                section: "fixed_point",
                source,
            })?;
        self.root_solver
            .validate()
            .map_err(|source| ConfigError::ValidationError {
                section: "root_solver",
                source,
            })?;
        Ok(())
    }
}

/// Where the resolved configuration came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfigSource {
    Cli,
    Env,
    Default,
}

/// Resolved configuration with provenance information.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub solver: SolverConfig,
    /// Path to the config file (None if using defaults).
    pub path: Option<PathBuf>,
    pub source: ConfigSource,
}

/// Configuration resolution options.
#[derive(Debug, Default)]
pub struct ConfigOptions {
    /// Explicit config file (highest priority).
    pub config_path: Option<PathBuf>,
}

/// Load configuration with the standard resolution order.
///
/// Resolution order (highest to lowest priority):
/// 1. Explicit CLI flag (via ConfigOptions)
/// 2. Environment variable (GW_CONFIG)
/// 3. Built-in defaults
pub fn load_config(options: &ConfigOptions) -> Result<ResolvedConfig, ConfigError> {
    load_config_with(options, std::env::var_os(CONFIG_ENV_VAR).map(PathBuf::from))
}

fn load_config_with(
    options: &ConfigOptions,
    env_path: Option<PathBuf>,
) -> Result<ResolvedConfig, ConfigError> {
    let (path, source) = match (&options.config_path, env_path) {
        (Some(path), _) => (path.clone(), ConfigSource::Cli),
        (None, Some(path)) => (path, ConfigSource::Env),
        (None, None) => {
            return Ok(ResolvedConfig {
                solver: SolverConfig::default(),
                path: None,
                source: ConfigSource::Default,
            })
        }
    };
    let solver = load_config_from_file(&path)?;
    Ok(ResolvedConfig {
        solver,
        path: Some(path),
        source,
    })
}

/// Load and validate a config from a specific file.
pub fn load_config_from_file(path: &Path) -> Result<SolverConfig, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::NotFound {
            path: path.to_path_buf(),
        });
    }
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::IoError {
        path: path.to_path_buf(),
        source: e,
    })?;
    parse_config(path, &content)
}

fn parse_config(path: &Path, content: &str) -> Result<SolverConfig, ConfigError> {
    let config: SolverConfig =
        serde_json::from_str(content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            source: e,
        })?;

    if config.schema_version != CONFIG_SCHEMA_VERSION {
        return Err(ConfigError::VersionMismatch {
            expected: CONFIG_SCHEMA_VERSION.to_string(),
            actual: config.schema_version,
        });
    }

    config.validate()?;
    Ok(config)
}
