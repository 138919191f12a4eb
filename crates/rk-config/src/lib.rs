//! ramkit configuration loading and validation.
//!
//! This crate provides:
//! - Typed settings for analysis defaults, prediction and FMEA scales
//! - MIL-HDBK-217F handbook tables with built-in defaults
//! - Config resolution (CLI → env → XDG → defaults)
//! - Semantic validation

pub mod resolve;
pub mod settings;
pub mod tables;
pub mod validate;

use std::path::{Path, PathBuf};

pub use resolve::{resolve_config, ConfigSource};
pub use settings::{AnalysisSettings, Config, FmeaSettings, PredictionSettings};
pub use tables::{HandbookTables, ENVIRONMENT_COUNT};
pub use validate::{validate_config, ValidationError, ValidationResult};

/// Schema version for configuration files.
pub const CONFIG_SCHEMA_VERSION: &str = "1.0.0";

/// A validated configuration plus where it came from.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config: Config,
    pub path: Option<PathBuf>,
    pub source: ConfigSource,
}

/// Parse and validate configuration JSON.
pub fn parse_config(json: &str) -> ValidationResult<Config> {
    let config: Config =
        serde_json::from_str(json).map_err(|e| ValidationError::ParseError(e.to_string()))?;
    validate_config(&config)?;
    Ok(config)
}

/// Resolve, read, parse and validate the configuration.
///
/// Falls back to [`Config::default`] when no file is found.
pub fn load_config(cli_path: Option<&Path>) -> ValidationResult<LoadedConfig> {
    let (path, source) = resolve_config(cli_path);
    let config = match &path {
        Some(p) => {
            let text = std::fs::read_to_string(p)
                .map_err(|e| ValidationError::IoError(format!("{}: {}", p.display(), e)))?;
            parse_config(&text)?
        }
        None => Config::default(),
    };
    tracing::debug!(
        source = %source,
        path = ?path,
        schema_version = %config.schema_version,
        "configuration resolved"
    );
    Ok(LoadedConfig {
        config,
        path,
        source,
    })
}
