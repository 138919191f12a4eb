//! Configuration validation errors and semantic validation.

use thiserror::Error;

use crate::settings::{AnalysisSettings, Config, FmeaSettings, PredictionSettings};
use crate::tables::ENVIRONMENT_COUNT;

/// Validation result type.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Configuration validation errors.
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("I/O error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Semantic validation failed: {0}")]
    SemanticError(String),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },

    #[error("Version mismatch: expected {expected}, got {actual}")]
    VersionMismatch { expected: String, actual: String },
}

impl ValidationError {
    /// Error code for structured error reporting.
    pub fn code(&self) -> u32 {
        match self {
            ValidationError::IoError(_) => 60,
            ValidationError::ParseError(_) => 61,
            ValidationError::SemanticError(_) => 63,
            ValidationError::InvalidValue { .. } => 65,
            ValidationError::VersionMismatch { .. } => 66,
        }
    }
}

impl From<ValidationError> for rk_common::Error {
    fn from(err: ValidationError) -> Self {
        match err {
            ValidationError::VersionMismatch { .. } => {
                rk_common::Error::SchemaValidation(err.to_string())
            }
            other => rk_common::Error::Config(other.to_string()),
        }
    }
}

fn invalid(field: impl Into<String>, message: String) -> ValidationError {
    ValidationError::InvalidValue {
        field: field.into(),
        message,
    }
}

/// Validate a configuration semantically.
pub fn validate_config(config: &Config) -> ValidationResult<()> {
    if config.schema_version != crate::CONFIG_SCHEMA_VERSION {
        return Err(ValidationError::VersionMismatch {
            expected: crate::CONFIG_SCHEMA_VERSION.to_string(),
            actual: config.schema_version.clone(),
        });
    }

    validate_analysis(&config.analysis)?;
    validate_prediction(&config.prediction)?;
    validate_fmea(&config.fmea)?;
    validate_tables(config)?;

    Ok(())
}

fn validate_analysis(a: &AnalysisSettings) -> ValidationResult<()> {
    if !(a.confidence > 0.0 && a.confidence < 1.0) {
        return Err(invalid(
            "analysis.confidence",
            format!("Must be in (0, 1), got {}", a.confidence),
        ));
    }
    if a.bootstrap_samples == 0 {
        return Err(invalid(
            "analysis.bootstrap_samples",
            "Must be positive, got 0".to_string(),
        ));
    }
    if !(a.solver_tolerance > 0.0) {
        return Err(invalid(
            "analysis.solver_tolerance",
            format!("Must be positive, got {}", a.solver_tolerance),
        ));
    }
    if a.max_iterations == 0 {
        return Err(invalid(
            "analysis.max_iterations",
            "Must be positive, got 0".to_string(),
        ));
    }
    Ok(())
}

fn validate_prediction(p: &PredictionSettings) -> ValidationResult<()> {
    if !(p.rate_multiplier > 0.0) {
        return Err(invalid(
            "prediction.rate_multiplier",
            format!("Must be positive, got {}", p.rate_multiplier),
        ));
    }
    for id in &p.benign_environments {
        if *id == 0 || *id as usize > ENVIRONMENT_COUNT {
            return Err(invalid(
                "prediction.benign_environments",
                format!("Environment ids must be in 1..={}, got {}", ENVIRONMENT_COUNT, id),
            ));
        }
    }
    Ok(())
}

fn validate_fmea(f: &FmeaSettings) -> ValidationResult<()> {
    for (name, scale) in [
        ("fmea.severity_scale", &f.severity_scale),
        ("fmea.occurrence_scale", &f.occurrence_scale),
        ("fmea.detection_scale", &f.detection_scale),
    ] {
        if scale.len() != 10 {
            return Err(invalid(
                name,
                format!("Must name exactly 10 ranks, got {}", scale.len()),
            ));
        }
    }
    for (label, p) in &f.effect_probabilities {
        if !(0.0..=1.0).contains(p) {
            return Err(invalid(
                format!("fmea.effect_probabilities.{}", label),
                format!("Must be in [0, 1], got {}", p),
            ));
        }
    }
    Ok(())
}

fn validate_tables(config: &Config) -> ValidationResult<()> {
    for (name, row) in config.tables.environment_rows() {
        if row.len() != ENVIRONMENT_COUNT {
            return Err(ValidationError::SemanticError(format!(
                "{} must have {} environment entries, got {}",
                name,
                ENVIRONMENT_COUNT,
                row.len()
            )));
        }
        if let Some(v) = row.iter().find(|v| !(**v >= 0.0)) {
            return Err(invalid(name, format!("Must be non-negative, got {}", v)));
        }
    }

    let cap = &config.tables.capacitor;
    let factor_lists = [
        ("capacitor.part_count_pi_q", &cap.part_count_pi_q),
        ("relay.pi_q", &config.tables.relay.pi_q),
        ("optoelectronic.pi_q", &config.tables.optoelectronic.pi_q),
        ("meter.panel_pi_q", &config.tables.meter.panel_pi_q),
        ("connection.pi_k", &config.tables.connection.pi_k),
        ("connection.pi_q", &config.tables.connection.pi_q),
    ];
    for (name, list) in factor_lists {
        if let Some(v) = list.iter().find(|v| !(**v >= 0.0)) {
            return Err(invalid(name, format!("Must be non-negative, got {}", v)));
        }
    }
    for (sub, list) in &cap.part_stress_pi_q {
        if let Some(v) = list.iter().find(|v| !(**v >= 0.0)) {
            return Err(invalid(
                format!("capacitor.part_stress_pi_q.{}", sub),
                format!("Must be non-negative, got {}", v),
            ));
        }
    }
    for (rated, t) in &cap.reference_temperatures {
        if !(*t > 0.0) {
            return Err(invalid(
                format!("capacitor.reference_temperatures.{}", rated),
                format!("Must be positive kelvin, got {}", t),
            ));
        }
    }
    Ok(())
}
