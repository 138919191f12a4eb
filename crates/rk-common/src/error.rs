//! Error types for ramkit.
//!
//! This module provides structured error handling with:
//! - Stable error codes for machine parsing
//! - Category classification (input, configuration, I/O)
//! - Remediation suggestions for humans
//! - Suggested actions for scripted callers
//!
//! Degenerate numerical results (a zero hazard rate, a zero variance) are
//! not errors; they are substituted and logged by the calculation layer.
//!
//! # Human-Facing Output
//!
//! ```text
//! ✗ Insufficient Data
//!   Reason: insufficient data: Weibull fit needs at least 2 failures, got 1
//!   Fix: Widen the start/end window or add failure records before fitting.
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// Result type alias for ramkit operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error categories for grouping related errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Malformed or insufficient calculation input, including input
    /// documents that do not parse.
    Input,
    /// Configuration and handbook lookup-table errors.
    Config,
    /// File I/O errors.
    Io,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorCategory::Input => write!(f, "input"),
            ErrorCategory::Config => write!(f, "config"),
            ErrorCategory::Io => write!(f, "io"),
        }
    }
}

/// Suggested actions for scripted callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuggestedAction {
    /// Correct the offending input field.
    FixInput,
    /// Add records or widen the analysis window.
    CollectMoreData,
    /// Pick a compatible fit/confidence method pairing.
    ChangeMethod,
    /// Run `rk config validate`.
    RunCheck,
    /// Fall back to the built-in configuration.
    ResetConfig,
    /// Retry the operation.
    Retry,
    /// Manual intervention required.
    ManualIntervention,
}

impl std::fmt::Display for SuggestedAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SuggestedAction::FixInput => write!(f, "fix_input"),
            SuggestedAction::CollectMoreData => write!(f, "collect_more_data"),
            SuggestedAction::ChangeMethod => write!(f, "change_method"),
            SuggestedAction::RunCheck => write!(f, "run_check"),
            SuggestedAction::ResetConfig => write!(f, "reset_config"),
            SuggestedAction::Retry => write!(f, "retry"),
            SuggestedAction::ManualIntervention => write!(f, "manual_intervention"),
        }
    }
}

/// Unified error type for ramkit.
#[derive(Error, Debug)]
pub enum Error {
    // Input errors (10-19)
    #[error("invalid {field}: {message}")]
    InvalidInput { field: String, message: String },

    #[error("insufficient data: {0}")]
    InsufficientData(String),

    #[error("confidence method {confidence} cannot be used with fit method {fit}")]
    IncompatibleMethods { fit: String, confidence: String },

    #[error("hardware node {id} not found")]
    UnknownNode { id: u32 },

    #[error("expression error: {0}")]
    Expression(String),

    #[error("cannot solve growth plan: {0}")]
    UnsolvablePlan(String),

    // Configuration errors (20-29)
    #[error("configuration error: {0}")]
    Config(String),

    #[error("{table} has no entry for index {index}")]
    LookupOutOfRange { table: String, index: u32 },

    #[error("no hazard-rate model for category {category}, subcategory {subcategory}")]
    UnsupportedCategory { category: u32, subcategory: u32 },

    #[error("schema validation failed: {0}")]
    SchemaValidation(String),

    // I/O errors (60-69)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Shorthand for [`Error::InvalidInput`].
    pub fn invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        Error::InvalidInput {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Shorthand for [`Error::LookupOutOfRange`].
    pub fn lookup(table: impl Into<String>, index: u32) -> Self {
        Error::LookupOutOfRange {
            table: table.into(),
            index,
        }
    }

    /// Returns the error code for this error type.
    ///
    /// Error codes are stable and grouped by category:
    /// - 10-19: Input errors
    /// - 20-29: Configuration errors
    /// - 60-69: I/O and document errors (`Json` is categorised as input)
    pub fn code(&self) -> u32 {
        match self {
            Error::InvalidInput { .. } => 10,
            Error::InsufficientData(_) => 11,
            Error::IncompatibleMethods { .. } => 12,
            Error::UnknownNode { .. } => 13,
            Error::Expression(_) => 14,
            Error::UnsolvablePlan(_) => 15,
            Error::Config(_) => 20,
            Error::LookupOutOfRange { .. } => 21,
            Error::UnsupportedCategory { .. } => 22,
            Error::SchemaValidation(_) => 23,
            Error::Io(_) => 60,
            Error::Json(_) => 61,
        }
    }

    /// Returns the error category for grouping and filtering.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::InvalidInput { .. }
            | Error::InsufficientData(_)
            | Error::IncompatibleMethods { .. }
            | Error::UnknownNode { .. }
            | Error::Expression(_)
            | Error::UnsolvablePlan(_)
            | Error::Json(_) => ErrorCategory::Input,

            Error::Config(_)
            | Error::LookupOutOfRange { .. }
            | Error::UnsupportedCategory { .. }
            | Error::SchemaValidation(_) => ErrorCategory::Config,

            Error::Io(_) => ErrorCategory::Io,
        }
    }

    /// Returns whether this error is potentially recoverable by the caller.
    ///
    /// Input and configuration errors abort only the calculation that raised
    /// them; previously stored results stay valid.
    pub fn is_recoverable(&self) -> bool {
        match self {
            Error::InvalidInput { .. } => true,
            Error::InsufficientData(_) => true,
            Error::IncompatibleMethods { .. } => true,
            Error::UnknownNode { .. } => false,
            Error::Expression(_) => true,
            Error::UnsolvablePlan(_) => true,

            Error::Config(_) => true,
            Error::LookupOutOfRange { .. } => true,
            Error::UnsupportedCategory { .. } => false,
            Error::SchemaValidation(_) => true,

            Error::Io(_) => true,
            Error::Json(_) => true,
        }
    }

    /// Returns the suggested action for scripted callers.
    pub fn suggested_action(&self) -> SuggestedAction {
        match self {
            Error::InvalidInput { .. } => SuggestedAction::FixInput,
            Error::InsufficientData(_) => SuggestedAction::CollectMoreData,
            Error::IncompatibleMethods { .. } => SuggestedAction::ChangeMethod,
            Error::UnknownNode { .. } => SuggestedAction::FixInput,
            Error::Expression(_) => SuggestedAction::FixInput,
            Error::UnsolvablePlan(_) => SuggestedAction::FixInput,

            Error::Config(_) => SuggestedAction::RunCheck,
            Error::LookupOutOfRange { .. } => SuggestedAction::FixInput,
            Error::UnsupportedCategory { .. } => SuggestedAction::ManualIntervention,
            Error::SchemaValidation(_) => SuggestedAction::ResetConfig,

            Error::Io(_) => SuggestedAction::Retry,
            Error::Json(_) => SuggestedAction::FixInput,
        }
    }

    /// Returns a human-readable remediation hint.
    pub fn remediation(&self) -> &'static str {
        match self {
            Error::InvalidInput { .. } => {
                "Correct the named field. Confidence must lie in (0, 1) and times must be non-negative."
            }
            Error::InsufficientData(_) => {
                "Widen the start/end window or add failure records before fitting."
            }
            Error::IncompatibleMethods { .. } => {
                "MLE pairs with Crow, Fisher matrix or bootstrap bounds; rank regression pairs with Duane bounds."
            }
            Error::UnknownNode { .. } => {
                "Check the parent/child ids in the hardware tree input."
            }
            Error::Expression(_) => {
                "Use only hr, pi1-pi8, uf1-uf3, ui1-ui3, res1-res5, numbers, + - * / ^ and exp/ln/log10/sqrt/abs."
            }
            Error::UnsolvablePlan(_) => {
                "Supply the prerequisite planning values; each unknown needs the others it is solved from."
            }

            Error::Config(_) => {
                "Run 'rk config validate' to check the configuration file."
            }
            Error::LookupOutOfRange { .. } => {
                "The environment, quality or type index is outside the handbook table. Check the part's indices."
            }
            Error::UnsupportedCategory { .. } => {
                "Only capacitor, connection, relay, meter and optoelectronic categories have prediction models."
            }
            Error::SchemaValidation(_) => {
                "Ensure the configuration matches the expected schema version, or remove it to use built-in defaults."
            }

            Error::Io(_) => {
                "Check that the input file exists and is readable. Retry the operation."
            }
            Error::Json(_) => {
                "Invalid JSON input. Check syntax with 'jq . <file>'."
            }
        }
    }

    /// Returns a short headline for human-readable output.
    pub fn headline(&self) -> &'static str {
        match self {
            Error::InvalidInput { .. } => "Invalid Input",
            Error::InsufficientData(_) => "Insufficient Data",
            Error::IncompatibleMethods { .. } => "Incompatible Methods",
            Error::UnknownNode { .. } => "Unknown Hardware Node",
            Error::Expression(_) => "Expression Error",
            Error::UnsolvablePlan(_) => "Unsolvable Growth Plan",

            Error::Config(_) => "Configuration Error",
            Error::LookupOutOfRange { .. } => "Lookup Out Of Range",
            Error::UnsupportedCategory { .. } => "Unsupported Category",
            Error::SchemaValidation(_) => "Schema Validation Failed",

            Error::Io(_) => "I/O Error",
            Error::Json(_) => "JSON Parse Error",
        }
    }
}

/// Structured error response for JSON output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StructuredError {
    /// Stable error code.
    pub code: u32,

    /// Error category for grouping.
    pub category: ErrorCategory,

    /// Human-readable error message.
    pub message: String,

    /// Whether the error is potentially recoverable.
    pub recoverable: bool,

    /// Suggested action for scripted callers.
    pub suggested_action: SuggestedAction,

    /// Additional structured context (field name, table, node id).
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub context: HashMap<String, serde_json::Value>,
}

impl From<&Error> for StructuredError {
    fn from(err: &Error) -> Self {
        let mut context = HashMap::new();

        match err {
            Error::InvalidInput { field, .. } => {
                context.insert("field".to_string(), serde_json::json!(field));
            }
            Error::IncompatibleMethods { fit, confidence } => {
                context.insert("fit_method".to_string(), serde_json::json!(fit));
                context.insert("confidence_method".to_string(), serde_json::json!(confidence));
            }
            Error::UnknownNode { id } => {
                context.insert("node_id".to_string(), serde_json::json!(id));
            }
            Error::LookupOutOfRange { table, index } => {
                context.insert("table".to_string(), serde_json::json!(table));
                context.insert("index".to_string(), serde_json::json!(index));
            }
            Error::UnsupportedCategory {
                category,
                subcategory,
            } => {
                context.insert("category_id".to_string(), serde_json::json!(category));
                context.insert("subcategory_id".to_string(), serde_json::json!(subcategory));
            }
            _ => {}
        }

        StructuredError {
            code: err.code(),
            category: err.category(),
            message: err.to_string(),
            recoverable: err.is_recoverable(),
            suggested_action: err.suggested_action(),
            context,
        }
    }
}

impl StructuredError {
    /// Add additional context to the error.
    pub fn with_context(mut self, key: impl Into<String>, value: impl Serialize) -> Self {
        if let Ok(v) = serde_json::to_value(value) {
            self.context.insert(key.into(), v);
        }
        self
    }

    /// Serialize to JSON string.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| {
            format!(r#"{{"code":{},"error":"serialization_failed"}}"#, self.code)
        })
    }
}

/// Format an error for human-readable stderr output.
///
/// Output format:
/// ```text
/// ✗ [Headline]
///   Reason: [Error message]
///   Fix: [Remediation hint]
/// ```
pub fn format_error_human(err: &Error, use_color: bool) -> String {
    let (red, cyan, reset) = if use_color {
        ("\x1b[31m", "\x1b[36m", "\x1b[0m")
    } else {
        ("", "", "")
    };

    format!(
        "{red}✗{reset} {headline}\n  Reason: {message}\n  {cyan}Fix:{reset} {remediation}",
        red = red,
        cyan = cyan,
        reset = reset,
        headline = err.headline(),
        message = err,
        remediation = err.remediation()
    )
}
