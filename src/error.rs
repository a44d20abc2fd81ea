//! Error types for option loading and constraint construction
use thiserror::Error;

use crate::variables::VarCategory;

/// Errors raised while loading or validating trajectory options
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required option '{0}'")]
    MissingOption(String),

    #[error("invalid value for option '{path}': {message}")]
    InvalidValue { path: String, message: String },

    #[error("option path '{0}' conflicts with an existing non-table value")]
    PathConflict(String),

    #[error("failed to parse options: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Errors raised while building constraint expressions
///
/// These are construction-time failures: the optimization problem cannot be
/// built and the error is handed back to the caller unchanged.
#[derive(Debug, Error)]
pub enum ConstraintError {
    #[error("variable '{category}.{key}' is not part of the model schema")]
    MissingVariable { category: VarCategory, key: String },

    #[error("component {index} out of range for '{key}' of size {size}")]
    ComponentOutOfRange {
        key: String,
        index: usize,
        size: usize,
    },

    #[error("invalid variable name '{0}'")]
    InvalidVariableName(String),

    #[error("duplicate variable '{0}' in schema")]
    DuplicateVariable(String),

    #[error("node {0} is not part of the system architecture")]
    UnknownNode(u32),

    #[error("invalid architecture: {0}")]
    InvalidArchitecture(String),

    #[error("no spline available for {key}[{dim}]")]
    MissingSpline { key: String, dim: usize },

    #[error("expected {expected} values for '{name}', got {actual}")]
    SizeMismatch {
        name: String,
        expected: usize,
        actual: usize,
    },

    #[error("constraint '{0}' is already present")]
    DuplicateConstraint(String),

    #[error(transparent)]
    Config(#[from] ConfigError),
}
