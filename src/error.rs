//! Error types for plan construction and rendering.
//!
//! Every failure is a validation failure of a malformed plan or an
//! unsupported dialect feature, so nothing here is retryable. Each variant
//! names the logical element and the stage that rejected it.

use std::fmt;

use crate::semantic::{DataType, TimeGranularity};
use crate::sql::Dialect;

/// Result type for compilation.
pub type CompileResult<T> = Result<T, CompileError>;

/// Pipeline stage that raised an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Resolving a query request against the semantic manifest.
    Request,
    Read,
    Join,
    Aggregate,
    ComputeMetrics,
    Render,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Request => "request",
            Stage::Read => "read",
            Stage::Join => "join",
            Stage::Aggregate => "aggregate",
            Stage::ComputeMetrics => "compute metrics",
            Stage::Render => "render",
        };
        f.write_str(name)
    }
}

/// Side of a join on which a key was looked up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinSide {
    Left,
    Right,
}

impl fmt::Display for JoinSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JoinSide::Left => f.write_str("left"),
            JoinSide::Right => f.write_str("right"),
        }
    }
}

/// Errors that can occur while building or rendering a plan.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CompileError {
    #[error("{stage}: unresolved element '{element}' in {scope}{}", did_you_mean(.suggestion))]
    UnresolvedElement {
        stage: Stage,
        scope: String,
        element: String,
        suggestion: Option<String>,
    },

    #[error("join: key '{key}' has type {left} on the left side but {right} on the right side")]
    JoinKeyTypeMismatch {
        key: String,
        left: DataType,
        right: DataType,
    },

    #[error("join: key '{key}' not found on the {side} side (relation '{alias}')")]
    UnresolvedJoinKey {
        key: String,
        side: JoinSide,
        alias: String,
    },

    #[error("join: no join keys given for relation '{alias}'")]
    EmptyJoinKeys { alias: String },

    #[error("{stage}: measure '{measure}' is not available in the input relation")]
    MissingMeasure { measure: String, stage: Stage },

    #[error("{stage}: dimension '{dimension}' is not available in the input relation")]
    MissingDimension { dimension: String, stage: Stage },

    #[error(
        "aggregate: '{dimension}' needs a join on entity '{entity}' that has not been applied yet"
    )]
    AggregationBeforeJoin { dimension: String, entity: String },

    #[error("compute metrics: metric '{metric}' references '{input}', which is not an aggregated output")]
    UnresolvedMetricInput { metric: String, input: String },

    #[error("compute metrics: metric '{metric}' needs aggregated input but got a {input_kind} node")]
    NotAggregated {
        metric: String,
        input_kind: &'static str,
    },

    #[error("compute metrics: metric '{metric}' contains a non-finite literal")]
    InvalidMetricLiteral { metric: String },

    #[error("{dialect}: unsupported dialect feature: {feature}")]
    UnsupportedDialectFeature { dialect: Dialect, feature: String },

    #[error("{stage}: duplicate output column '{name}'")]
    DuplicateColumn { name: String, stage: Stage },

    #[error("read: cannot truncate '{dimension}' to {grain}: {reason}")]
    InvalidTimeGrain {
        dimension: String,
        grain: TimeGranularity,
        reason: String,
    },

    #[error(
        "request: measure '{measure}' lives in '{model}', but the query is anchored on '{expected}'"
    )]
    MultipleMeasureSources {
        measure: String,
        model: String,
        expected: String,
    },

    #[error(
        "request: '{window_model}' has a validity window, but '{model}' has no time dimension to place in it"
    )]
    MissingWindowTime { model: String, window_model: String },

    #[error("{stage}: nothing to select")]
    EmptyQuery { stage: Stage },

    #[error("aggregate: percentile {value} for measure '{measure}' is outside [0, 1]")]
    InvalidPercentile { measure: String, value: f64 },

    #[error("{dialect}: rendered SQL failed to parse: {message}")]
    InvalidOutputSql { dialect: Dialect, message: String },
}

fn did_you_mean(suggestion: &Option<String>) -> String {
    match suggestion {
        Some(s) => format!(". Did you mean '{s}'?"),
        None => String::new(),
    }
}

impl CompileError {
    /// Stage that raised this error.
    pub fn stage(&self) -> Stage {
        match self {
            CompileError::UnresolvedElement { stage, .. }
            | CompileError::MissingMeasure { stage, .. }
            | CompileError::MissingDimension { stage, .. }
            | CompileError::DuplicateColumn { stage, .. }
            | CompileError::EmptyQuery { stage } => *stage,
            CompileError::JoinKeyTypeMismatch { .. }
            | CompileError::UnresolvedJoinKey { .. }
            | CompileError::EmptyJoinKeys { .. } => Stage::Join,
            CompileError::AggregationBeforeJoin { .. } | CompileError::InvalidPercentile { .. } => {
                Stage::Aggregate
            }
            CompileError::UnresolvedMetricInput { .. }
            | CompileError::NotAggregated { .. }
            | CompileError::InvalidMetricLiteral { .. } => Stage::ComputeMetrics,
            CompileError::UnsupportedDialectFeature { .. }
            | CompileError::InvalidOutputSql { .. } => Stage::Render,
            CompileError::InvalidTimeGrain { .. } => Stage::Read,
            CompileError::MultipleMeasureSources { .. }
            | CompileError::MissingWindowTime { .. } => Stage::Request,
        }
    }
}
