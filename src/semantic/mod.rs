//! Semantic layer metadata consumed by the planner.
//!
//! - [`model`] - semantic models, entities, dimensions, measures
//! - [`metric`] - metric definitions and formulas
//! - [`manifest`] - the resolved registry of models and metrics

pub mod manifest;
pub mod metric;
pub mod model;

pub use manifest::{suggest_closest, SemanticManifest};
pub use metric::{ArithmeticOp, Metric, MetricExpr};
pub use model::{
    AggregationType, DataType, Dimension, DimensionKind, Element, Entity, EntityKind, Measure,
    MeasureExpr, SemanticModel, TableName, TimeGranularity, ValidityWindow,
};
