//! # Tally
//!
//! Compiles metric queries over a semantic layer into multi-dialect SQL.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │        SemanticManifest + QueryRequest (metrics,         │
//! │              group-by items, time grains)                │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [plan builder]
//! ┌─────────────────────────────────────────────────────────┐
//! │                   Dataflow Plan                          │
//! │   Read → Join → Aggregate → Compute Metrics              │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [renderer + dialect profile]
//! ┌─────────────────────────────────────────────────────────┐
//! │               Nested SELECT (SQL text)                   │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! Compilation is pure and synchronous. A [`semantic::SemanticManifest`] is
//! immutable, so any number of compilations can share it by reference.

pub mod compile;
pub mod config;
pub mod error;
pub mod plan;
pub mod semantic;
pub mod sql;

pub use sql::dialect;

/// Re-exports for convenient usage.
pub mod prelude {
    pub use crate::compile::{compile_plan, compile_query, CompileOptions, CompileOutput};
    pub use crate::error::{CompileError, CompileResult, Stage};
    pub use crate::plan::{DataflowPlanBuilder, GroupBy, PlanNode, QueryRequest};
    pub use crate::semantic::{
        AggregationType, DataType, Dimension, Entity, Measure, Metric, MetricExpr,
        SemanticManifest, SemanticModel, TableName, TimeGranularity,
    };
    pub use crate::sql::{Dialect, DialectProfile, DivisionStyle, QuotePolicy, SqlDialect};
}

// Also export at crate root for convenience
pub use compile::{compile_plan, compile_query, CompileOptions, CompileOutput};
pub use error::{CompileError, CompileResult};
pub use sql::{render, Dialect, DialectProfile};
