//! End-to-end compilation from a metric query to SQL.
//!
//! ```text
//! QueryRequest → DataflowPlanBuilder → PlanNode → SqlRenderer → SQL
//! ```
//!
//! # Example
//!
//! ```ignore
//! use tally::compile::{compile_query, CompileOptions};
//! use tally::plan::{GroupBy, QueryRequest};
//! use tally::sql::{Dialect, DialectProfile};
//!
//! let request = QueryRequest::new()
//!     .metric("bookings")
//!     .group_by(GroupBy::entity("listing"))
//!     .group_by(GroupBy::dimension("country_latest").via("listing"));
//!
//! let options = CompileOptions::new(DialectProfile::new(Dialect::Snowflake));
//! let output = compile_query(&manifest, &request, &options)?;
//! println!("{}", output.sql);
//! ```

use tracing::info_span;

use crate::error::CompileResult;
use crate::plan::{DataflowPlanBuilder, PlanNode, QueryRequest};
use crate::semantic::SemanticManifest;
use crate::sql::{render, validate_sql, DialectProfile};

// ============================================================================
// Options
// ============================================================================

/// Options for compilation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompileOptions {
    /// Rendering profile.
    pub profile: DialectProfile,
    /// Re-parse the rendered SQL and fail on syntax errors.
    pub validate_output: bool,
}

impl CompileOptions {
    pub fn new(profile: DialectProfile) -> Self {
        Self {
            profile,
            validate_output: false,
        }
    }

    pub fn with_validation(mut self, validate_output: bool) -> Self {
        self.validate_output = validate_output;
        self
    }
}

// ============================================================================
// Result Types
// ============================================================================

/// Result of compiling a query to SQL.
#[derive(Debug, Clone)]
pub struct CompileOutput {
    /// The generated SQL string.
    pub sql: String,

    /// The plan the SQL was rendered from.
    pub plan: PlanNode,

    /// The profile used for rendering.
    pub profile: DialectProfile,
}

// ============================================================================
// Compilation
// ============================================================================

/// Plan and render `request` against `manifest`.
pub fn compile_query(
    manifest: &SemanticManifest,
    request: &QueryRequest,
    options: &CompileOptions,
) -> CompileResult<CompileOutput> {
    let span = info_span!(
        "compile_query",
        dialect = %options.profile.dialect,
        metrics = request.metrics.len()
    );
    let _guard = span.enter();

    let plan = DataflowPlanBuilder::new(manifest).build(request)?;
    compile_plan(plan, options)
}

/// Render an already-built plan.
pub fn compile_plan(plan: PlanNode, options: &CompileOptions) -> CompileResult<CompileOutput> {
    let sql = render(&plan, &options.profile)?;
    if options.validate_output {
        validate_sql(&sql, options.profile.dialect)?;
    }
    Ok(CompileOutput {
        sql,
        plan,
        profile: options.profile.clone(),
    })
}
