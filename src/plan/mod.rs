//! Dataflow plan: an immutable tree of relational stages.
//!
//! ```text
//! ComputeMetrics ── Aggregate ── Join ─┬─ Read (primary source)
//!                                      └─ Read (linked source) ...
//! ```
//!
//! Each node owns its children, carries a deterministic alias and exposes
//! an ordered list of [`ColumnBinding`]s. Nodes are only built through the
//! planners in this module, which check every invariant on construction.

pub mod aggregate;
pub mod alias;
pub mod builder;
pub mod join;
pub mod metrics;
pub mod reader;

pub use aggregate::{plan_aggregate, MeasureSpec};
pub use alias::AliasGenerator;
pub use builder::{DataflowPlanBuilder, GroupBy, QueryRequest};
pub use join::{plan_join, JoinRole, JoinTarget, WindowJoin};
pub use metrics::{plan_metrics, MetricSpec};
pub use reader::{ElementRequest, SourceReader};

pub use crate::semantic::MetricExpr;

use crate::error::{CompileError, CompileResult, Stage};
use crate::semantic::{DataType, TableName};
use crate::sql::expr::{table_col, Expr};

/// What a column of a relation represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Entity,
    Dimension,
    TimeDimension,
    /// Row-level measure value, or its aggregate after an Aggregate node.
    Measure,
    Metric,
}

impl ColumnKind {
    /// Usable as a GROUP BY key.
    pub fn is_groupable(&self) -> bool {
        matches!(
            self,
            ColumnKind::Entity | ColumnKind::Dimension | ColumnKind::TimeDimension
        )
    }
}

/// A logical output column: name, defining expression, kind, type.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnBinding {
    pub name: String,
    pub expr: Expr,
    pub kind: ColumnKind,
    pub data_type: Option<DataType>,
}

impl ColumnBinding {
    pub fn new(name: &str, expr: Expr, kind: ColumnKind, data_type: Option<DataType>) -> Self {
        Self {
            name: name.into(),
            expr,
            kind,
            data_type,
        }
    }

    /// The same column, selected by name from the relation aliased `alias`.
    pub fn passthrough(&self, alias: &str) -> Self {
        Self {
            name: self.name.clone(),
            expr: table_col(alias, &self.name),
            kind: self.kind,
            data_type: self.data_type,
        }
    }
}

/// Ordered, duplicate-free group key names.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupKeySet {
    keys: Vec<String>,
}

impl GroupKeySet {
    pub fn new<I, S>(keys: I) -> CompileResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut set = Vec::new();
        for key in keys {
            let key = key.into();
            if set.contains(&key) {
                return Err(CompileError::DuplicateColumn {
                    name: key,
                    stage: Stage::Aggregate,
                });
            }
            set.push(key);
        }
        Ok(Self { keys: set })
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.keys.iter().map(String::as_str)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.keys
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.keys.iter().any(|k| k == key)
    }
}

/// Reads elements of one semantic model from its physical table.
#[derive(Debug, Clone, PartialEq)]
pub struct ReadNode {
    alias: String,
    model: String,
    table: TableName,
    table_alias: String,
    outputs: Vec<ColumnBinding>,
}

impl ReadNode {
    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn table(&self) -> &TableName {
        &self.table
    }

    pub fn table_alias(&self) -> &str {
        &self.table_alias
    }
}

/// Join kind emitted for a join target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinKind {
    Inner,
    LeftOuter,
}

/// One key equality: `<left_alias>.<left_column> = <right>.<right_column>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinCondition {
    pub key: String,
    pub left_alias: String,
    pub left_column: String,
    pub right_column: String,
}

/// Range predicate against a validity window on the right side:
/// `left.time >= right.start AND (left.time < right.end OR right.end IS NULL)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowCondition {
    pub left_alias: String,
    pub left_column: String,
    pub start_column: String,
    pub end_column: String,
}

/// One right-hand side of a left-deep join.
#[derive(Debug, Clone, PartialEq)]
pub struct JoinSpec {
    pub right: PlanNode,
    pub kind: JoinKind,
    pub conditions: Vec<JoinCondition>,
    pub window: Option<WindowCondition>,
    pub prefix: Option<String>,
}

/// A primary relation joined with one or more secondary relations.
#[derive(Debug, Clone, PartialEq)]
pub struct JoinNode {
    alias: String,
    left: Box<PlanNode>,
    joins: Vec<JoinSpec>,
    outputs: Vec<ColumnBinding>,
}

impl JoinNode {
    pub fn left(&self) -> &PlanNode {
        &self.left
    }

    pub fn joins(&self) -> &[JoinSpec] {
        &self.joins
    }
}

/// Groups its input by a key set and aggregates measures.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregateNode {
    alias: String,
    input: Box<PlanNode>,
    group_keys: GroupKeySet,
    measures: Vec<MeasureSpec>,
    outputs: Vec<ColumnBinding>,
}

impl AggregateNode {
    pub fn input(&self) -> &PlanNode {
        &self.input
    }

    pub fn group_keys(&self) -> &GroupKeySet {
        &self.group_keys
    }

    pub fn measures(&self) -> &[MeasureSpec] {
        &self.measures
    }
}

/// Evaluates metric formulas over aggregated columns.
#[derive(Debug, Clone, PartialEq)]
pub struct ComputeMetricsNode {
    alias: String,
    input: Box<PlanNode>,
    group_keys: GroupKeySet,
    metrics: Vec<MetricSpec>,
    outputs: Vec<ColumnBinding>,
}

impl ComputeMetricsNode {
    pub fn input(&self) -> &PlanNode {
        &self.input
    }

    pub fn group_keys(&self) -> &GroupKeySet {
        &self.group_keys
    }

    pub fn metrics(&self) -> &[MetricSpec] {
        &self.metrics
    }
}

/// A node of the dataflow plan.
#[derive(Debug, Clone, PartialEq)]
pub enum PlanNode {
    Read(ReadNode),
    Join(JoinNode),
    Aggregate(AggregateNode),
    ComputeMetrics(ComputeMetricsNode),
}

impl PlanNode {
    pub fn alias(&self) -> &str {
        match self {
            PlanNode::Read(n) => &n.alias,
            PlanNode::Join(n) => &n.alias,
            PlanNode::Aggregate(n) => &n.alias,
            PlanNode::ComputeMetrics(n) => &n.alias,
        }
    }

    pub fn outputs(&self) -> &[ColumnBinding] {
        match self {
            PlanNode::Read(n) => &n.outputs,
            PlanNode::Join(n) => &n.outputs,
            PlanNode::Aggregate(n) => &n.outputs,
            PlanNode::ComputeMetrics(n) => &n.outputs,
        }
    }

    pub fn column(&self, name: &str) -> Option<&ColumnBinding> {
        self.outputs().iter().find(|c| c.name == name)
    }

    pub fn output_names(&self) -> Vec<&str> {
        self.outputs().iter().map(|c| c.name.as_str()).collect()
    }

    /// Direct children, left to right.
    pub fn children(&self) -> Vec<&PlanNode> {
        match self {
            PlanNode::Read(_) => Vec::new(),
            PlanNode::Join(n) => std::iter::once(n.left.as_ref())
                .chain(n.joins.iter().map(|j| &j.right))
                .collect(),
            PlanNode::Aggregate(n) => vec![n.input.as_ref()],
            PlanNode::ComputeMetrics(n) => vec![n.input.as_ref()],
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            PlanNode::Read(_) => "read",
            PlanNode::Join(_) => "join",
            PlanNode::Aggregate(_) => "aggregate",
            PlanNode::ComputeMetrics(_) => "compute metrics",
        }
    }

    /// Stage comment rendered above this node's SELECT.
    pub fn description(&self) -> String {
        match self {
            PlanNode::Read(n) => format!("Read Elements From Semantic Model '{}'", n.model),
            PlanNode::Join(_) => "Join Standard Outputs".to_string(),
            PlanNode::Aggregate(_) => "Aggregate Measures".to_string(),
            PlanNode::ComputeMetrics(_) => "Compute Metrics via Expressions".to_string(),
        }
    }

    /// Number of nodes in this subtree.
    pub fn node_count(&self) -> usize {
        1 + self.children().iter().map(|c| c.node_count()).sum::<usize>()
    }
}

/// Reject repeated output names within one node.
fn ensure_unique(outputs: &[ColumnBinding], stage: Stage) -> CompileResult<()> {
    for (i, binding) in outputs.iter().enumerate() {
        if outputs[..i].iter().any(|b| b.name == binding.name) {
            return Err(CompileError::DuplicateColumn {
                name: binding.name.clone(),
                stage,
            });
        }
    }
    Ok(())
}
