//! Metric expression compiler: turns metric formulas into expressions over
//! an aggregated relation.

use tracing::debug;

use super::{
    ensure_unique, AliasGenerator, ColumnBinding, ColumnKind, ComputeMetricsNode, PlanNode,
};
use crate::error::{CompileError, CompileResult, Stage};
use crate::semantic::{ArithmeticOp, DataType, MetricExpr};
use crate::sql::expr::{lit_float, table_col, Expr, ExprExt};

/// A metric to compute, by output name.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricSpec {
    pub name: String,
    pub expr: MetricExpr,
}

impl MetricSpec {
    pub fn new(name: &str, expr: MetricExpr) -> Self {
        Self {
            name: name.into(),
            expr,
        }
    }
}

/// Build a ComputeMetricsNode over an aggregated `input`.
///
/// Group keys pass through unchanged, followed by one column per metric.
pub fn plan_metrics(
    input: PlanNode,
    metrics: Vec<MetricSpec>,
    aliases: &mut AliasGenerator,
) -> CompileResult<PlanNode> {
    let group_keys = match &input {
        PlanNode::Aggregate(n) => n.group_keys().clone(),
        PlanNode::ComputeMetrics(n) => n.group_keys().clone(),
        other => {
            return Err(CompileError::NotAggregated {
                metric: metrics.first().map(|m| m.name.clone()).unwrap_or_default(),
                input_kind: other.kind_name(),
            })
        }
    };
    if metrics.is_empty() {
        return Err(CompileError::EmptyQuery {
            stage: Stage::ComputeMetrics,
        });
    }

    let source = input.alias().to_string();
    let mut outputs: Vec<ColumnBinding> = group_keys
        .iter()
        .filter_map(|key| input.column(key))
        .map(|c| c.passthrough(&source))
        .collect();

    let compiler = MetricCompiler {
        input: &input,
        source: &source,
    };
    for spec in &metrics {
        let (expr, data_type) = compiler.compile(&spec.name, &spec.expr)?;
        outputs.push(ColumnBinding::new(
            &spec.name,
            expr,
            ColumnKind::Metric,
            data_type,
        ));
    }
    ensure_unique(&outputs, Stage::ComputeMetrics)?;

    let alias = aliases.subquery();
    debug!(
        alias = %alias,
        metrics = metrics.len(),
        "planned compute metrics node"
    );

    Ok(PlanNode::ComputeMetrics(ComputeMetricsNode {
        alias,
        input: Box::new(input),
        group_keys,
        metrics,
        outputs,
    }))
}

struct MetricCompiler<'a> {
    input: &'a PlanNode,
    source: &'a str,
}

impl MetricCompiler<'_> {
    fn compile(&self, metric: &str, expr: &MetricExpr) -> CompileResult<(Expr, Option<DataType>)> {
        match expr {
            MetricExpr::Input(name) => {
                let col = self
                    .input
                    .column(name)
                    .filter(|c| matches!(c.kind, ColumnKind::Measure | ColumnKind::Metric))
                    .ok_or_else(|| CompileError::UnresolvedMetricInput {
                        metric: metric.into(),
                        input: name.clone(),
                    })?;
                Ok((table_col(self.source, name), col.data_type))
            }
            MetricExpr::Literal(value) => {
                if !value.is_finite() {
                    return Err(CompileError::InvalidMetricLiteral {
                        metric: metric.into(),
                    });
                }
                Ok((lit_float(*value), Some(DataType::Float)))
            }
            MetricExpr::Neg(inner) => {
                let (e, ty) = self.compile(metric, inner)?;
                Ok((e.as_operand().neg(), ty))
            }
            MetricExpr::Binary { op, left, right } => {
                let (l, lt) = self.compile(metric, left)?;
                let (r, rt) = self.compile(metric, right)?;
                let expr = match op {
                    ArithmeticOp::Add => l.as_operand().add(r.as_operand()),
                    ArithmeticOp::Sub => l.as_operand().sub(r.as_operand()),
                    ArithmeticOp::Mul => l.as_operand().mul(r.as_operand()),
                    ArithmeticOp::Div => l.safe_div(r),
                };
                let ty = match op {
                    ArithmeticOp::Div => Some(DataType::Float),
                    _ if lt == rt => lt,
                    _ => Some(DataType::Float),
                };
                Ok((expr, ty))
            }
            MetricExpr::Ratio {
                numerator,
                denominator,
            } => {
                let (n, _) = self.compile(metric, numerator)?;
                let (d, _) = self.compile(metric, denominator)?;
                let expr = Expr::CastFloat(Box::new(n)).safe_div(Expr::CastFloat(Box::new(d)));
                Ok((expr, Some(DataType::Float)))
            }
        }
    }
}
