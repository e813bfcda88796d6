//! SQL renderer: serializes a dataflow plan into nested SELECT statements.
//!
//! Every node becomes one SELECT. Children are wrapped as subqueries under
//! their own alias, so each node only ever references its direct inputs:
//!
//! ```text
//! -- Compute Metrics via Expressions
//! SELECT ... FROM (
//!   -- Aggregate Measures
//!   SELECT ... FROM (
//!     -- Join Standard Outputs
//!     SELECT ... FROM (<read>) subq_0 LEFT OUTER JOIN (<read>) subq_1 ON ...
//!   ) subq_2
//!   GROUP BY ...
//! ) subq_3
//! ```

use tracing::debug;

use super::expr::{table_col, Expr, ExprExt};
use super::profile::DialectProfile;
use super::query::{JoinType, Query, Relation, SelectExpr, TableRef};
use crate::error::CompileResult;
use crate::plan::{JoinKind, PlanNode, ReadNode};

/// Render `plan` for `profile`.
pub fn render(plan: &PlanNode, profile: &DialectProfile) -> CompileResult<String> {
    SqlRenderer::new(profile).render(plan)
}

/// Plan-to-SQL renderer bound to one profile.
pub struct SqlRenderer<'a> {
    profile: &'a DialectProfile,
}

impl<'a> SqlRenderer<'a> {
    pub fn new(profile: &'a DialectProfile) -> Self {
        Self { profile }
    }

    /// Check the plan against the profile, then serialize it.
    pub fn render(&self, plan: &PlanNode) -> CompileResult<String> {
        self.profile.validate()?;
        self.check(plan)?;
        let sql = self.query(plan).to_sql(self.profile);
        debug!(
            dialect = %self.profile.dialect,
            nodes = plan.node_count(),
            bytes = sql.len(),
            "rendered plan"
        );
        Ok(sql)
    }

    fn check(&self, node: &PlanNode) -> CompileResult<()> {
        for binding in node.outputs() {
            self.profile.check_expr(&binding.expr)?;
        }
        for child in node.children() {
            self.check(child)?;
        }
        Ok(())
    }

    /// Query for one node, children nested as subqueries.
    pub fn query(&self, node: &PlanNode) -> Query {
        let select: Vec<SelectExpr> = node
            .outputs()
            .iter()
            .map(|b| SelectExpr::named(b.expr.clone(), &b.name))
            .collect();
        let query = Query::new().comment(&node.description()).select(select);

        match node {
            PlanNode::Read(read) => query.from(Relation::Table(table_ref(read))),
            PlanNode::Join(join) => {
                let left = join.left();
                let mut query = query.from(self.subquery(left));
                for spec in join.joins() {
                    let join_type = match spec.kind {
                        JoinKind::Inner => JoinType::Inner,
                        JoinKind::LeftOuter => JoinType::LeftOuter,
                    };
                    let right = spec.right.alias();
                    let mut on: Vec<Expr> = spec
                        .conditions
                        .iter()
                        .map(|c| {
                            table_col(&c.left_alias, &c.left_column)
                                .eq(table_col(right, &c.right_column))
                        })
                        .collect();
                    if let Some(w) = &spec.window {
                        let time = table_col(&w.left_alias, &w.left_column);
                        let end = table_col(right, &w.end_column);
                        on.push(time.clone().gt_eq(table_col(right, &w.start_column)));
                        on.push(time.lt(end.clone()).or(end.is_null()).as_operand());
                    }
                    query = query.join(join_type, self.subquery(&spec.right), on);
                }
                query
            }
            PlanNode::Aggregate(agg) => {
                let keys = node.outputs()[..agg.group_keys().len()]
                    .iter()
                    .map(|b| b.expr.clone())
                    .collect();
                query.from(self.subquery(agg.input())).group_by(keys)
            }
            PlanNode::ComputeMetrics(compute) => query.from(self.subquery(compute.input())),
        }
    }

    fn subquery(&self, node: &PlanNode) -> Relation {
        Relation::subquery(self.query(node), node.alias())
    }
}

fn table_ref(read: &ReadNode) -> TableRef {
    let table = read.table();
    let tref = TableRef::new(&table.name, read.table_alias());
    match &table.schema {
        Some(schema) => tref.with_schema(schema),
        None => tref,
    }
}
