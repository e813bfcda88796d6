//! Aggregation planner: groups a combined relation and applies each
//! measure's aggregation.

use tracing::debug;

use super::{
    ensure_unique, AggregateNode, AliasGenerator, ColumnBinding, ColumnKind, GroupKeySet,
    PlanNode,
};
use crate::error::{CompileError, CompileResult, Stage};
use crate::semantic::AggregationType;
use crate::sql::expr::{
    avg, bool_to_int, count, count_distinct, max, min, sum, table_col, Expr,
};

/// A measure to aggregate, by logical name.
#[derive(Debug, Clone, PartialEq)]
pub struct MeasureSpec {
    pub name: String,
    pub agg: AggregationType,
}

impl MeasureSpec {
    pub fn new(name: &str, agg: AggregationType) -> Self {
        Self {
            name: name.into(),
            agg,
        }
    }
}

/// Build an AggregateNode over `input`.
///
/// Outputs are the group keys in order, then one aggregate per measure.
pub fn plan_aggregate(
    input: PlanNode,
    group_keys: GroupKeySet,
    measures: Vec<MeasureSpec>,
    aliases: &mut AliasGenerator,
) -> CompileResult<PlanNode> {
    if group_keys.is_empty() && measures.is_empty() {
        return Err(CompileError::EmptyQuery {
            stage: Stage::Aggregate,
        });
    }

    let source = input.alias().to_string();
    let mut outputs = Vec::with_capacity(group_keys.len() + measures.len());

    for key in group_keys.iter() {
        match input.column(key) {
            Some(col) if col.kind.is_groupable() => outputs.push(col.passthrough(&source)),
            _ => return Err(missing_group_key(&input, key)),
        }
    }

    for spec in &measures {
        let col = input
            .column(&spec.name)
            .filter(|c| c.kind == ColumnKind::Measure)
            .ok_or_else(|| CompileError::MissingMeasure {
                measure: spec.name.clone(),
                stage: Stage::Aggregate,
            })?;
        let expr = aggregate_expr(spec, table_col(&source, &spec.name))?;
        outputs.push(ColumnBinding::new(
            &spec.name,
            expr,
            ColumnKind::Measure,
            spec.agg.output_type(col.data_type),
        ));
    }
    ensure_unique(&outputs, Stage::Aggregate)?;

    let alias = aliases.subquery();
    debug!(
        alias = %alias,
        group_keys = group_keys.len(),
        measures = measures.len(),
        "planned aggregate node"
    );

    Ok(PlanNode::Aggregate(AggregateNode {
        alias,
        input: Box::new(input),
        group_keys,
        measures,
        outputs,
    }))
}

fn aggregate_expr(spec: &MeasureSpec, column: Expr) -> CompileResult<Expr> {
    let expr = match spec.agg {
        AggregationType::Sum => sum(column),
        AggregationType::Count => count(column),
        AggregationType::Min => min(column),
        AggregationType::Max => max(column),
        AggregationType::CountDistinct => count_distinct(column),
        AggregationType::Average => avg(column),
        AggregationType::SumBoolean => sum(bool_to_int(column)),
        AggregationType::Percentile {
            percentile,
            discrete,
            approximate,
        } => {
            if !(0.0..=1.0).contains(&percentile) {
                return Err(CompileError::InvalidPercentile {
                    measure: spec.name.clone(),
                    value: percentile,
                });
            }
            Expr::Percentile {
                expr: Box::new(column),
                percentile,
                discrete,
                approximate,
            }
        }
    };
    Ok(expr)
}

/// A group key that cannot be resolved against `input`. When the key is
/// linked through an entity the input still carries, the join is missing.
fn missing_group_key(input: &PlanNode, key: &str) -> CompileError {
    if let Some((entity, _)) = key.split_once("__") {
        let entity_present = input
            .column(entity)
            .is_some_and(|c| c.kind == ColumnKind::Entity);
        if entity_present {
            return CompileError::AggregationBeforeJoin {
                dimension: key.into(),
                entity: entity.into(),
            };
        }
    }
    CompileError::MissingDimension {
        dimension: key.into(),
        stage: Stage::Aggregate,
    }
}
