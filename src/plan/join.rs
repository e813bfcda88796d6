//! Join planner: combines a primary relation with secondary relations into
//! a left-deep [`JoinNode`].

use tracing::debug;

use super::{
    ensure_unique, AliasGenerator, ColumnBinding, JoinCondition, JoinKind, JoinNode, JoinSpec,
    PlanNode, WindowCondition,
};
use crate::error::{CompileError, CompileResult, JoinSide, Stage};
use crate::sql::expr::table_col;

/// Cardinality relationship between the accumulated left side and a target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinRole {
    /// Many-to-one lookup of attributes; left rows are always kept.
    Dimension,
    /// One-to-one equivalent relation; only matching rows are kept.
    Equivalent,
}

impl JoinRole {
    pub fn join_kind(&self) -> JoinKind {
        match self {
            JoinRole::Dimension => JoinKind::LeftOuter,
            JoinRole::Equivalent => JoinKind::Inner,
        }
    }
}

/// A secondary relation to join.
#[derive(Debug, Clone, PartialEq)]
pub struct JoinTarget {
    pub node: PlanNode,
    pub keys: Vec<String>,
    pub role: JoinRole,
    /// Applied as `<prefix>__` to the target's pulled-through columns.
    pub prefix: Option<String>,
    pub window: Option<WindowJoin>,
}

/// Keeps only target rows whose validity window contains a left time column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowJoin {
    /// Output of the accumulated left side.
    pub time_column: String,
    /// Window bounds on the target.
    pub start: String,
    pub end: String,
}

impl JoinTarget {
    pub fn dimension(node: PlanNode, key: &str) -> Self {
        Self {
            node,
            keys: vec![key.into()],
            role: JoinRole::Dimension,
            prefix: None,
            window: None,
        }
    }

    pub fn equivalent(node: PlanNode, key: &str) -> Self {
        Self {
            role: JoinRole::Equivalent,
            ..Self::dimension(node, key)
        }
    }

    pub fn with_key(mut self, key: &str) -> Self {
        self.keys.push(key.into());
        self
    }

    pub fn with_prefix(mut self, prefix: &str) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    pub fn with_window(mut self, time_column: &str, start: &str, end: &str) -> Self {
        self.window = Some(WindowJoin {
            time_column: time_column.into(),
            start: start.into(),
            end: end.into(),
        });
        self
    }
}

/// Where an output of the accumulated left side comes from.
struct Provenance {
    name: String,
    alias: String,
    column: String,
    binding: ColumnBinding,
}

/// Join `targets` onto `primary`, left-deep, in order.
///
/// With no targets the primary relation is returned unchanged.
pub fn plan_join(
    primary: PlanNode,
    targets: Vec<JoinTarget>,
    aliases: &mut AliasGenerator,
) -> CompileResult<PlanNode> {
    if targets.is_empty() {
        return Ok(primary);
    }

    let mut left: Vec<Provenance> = primary
        .outputs()
        .iter()
        .map(|b| Provenance {
            name: b.name.clone(),
            alias: primary.alias().to_string(),
            column: b.name.clone(),
            binding: b.clone(),
        })
        .collect();

    let mut joins = Vec::with_capacity(targets.len());
    for target in targets {
        let right_alias = target.node.alias().to_string();
        if target.keys.is_empty() {
            return Err(CompileError::EmptyJoinKeys { alias: right_alias });
        }

        let mut conditions = Vec::with_capacity(target.keys.len());
        for key in &target.keys {
            let l = left
                .iter()
                .find(|p| &p.name == key)
                .ok_or_else(|| CompileError::UnresolvedJoinKey {
                    key: key.clone(),
                    side: JoinSide::Left,
                    alias: primary.alias().to_string(),
                })?;
            let r = target
                .node
                .column(key)
                .ok_or_else(|| CompileError::UnresolvedJoinKey {
                    key: key.clone(),
                    side: JoinSide::Right,
                    alias: right_alias.clone(),
                })?;
            if let (Some(lt), Some(rt)) = (l.binding.data_type, r.data_type) {
                if lt != rt {
                    return Err(CompileError::JoinKeyTypeMismatch {
                        key: key.clone(),
                        left: lt,
                        right: rt,
                    });
                }
            }
            conditions.push(JoinCondition {
                key: key.clone(),
                left_alias: l.alias.clone(),
                left_column: l.column.clone(),
                right_column: key.clone(),
            });
        }

        let window = match &target.window {
            Some(w) => {
                let time = left.iter().find(|p| p.name == w.time_column).ok_or_else(|| {
                    CompileError::UnresolvedJoinKey {
                        key: w.time_column.clone(),
                        side: JoinSide::Left,
                        alias: primary.alias().to_string(),
                    }
                })?;
                for bound in [&w.start, &w.end] {
                    if target.node.column(bound).is_none() {
                        return Err(CompileError::UnresolvedJoinKey {
                            key: bound.clone(),
                            side: JoinSide::Right,
                            alias: right_alias.clone(),
                        });
                    }
                }
                Some(WindowCondition {
                    left_alias: time.alias.clone(),
                    left_column: time.column.clone(),
                    start_column: w.start.clone(),
                    end_column: w.end.clone(),
                })
            }
            None => None,
        };

        for col in target.node.outputs() {
            if target.keys.contains(&col.name) {
                continue;
            }
            let name = match &target.prefix {
                Some(prefix) => format!("{}__{}", prefix, col.name),
                None => col.name.clone(),
            };
            if left.iter().any(|p| p.name == name) {
                return Err(CompileError::DuplicateColumn {
                    name,
                    stage: Stage::Join,
                });
            }
            left.push(Provenance {
                name,
                alias: right_alias.clone(),
                column: col.name.clone(),
                binding: col.clone(),
            });
        }

        joins.push(JoinSpec {
            kind: target.role.join_kind(),
            right: target.node,
            conditions,
            window,
            prefix: target.prefix,
        });
    }

    let outputs: Vec<ColumnBinding> = left
        .into_iter()
        .map(|p| ColumnBinding {
            name: p.name,
            expr: table_col(&p.alias, &p.column),
            kind: p.binding.kind,
            data_type: p.binding.data_type,
        })
        .collect();
    ensure_unique(&outputs, Stage::Join)?;

    let alias = aliases.subquery();
    debug!(
        alias = %alias,
        targets = joins.len(),
        columns = outputs.len(),
        "planned join node"
    );

    Ok(PlanNode::Join(JoinNode {
        alias,
        left: Box::new(primary),
        joins,
        outputs,
    }))
}
