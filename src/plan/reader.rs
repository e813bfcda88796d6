//! Semantic source reader: lowers requested elements of one semantic model
//! into a [`ReadNode`].

use tracing::debug;

use super::{ensure_unique, AliasGenerator, ColumnBinding, ColumnKind, PlanNode, ReadNode};
use crate::error::{CompileError, CompileResult, Stage};
use crate::semantic::{suggest_closest, Element, MeasureExpr, SemanticModel, TimeGranularity};
use crate::sql::dialect::helpers;
use crate::sql::expr::{lit_int, table_col, Expr};

/// One element to read, optionally truncated to a time grain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementRequest {
    pub name: String,
    pub grain: Option<TimeGranularity>,
}

impl ElementRequest {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.into(),
            grain: None,
        }
    }

    pub fn at_grain(name: &str, grain: TimeGranularity) -> Self {
        Self {
            name: name.into(),
            grain: Some(grain),
        }
    }

    /// Logical output name: `<name>` or `<name>__<grain>`.
    pub fn output_name(&self) -> String {
        match self.grain {
            Some(grain) => format!("{}__{}", self.name, grain),
            None => self.name.clone(),
        }
    }
}

impl From<&str> for ElementRequest {
    fn from(name: &str) -> Self {
        ElementRequest::new(name)
    }
}

/// Reads elements of a single semantic model.
pub struct SourceReader<'a> {
    model: &'a SemanticModel,
}

impl<'a> SourceReader<'a> {
    pub fn new(model: &'a SemanticModel) -> Self {
        Self { model }
    }

    /// Build a ReadNode selecting exactly `elements`, in order.
    pub fn read(
        &self,
        elements: &[ElementRequest],
        aliases: &mut AliasGenerator,
    ) -> CompileResult<PlanNode> {
        if elements.is_empty() {
            return Err(CompileError::EmptyQuery { stage: Stage::Read });
        }

        let table_alias = aliases.table(&self.model.name);
        let outputs = elements
            .iter()
            .map(|req| self.bind(req, &table_alias))
            .collect::<CompileResult<Vec<_>>>()?;
        ensure_unique(&outputs, Stage::Read)?;

        let alias = aliases.subquery();
        debug!(
            model = %self.model.name,
            alias = %alias,
            columns = outputs.len(),
            "planned read node"
        );

        Ok(PlanNode::Read(ReadNode {
            alias,
            model: self.model.name.clone(),
            table: self.model.table.clone(),
            table_alias,
            outputs,
        }))
    }

    fn bind(&self, req: &ElementRequest, table_alias: &str) -> CompileResult<ColumnBinding> {
        let element = self
            .model
            .element(&req.name)
            .ok_or_else(|| self.unresolved(&req.name))?;

        if let Some(grain) = req.grain {
            self.check_grain(&element, &req.name, grain)?;
        }

        let binding = match element {
            Element::Entity(entity) => ColumnBinding::new(
                &req.name,
                physical(table_alias, entity.column_expr()),
                ColumnKind::Entity,
                Some(entity.data_type),
            ),
            Element::Dimension(dim) => {
                let column = physical(table_alias, dim.column_expr());
                match req.grain {
                    Some(grain) => ColumnBinding::new(
                        &req.output_name(),
                        Expr::DateTrunc {
                            grain,
                            expr: Box::new(column),
                        },
                        ColumnKind::TimeDimension,
                        Some(dim.data_type),
                    ),
                    None if dim.is_time() => ColumnBinding::new(
                        &req.name,
                        column,
                        ColumnKind::TimeDimension,
                        Some(dim.data_type),
                    ),
                    None => ColumnBinding::new(
                        &req.name,
                        column,
                        ColumnKind::Dimension,
                        Some(dim.data_type),
                    ),
                }
            }
            Element::Measure(measure) => {
                let expr = match &measure.expr {
                    MeasureExpr::Column(column) => physical(table_alias, column),
                    MeasureExpr::Constant(value) => lit_int(*value),
                };
                ColumnBinding::new(&req.name, expr, ColumnKind::Measure, measure.value_type())
            }
        };
        Ok(binding)
    }

    fn check_grain(
        &self,
        element: &Element<'_>,
        name: &str,
        grain: TimeGranularity,
    ) -> CompileResult<()> {
        let invalid = |reason: String| CompileError::InvalidTimeGrain {
            dimension: name.into(),
            grain,
            reason,
        };
        match element {
            Element::Dimension(dim) => match dim.defined_granularity() {
                Some(defined) if grain < defined => Err(invalid(format!(
                    "finer than its defined granularity '{}'",
                    defined
                ))),
                Some(_) if !dim.data_type.is_temporal() => {
                    Err(invalid(format!("type {} is not temporal", dim.data_type)))
                }
                Some(_) => Ok(()),
                None => Err(invalid("not a time dimension".into())),
            },
            _ => Err(invalid("not a time dimension".into())),
        }
    }

    fn unresolved(&self, name: &str) -> CompileError {
        CompileError::UnresolvedElement {
            stage: Stage::Read,
            scope: format!("semantic model '{}'", self.model.name),
            element: name.into(),
            suggestion: suggest_closest(name, &self.model.element_names()),
        }
    }
}

/// Qualified column reference for a plain identifier in any case, raw SQL
/// otherwise. Quoting is left to the profile.
fn physical(table_alias: &str, expr: &str) -> Expr {
    if helpers::is_plain_identifier(expr) {
        table_col(table_alias, expr)
    } else {
        Expr::Raw(expr.to_string())
    }
}
