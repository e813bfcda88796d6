//! Round-trip validation of rendered SQL with sqlparser-rs.
//!
//! Parsing the output back catches syntax the renderer should never emit.
//! [`select_shapes`] additionally recovers the SELECT and GROUP BY names of
//! every nested query, so tests can compare them with the plan.

use sqlparser::ast::{
    Expr as SqlExpr, GroupByExpr, Query as SqlQuery, SelectItem, SetExpr, Statement, TableFactor,
};
use sqlparser::dialect::{
    DuckDbDialect, GenericDialect, MsSqlDialect, MySqlDialect, PostgreSqlDialect,
    RedshiftSqlDialect, SnowflakeDialect,
};
use sqlparser::parser::Parser;

use super::dialect::Dialect;
use crate::error::{CompileError, CompileResult};

fn parser_dialect(dialect: Dialect) -> Box<dyn sqlparser::dialect::Dialect> {
    match dialect {
        Dialect::Postgres => Box::new(PostgreSqlDialect {}),
        Dialect::DuckDb => Box::new(DuckDbDialect {}),
        Dialect::MySql => Box::new(MySqlDialect {}),
        Dialect::TSql => Box::new(MsSqlDialect {}),
        Dialect::Snowflake => Box::new(SnowflakeDialect {}),
        Dialect::Redshift => Box::new(RedshiftSqlDialect {}),
        // Generic accepts backtick identifiers and the function-call forms both use.
        Dialect::BigQuery | Dialect::Databricks => Box::new(GenericDialect {}),
    }
}

fn parse(sql: &str, dialect: Dialect) -> CompileResult<Vec<Statement>> {
    Parser::parse_sql(&*parser_dialect(dialect), sql).map_err(|e| CompileError::InvalidOutputSql {
        dialect,
        message: e.to_string(),
    })
}

/// Check that `sql` parses as a single statement for `dialect`.
pub fn validate_sql(sql: &str, dialect: Dialect) -> CompileResult<()> {
    let statements = parse(sql, dialect)?;
    if statements.len() != 1 {
        return Err(CompileError::InvalidOutputSql {
            dialect,
            message: format!("expected one statement, found {}", statements.len()),
        });
    }
    Ok(())
}

/// Output and grouping names of one SELECT.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectShape {
    /// Alias under which the enclosing query selects from this one.
    pub alias: Option<String>,
    pub columns: Vec<String>,
    pub group_by: Vec<String>,
}

/// Shapes of every SELECT in `sql`, outermost first, then nested
/// subqueries in FROM and JOIN order.
pub fn select_shapes(sql: &str, dialect: Dialect) -> CompileResult<Vec<SelectShape>> {
    let mut shapes = Vec::new();
    for statement in parse(sql, dialect)? {
        if let Statement::Query(query) = statement {
            collect_shapes(&query, None, &mut shapes);
        }
    }
    Ok(shapes)
}

fn collect_shapes(query: &SqlQuery, alias: Option<String>, shapes: &mut Vec<SelectShape>) {
    let SetExpr::Select(select) = query.body.as_ref() else {
        return;
    };

    let columns = select
        .projection
        .iter()
        .filter_map(|item| match item {
            SelectItem::ExprWithAlias { alias, .. } => Some(alias.value.clone()),
            SelectItem::UnnamedExpr(expr) => column_name(expr),
            _ => None,
        })
        .collect();
    let group_by = match &select.group_by {
        GroupByExpr::Expressions(exprs, _) => exprs.iter().filter_map(column_name).collect(),
        GroupByExpr::All(_) => Vec::new(),
    };
    shapes.push(SelectShape {
        alias,
        columns,
        group_by,
    });

    for table in &select.from {
        let factors =
            std::iter::once(&table.relation).chain(table.joins.iter().map(|j| &j.relation));
        for factor in factors {
            if let TableFactor::Derived {
                subquery, alias, ..
            } = factor
            {
                let alias = alias.as_ref().map(|a| a.name.value.clone());
                collect_shapes(subquery, alias, shapes);
            }
        }
    }
}

/// Trailing identifier of a (possibly qualified) column reference.
fn column_name(expr: &SqlExpr) -> Option<String> {
    match expr {
        SqlExpr::Identifier(ident) => Some(ident.value.clone()),
        SqlExpr::CompoundIdentifier(idents) => idents.last().map(|i| i.value.clone()),
        _ => None,
    }
}
