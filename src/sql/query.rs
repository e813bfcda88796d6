//! Query builder - construct nested SELECT statements with a fluent API.
//!
//! Layout is fixed so output is byte-stable: two-space indentation per
//! nesting level, one select item per line with leading commas, `ON` and
//! `GROUP BY` items on their own lines.

use super::expr::Expr;
use super::profile::DialectProfile;
use super::token::{Token, TokenStream};

// =============================================================================
// Select Expression (column with optional alias)
// =============================================================================

/// A SELECT list item: expression with optional alias.
#[derive(Debug, Clone, PartialEq)]
#[must_use = "builders have no effect until used"]
pub struct SelectExpr {
    pub expr: Expr,
    pub alias: Option<String>,
}

impl SelectExpr {
    pub fn new(expr: Expr) -> Self {
        Self { expr, alias: None }
    }

    pub fn with_alias(mut self, alias: &str) -> Self {
        self.alias = Some(alias.into());
        self
    }

    /// Select `expr` under `name`, leaving out `AS name` when the
    /// expression is already a column called `name`.
    pub fn named(expr: Expr, name: &str) -> Self {
        match &expr {
            Expr::Column { column, .. } if column == name => Self::new(expr),
            _ => Self::new(expr).with_alias(name),
        }
    }

    pub fn to_tokens(&self, profile: &DialectProfile) -> TokenStream {
        let mut ts = self.expr.to_tokens(profile);
        if let Some(alias) = &self.alias {
            ts.space()
                .push(Token::As)
                .space()
                .push(Token::Ident(alias.clone()));
        }
        ts
    }
}

impl From<Expr> for SelectExpr {
    fn from(expr: Expr) -> Self {
        SelectExpr::new(expr)
    }
}

// =============================================================================
// Relations
// =============================================================================

/// A physical table with optional schema and a mandatory alias.
#[derive(Debug, Clone, PartialEq)]
#[must_use = "builders have no effect until used"]
pub struct TableRef {
    pub schema: Option<String>,
    pub table: String,
    pub alias: String,
}

impl TableRef {
    pub fn new(table: &str, alias: &str) -> Self {
        Self {
            schema: None,
            table: table.into(),
            alias: alias.into(),
        }
    }

    pub fn with_schema(mut self, schema: &str) -> Self {
        self.schema = Some(schema.into());
        self
    }
}

/// Something a query selects from.
#[derive(Debug, Clone, PartialEq)]
pub enum Relation {
    Table(TableRef),
    Subquery { query: Box<Query>, alias: String },
}

impl Relation {
    pub fn subquery(query: Query, alias: &str) -> Self {
        Relation::Subquery {
            query: Box::new(query),
            alias: alias.into(),
        }
    }

    fn emit(&self, ts: &mut TokenStream, profile: &DialectProfile, depth: usize) {
        match self {
            Relation::Table(t) => {
                ts.push(Token::QualifiedIdent {
                    schema: t.schema.clone(),
                    name: t.table.clone(),
                });
                ts.space().push(Token::Ident(t.alias.clone()));
            }
            Relation::Subquery { query, alias } => {
                ts.lparen().newline();
                ts.append(&query.to_tokens_at(profile, depth + 1));
                ts.newline().indent(depth).rparen();
                ts.space().push(Token::Ident(alias.clone()));
            }
        }
    }
}

// =============================================================================
// Joins
// =============================================================================

/// JOIN types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinType {
    Inner,
    LeftOuter,
}

/// A JOIN clause with its conjunctive ON conditions.
#[derive(Debug, Clone, PartialEq)]
pub struct Join {
    pub join_type: JoinType,
    pub relation: Relation,
    pub on: Vec<Expr>,
}

impl Join {
    fn emit(&self, ts: &mut TokenStream, profile: &DialectProfile, depth: usize) {
        match self.join_type {
            JoinType::Inner => ts.push(Token::Inner),
            JoinType::LeftOuter => ts.push(Token::Left).space().push(Token::Outer),
        };
        ts.space().push(Token::Join).space();
        self.relation.emit(ts, profile, depth);
        if self.on.is_empty() {
            return;
        }
        ts.newline().indent(depth).push(Token::On);
        for (i, cond) in self.on.iter().enumerate() {
            ts.newline().indent(depth + 1);
            if i > 0 {
                ts.push(Token::And).space();
            }
            ts.append(&cond.to_tokens(profile));
        }
    }
}

// =============================================================================
// Query
// =============================================================================

/// A SELECT statement.
#[derive(Debug, Clone, Default, PartialEq)]
#[must_use = "builders have no effect until used"]
pub struct Query {
    pub comments: Vec<String>,
    pub select: Vec<SelectExpr>,
    pub from: Option<Relation>,
    pub joins: Vec<Join>,
    pub group_by: Vec<Expr>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    /// Leading `-- text` line, emitted when the profile enables stage comments.
    pub fn comment(mut self, text: &str) -> Self {
        self.comments.push(text.into());
        self
    }

    pub fn select(mut self, exprs: Vec<impl Into<SelectExpr>>) -> Self {
        self.select.extend(exprs.into_iter().map(Into::into));
        self
    }

    pub fn from(mut self, relation: Relation) -> Self {
        self.from = Some(relation);
        self
    }

    pub fn join(mut self, join_type: JoinType, relation: Relation, on: Vec<Expr>) -> Self {
        self.joins.push(Join {
            join_type,
            relation,
            on,
        });
        self
    }

    pub fn group_by(mut self, exprs: Vec<Expr>) -> Self {
        self.group_by.extend(exprs);
        self
    }

    pub fn to_tokens(&self, profile: &DialectProfile) -> TokenStream {
        self.to_tokens_at(profile, 0)
    }

    /// Tokens for this query nested `depth` levels deep.
    pub fn to_tokens_at(&self, profile: &DialectProfile, depth: usize) -> TokenStream {
        let mut ts = TokenStream::new();

        if profile.stage_comments {
            for comment in &self.comments {
                ts.indent(depth).push(Token::Comment(comment.clone())).newline();
            }
        }

        ts.indent(depth).push(Token::Select);
        for (i, item) in self.select.iter().enumerate() {
            ts.newline().indent(depth + 1);
            if i > 0 {
                ts.comma().space();
            }
            ts.append(&item.to_tokens(profile));
        }

        if let Some(from) = &self.from {
            ts.newline().indent(depth).push(Token::From).space();
            from.emit(&mut ts, profile, depth);
        }

        for join in &self.joins {
            ts.newline().indent(depth);
            join.emit(&mut ts, profile, depth);
        }

        if !self.group_by.is_empty() {
            ts.newline().indent(depth).push(Token::GroupBy);
            for (i, expr) in self.group_by.iter().enumerate() {
                ts.newline().indent(depth + 1);
                if i > 0 {
                    ts.comma().space();
                }
                ts.append(&expr.to_tokens(profile));
            }
        }

        ts
    }

    pub fn to_sql(&self, profile: &DialectProfile) -> String {
        self.to_tokens(profile).serialize(profile)
    }
}
