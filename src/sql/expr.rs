//! Expression AST for select items, join conditions and group keys.
//!
//! Expressions are dialect-agnostic. A few variants (`DateTrunc`,
//! `SafeDivide`, `Percentile`, `CastFloat`) are resolved against the profile
//! only when tokens are produced.

use super::dialect::{DateTruncSyntax, PercentileSyntax, SqlDialect};
use super::profile::{DialectProfile, DivisionStyle};
use super::token::{Token, TokenStream};
use crate::semantic::TimeGranularity;

// =============================================================================
// Expression AST
// =============================================================================

/// A SQL expression.
///
/// Every variant must be handled in `to_tokens()` - the compiler enforces this.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Column reference: optional_table.column
    Column {
        table: Option<String>,
        column: String,
    },

    Literal(Literal),

    /// Binary operation: left op right
    BinaryOp {
        left: Box<Expr>,
        op: BinaryOperator,
        right: Box<Expr>,
    },

    UnaryOp { op: UnaryOperator, expr: Box<Expr> },

    /// expr IS NULL
    IsNull(Box<Expr>),

    /// Function call: name(args...)
    Function {
        name: String,
        args: Vec<Expr>,
        distinct: bool,
    },

    /// CASE WHEN... THEN... ELSE... END
    Case {
        when_clauses: Vec<(Expr, Expr)>,
        else_clause: Option<Box<Expr>>,
    },

    Paren(Box<Expr>),

    /// CAST(expr AS <dialect float type>)
    CastFloat(Box<Expr>),

    /// Division that yields NULL instead of failing on a zero denominator.
    SafeDivide {
        numerator: Box<Expr>,
        denominator: Box<Expr>,
    },

    /// Truncate a date or timestamp to a grain.
    DateTrunc {
        grain: TimeGranularity,
        expr: Box<Expr>,
    },

    /// Percentile aggregate over `expr`.
    Percentile {
        expr: Box<Expr>,
        percentile: f64,
        discrete: bool,
        approximate: bool,
    },

    /// Raw SQL expression passed directly to output without escaping.
    ///
    /// Only built from expressions declared in semantic models.
    Raw(String),
}

/// Literal values.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Int(i64),
    Float(f64),
}

/// Binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOperator {
    Eq,
    GtEq,
    Lt,
    And,
    Or,
    Plus,
    Minus,
    Mul,
    Div,
}

/// Unary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOperator {
    Minus,
}

impl Expr {
    /// Convert this expression to a token stream for a profile.
    pub fn to_tokens(&self, profile: &DialectProfile) -> TokenStream {
        let mut ts = TokenStream::new();

        match self {
            Expr::Column { table, column } => {
                if let Some(t) = table {
                    ts.push(Token::Ident(t.clone()));
                    ts.push(Token::Dot);
                }
                ts.push(Token::Ident(column.clone()));
            }

            Expr::Literal(lit) => {
                ts.push(match lit {
                    Literal::Int(n) => Token::LitInt(*n),
                    Literal::Float(f) => Token::LitFloat(*f),
                });
            }

            Expr::BinaryOp { left, op, right } => {
                ts.append(&left.to_tokens(profile));
                ts.space();
                ts.push(binary_op_to_token(*op));
                ts.space();
                ts.append(&right.to_tokens(profile));
            }

            Expr::UnaryOp { op, expr } => {
                ts.push(match op {
                    UnaryOperator::Minus => Token::Minus,
                });
                // `--` opens a line comment.
                if expr.starts_with_minus() {
                    ts.lparen();
                    ts.append(&expr.to_tokens(profile));
                    ts.rparen();
                } else {
                    ts.append(&expr.to_tokens(profile));
                }
            }

            Expr::IsNull(inner) => {
                ts.append(&inner.to_tokens(profile));
                ts.space().push(Token::Is).space().push(Token::LitNull);
            }

            Expr::Function {
                name,
                args,
                distinct,
            } => {
                ts.push(Token::FunctionName(name.clone()));
                ts.lparen();
                if *distinct {
                    ts.push(Token::Distinct).space();
                }
                append_args(&mut ts, args.iter(), profile);
                ts.rparen();
            }

            Expr::Case {
                when_clauses,
                else_clause,
            } => {
                ts.push(Token::Case);
                for (when, then) in when_clauses {
                    ts.space().push(Token::When).space();
                    ts.append(&when.to_tokens(profile));
                    ts.space().push(Token::Then).space();
                    ts.append(&then.to_tokens(profile));
                }
                if let Some(else_expr) = else_clause {
                    ts.space().push(Token::Else).space();
                    ts.append(&else_expr.to_tokens(profile));
                }
                ts.space().push(Token::End);
            }

            Expr::Paren(inner) => {
                ts.lparen();
                ts.append(&inner.to_tokens(profile));
                ts.rparen();
            }

            Expr::CastFloat(inner) => {
                ts.push(Token::Cast).lparen();
                ts.append(&inner.to_tokens(profile));
                ts.space().push(Token::As).space();
                ts.push(Token::Keyword(profile.dialect.float_type().into()));
                ts.rparen();
            }

            Expr::SafeDivide {
                numerator,
                denominator,
            } => emit_safe_divide(&mut ts, numerator, denominator, profile),

            Expr::DateTrunc { grain, expr } => emit_date_trunc(&mut ts, *grain, expr, profile),

            Expr::Percentile {
                expr,
                percentile,
                discrete,
                approximate,
            } => {
                let syntax = profile
                    .dialect
                    .percentile(*discrete, *approximate)
                    .unwrap_or(PercentileSyntax::WithinGroup(if *discrete {
                        "PERCENTILE_DISC"
                    } else {
                        "PERCENTILE_CONT"
                    }));
                match syntax {
                    PercentileSyntax::WithinGroup(name) => {
                        ts.push(Token::FunctionName(name.into()));
                        ts.lparen().push(Token::LitFloat(*percentile)).rparen();
                        ts.space().push(Token::WithinGroup).space().lparen();
                        ts.push(Token::OrderBy).space();
                        ts.append(&expr.to_tokens(profile));
                        ts.rparen();
                    }
                    PercentileSyntax::Function(name) => {
                        ts.push(Token::FunctionName(name.into()));
                        ts.lparen();
                        ts.append(&expr.to_tokens(profile));
                        ts.comma().space().push(Token::LitFloat(*percentile));
                        ts.rparen();
                    }
                }
            }

            Expr::Raw(sql) => {
                ts.push(Token::Raw(sql.clone()));
            }
        }

        ts
    }

    /// Visit this expression and every sub-expression, parents first.
    pub fn visit<F: FnMut(&Expr)>(&self, f: &mut F) {
        f(self);
        match self {
            Expr::Column { .. } | Expr::Literal(_) | Expr::Raw(_) => {}
            Expr::BinaryOp { left, right, .. } => {
                left.visit(f);
                right.visit(f);
            }
            Expr::UnaryOp { expr, .. }
            | Expr::IsNull(expr)
            | Expr::Paren(expr)
            | Expr::CastFloat(expr)
            | Expr::DateTrunc { expr, .. }
            | Expr::Percentile { expr, .. } => expr.visit(f),
            Expr::Function { args, .. } => {
                for arg in args {
                    arg.visit(f);
                }
            }
            Expr::Case {
                when_clauses,
                else_clause,
            } => {
                for (when, then) in when_clauses {
                    when.visit(f);
                    then.visit(f);
                }
                if let Some(e) = else_clause {
                    e.visit(f);
                }
            }
            Expr::SafeDivide {
                numerator,
                denominator,
            } => {
                numerator.visit(f);
                denominator.visit(f);
            }
        }
    }

    /// Whether the rendered expression begins with a `-` sign.
    fn starts_with_minus(&self) -> bool {
        match self {
            Expr::Literal(Literal::Int(n)) => *n < 0,
            Expr::Literal(Literal::Float(f)) => f.is_sign_negative(),
            Expr::UnaryOp { .. } => true,
            Expr::BinaryOp { left, .. } | Expr::IsNull(left) => left.starts_with_minus(),
            Expr::Raw(sql) => sql.trim_start().starts_with('-'),
            _ => false,
        }
    }

    /// Whether this expression needs parentheses when used as an operand.
    pub fn is_compound(&self) -> bool {
        matches!(
            self,
            Expr::BinaryOp { .. }
                | Expr::UnaryOp { .. }
                | Expr::IsNull(_)
                | Expr::SafeDivide { .. }
                | Expr::Raw(_)
        )
    }

    /// Wrap in parentheses if compound.
    pub fn as_operand(self) -> Expr {
        if self.is_compound() {
            Expr::Paren(Box::new(self))
        } else {
            self
        }
    }
}

fn append_args<'a>(
    ts: &mut TokenStream,
    args: impl Iterator<Item = &'a Expr>,
    profile: &DialectProfile,
) {
    for (i, arg) in args.enumerate() {
        if i > 0 {
            ts.comma().space();
        }
        ts.append(&arg.to_tokens(profile));
    }
}

fn emit_safe_divide(
    ts: &mut TokenStream,
    numerator: &Expr,
    denominator: &Expr,
    profile: &DialectProfile,
) {
    let native = profile.dialect.safe_divide_function();
    let numerator = numerator.clone().as_operand();
    let guarded = denominator.clone().as_operand();
    match (profile.division_style(), native) {
        (DivisionStyle::Native, Some(name)) => {
            ts.push(Token::FunctionName(name.into()));
            ts.lparen();
            append_args(ts, [&numerator, denominator].into_iter(), profile);
            ts.rparen();
        }
        (DivisionStyle::CaseGuard, _) => {
            ts.push(Token::Case).space().push(Token::When).space();
            ts.append(&guarded.to_tokens(profile));
            ts.space().push(Token::Eq).space().push(Token::LitInt(0));
            ts.space().push(Token::Then).space().push(Token::LitNull);
            ts.space().push(Token::Else).space();
            ts.append(&numerator.to_tokens(profile));
            ts.space().push(Token::Div).space();
            ts.append(&guarded.to_tokens(profile));
            ts.space().push(Token::End);
        }
        // Native without a function is rejected by `DialectProfile::validate`.
        (DivisionStyle::NullIf, _) | (DivisionStyle::Native, None) => {
            ts.append(&numerator.to_tokens(profile));
            ts.space().push(Token::Div).space();
            ts.push(Token::FunctionName("NULLIF".into())).lparen();
            ts.append(&denominator.to_tokens(profile));
            ts.comma().space().push(Token::LitInt(0)).rparen();
        }
    }
}

fn emit_date_trunc(
    ts: &mut TokenStream,
    grain: TimeGranularity,
    expr: &Expr,
    profile: &DialectProfile,
) {
    let part = profile.dialect.date_part(grain);
    let syntax = profile
        .dialect
        .date_trunc()
        .unwrap_or(DateTruncSyntax::QuotedPartFirst("DATE_TRUNC"));
    match syntax {
        DateTruncSyntax::QuotedPartFirst(name) => {
            ts.push(Token::FunctionName(name.into())).lparen();
            ts.push(Token::LitString(part.into())).comma().space();
            ts.append(&expr.to_tokens(profile));
            ts.rparen();
        }
        DateTruncSyntax::KeywordPartFirst(name) => {
            ts.push(Token::FunctionName(name.into())).lparen();
            ts.push(Token::Keyword(part.to_uppercase())).comma().space();
            ts.append(&expr.to_tokens(profile));
            ts.rparen();
        }
        DateTruncSyntax::KeywordPartLast(name) => {
            ts.push(Token::FunctionName(name.into())).lparen();
            ts.append(&expr.to_tokens(profile));
            ts.comma().space().push(Token::Keyword(part.to_uppercase()));
            ts.rparen();
        }
    }
}

fn binary_op_to_token(op: BinaryOperator) -> Token {
    match op {
        BinaryOperator::Eq => Token::Eq,
        BinaryOperator::GtEq => Token::GtEq,
        BinaryOperator::Lt => Token::Lt,
        BinaryOperator::And => Token::And,
        BinaryOperator::Or => Token::Or,
        BinaryOperator::Plus => Token::Plus,
        BinaryOperator::Minus => Token::Minus,
        BinaryOperator::Mul => Token::Mul,
        BinaryOperator::Div => Token::Div,
    }
}

// =============================================================================
// Builder helpers
// =============================================================================

/// Unqualified column reference.
pub fn col(name: &str) -> Expr {
    Expr::Column {
        table: None,
        column: name.into(),
    }
}

/// Qualified column reference: table.column
pub fn table_col(table: &str, column: &str) -> Expr {
    Expr::Column {
        table: Some(table.into()),
        column: column.into(),
    }
}

pub fn lit_int(n: i64) -> Expr {
    Expr::Literal(Literal::Int(n))
}

pub fn lit_float(f: f64) -> Expr {
    Expr::Literal(Literal::Float(f))
}

pub fn func(name: &str, args: Vec<Expr>) -> Expr {
    Expr::Function {
        name: name.into(),
        args,
        distinct: false,
    }
}

pub fn sum(expr: Expr) -> Expr {
    func("SUM", vec![expr])
}

pub fn count(expr: Expr) -> Expr {
    func("COUNT", vec![expr])
}

pub fn count_distinct(expr: Expr) -> Expr {
    Expr::Function {
        name: "COUNT".into(),
        args: vec![expr],
        distinct: true,
    }
}

pub fn avg(expr: Expr) -> Expr {
    func("AVG", vec![expr])
}

pub fn min(expr: Expr) -> Expr {
    func("MIN", vec![expr])
}

pub fn max(expr: Expr) -> Expr {
    func("MAX", vec![expr])
}

/// CASE WHEN expr THEN 1 ELSE 0 END
pub fn bool_to_int(expr: Expr) -> Expr {
    Expr::Case {
        when_clauses: vec![(expr, lit_int(1))],
        else_clause: Some(Box::new(lit_int(0))),
    }
}

/// Extension trait for building expressions fluently.
pub trait ExprExt: Sized {
    fn into_expr(self) -> Expr;

    fn eq(self, other: impl Into<Expr>) -> Expr {
        binary(self.into_expr(), BinaryOperator::Eq, other.into())
    }

    fn gt_eq(self, other: impl Into<Expr>) -> Expr {
        binary(self.into_expr(), BinaryOperator::GtEq, other.into())
    }

    fn lt(self, other: impl Into<Expr>) -> Expr {
        binary(self.into_expr(), BinaryOperator::Lt, other.into())
    }

    fn and(self, other: impl Into<Expr>) -> Expr {
        binary(self.into_expr(), BinaryOperator::And, other.into())
    }

    fn or(self, other: impl Into<Expr>) -> Expr {
        binary(self.into_expr(), BinaryOperator::Or, other.into())
    }

    fn is_null(self) -> Expr {
        Expr::IsNull(Box::new(self.into_expr()))
    }

    fn add(self, other: impl Into<Expr>) -> Expr {
        binary(self.into_expr(), BinaryOperator::Plus, other.into())
    }

    fn sub(self, other: impl Into<Expr>) -> Expr {
        binary(self.into_expr(), BinaryOperator::Minus, other.into())
    }

    fn mul(self, other: impl Into<Expr>) -> Expr {
        binary(self.into_expr(), BinaryOperator::Mul, other.into())
    }

    fn neg(self) -> Expr {
        Expr::UnaryOp {
            op: UnaryOperator::Minus,
            expr: Box::new(self.into_expr()),
        }
    }

    /// NULL-safe division.
    fn safe_div(self, other: impl Into<Expr>) -> Expr {
        Expr::SafeDivide {
            numerator: Box::new(self.into_expr()),
            denominator: Box::new(other.into()),
        }
    }
}

impl ExprExt for Expr {
    fn into_expr(self) -> Expr {
        self
    }
}

fn binary(left: Expr, op: BinaryOperator, right: Expr) -> Expr {
    Expr::BinaryOp {
        left: Box::new(left),
        op,
        right: Box::new(right),
    }
}
