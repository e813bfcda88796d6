//! SQL generation.
//!
//! - [`token`] - Token types and serialization
//! - [`expr`] - Expression AST and builder DSL
//! - [`query`] - Nested SELECT builder
//! - [`dialect`] - SQL dialect implementations
//! - [`profile`] - Per-warehouse rendering options
//! - [`render`] - Plan-to-SQL renderer
//! - [`validate`] - Round-trip validation with sqlparser-rs

pub mod dialect;
pub mod expr;
pub mod profile;
pub mod query;
pub mod render;
pub mod token;
pub mod validate;

pub use dialect::{Dialect, SqlDialect};
pub use expr::{
    avg, bool_to_int, col, count, count_distinct, func, lit_float, lit_int, max, min,
    sum, table_col, BinaryOperator, Expr, ExprExt, Literal, UnaryOperator,
};
pub use profile::{DialectProfile, DivisionStyle, QuotePolicy};
pub use query::{Join, JoinType, Query, Relation, SelectExpr, TableRef};
pub use render::{render, SqlRenderer};
pub use token::{Token, TokenStream};
pub use validate::{select_shapes, validate_sql, SelectShape};
