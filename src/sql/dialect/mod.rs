//! SQL Dialect definitions and formatting rules.
//!
//! Each dialect implements `SqlDialect` for the constructs the renderer
//! needs that differ between warehouses:
//!
//! - Identifier quoting: `"` (ANSI/PG/DuckDB), `` ` `` (MySQL/BigQuery/Databricks), `[]` (T-SQL)
//! - Floating point type name used by ratio casts
//! - Date truncation syntax
//! - A native NULL-returning safe division function
//! - Percentile aggregate syntax
//!
//! | Feature | DuckDB | Postgres | T-SQL | MySQL | Snowflake | BigQuery | Redshift | Databricks |
//! |---------|--------|----------|-------|-------|-----------|----------|----------|------------|
//! | Date truncation | ✓ | ✓ | 2022+ | ❌ | ✓ | ✓ | ✓ | ✓ |
//! | Safe division function | ❌ | ❌ | ❌ | ❌ | ❌ | ✓ | ❌ | ✓ |
//! | Exact percentile | ✓ | ✓ | ❌ | ❌ | ✓ | ❌ | ✓ | ✓ |
//! | Approximate percentile | ✓ | ❌ | ❌ | ❌ | ✓ | ❌ | ❌ | ✓ |
//!
//! The renderer checks these before emitting SQL and fails with
//! `UnsupportedDialectFeature` rather than writing SQL the warehouse rejects.

mod bigquery;
mod databricks;
mod duckdb;
pub mod helpers;
mod mysql;
mod postgres;
mod redshift;
mod snowflake;
mod tsql;

pub use bigquery::BigQuery;
pub use databricks::Databricks;
pub use duckdb::DuckDb;
pub use mysql::MySql;
pub use postgres::Postgres;
pub use redshift::Redshift;
pub use snowflake::Snowflake;
pub use tsql::TSql;

use serde::{Deserialize, Serialize};

use crate::semantic::TimeGranularity;

/// How a dialect spells date truncation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateTruncSyntax {
    /// `DATE_TRUNC('month', x)`
    QuotedPartFirst(&'static str),
    /// `DATETRUNC(MONTH, x)`
    KeywordPartFirst(&'static str),
    /// `DATETIME_TRUNC(x, MONTH)`
    KeywordPartLast(&'static str),
}

/// How a dialect spells a percentile aggregate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PercentileSyntax {
    /// `PERCENTILE_CONT(0.5) WITHIN GROUP (ORDER BY x)`
    WithinGroup(&'static str),
    /// `APPROX_QUANTILE(x, 0.5)`
    Function(&'static str),
}

/// SQL dialect trait - defines how SQL constructs are rendered.
///
/// The default implementations follow ANSI SQL where possible.
pub trait SqlDialect: std::fmt::Debug {
    /// Dialect name for display/logging.
    fn name(&self) -> &'static str;

    /// Quote an identifier (table, column, alias).
    fn quote_identifier(&self, ident: &str) -> String;

    /// Quote a string literal. All dialects use single quotes with `''`
    /// escaping; T-SQL adds an `N` prefix for non-ASCII text.
    fn quote_string(&self, s: &str) -> String {
        helpers::quote_string_single(s)
    }

    /// Whether `ident` must be quoted even when quoting is only applied
    /// where required.
    fn is_reserved_word(&self, ident: &str) -> bool {
        helpers::is_reserved_keyword(ident)
    }

    /// Type name used to cast ratio operands.
    fn float_type(&self) -> &'static str {
        "DOUBLE"
    }

    /// Date truncation syntax, `None` when the dialect has no equivalent.
    fn date_trunc(&self) -> Option<DateTruncSyntax> {
        Some(DateTruncSyntax::QuotedPartFirst("DATE_TRUNC"))
    }

    /// Date part name for a grain, lower-case.
    fn date_part(&self, grain: TimeGranularity) -> &'static str {
        grain.as_str()
    }

    /// Division function that returns NULL for a zero denominator.
    fn safe_divide_function(&self) -> Option<&'static str> {
        None
    }

    /// Percentile syntax for the given variant, `None` when unsupported.
    fn percentile(&self, discrete: bool, approximate: bool) -> Option<PercentileSyntax> {
        helpers::percentile_within_group(discrete, approximate)
    }
}

/// Supported SQL dialects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    #[default]
    DuckDb,
    TSql,
    MySql,
    Postgres,
    Snowflake,
    BigQuery,
    Redshift,
    Databricks,
}

impl Dialect {
    /// Every supported dialect.
    pub const ALL: [Dialect; 8] = [
        Dialect::DuckDb,
        Dialect::TSql,
        Dialect::MySql,
        Dialect::Postgres,
        Dialect::Snowflake,
        Dialect::BigQuery,
        Dialect::Redshift,
        Dialect::Databricks,
    ];

    /// Get the dialect implementation.
    pub fn dialect(&self) -> &'static dyn SqlDialect {
        match self {
            Dialect::DuckDb => &DuckDb,
            Dialect::Postgres => &Postgres,
            Dialect::TSql => &TSql,
            Dialect::MySql => &MySql,
            Dialect::Snowflake => &Snowflake,
            Dialect::BigQuery => &BigQuery,
            Dialect::Redshift => &Redshift,
            Dialect::Databricks => &Databricks,
        }
    }
}

// Implement SqlDialect for Dialect enum by delegating to concrete types
impl SqlDialect for Dialect {
    fn name(&self) -> &'static str {
        self.dialect().name()
    }

    fn quote_identifier(&self, ident: &str) -> String {
        self.dialect().quote_identifier(ident)
    }

    fn quote_string(&self, s: &str) -> String {
        self.dialect().quote_string(s)
    }

    fn is_reserved_word(&self, ident: &str) -> bool {
        self.dialect().is_reserved_word(ident)
    }

    fn float_type(&self) -> &'static str {
        self.dialect().float_type()
    }

    fn date_trunc(&self) -> Option<DateTruncSyntax> {
        self.dialect().date_trunc()
    }

    fn date_part(&self, grain: TimeGranularity) -> &'static str {
        self.dialect().date_part(grain)
    }

    fn safe_divide_function(&self) -> Option<&'static str> {
        self.dialect().safe_divide_function()
    }

    fn percentile(&self, discrete: bool, approximate: bool) -> Option<PercentileSyntax> {
        self.dialect().percentile(discrete, approximate)
    }
}

impl std::fmt::Display for Dialect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.dialect().name())
    }
}
