//! DuckDB SQL dialect.
//!
//! DuckDB is PostgreSQL-compatible with extensions:
//! - ANSI identifier quoting (`"`)
//! - `DATE_TRUNC('part', x)`
//! - Ordered-set percentiles plus `APPROX_QUANTILE`

use super::helpers;
use super::{PercentileSyntax, SqlDialect};

/// DuckDB SQL dialect.
#[derive(Debug, Clone, Copy)]
pub struct DuckDb;

impl SqlDialect for DuckDb {
    fn name(&self) -> &'static str {
        "duckdb"
    }

    fn quote_identifier(&self, ident: &str) -> String {
        helpers::quote_double(ident)
    }

    fn percentile(&self, discrete: bool, approximate: bool) -> Option<PercentileSyntax> {
        helpers::percentile_with_approx(discrete, approximate, "APPROX_QUANTILE")
    }
}
