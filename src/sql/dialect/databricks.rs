//! Databricks SQL dialect.
//!
//! Spark SQL quoting with backticks, `TRY_DIVIDE` for NULL-safe division
//! and `APPROX_PERCENTILE`.

use super::helpers;
use super::{PercentileSyntax, SqlDialect};

/// Databricks SQL dialect.
#[derive(Debug, Clone, Copy)]
pub struct Databricks;

impl SqlDialect for Databricks {
    fn name(&self) -> &'static str {
        "databricks"
    }

    fn quote_identifier(&self, ident: &str) -> String {
        helpers::quote_backtick(ident)
    }

    fn safe_divide_function(&self) -> Option<&'static str> {
        Some("TRY_DIVIDE")
    }

    fn percentile(&self, discrete: bool, approximate: bool) -> Option<PercentileSyntax> {
        helpers::percentile_with_approx(discrete, approximate, "APPROX_PERCENTILE")
    }
}
