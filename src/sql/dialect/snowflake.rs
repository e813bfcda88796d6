//! Snowflake SQL dialect.

use super::helpers;
use super::{PercentileSyntax, SqlDialect};

/// Snowflake SQL dialect.
#[derive(Debug, Clone, Copy)]
pub struct Snowflake;

impl SqlDialect for Snowflake {
    fn name(&self) -> &'static str {
        "snowflake"
    }

    fn quote_identifier(&self, ident: &str) -> String {
        helpers::quote_double(ident)
    }

    fn percentile(&self, discrete: bool, approximate: bool) -> Option<PercentileSyntax> {
        helpers::percentile_with_approx(discrete, approximate, "APPROX_PERCENTILE")
    }
}
