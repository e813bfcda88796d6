//! MySQL dialect.
//!
//! Backtick quoting. MySQL has no date truncation function and no
//! percentile aggregates, so plans using either are rejected.

use super::helpers;
use super::{DateTruncSyntax, PercentileSyntax, SqlDialect};

/// MySQL dialect.
#[derive(Debug, Clone, Copy)]
pub struct MySql;

impl SqlDialect for MySql {
    fn name(&self) -> &'static str {
        "mysql"
    }

    fn quote_identifier(&self, ident: &str) -> String {
        helpers::quote_backtick(ident)
    }

    fn date_trunc(&self) -> Option<DateTruncSyntax> {
        None
    }

    fn percentile(&self, _discrete: bool, _approximate: bool) -> Option<PercentileSyntax> {
        None
    }
}
