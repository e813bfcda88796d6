//! T-SQL (SQL Server / Azure SQL) dialect.
//!
//! T-SQL differs from ANSI in the places the renderer cares about:
//! - Square bracket identifier quoting (`[name]`)
//! - N'...' prefix for Unicode strings
//! - `DATETRUNC(PART, x)` (SQL Server 2022+)
//! - `FLOAT` as the double precision type
//! - PERCENTILE_CONT is window-only, so percentile aggregates are unsupported

use super::helpers;
use super::{DateTruncSyntax, PercentileSyntax, SqlDialect};

/// T-SQL (SQL Server) dialect.
#[derive(Debug, Clone, Copy)]
pub struct TSql;

impl SqlDialect for TSql {
    fn name(&self) -> &'static str {
        "tsql"
    }

    fn quote_identifier(&self, ident: &str) -> String {
        helpers::quote_bracket(ident)
    }

    fn quote_string(&self, s: &str) -> String {
        if !s.is_ascii() {
            helpers::quote_string_unicode(s)
        } else {
            helpers::quote_string_single(s)
        }
    }

    fn float_type(&self) -> &'static str {
        "FLOAT"
    }

    fn date_trunc(&self) -> Option<DateTruncSyntax> {
        Some(DateTruncSyntax::KeywordPartFirst("DATETRUNC"))
    }

    fn percentile(&self, _discrete: bool, _approximate: bool) -> Option<PercentileSyntax> {
        None
    }
}
