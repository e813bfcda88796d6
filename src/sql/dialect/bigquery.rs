//! BigQuery SQL dialect.
//!
//! BigQuery features:
//! - Backtick identifier quoting
//! - `DATETIME_TRUNC(x, PART)` with the part last; weeks start on Monday (`ISOWEEK`)
//! - `SAFE_DIVIDE` returns NULL on a zero denominator
//! - No ordered-set percentile aggregates

use super::helpers;
use super::{DateTruncSyntax, PercentileSyntax, SqlDialect};
use crate::semantic::TimeGranularity;

/// BigQuery SQL dialect.
#[derive(Debug, Clone, Copy)]
pub struct BigQuery;

impl SqlDialect for BigQuery {
    fn name(&self) -> &'static str {
        "bigquery"
    }

    fn quote_identifier(&self, ident: &str) -> String {
        helpers::quote_backtick(ident)
    }

    fn float_type(&self) -> &'static str {
        "FLOAT64"
    }

    fn date_trunc(&self) -> Option<DateTruncSyntax> {
        Some(DateTruncSyntax::KeywordPartLast("DATETIME_TRUNC"))
    }

    fn date_part(&self, grain: TimeGranularity) -> &'static str {
        match grain {
            TimeGranularity::Week => "isoweek",
            other => other.as_str(),
        }
    }

    fn safe_divide_function(&self) -> Option<&'static str> {
        Some("SAFE_DIVIDE")
    }

    fn percentile(&self, _discrete: bool, _approximate: bool) -> Option<PercentileSyntax> {
        None
    }
}
