//! Amazon Redshift dialect.
//!
//! Redshift is PostgreSQL 8.0 based: double quotes, `DATE_TRUNC`,
//! exact ordered-set percentiles only.

use super::helpers;
use super::SqlDialect;

/// Amazon Redshift dialect.
#[derive(Debug, Clone, Copy)]
pub struct Redshift;

impl SqlDialect for Redshift {
    fn name(&self) -> &'static str {
        "redshift"
    }

    fn quote_identifier(&self, ident: &str) -> String {
        helpers::quote_double(ident)
    }

    fn float_type(&self) -> &'static str {
        "DOUBLE PRECISION"
    }
}
