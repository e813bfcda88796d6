//! Shared helper functions for SQL dialect implementations.
//!
//! Reusable building blocks that dialects compose to implement
//! `SqlDialect` with minimal duplication.

use super::PercentileSyntax;

// =============================================================================
// Identifier Quoting
// =============================================================================

/// Quote identifier with double quotes (ANSI style).
/// Used by: Postgres, DuckDB, Snowflake, Redshift
pub fn quote_double(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

/// Quote identifier with backticks.
/// Used by: MySQL, BigQuery, Databricks
pub fn quote_backtick(ident: &str) -> String {
    format!("`{}`", ident.replace('`', "``"))
}

/// Quote identifier with square brackets.
/// Used by: T-SQL (SQL Server, Azure Synapse)
pub fn quote_bracket(ident: &str) -> String {
    format!("[{}]", ident.replace(']', "]]"))
}

/// Lower-case identifier made of `[a-z0-9_]`, not starting with a digit.
/// Such identifiers are stored unchanged by every supported warehouse.
pub fn is_bare_identifier(ident: &str) -> bool {
    let mut chars = ident.chars();
    match chars.next() {
        Some(c) if c.is_ascii_lowercase() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
}

/// Identifier made of `[A-Za-z0-9_]`, not starting with a digit, in any case.
pub fn is_plain_identifier(ident: &str) -> bool {
    let mut chars = ident.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

// Reserved in at least one supported dialect.
const RESERVED_KEYWORDS: &[&str] = &[
    "all", "and", "any", "as", "asc", "between", "by", "case", "cast", "check", "column",
    "constraint", "create", "cross", "current_date", "current_time", "current_timestamp",
    "current_user", "default", "delete", "desc", "distinct", "drop", "else", "end", "except",
    "exists", "false", "fetch", "for", "foreign", "from", "full", "grant", "group", "having", "in",
    "inner", "insert", "intersect", "interval", "into", "is", "join", "key", "lateral", "left",
    "like", "limit", "natural", "not", "null", "of", "offset", "on", "or", "order", "outer",
    "over", "partition", "primary", "qualify", "range", "references", "right", "rows", "select",
    "set", "some", "table", "then", "to", "top", "true", "union", "unique", "update", "user",
    "using", "values", "when", "where", "window", "with",
];

/// Whether a lower-cased identifier collides with a reserved keyword.
pub fn is_reserved_keyword(ident: &str) -> bool {
    let lower = ident.to_ascii_lowercase();
    RESERVED_KEYWORDS.binary_search(&lower.as_str()).is_ok()
}

// =============================================================================
// String Quoting
// =============================================================================

/// Quote string with single quotes (standard SQL).
pub fn quote_string_single(s: &str) -> String {
    format!("'{}'", s.replace('\'', "''"))
}

/// Quote string with N prefix for Unicode (T-SQL).
pub fn quote_string_unicode(s: &str) -> String {
    format!("N'{}'", s.replace('\'', "''"))
}

// =============================================================================
// Percentiles
// =============================================================================

/// Exact ordered-set percentiles, no approximate variant.
/// Used by: Postgres, Redshift
pub fn percentile_within_group(discrete: bool, approximate: bool) -> Option<PercentileSyntax> {
    match (discrete, approximate) {
        (false, false) => Some(PercentileSyntax::WithinGroup("PERCENTILE_CONT")),
        (true, false) => Some(PercentileSyntax::WithinGroup("PERCENTILE_DISC")),
        (_, true) => None,
    }
}

/// Exact ordered-set percentiles plus a continuous approximate function.
/// Used by: DuckDB, Snowflake, Databricks
pub fn percentile_with_approx(
    discrete: bool,
    approximate: bool,
    approx_function: &'static str,
) -> Option<PercentileSyntax> {
    match (discrete, approximate) {
        (false, true) => Some(PercentileSyntax::Function(approx_function)),
        _ => percentile_within_group(discrete, approximate),
    }
}
