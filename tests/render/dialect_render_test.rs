//! Per-dialect rendering of grains, ratios and percentiles.

use tally::error::{CompileError, Stage};
use tally::plan::{GroupBy, QueryRequest};
use tally::semantic::{SemanticManifest, TimeGranularity};
use tally::sql::{validate_sql, Dialect, DialectProfile, DivisionStyle, QuotePolicy, SqlDialect};
use tally::{compile_query, CompileOptions};

fn manifest() -> SemanticManifest {
    SemanticManifest::from_json_str(include_str!("../fixtures/bookings_manifest.json"))
        .expect("fixture parses")
}

fn rate_by_month() -> QueryRequest {
    QueryRequest::new()
        .metric("instant_booking_rate")
        .group_by(GroupBy::dimension("ds").grain(TimeGranularity::Month))
}

fn render(request: &QueryRequest, profile: DialectProfile) -> Result<String, CompileError> {
    let options = CompileOptions::new(profile);
    compile_query(&manifest(), request, &options).map(|out| out.sql)
}

fn assert_renders(dialect: Dialect, fragments: &[&str]) {
    let sql = render(&rate_by_month(), DialectProfile::new(dialect)).unwrap();
    validate_sql(&sql, dialect).unwrap();
    for fragment in fragments {
        assert!(sql.contains(fragment), "{dialect}: missing `{fragment}` in\n{sql}");
    }
}

// ============================================================================
// Dialect spellings
// ============================================================================

#[test]
fn test_duckdb() {
    assert_renders(
        Dialect::DuckDb,
        &[
            "DATE_TRUNC('month', bookings_source_src_0.ds) AS ds__month",
            "SUM(CASE WHEN subq_0.instant_bookings THEN 1 ELSE 0 END) AS instant_bookings",
            "CAST(subq_1.instant_bookings AS DOUBLE) / NULLIF(CAST(subq_1.bookings AS DOUBLE), 0)",
        ],
    );
}

#[test]
fn test_postgres() {
    assert_renders(
        Dialect::Postgres,
        &[
            "DATE_TRUNC('month', bookings_source_src_0.ds) AS ds__month",
            "CAST(subq_1.instant_bookings AS DOUBLE PRECISION) \
             / NULLIF(CAST(subq_1.bookings AS DOUBLE PRECISION), 0)",
        ],
    );
}

#[test]
fn test_redshift() {
    assert_renders(
        Dialect::Redshift,
        &["NULLIF(CAST(subq_1.bookings AS DOUBLE PRECISION), 0)"],
    );
}

#[test]
fn test_snowflake() {
    assert_renders(
        Dialect::Snowflake,
        &["DATE_TRUNC('month', bookings_source_src_0.ds) AS ds__month"],
    );
}

#[test]
fn test_bigquery() {
    assert_renders(
        Dialect::BigQuery,
        &[
            "DATETIME_TRUNC(bookings_source_src_0.ds, MONTH) AS ds__month",
            "SAFE_DIVIDE(CAST(subq_1.instant_bookings AS FLOAT64), \
             CAST(subq_1.bookings AS FLOAT64)) AS instant_booking_rate",
        ],
    );
}

#[test]
fn test_databricks() {
    assert_renders(
        Dialect::Databricks,
        &[
            "DATE_TRUNC('month', bookings_source_src_0.ds) AS ds__month",
            "TRY_DIVIDE(CAST(subq_1.instant_bookings AS DOUBLE), CAST(subq_1.bookings AS DOUBLE))",
        ],
    );
}

#[test]
fn test_tsql() {
    assert_renders(
        Dialect::TSql,
        &[
            "DATETRUNC(MONTH, bookings_source_src_0.ds) AS ds__month",
            "CAST(subq_1.instant_bookings AS FLOAT) / NULLIF(CAST(subq_1.bookings AS FLOAT), 0)",
        ],
    );
}

#[test]
fn test_mysql_rejects_date_truncation() {
    let err = render(&rate_by_month(), DialectProfile::new(Dialect::MySql)).unwrap_err();
    assert_eq!(err.stage(), Stage::Render);
    assert_eq!(
        err.to_string(),
        "mysql: unsupported dialect feature: date truncation to month"
    );
}

#[test]
fn test_bigquery_week_is_iso() {
    let request = QueryRequest::new()
        .metric("bookings")
        .group_by(GroupBy::dimension("ds").grain(TimeGranularity::Week));
    let sql = render(&request, DialectProfile::new(Dialect::BigQuery)).unwrap();
    assert!(sql.contains("DATETIME_TRUNC(bookings_source_src_0.ds, ISOWEEK) AS ds__week"));
}

// ============================================================================
// Profile options
// ============================================================================

#[test]
fn test_case_guard_division() {
    let profile = DialectProfile::new(Dialect::Postgres).with_division(DivisionStyle::CaseGuard);
    let sql = render(&rate_by_month(), profile).unwrap();
    assert!(
        sql.contains(
            "CASE WHEN CAST(subq_1.bookings AS DOUBLE PRECISION) = 0 THEN NULL \
             ELSE CAST(subq_1.instant_bookings AS DOUBLE PRECISION) \
             / CAST(subq_1.bookings AS DOUBLE PRECISION) END AS instant_booking_rate"
        ),
        "{sql}"
    );
    validate_sql(&sql, Dialect::Postgres).unwrap();
}

#[test]
fn test_nullif_overrides_native_division() {
    let profile = DialectProfile::new(Dialect::BigQuery).with_division(DivisionStyle::NullIf);
    let sql = render(&rate_by_month(), profile).unwrap();
    assert!(!sql.contains("SAFE_DIVIDE"));
    assert!(sql.contains("NULLIF(CAST(subq_1.bookings AS FLOAT64), 0)"));
}

#[test]
fn test_native_division_without_function_is_rejected() {
    let profile = DialectProfile::new(Dialect::DuckDb).with_division(DivisionStyle::Native);
    let err = render(&rate_by_month(), profile).unwrap_err();
    assert!(matches!(
        err,
        CompileError::UnsupportedDialectFeature { dialect: Dialect::DuckDb, .. }
    ));
}

#[test]
fn test_always_quoted_output_parses() {
    let request = QueryRequest::new()
        .metric("bookings_per_booking")
        .group_by(GroupBy::entity("listing"))
        .group_by(GroupBy::dimension("country_latest").via("listing"))
        .group_by(GroupBy::dimension("home_country").via("guest"));
    for dialect in Dialect::ALL {
        let profile = DialectProfile::new(dialect).with_quoting(QuotePolicy::Always);
        let sql = render(&request, profile).unwrap();
        validate_sql(&sql, dialect).unwrap();
        let quoted = dialect.quote_identifier("listing__country_latest");
        assert!(sql.contains(&quoted), "{dialect}: {sql}");
    }
}

#[test]
fn test_stage_comments_can_be_disabled() {
    let sql = render(
        &rate_by_month(),
        DialectProfile::new(Dialect::DuckDb).without_stage_comments(),
    )
    .unwrap();
    assert!(!sql.contains("--"));
    assert!(sql.starts_with("SELECT\n"));
}

// ============================================================================
// Percentiles
// ============================================================================

const PERCENTILE_MANIFEST: &str = r#"{
    "semantic_models": [{
        "name": "bookings_source",
        "table": {"name": "fct_bookings"},
        "entities": [
            {"name": "listing", "expr": "listing_id", "kind": "foreign", "data_type": "int"}
        ],
        "measures": [
            {"name": "median_value", "agg": {"percentile": {"percentile": 0.5}},
             "expr": {"column": "booking_value"}, "data_type": "decimal"},
            {"name": "approx_p90_value",
             "agg": {"percentile": {"percentile": 0.9, "approximate": true}},
             "expr": {"column": "booking_value"}, "data_type": "decimal"}
        ]
    }],
    "metrics": [
        {"name": "median_booking_value", "expr": {"input": "median_value"}},
        {"name": "p90_booking_value", "expr": {"input": "approx_p90_value"}}
    ]
}"#;

fn render_percentile(metric: &str, dialect: Dialect) -> Result<String, CompileError> {
    let manifest = SemanticManifest::from_json_str(PERCENTILE_MANIFEST).unwrap();
    let request = QueryRequest::new()
        .metric(metric)
        .group_by(GroupBy::entity("listing"));
    let options = CompileOptions::new(DialectProfile::new(dialect));
    compile_query(&manifest, &request, &options).map(|out| out.sql)
}

#[test]
fn test_exact_percentile() {
    let sql = render_percentile("median_booking_value", Dialect::Postgres).unwrap();
    assert!(sql.contains(
        "PERCENTILE_CONT(0.5) WITHIN GROUP (ORDER BY subq_0.median_value) AS median_value"
    ));
}

#[test]
fn test_approximate_percentile() {
    let sql = render_percentile("p90_booking_value", Dialect::DuckDb).unwrap();
    assert!(sql.contains("APPROX_QUANTILE(subq_0.approx_p90_value, 0.9) AS approx_p90_value"));

    let sql = render_percentile("p90_booking_value", Dialect::Snowflake).unwrap();
    assert!(sql.contains("APPROX_PERCENTILE(subq_0.approx_p90_value, 0.9)"));
}

#[test]
fn test_percentile_unsupported() {
    for dialect in [Dialect::BigQuery, Dialect::MySql, Dialect::TSql] {
        let err = render_percentile("median_booking_value", dialect).unwrap_err();
        assert_eq!(
            err.to_string(),
            format!("{dialect}: unsupported dialect feature: continuous percentile")
        );
    }

    let err = render_percentile("p90_booking_value", Dialect::Redshift).unwrap_err();
    assert_eq!(
        err.to_string(),
        "redshift: unsupported dialect feature: approximate continuous percentile"
    );
}

// ============================================================================
// Physical column names
// ============================================================================

const MIXED_CASE_MANIFEST: &str = r#"{
    "semantic_models": [{
        "name": "bookings_source",
        "table": {"name": "fct_bookings"},
        "dimensions": [
            {"name": "country", "expr": "Country", "kind": "categorical", "data_type": "string"},
            {"name": "booking_month", "expr": "EXTRACT(month FROM ds)",
             "kind": "categorical", "data_type": "int"}
        ],
        "measures": [{"name": "bookings", "agg": "sum", "expr": {"constant": 1}}]
    }],
    "metrics": [{"name": "bookings", "expr": {"input": "bookings"}}]
}"#;

fn render_mixed_case(group_by: &str, profile: DialectProfile) -> String {
    let manifest = SemanticManifest::from_json_str(MIXED_CASE_MANIFEST).unwrap();
    let request = QueryRequest::new()
        .metric("bookings")
        .group_by(GroupBy::dimension(group_by));
    let options = CompileOptions::new(profile).with_validation(true);
    compile_query(&manifest, &request, &options).unwrap().sql
}

#[test]
fn test_mixed_case_column_is_qualified_and_quoted() {
    let always = DialectProfile::new(Dialect::Postgres).with_quoting(QuotePolicy::Always);
    let sql = render_mixed_case("country", always);
    assert!(
        sql.contains("\"bookings_source_src_0\".\"Country\" AS \"country\""),
        "{sql}"
    );

    let sql = render_mixed_case("country", DialectProfile::new(Dialect::Postgres));
    assert!(sql.contains("bookings_source_src_0.\"Country\" AS country"), "{sql}");

    let sql = render_mixed_case("country", DialectProfile::new(Dialect::TSql));
    assert!(sql.contains("bookings_source_src_0.[Country] AS country"), "{sql}");
}

#[test]
fn test_column_expression_passes_through() {
    let always = DialectProfile::new(Dialect::Postgres).with_quoting(QuotePolicy::Always);
    let sql = render_mixed_case("booking_month", always);
    assert!(sql.contains("EXTRACT(month FROM ds) AS \"booking_month\""), "{sql}");
}

// ============================================================================
// Validity windows
// ============================================================================

const WINDOWED_MANIFEST: &str = r#"{
    "semantic_models": [
        {
            "name": "bookings_source",
            "table": {"name": "fct_bookings"},
            "entities": [
                {"name": "listing", "expr": "listing_id", "kind": "foreign", "data_type": "int"}
            ],
            "dimensions": [
                {"name": "ds", "kind": "time", "data_type": "date", "granularity": "day"}
            ],
            "measures": [{"name": "bookings", "agg": "sum", "expr": {"constant": 1}}]
        },
        {
            "name": "listings",
            "table": {"name": "dim_listings"},
            "entities": [
                {"name": "listing", "expr": "listing_id", "kind": "primary", "data_type": "int"}
            ],
            "dimensions": [
                {"name": "window_start", "expr": "active_from", "kind": "time",
                 "data_type": "date", "granularity": "day"},
                {"name": "window_end", "expr": "active_to", "kind": "time",
                 "data_type": "date", "granularity": "day"},
                {"name": "capacity", "kind": "categorical", "data_type": "int"}
            ],
            "validity_window": {"start": "window_start", "end": "window_end"}
        }
    ],
    "metrics": [{"name": "bookings", "expr": {"input": "bookings"}}]
}"#;

#[test]
fn test_validity_window_join_condition() {
    let manifest = SemanticManifest::from_json_str(WINDOWED_MANIFEST).unwrap();
    let request = QueryRequest::new()
        .metric("bookings")
        .group_by(GroupBy::dimension("capacity").via("listing"));
    for dialect in Dialect::ALL {
        let options = CompileOptions::new(DialectProfile::new(dialect));
        let sql = compile_query(&manifest, &request, &options).unwrap().sql;
        validate_sql(&sql, dialect).unwrap();
        assert!(
            sql.contains(
                "    ON\n      \
                 subq_0.listing = subq_1.listing\n      \
                 AND subq_0.ds >= subq_1.window_start\n      \
                 AND (subq_0.ds < subq_1.window_end OR subq_1.window_end IS NULL)\n"
            ),
            "{dialect}: {sql}"
        );
    }
}
