//! End-to-end scenarios over the bookings manifest fixture.

use insta::assert_snapshot;
use tally::error::{CompileError, Stage};
use tally::plan::{
    plan_aggregate, AliasGenerator, ElementRequest, GroupBy, GroupKeySet, MeasureSpec,
    QueryRequest, SourceReader,
};
use tally::semantic::{AggregationType, SemanticManifest};
use tally::sql::{validate_sql, Dialect, DialectProfile, QuotePolicy};
use tally::{compile_query, CompileOptions};

fn manifest() -> SemanticManifest {
    SemanticManifest::from_json_str(include_str!("../fixtures/bookings_manifest.json"))
        .expect("fixture parses")
}

fn bookings_by_listing_country(metric: &str) -> QueryRequest {
    QueryRequest::new()
        .metric(metric)
        .group_by(GroupBy::entity("listing"))
        .group_by(GroupBy::dimension("country_latest").via("listing"))
}

fn compile(request: &QueryRequest, profile: DialectProfile) -> String {
    let options = CompileOptions::new(profile).with_validation(true);
    compile_query(&manifest(), request, &options).unwrap().sql
}

// ============================================================================
// Simple metric with a linked dimension
// ============================================================================

#[test]
fn scenario_a_duckdb() {
    let sql = compile(
        &bookings_by_listing_country("bookings"),
        DialectProfile::new(Dialect::DuckDb),
    );
    assert_snapshot!(sql);
}

#[test]
fn scenario_a_tsql_always_quoted() {
    let sql = compile(
        &bookings_by_listing_country("bookings"),
        DialectProfile::new(Dialect::TSql).with_quoting(QuotePolicy::Always),
    );
    assert_snapshot!(sql);
}

#[test]
fn scenario_a_is_deterministic() {
    let request = bookings_by_listing_country("bookings");
    let first = compile(&request, DialectProfile::default());
    let second = compile(&request, DialectProfile::default());
    assert_eq!(first, second);
}

// ============================================================================
// Ratio metric
// ============================================================================

#[test]
fn scenario_b_ratio_is_null_safe() {
    let sql = compile(
        &bookings_by_listing_country("bookings_per_booking"),
        DialectProfile::new(Dialect::DuckDb),
    );
    assert!(
        sql.contains(
            "CAST(subq_3.bookings AS DOUBLE) / NULLIF(CAST(subq_3.bookings AS DOUBLE), 0) \
             AS bookings_per_booking"
        ),
        "{sql}"
    );
    // A measure used twice is aggregated once.
    assert_eq!(sql.matches("SUM(subq_2.bookings) AS bookings").count(), 1);
}

#[test]
fn scenario_b_ratio_native_division() {
    let sql = compile(
        &bookings_by_listing_country("bookings_per_booking"),
        DialectProfile::new(Dialect::BigQuery),
    );
    assert!(
        sql.contains(
            "SAFE_DIVIDE(CAST(subq_3.bookings AS FLOAT64), CAST(subq_3.bookings AS FLOAT64)) \
             AS bookings_per_booking"
        ),
        "{sql}"
    );
}

// ============================================================================
// Failures
// ============================================================================

#[test]
fn scenario_c_unknown_metric_fails_without_sql() {
    let err = compile_query(
        &manifest(),
        &QueryRequest::new().metric("bookngs"),
        &CompileOptions::default(),
    )
    .unwrap_err();
    assert_eq!(err.stage(), Stage::Request);
    assert_eq!(
        err.to_string(),
        "request: unresolved element 'bookngs' in semantic manifest metrics. \
         Did you mean 'bookings'?"
    );
}

#[test]
fn scenario_c_unknown_dimension_fails() {
    let request = QueryRequest::new()
        .metric("bookings")
        .group_by(GroupBy::dimension("country_latest"));
    let err = compile_query(&manifest(), &request, &CompileOptions::default()).unwrap_err();
    assert!(matches!(
        err,
        CompileError::UnresolvedElement { ref suggestion, .. }
            if suggestion.as_deref() == Some("listing__country_latest")
    ));
}

#[test]
fn scenario_d_group_key_missing_from_input() {
    let manifest = manifest();
    let model = manifest.model("bookings_source").unwrap();
    let mut aliases = AliasGenerator::new();
    let read = SourceReader::new(model)
        .read(
            &[ElementRequest::new("listing"), ElementRequest::new("bookings")],
            &mut aliases,
        )
        .unwrap();

    let err = plan_aggregate(
        read,
        GroupKeySet::new(["is_instant"]).unwrap(),
        vec![MeasureSpec::new("bookings", AggregationType::Sum)],
        &mut aliases,
    )
    .unwrap_err();
    assert!(matches!(
        err,
        CompileError::MissingDimension { ref dimension, stage: Stage::Aggregate }
            if dimension == "is_instant"
    ));
}

#[test]
fn scenario_d_linked_key_before_join() {
    let manifest = manifest();
    let model = manifest.model("bookings_source").unwrap();
    let mut aliases = AliasGenerator::new();
    let read = SourceReader::new(model)
        .read(
            &[ElementRequest::new("listing"), ElementRequest::new("bookings")],
            &mut aliases,
        )
        .unwrap();

    let err = plan_aggregate(
        read,
        GroupKeySet::new(["listing__country_latest"]).unwrap(),
        vec![MeasureSpec::new("bookings", AggregationType::Sum)],
        &mut aliases,
    )
    .unwrap_err();
    assert_eq!(
        err.to_string(),
        "aggregate: 'listing__country_latest' needs a join on entity 'listing' \
         that has not been applied yet"
    );
}

#[test]
fn scenario_output_parses_for_every_dialect() {
    let request = bookings_by_listing_country("instant_booking_rate");
    for dialect in Dialect::ALL {
        let sql = compile(&request, DialectProfile::new(dialect));
        validate_sql(&sql, dialect).unwrap();
    }
}
