//! Property tests over randomly shaped requests against the bookings fixture.

use proptest::prelude::*;
use tally::plan::{DataflowPlanBuilder, GroupBy, PlanNode, QueryRequest};
use tally::semantic::{SemanticManifest, TimeGranularity};
use tally::sql::{render, select_shapes, validate_sql, Dialect, DialectProfile};

fn manifest() -> SemanticManifest {
    SemanticManifest::from_json_str(include_str!("../fixtures/bookings_manifest.json"))
        .expect("fixture parses")
}

// ---------------------------------------------------------------------------
// Strategies
// ---------------------------------------------------------------------------

fn group_by_pool() -> Vec<GroupBy> {
    vec![
        GroupBy::entity("listing"),
        GroupBy::entity("guest"),
        GroupBy::dimension("is_instant"),
        GroupBy::dimension("ds").grain(TimeGranularity::Month),
        GroupBy::dimension("ds").grain(TimeGranularity::Week),
        GroupBy::dimension("country_latest").via("listing"),
        GroupBy::dimension("capacity_latest").via("listing"),
        GroupBy::dimension("home_country").via("guest"),
    ]
}

const METRICS: [&str; 8] = [
    "bookings",
    "booking_value",
    "instant_bookings",
    "bookings_per_booking",
    "instant_booking_rate",
    "average_booking_value",
    "booking_value_refunded",
    "net_booking_offset",
];

// MySQL has no date truncation, so grains would fail to render there.
const DIALECTS: [Dialect; 7] = [
    Dialect::DuckDb,
    Dialect::TSql,
    Dialect::Postgres,
    Dialect::Snowflake,
    Dialect::BigQuery,
    Dialect::Redshift,
    Dialect::Databricks,
];

fn arb_request() -> impl Strategy<Value = QueryRequest> {
    let pool = group_by_pool();
    let group_by = proptest::sample::subsequence(pool.clone(), 0..=pool.len()).prop_shuffle();
    let metrics = proptest::sample::subsequence(METRICS.to_vec(), 1..=3).prop_shuffle();

    (group_by, metrics).prop_map(|(group_by, metrics)| QueryRequest {
        metrics: metrics.into_iter().map(String::from).collect(),
        group_by,
    })
}

fn arb_dialect() -> impl Strategy<Value = Dialect> {
    proptest::sample::select(DIALECTS.to_vec())
}

fn collect_aliases<'a>(node: &'a PlanNode, out: &mut Vec<&'a str>) {
    out.push(node.alias());
    for child in node.children() {
        collect_aliases(child, out);
    }
}

// ---------------------------------------------------------------------------
// Properties
// ---------------------------------------------------------------------------

proptest! {
    /// The same request always yields the same plan and the same SQL.
    #[test]
    fn compilation_is_deterministic(request in arb_request(), dialect in arb_dialect()) {
        let manifest = manifest();
        let profile = DialectProfile::new(dialect);

        let first = DataflowPlanBuilder::new(&manifest).build(&request).unwrap();
        let second = DataflowPlanBuilder::new(&manifest).build(&request).unwrap();
        prop_assert_eq!(&first, &second);
        prop_assert_eq!(render(&first, &profile).unwrap(), render(&second, &profile).unwrap());
    }

    /// Output columns are the group-by items in request order, then the metrics.
    #[test]
    fn outputs_follow_request_order(request in arb_request()) {
        let plan = DataflowPlanBuilder::new(&manifest()).build(&request).unwrap();

        let mut expected: Vec<String> = request.group_by.iter().map(GroupBy::output_name).collect();
        expected.extend(request.metrics.iter().cloned());
        prop_assert_eq!(plan.output_names(), expected);
    }

    /// GROUP BY lists exactly the leading key columns of the aggregate SELECT.
    #[test]
    fn group_by_matches_select_keys(request in arb_request(), dialect in arb_dialect()) {
        let plan = DataflowPlanBuilder::new(&manifest()).build(&request).unwrap();
        let sql = render(&plan, &DialectProfile::new(dialect)).unwrap();
        let shapes = select_shapes(&sql, dialect).unwrap();

        let keys: Vec<String> = request.group_by.iter().map(GroupBy::output_name).collect();
        let outer = &shapes[0];
        prop_assert_eq!(&outer.columns[..keys.len()], keys.as_slice());
        prop_assert!(outer.group_by.is_empty());

        let aggregate = &shapes[1];
        prop_assert_eq!(&aggregate.group_by, &keys);
        prop_assert_eq!(&aggregate.columns[..keys.len()], keys.as_slice());
    }

    /// Rendered SQL parses in every dialect, whatever metric formulas are mixed.
    #[test]
    fn rendered_sql_parses(request in arb_request(), dialect in arb_dialect()) {
        let plan = DataflowPlanBuilder::new(&manifest()).build(&request).unwrap();
        let sql = render(&plan, &DialectProfile::new(dialect)).unwrap();
        prop_assert!(validate_sql(&sql, dialect).is_ok(), "{}", sql);
    }

    /// Every node alias is unique within a plan.
    #[test]
    fn aliases_are_unique(request in arb_request()) {
        let plan = DataflowPlanBuilder::new(&manifest()).build(&request).unwrap();
        let mut aliases = Vec::new();
        collect_aliases(&plan, &mut aliases);

        let mut deduped = aliases.clone();
        deduped.sort_unstable();
        deduped.dedup();
        prop_assert_eq!(deduped.len(), aliases.len());
        prop_assert_eq!(aliases.len(), plan.node_count());
    }
}
