//! Plan shapes built from requests against the bookings fixture.

use tally::error::{CompileError, Stage};
use tally::plan::{DataflowPlanBuilder, GroupBy, JoinKind, PlanNode, QueryRequest};
use tally::semantic::{SemanticManifest, TimeGranularity};

fn manifest() -> SemanticManifest {
    SemanticManifest::from_json_str(include_str!("../fixtures/bookings_manifest.json"))
        .expect("fixture parses")
}

fn build(request: &QueryRequest) -> Result<PlanNode, CompileError> {
    DataflowPlanBuilder::new(&manifest()).build(request)
}

/// `kind:alias` for every node, preorder.
fn outline(node: &PlanNode) -> Vec<String> {
    let mut out = vec![format!("{}:{}", node.kind_name(), node.alias())];
    for child in node.children() {
        out.extend(outline(child));
    }
    out
}

#[test]
fn test_linked_dimensions_join_each_source_once() {
    let request = QueryRequest::new()
        .metric("bookings")
        .group_by(GroupBy::dimension("country_latest").via("listing"))
        .group_by(GroupBy::dimension("home_country").via("guest"))
        .group_by(GroupBy::dimension("capacity_latest").via("listing"));
    let plan = build(&request).unwrap();

    assert_eq!(
        outline(&plan),
        vec![
            "compute metrics:subq_5",
            "aggregate:subq_4",
            "join:subq_3",
            "read:subq_0",
            "read:subq_1",
            "read:subq_2",
        ]
    );

    let PlanNode::ComputeMetrics(compute) = &plan else {
        panic!("expected compute metrics");
    };
    let PlanNode::Aggregate(aggregate) = compute.input() else {
        panic!("expected aggregate");
    };
    let PlanNode::Join(join) = aggregate.input() else {
        panic!("expected join");
    };
    assert_eq!(join.joins().len(), 2);
    for spec in join.joins() {
        assert_eq!(spec.kind, JoinKind::LeftOuter);
        assert_eq!(spec.conditions.len(), 1);
    }
    assert_eq!(join.joins()[0].prefix.as_deref(), Some("listing"));
    assert_eq!(join.joins()[1].prefix.as_deref(), Some("guest"));

    let PlanNode::Read(listings) = &join.joins()[0].right else {
        panic!("expected read");
    };
    assert_eq!(listings.model(), "listings_latest");
    assert_eq!(
        join.joins()[0].right.output_names(),
        vec!["listing", "country_latest", "capacity_latest"]
    );

    assert_eq!(
        plan.output_names(),
        vec![
            "listing__country_latest",
            "guest__home_country",
            "listing__capacity_latest",
            "bookings",
        ]
    );
}

#[test]
fn test_primary_read_includes_link_entities_then_measures() {
    let request = QueryRequest::new()
        .metric("instant_booking_rate")
        .group_by(GroupBy::dimension("is_instant"))
        .group_by(GroupBy::dimension("country_latest").via("listing"));
    let plan = build(&request).unwrap();

    let mut node = &plan;
    while let Some(first) = node.children().first().copied() {
        node = first;
    }
    assert_eq!(
        node.output_names(),
        vec!["is_instant", "listing", "instant_bookings", "bookings"]
    );
}

#[test]
fn test_no_group_by_skips_join() {
    let plan = build(&QueryRequest::new().metric("average_booking_value")).unwrap();
    assert_eq!(
        outline(&plan),
        vec!["compute metrics:subq_2", "aggregate:subq_1", "read:subq_0"]
    );
    assert_eq!(plan.output_names(), vec!["average_booking_value"]);
}

#[test]
fn test_metrics_share_one_aggregate() {
    let request = QueryRequest::new()
        .metric("bookings")
        .metric("bookings_per_booking")
        .metric("booking_value")
        .group_by(GroupBy::dimension("ds").grain(TimeGranularity::Quarter));
    let plan = build(&request).unwrap();

    let PlanNode::ComputeMetrics(compute) = &plan else {
        panic!("expected compute metrics");
    };
    let PlanNode::Aggregate(aggregate) = compute.input() else {
        panic!("expected aggregate");
    };
    let measures: Vec<&str> = aggregate.measures().iter().map(|m| m.name.as_str()).collect();
    assert_eq!(measures, vec!["bookings", "booking_value"]);
    assert_eq!(aggregate.group_keys().as_slice(), ["ds__quarter".to_string()]);
    assert_eq!(
        plan.output_names(),
        vec!["ds__quarter", "bookings", "bookings_per_booking", "booking_value"]
    );
}

#[test]
fn test_request_from_json() {
    let request: QueryRequest = serde_json::from_str(
        r#"{
            "metrics": ["bookings"],
            "group_by": [
                {"name": "listing"},
                {"name": "country_latest", "via": "listing"},
                {"name": "ds", "grain": "month"}
            ]
        }"#,
    )
    .unwrap();
    let plan = build(&request).unwrap();
    assert_eq!(
        plan.output_names(),
        vec!["listing", "listing__country_latest", "ds__month", "bookings"]
    );
}

// ============================================================================
// Errors
// ============================================================================

#[test]
fn test_grain_finer_than_defined_is_rejected() {
    let manifest = SemanticManifest::from_json_str(
        r#"{
            "semantic_models": [{
                "name": "bookings_source",
                "table": {"name": "fct_bookings"},
                "dimensions": [
                    {"name": "ds", "kind": "time", "data_type": "date", "granularity": "month"}
                ],
                "measures": [{"name": "bookings", "agg": "sum", "expr": {"constant": 1}}]
            }],
            "metrics": [{"name": "bookings", "expr": {"input": "bookings"}}]
        }"#,
    )
    .unwrap();
    let request = QueryRequest::new()
        .metric("bookings")
        .group_by(GroupBy::dimension("ds").grain(TimeGranularity::Week));
    let err = DataflowPlanBuilder::new(&manifest)
        .build(&request)
        .unwrap_err();
    assert_eq!(err.stage(), Stage::Read);
    assert_eq!(
        err.to_string(),
        "read: cannot truncate 'ds' to week: finer than its defined granularity 'month'"
    );
}

#[test]
fn test_grain_on_categorical_dimension_is_rejected() {
    let request = QueryRequest::new()
        .metric("bookings")
        .group_by(GroupBy::dimension("is_instant").grain(TimeGranularity::Day));
    let err = build(&request).unwrap_err();
    assert!(matches!(err, CompileError::InvalidTimeGrain { .. }));
}

#[test]
fn test_duplicate_group_by_is_rejected() {
    let request = QueryRequest::new()
        .metric("bookings")
        .group_by(GroupBy::entity("listing"))
        .group_by(GroupBy::entity("listing"));
    let err = build(&request).unwrap_err();
    assert!(matches!(err, CompileError::DuplicateColumn { ref name, .. } if name == "listing"));
}

#[test]
fn test_unknown_linked_dimension() {
    let request = QueryRequest::new()
        .metric("bookings")
        .group_by(GroupBy::dimension("country").via("listing"));
    let err = build(&request).unwrap_err();
    assert!(matches!(
        err,
        CompileError::UnresolvedElement { ref element, stage: Stage::Request, .. }
            if element == "listing__country"
    ));
}

#[test]
fn test_empty_request_is_rejected() {
    let err = build(&QueryRequest::new()).unwrap_err();
    assert!(matches!(err, CompileError::EmptyQuery { stage: Stage::Request }));
}
