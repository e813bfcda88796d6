//! Dataflow plan builder: turns a metric query request into a plan tree.
//!
//! Resolution happens up front so that every name error surfaces before
//! any node is built:
//! 1. metrics, then the measures they reference (one anchoring model)
//! 2. group-by items, locally or through an entity link
//! 3. read, join, aggregate, compute metrics

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{
    plan_aggregate, plan_join, plan_metrics, AliasGenerator, ElementRequest, GroupKeySet,
    JoinTarget, MeasureSpec, MetricSpec, PlanNode, SourceReader,
};
use crate::error::{CompileError, CompileResult, Stage};
use crate::semantic::{
    suggest_closest, Element, Metric, SemanticManifest, SemanticModel, TimeGranularity,
};

/// One group-by item of a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupBy {
    /// Dimension or entity name.
    pub name: String,
    /// Entity through which `name` is reached from the measures' model.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub via: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grain: Option<TimeGranularity>,
}

impl GroupBy {
    pub fn dimension(name: &str) -> Self {
        Self {
            name: name.into(),
            via: None,
            grain: None,
        }
    }

    pub fn entity(name: &str) -> Self {
        Self::dimension(name)
    }

    pub fn via(mut self, entity: &str) -> Self {
        self.via = Some(entity.into());
        self
    }

    pub fn grain(mut self, grain: TimeGranularity) -> Self {
        self.grain = Some(grain);
        self
    }

    /// Logical column name: `[<via>__]<name>[__<grain>]`.
    pub fn output_name(&self) -> String {
        let mut name = match &self.via {
            Some(entity) => format!("{}__{}", entity, self.name),
            None => self.name.clone(),
        };
        if let Some(grain) = self.grain {
            name.push_str("__");
            name.push_str(grain.as_str());
        }
        name
    }

    fn element(&self) -> ElementRequest {
        ElementRequest {
            name: self.name.clone(),
            grain: self.grain,
        }
    }
}

/// Metrics to compute, sliced by group-by items.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryRequest {
    pub metrics: Vec<String>,
    #[serde(default)]
    pub group_by: Vec<GroupBy>,
}

impl QueryRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn metric(mut self, name: &str) -> Self {
        self.metrics.push(name.into());
        self
    }

    pub fn group_by(mut self, item: GroupBy) -> Self {
        self.group_by.push(item);
        self
    }
}

/// A secondary source joined through one entity.
struct LinkedRead<'a> {
    entity: String,
    model: &'a SemanticModel,
    elements: Vec<ElementRequest>,
}

/// Builds plans against one manifest.
pub struct DataflowPlanBuilder<'a> {
    manifest: &'a SemanticManifest,
}

impl<'a> DataflowPlanBuilder<'a> {
    pub fn new(manifest: &'a SemanticManifest) -> Self {
        Self { manifest }
    }

    pub fn build(&self, request: &QueryRequest) -> CompileResult<PlanNode> {
        if request.metrics.is_empty() {
            return Err(CompileError::EmptyQuery {
                stage: Stage::Request,
            });
        }

        let metrics = request
            .metrics
            .iter()
            .map(|name| self.resolve_metric(name))
            .collect::<CompileResult<Vec<_>>>()?;
        let (anchor, measures) = self.resolve_measures(&metrics)?;

        let mut primary: Vec<ElementRequest> = Vec::new();
        let mut links: Vec<String> = Vec::new();
        let mut linked: Vec<LinkedRead<'_>> = Vec::new();
        for item in &request.group_by {
            match &item.via {
                None => {
                    self.resolve_local(anchor, item)?;
                    primary.push(item.element());
                }
                Some(entity) => {
                    let model = self.resolve_linked(anchor, entity, item)?;
                    if !links.contains(entity) {
                        links.push(entity.clone());
                    }
                    match linked
                        .iter()
                        .position(|l| &l.entity == entity && l.model.name == model.name)
                    {
                        Some(i) => linked[i].elements.push(item.element()),
                        None => linked.push(LinkedRead {
                            entity: entity.clone(),
                            model,
                            elements: vec![ElementRequest::new(entity), item.element()],
                        }),
                    }
                }
            }
        }
        for entity in links {
            if !primary.iter().any(|r| r.output_name() == entity) {
                primary.push(ElementRequest::new(&entity));
            }
        }
        let window_time = self.add_window_bounds(anchor, &mut linked)?;
        if let Some(time) = &window_time {
            if !primary.iter().any(|r| &r.output_name() == time) {
                primary.push(ElementRequest::new(time));
            }
        }
        primary.extend(measures.iter().map(|m| ElementRequest::new(&m.name)));

        let group_keys = GroupKeySet::new(request.group_by.iter().map(GroupBy::output_name))?;

        let mut aliases = AliasGenerator::new();
        let primary = SourceReader::new(anchor).read(&primary, &mut aliases)?;
        let targets = linked
            .iter()
            .map(|l| {
                let node = SourceReader::new(l.model).read(&l.elements, &mut aliases)?;
                let target = JoinTarget::dimension(node, &l.entity).with_prefix(&l.entity);
                match (&l.model.validity_window, &window_time) {
                    (Some(w), Some(time)) => Ok(target.with_window(time, &w.start, &w.end)),
                    _ => Ok(target),
                }
            })
            .collect::<CompileResult<Vec<_>>>()?;

        let joined = plan_join(primary, targets, &mut aliases)?;
        let aggregated = plan_aggregate(joined, group_keys, measures, &mut aliases)?;
        let specs = metrics
            .iter()
            .map(|m| MetricSpec::new(&m.name, m.expr.clone()))
            .collect();
        let plan = plan_metrics(aggregated, specs, &mut aliases)?;

        debug!(
            anchor = %anchor.name,
            metrics = request.metrics.len(),
            group_by = request.group_by.len(),
            nodes = plan.node_count(),
            "built dataflow plan"
        );
        Ok(plan)
    }

    /// Add window bounds to every linked read of a windowed model, and
    /// return the anchor time dimension the windows are matched against.
    fn add_window_bounds(
        &self,
        anchor: &SemanticModel,
        linked: &mut [LinkedRead<'_>],
    ) -> CompileResult<Option<String>> {
        let mut time = None;
        for read in linked.iter_mut() {
            let model = read.model;
            let Some(window) = &model.validity_window else {
                continue;
            };
            let dim = anchor.primary_time_dimension().ok_or_else(|| {
                CompileError::MissingWindowTime {
                    model: anchor.name.clone(),
                    window_model: model.name.clone(),
                }
            })?;
            for bound in [&window.start, &window.end] {
                if !read.elements.iter().any(|e| e.grain.is_none() && &e.name == bound) {
                    read.elements.push(ElementRequest::new(bound));
                }
            }
            debug!(
                model = %model.name,
                time = %dim.name,
                "joining through validity window"
            );
            time = Some(dim.name.clone());
        }
        Ok(time)
    }

    fn resolve_metric(&self, name: &str) -> CompileResult<&'a Metric> {
        self.manifest
            .metric(name)
            .ok_or_else(|| CompileError::UnresolvedElement {
                stage: Stage::Request,
                scope: "semantic manifest metrics".into(),
                element: name.into(),
                suggestion: suggest_closest(name, &self.manifest.metric_names()),
            })
    }

    /// Measures referenced by `metrics` in first-use order, and the single
    /// model that defines all of them.
    fn resolve_measures(
        &self,
        metrics: &[&'a Metric],
    ) -> CompileResult<(&'a SemanticModel, Vec<MeasureSpec>)> {
        let mut anchor: Option<&'a SemanticModel> = None;
        let mut specs: Vec<MeasureSpec> = Vec::new();

        for metric in metrics {
            for input in metric.inputs() {
                if specs.iter().any(|s| s.name == input) {
                    continue;
                }
                let model = self.manifest.model_for_measure(input).ok_or_else(|| {
                    CompileError::UnresolvedElement {
                        stage: Stage::Request,
                        scope: format!("measures of metric '{}'", metric.name),
                        element: input.into(),
                        suggestion: suggest_closest(input, &self.manifest.measure_names()),
                    }
                })?;
                match anchor {
                    Some(a) if a.name != model.name => {
                        return Err(CompileError::MultipleMeasureSources {
                            measure: input.into(),
                            model: model.name.clone(),
                            expected: a.name.clone(),
                        });
                    }
                    Some(_) => {}
                    None => anchor = Some(model),
                }
                if let Some(measure) = model.measure(input) {
                    specs.push(MeasureSpec::new(&measure.name, measure.agg));
                }
            }
        }

        match anchor {
            Some(model) => Ok((model, specs)),
            None => Err(CompileError::EmptyQuery {
                stage: Stage::Request,
            }),
        }
    }

    fn resolve_local(&self, anchor: &SemanticModel, item: &GroupBy) -> CompileResult<()> {
        match anchor.element(&item.name) {
            Some(Element::Entity(_)) | Some(Element::Dimension(_)) => Ok(()),
            _ => {
                let linked: Vec<String> = anchor
                    .entities
                    .iter()
                    .flat_map(|e| self.manifest.linked_dimension_names(&e.name, &anchor.name))
                    .collect();
                // A bare name that exists on a linked model suggests the linked form.
                let suffix = format!("__{}", item.name);
                let suggestion = linked.iter().find(|n| n.ends_with(&suffix)).cloned().or_else(|| {
                    let candidates: Vec<String> = anchor
                        .entities
                        .iter()
                        .map(|e| e.name.clone())
                        .chain(anchor.dimensions.iter().map(|d| d.name.clone()))
                        .chain(linked.iter().cloned())
                        .collect();
                    suggest_closest(&item.name, &candidates)
                });
                Err(CompileError::UnresolvedElement {
                    stage: Stage::Request,
                    scope: format!("group-by items of semantic model '{}'", anchor.name),
                    element: item.name.clone(),
                    suggestion,
                })
            }
        }
    }

    fn resolve_linked(
        &self,
        anchor: &SemanticModel,
        entity: &str,
        item: &GroupBy,
    ) -> CompileResult<&'a SemanticModel> {
        if anchor.entity(entity).is_none() {
            let names: Vec<String> = anchor.entities.iter().map(|e| e.name.clone()).collect();
            return Err(CompileError::UnresolvedElement {
                stage: Stage::Request,
                scope: format!("entities of semantic model '{}'", anchor.name),
                element: entity.into(),
                suggestion: suggest_closest(entity, &names),
            });
        }
        self.manifest
            .dimension_source(entity, &item.name, &anchor.name)
            .ok_or_else(|| {
                let linked = format!("{}__{}", entity, item.name);
                CompileError::UnresolvedElement {
                    stage: Stage::Request,
                    scope: format!("semantic models linked through entity '{}'", entity),
                    suggestion: suggest_closest(
                        &linked,
                        &self.manifest.linked_dimension_names(entity, &anchor.name),
                    ),
                    element: linked,
                }
            })
    }
}
