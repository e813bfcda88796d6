//! The resolved semantic registry handed to the compiler.

use serde::{Deserialize, Serialize};
use tracing::warn;

use super::metric::Metric;
use super::model::SemanticModel;

/// Semantic models and metric definitions, already validated by the
/// registry that produced them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SemanticManifest {
    #[serde(default)]
    pub semantic_models: Vec<SemanticModel>,
    #[serde(default)]
    pub metrics: Vec<Metric>,
}

impl SemanticManifest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_model(mut self, model: SemanticModel) -> Self {
        self.semantic_models.push(model);
        self
    }

    pub fn with_metric(mut self, metric: Metric) -> Self {
        self.metrics.push(metric);
        self
    }

    /// Load a manifest from its JSON form.
    ///
    /// Entities that no other model shares are logged, since nothing can
    /// be joined through them.
    pub fn from_json_str(json: &str) -> serde_json::Result<Self> {
        let manifest: Self = serde_json::from_str(json)?;
        for (model, entity) in manifest.isolated_entities() {
            warn!(
                model = %model,
                entity = %entity,
                "entity appears in only one semantic model and cannot be joined"
            );
        }
        Ok(manifest)
    }

    /// `(model, entity)` pairs for entities declared by a single model.
    pub fn isolated_entities(&self) -> Vec<(&str, &str)> {
        self.semantic_models
            .iter()
            .flat_map(|m| m.entities.iter().map(move |e| (m.name.as_str(), e.name.as_str())))
            .filter(|(model, entity)| {
                !self
                    .semantic_models
                    .iter()
                    .any(|other| other.name != *model && other.entity(entity).is_some())
            })
            .collect()
    }

    pub fn model(&self, name: &str) -> Option<&SemanticModel> {
        self.semantic_models.iter().find(|m| m.name == name)
    }

    pub fn metric(&self, name: &str) -> Option<&Metric> {
        self.metrics.iter().find(|m| m.name == name)
    }

    /// First model, in declaration order, that defines `measure`.
    pub fn model_for_measure(&self, measure: &str) -> Option<&SemanticModel> {
        self.semantic_models
            .iter()
            .find(|m| m.measure(measure).is_some())
    }

    /// Model reachable through `entity` that defines `dimension`.
    ///
    /// The entity must identify rows of that model (primary, unique or
    /// natural), so joining to it cannot fan out. `exclude` skips the model
    /// the join starts from.
    pub fn dimension_source(
        &self,
        entity: &str,
        dimension: &str,
        exclude: &str,
    ) -> Option<&SemanticModel> {
        self.semantic_models.iter().find(|m| {
            m.name != exclude
                && m.entity(entity).is_some_and(|e| e.kind.is_join_target())
                && m.dimension(dimension).is_some()
        })
    }

    pub fn metric_names(&self) -> Vec<String> {
        self.metrics.iter().map(|m| m.name.clone()).collect()
    }

    pub fn measure_names(&self) -> Vec<String> {
        self.semantic_models
            .iter()
            .flat_map(|m| m.measures.iter().map(|measure| measure.name.clone()))
            .collect()
    }

    /// Dimension names reachable through `entity`, as `<entity>__<dim>`.
    pub fn linked_dimension_names(&self, entity: &str, exclude: &str) -> Vec<String> {
        self.semantic_models
            .iter()
            .filter(|m| m.name != exclude)
            .filter(|m| m.entity(entity).is_some_and(|e| e.kind.is_join_target()))
            .flat_map(|m| m.dimensions.iter().map(|d| format!("{}__{}", entity, d.name)))
            .collect()
    }
}

/// Closest name in `available` within an edit distance of 3, compared
/// case-insensitively.
pub fn suggest_closest(name: &str, available: &[String]) -> Option<String> {
    let query = name.to_ascii_lowercase();
    let mut best: Option<(usize, &str)> = None;
    for candidate in available {
        let dist = strsim::levenshtein(&query, &candidate.to_ascii_lowercase());
        if dist > 3 {
            continue;
        }
        match best {
            Some((best_dist, _)) if dist >= best_dist => {}
            _ => best = Some((dist, candidate)),
        }
    }
    best.map(|(_, s)| s.to_string())
}
