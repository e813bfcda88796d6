//! Semantic model metadata: entities, dimensions and measures over one table.
//!
//! A semantic model maps logical element names to physical columns of a
//! single table. Models are immutable once loaded.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Logical data type of an element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataType {
    String,
    Int,
    Decimal,
    Float,
    Bool,
    Date,
    Timestamp,
}

impl DataType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DataType::String => "string",
            DataType::Int => "int",
            DataType::Decimal => "decimal",
            DataType::Float => "float",
            DataType::Bool => "bool",
            DataType::Date => "date",
            DataType::Timestamp => "timestamp",
        }
    }

    /// Whether values of this type can be truncated to a time grain.
    pub fn is_temporal(&self) -> bool {
        matches!(self, DataType::Date | DataType::Timestamp)
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Time granularity, ordered from finest to coarsest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeGranularity {
    Day,
    Week,
    Month,
    Quarter,
    Year,
}

impl TimeGranularity {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimeGranularity::Day => "day",
            TimeGranularity::Week => "week",
            TimeGranularity::Month => "month",
            TimeGranularity::Quarter => "quarter",
            TimeGranularity::Year => "year",
        }
    }
}

impl fmt::Display for TimeGranularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Physical table reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableName {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,
    pub name: String,
}

impl TableName {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            schema: None,
            name: name.into(),
        }
    }

    pub fn with_schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = Some(schema.into());
        self
    }
}

impl fmt::Display for TableName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.schema {
            Some(schema) => write!(f, "{}.{}", schema, self.name),
            None => f.write_str(&self.name),
        }
    }
}

/// How an entity identifies rows of its model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Primary,
    Unique,
    Foreign,
    Natural,
}

impl EntityKind {
    /// A model can be joined *to* on this entity without fanning out rows.
    pub fn is_join_target(&self) -> bool {
        !matches!(self, EntityKind::Foreign)
    }
}

/// A join key shared between semantic models.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    pub name: String,
    /// Physical column or SQL expression. Defaults to the entity name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expr: Option<String>,
    pub kind: EntityKind,
    pub data_type: DataType,
}

impl Entity {
    pub fn new(name: impl Into<String>, kind: EntityKind, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            expr: None,
            kind,
            data_type,
        }
    }

    pub fn primary(name: impl Into<String>, data_type: DataType) -> Self {
        Self::new(name, EntityKind::Primary, data_type)
    }

    pub fn foreign(name: impl Into<String>, data_type: DataType) -> Self {
        Self::new(name, EntityKind::Foreign, data_type)
    }

    pub fn with_expr(mut self, expr: impl Into<String>) -> Self {
        self.expr = Some(expr.into());
        self
    }

    pub fn column_expr(&self) -> &str {
        self.expr.as_deref().unwrap_or(&self.name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DimensionKind {
    Categorical,
    Time,
}

/// A groupable attribute of a semantic model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimension {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expr: Option<String>,
    pub kind: DimensionKind,
    pub data_type: DataType,
    /// Finest grain stored for a time dimension.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub granularity: Option<TimeGranularity>,
}

impl Dimension {
    pub fn categorical(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            expr: None,
            kind: DimensionKind::Categorical,
            data_type,
            granularity: None,
        }
    }

    pub fn time(name: impl Into<String>, data_type: DataType, granularity: TimeGranularity) -> Self {
        Self {
            name: name.into(),
            expr: None,
            kind: DimensionKind::Time,
            data_type,
            granularity: Some(granularity),
        }
    }

    pub fn with_expr(mut self, expr: impl Into<String>) -> Self {
        self.expr = Some(expr.into());
        self
    }

    pub fn column_expr(&self) -> &str {
        self.expr.as_deref().unwrap_or(&self.name)
    }

    pub fn is_time(&self) -> bool {
        self.kind == DimensionKind::Time
    }

    /// Defined granularity of a time dimension, `day` when unspecified.
    pub fn defined_granularity(&self) -> Option<TimeGranularity> {
        if self.is_time() {
            Some(self.granularity.unwrap_or(TimeGranularity::Day))
        } else {
            None
        }
    }
}

/// Aggregation applied to a measure.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AggregationType {
    Sum,
    Count,
    Min,
    Max,
    CountDistinct,
    Average,
    /// Counts rows where a boolean expression holds.
    SumBoolean,
    Percentile {
        percentile: f64,
        #[serde(default)]
        discrete: bool,
        #[serde(default)]
        approximate: bool,
    },
}

impl AggregationType {
    pub fn median() -> Self {
        AggregationType::Percentile {
            percentile: 0.5,
            discrete: false,
            approximate: false,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            AggregationType::Sum => "sum",
            AggregationType::Count => "count",
            AggregationType::Min => "min",
            AggregationType::Max => "max",
            AggregationType::CountDistinct => "count_distinct",
            AggregationType::Average => "average",
            AggregationType::SumBoolean => "sum_boolean",
            AggregationType::Percentile { .. } => "percentile",
        }
    }

    /// Data type of the aggregated value given the input type.
    pub fn output_type(&self, input: Option<DataType>) -> Option<DataType> {
        match self {
            AggregationType::Count | AggregationType::CountDistinct | AggregationType::SumBoolean => {
                Some(DataType::Int)
            }
            AggregationType::Average | AggregationType::Percentile { .. } => Some(DataType::Float),
            AggregationType::Sum | AggregationType::Min | AggregationType::Max => input,
        }
    }
}

/// Source of a measure's row-level value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MeasureExpr {
    /// A physical column or SQL expression.
    Column(String),
    /// A literal, e.g. `1` for a row-presence measure.
    Constant(i64),
}

/// An aggregatable quantity of a semantic model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Measure {
    pub name: String,
    pub agg: AggregationType,
    pub expr: MeasureExpr,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_type: Option<DataType>,
}

impl Measure {
    pub fn new(name: impl Into<String>, agg: AggregationType, expr: MeasureExpr) -> Self {
        Self {
            name: name.into(),
            agg,
            expr,
            data_type: None,
        }
    }

    pub fn column(name: impl Into<String>, agg: AggregationType, column: impl Into<String>) -> Self {
        Self::new(name, agg, MeasureExpr::Column(column.into()))
    }

    /// `SUM(1)`: one per row.
    pub fn row_count(name: impl Into<String>) -> Self {
        Self::new(name, AggregationType::Sum, MeasureExpr::Constant(1))
    }

    pub fn with_data_type(mut self, data_type: DataType) -> Self {
        self.data_type = Some(data_type);
        self
    }

    /// Row-level type: the declared type, `int` for constants.
    pub fn value_type(&self) -> Option<DataType> {
        match (&self.expr, self.data_type) {
            (_, Some(dt)) => Some(dt),
            (MeasureExpr::Constant(_), None) => Some(DataType::Int),
            (MeasureExpr::Column(_), None) => None,
        }
    }
}

/// A named element of a semantic model.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Element<'a> {
    Entity(&'a Entity),
    Dimension(&'a Dimension),
    Measure(&'a Measure),
}

/// A semantic model over one physical table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SemanticModel {
    pub name: String,
    pub table: TableName,
    #[serde(default)]
    pub entities: Vec<Entity>,
    #[serde(default)]
    pub dimensions: Vec<Dimension>,
    #[serde(default)]
    pub measures: Vec<Measure>,
    /// Set on slowly changing dimension tables whose rows are only valid
    /// for a time range.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validity_window: Option<ValidityWindow>,
}

/// Pair of time dimensions bounding the period a row is valid for.
///
/// `end` is exclusive; a NULL end means the row is still current.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidityWindow {
    pub start: String,
    pub end: String,
}

impl ValidityWindow {
    pub fn new(start: &str, end: &str) -> Self {
        Self {
            start: start.into(),
            end: end.into(),
        }
    }
}

impl SemanticModel {
    pub fn new(name: impl Into<String>, table: TableName) -> Self {
        Self {
            name: name.into(),
            table,
            entities: Vec::new(),
            dimensions: Vec::new(),
            measures: Vec::new(),
            validity_window: None,
        }
    }

    pub fn with_validity_window(mut self, start: &str, end: &str) -> Self {
        self.validity_window = Some(ValidityWindow::new(start, end));
        self
    }

    /// First time dimension, used to place rows inside another model's
    /// validity window.
    pub fn primary_time_dimension(&self) -> Option<&Dimension> {
        self.dimensions.iter().find(|d| d.is_time())
    }

    pub fn with_entity(mut self, entity: Entity) -> Self {
        self.entities.push(entity);
        self
    }

    pub fn with_dimension(mut self, dimension: Dimension) -> Self {
        self.dimensions.push(dimension);
        self
    }

    pub fn with_measure(mut self, measure: Measure) -> Self {
        self.measures.push(measure);
        self
    }

    pub fn entity(&self, name: &str) -> Option<&Entity> {
        self.entities.iter().find(|e| e.name == name)
    }

    pub fn dimension(&self, name: &str) -> Option<&Dimension> {
        self.dimensions.iter().find(|d| d.name == name)
    }

    pub fn measure(&self, name: &str) -> Option<&Measure> {
        self.measures.iter().find(|m| m.name == name)
    }

    /// Look up any element by name. Entities shadow dimensions, which
    /// shadow measures.
    pub fn element(&self, name: &str) -> Option<Element<'_>> {
        self.entity(name)
            .map(Element::Entity)
            .or_else(|| self.dimension(name).map(Element::Dimension))
            .or_else(|| self.measure(name).map(Element::Measure))
    }

    /// All element names in declaration order.
    pub fn element_names(&self) -> Vec<String> {
        self.entities
            .iter()
            .map(|e| e.name.clone())
            .chain(self.dimensions.iter().map(|d| d.name.clone()))
            .chain(self.measures.iter().map(|m| m.name.clone()))
            .collect()
    }
}
