//! Metric definitions: formulas over aggregated measures.

use serde::{Deserialize, Serialize};

/// Arithmetic operator in a metric formula.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArithmeticOp {
    Add,
    Sub,
    Mul,
    Div,
}

/// Formula evaluated after aggregation.
///
/// `Input` names an aggregated column of the relation the metric is
/// computed over: a measure, or a metric computed by an earlier stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricExpr {
    Input(String),
    Literal(f64),
    Neg(Box<MetricExpr>),
    Binary {
        op: ArithmeticOp,
        left: Box<MetricExpr>,
        right: Box<MetricExpr>,
    },
    /// Floating-point, NULL-safe division.
    Ratio {
        numerator: Box<MetricExpr>,
        denominator: Box<MetricExpr>,
    },
}

impl MetricExpr {
    pub fn input(name: impl Into<String>) -> Self {
        MetricExpr::Input(name.into())
    }

    pub fn literal(value: f64) -> Self {
        MetricExpr::Literal(value)
    }

    pub fn ratio(numerator: MetricExpr, denominator: MetricExpr) -> Self {
        MetricExpr::Ratio {
            numerator: Box::new(numerator),
            denominator: Box::new(denominator),
        }
    }

    pub fn neg(self) -> Self {
        MetricExpr::Neg(Box::new(self))
    }

    fn binary(self, op: ArithmeticOp, other: MetricExpr) -> Self {
        MetricExpr::Binary {
            op,
            left: Box::new(self),
            right: Box::new(other),
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn add(self, other: MetricExpr) -> Self {
        self.binary(ArithmeticOp::Add, other)
    }

    #[allow(clippy::should_implement_trait)]
    pub fn sub(self, other: MetricExpr) -> Self {
        self.binary(ArithmeticOp::Sub, other)
    }

    #[allow(clippy::should_implement_trait)]
    pub fn mul(self, other: MetricExpr) -> Self {
        self.binary(ArithmeticOp::Mul, other)
    }

    #[allow(clippy::should_implement_trait)]
    pub fn div(self, other: MetricExpr) -> Self {
        self.binary(ArithmeticOp::Div, other)
    }

    /// Referenced input names, deduplicated, in first-use order.
    pub fn input_names(&self) -> Vec<&str> {
        let mut names = Vec::new();
        self.collect_inputs(&mut names);
        names
    }

    fn collect_inputs<'a>(&'a self, names: &mut Vec<&'a str>) {
        match self {
            MetricExpr::Input(name) => {
                if !names.contains(&name.as_str()) {
                    names.push(name);
                }
            }
            MetricExpr::Literal(_) => {}
            MetricExpr::Neg(inner) => inner.collect_inputs(names),
            MetricExpr::Binary { left, right, .. } => {
                left.collect_inputs(names);
                right.collect_inputs(names);
            }
            MetricExpr::Ratio {
                numerator,
                denominator,
            } => {
                numerator.collect_inputs(names);
                denominator.collect_inputs(names);
            }
        }
    }
}

/// A named metric.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metric {
    pub name: String,
    pub expr: MetricExpr,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Metric {
    /// A metric that exposes one measure unchanged.
    pub fn simple(name: impl Into<String>, measure: impl Into<String>) -> Self {
        Self::derived(name, MetricExpr::input(measure))
    }

    pub fn ratio(
        name: impl Into<String>,
        numerator: impl Into<String>,
        denominator: impl Into<String>,
    ) -> Self {
        Self::derived(
            name,
            MetricExpr::ratio(MetricExpr::input(numerator), MetricExpr::input(denominator)),
        )
    }

    pub fn derived(name: impl Into<String>, expr: MetricExpr) -> Self {
        Self {
            name: name.into(),
            expr,
            description: None,
        }
    }

    pub fn inputs(&self) -> Vec<&str> {
        self.expr.input_names()
    }
}
