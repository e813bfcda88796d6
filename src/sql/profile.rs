//! Dialect profile: the single configuration object the renderer consults.

use serde::{Deserialize, Serialize};

use super::dialect::{helpers, Dialect, SqlDialect};
use super::expr::Expr;
use crate::error::{CompileError, CompileResult};

/// When identifiers are quoted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuotePolicy {
    Always,
    /// Leave lower-case, non-keyword identifiers bare.
    #[default]
    WhenRequired,
}

/// How a NULL-safe division is spelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DivisionStyle {
    /// `a / NULLIF(b, 0)`
    NullIf,
    /// `CASE WHEN b = 0 THEN NULL ELSE a / b END`
    CaseGuard,
    /// The dialect's safe division function, e.g. `SAFE_DIVIDE(a, b)`.
    Native,
}

/// Per-warehouse rendering configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DialectProfile {
    pub dialect: Dialect,
    pub quoting: QuotePolicy,
    /// Overrides the dialect's preferred division style.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub division: Option<DivisionStyle>,
    /// Emit a `-- <stage>` comment at the top of every subquery.
    pub stage_comments: bool,
}

impl Default for DialectProfile {
    fn default() -> Self {
        Self {
            dialect: Dialect::default(),
            quoting: QuotePolicy::default(),
            division: None,
            stage_comments: true,
        }
    }
}

impl DialectProfile {
    pub fn new(dialect: Dialect) -> Self {
        Self {
            dialect,
            ..Default::default()
        }
    }

    pub fn with_quoting(mut self, quoting: QuotePolicy) -> Self {
        self.quoting = quoting;
        self
    }

    pub fn with_division(mut self, division: DivisionStyle) -> Self {
        self.division = Some(division);
        self
    }

    pub fn without_stage_comments(mut self) -> Self {
        self.stage_comments = false;
        self
    }

    /// Effective division style: the override, else the dialect's native
    /// function when it has one, else `NULLIF`.
    pub fn division_style(&self) -> DivisionStyle {
        match self.division {
            Some(style) => style,
            None if self.dialect.safe_divide_function().is_some() => DivisionStyle::Native,
            None => DivisionStyle::NullIf,
        }
    }

    pub fn quote_identifier(&self, ident: &str) -> String {
        match self.quoting {
            QuotePolicy::Always => self.dialect.quote_identifier(ident),
            QuotePolicy::WhenRequired => {
                if helpers::is_bare_identifier(ident) && !self.dialect.is_reserved_word(ident) {
                    ident.to_string()
                } else {
                    self.dialect.quote_identifier(ident)
                }
            }
        }
    }

    /// Reject option combinations the dialect cannot honor.
    pub fn validate(&self) -> CompileResult<()> {
        if self.division == Some(DivisionStyle::Native)
            && self.dialect.safe_divide_function().is_none()
        {
            return Err(self.unsupported("native safe division"));
        }
        Ok(())
    }

    /// Check that every construct in `expr` can be rendered.
    pub fn check_expr(&self, expr: &Expr) -> CompileResult<()> {
        let mut result = Ok(());
        expr.visit(&mut |e| {
            if result.is_err() {
                return;
            }
            match e {
                Expr::DateTrunc { grain, .. } if self.dialect.date_trunc().is_none() => {
                    result = Err(self.unsupported(&format!("date truncation to {grain}")));
                }
                Expr::Percentile {
                    discrete,
                    approximate,
                    ..
                } if self.dialect.percentile(*discrete, *approximate).is_none() => {
                    let kind = match (discrete, approximate) {
                        (false, false) => "continuous percentile",
                        (true, false) => "discrete percentile",
                        (false, true) => "approximate continuous percentile",
                        (true, true) => "approximate discrete percentile",
                    };
                    result = Err(self.unsupported(kind));
                }
                _ => {}
            }
        });
        result
    }

    fn unsupported(&self, feature: &str) -> CompileError {
        CompileError::UnsupportedDialectFeature {
            dialect: self.dialect,
            feature: feature.to_string(),
        }
    }
}
