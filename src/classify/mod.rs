//! Problem-type classification
//!
//! Three tiers are tried in order: structural rules over the parsed
//! expression, a statistical text model gated by a confidence threshold, and
//! finally the `unknown` label. The labels here are finer than the
//! [`QueryType`](crate::router::QueryType) the router dispatches on; the two
//! are deliberately separate types.

mod deterministic;
mod model;
mod statistical;
mod unified;

use std::fmt;
use std::str::FromStr;

use crate::router::QueryType;

pub use deterministic::deterministic_classify;
pub use model::LinearTextModel;
pub use statistical::{Prediction, SequenceClassifier, StatisticalClassifier};
pub use unified::UnifiedClassifier;

/// Label space of the unified classifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UnifiedLabel {
    Derivative,
    Integral,
    EquationLinear,
    EquationNonlinear,
    SystemLinear,
    SystemNonlinear,
    Unknown,
}

impl UnifiedLabel {
    pub const ALL: [UnifiedLabel; 7] = [
        UnifiedLabel::Derivative,
        UnifiedLabel::Integral,
        UnifiedLabel::EquationLinear,
        UnifiedLabel::EquationNonlinear,
        UnifiedLabel::SystemLinear,
        UnifiedLabel::SystemNonlinear,
        UnifiedLabel::Unknown,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            UnifiedLabel::Derivative => "derivative",
            UnifiedLabel::Integral => "integral",
            UnifiedLabel::EquationLinear => "equation_linear",
            UnifiedLabel::EquationNonlinear => "equation_nonlinear",
            UnifiedLabel::SystemLinear => "system_linear",
            UnifiedLabel::SystemNonlinear => "system_nonlinear",
            UnifiedLabel::Unknown => "unknown",
        }
    }

    /// The coarser router query type a label falls under. The linear and
    /// nonlinear variants share one; `Unknown` has none.
    pub fn query_type(self) -> Option<QueryType> {
        match self {
            UnifiedLabel::Derivative => Some(QueryType::Derivative),
            UnifiedLabel::Integral => Some(QueryType::Integral),
            UnifiedLabel::EquationLinear | UnifiedLabel::EquationNonlinear => {
                Some(QueryType::Equation)
            }
            UnifiedLabel::SystemLinear | UnifiedLabel::SystemNonlinear => Some(QueryType::System),
            UnifiedLabel::Unknown => None,
        }
    }
}

impl fmt::Display for UnifiedLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UnifiedLabel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        UnifiedLabel::ALL
            .into_iter()
            .find(|l| l.as_str() == s)
            .ok_or_else(|| format!("unknown label '{}'", s))
    }
}

/// Which tier produced a classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Source {
    Deterministic,
    Statistical,
    Fallback,
}

impl Source {
    pub fn as_str(self) -> &'static str {
        match self {
            Source::Deterministic => "deterministic",
            Source::Statistical => "statistical",
            Source::Fallback => "fallback",
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
pub struct ClassificationResult {
    pub label: UnifiedLabel,
    /// Probability in `[0, 1]`
    pub confidence: f64,
    pub source: Source,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_names_round_trip() {
        for label in UnifiedLabel::ALL {
            assert_eq!(label.as_str().parse::<UnifiedLabel>(), Ok(label));
        }
        assert!("equation".parse::<UnifiedLabel>().is_err());
    }

    #[test]
    fn test_coarse_query_type() {
        assert_eq!(UnifiedLabel::EquationNonlinear.query_type(), Some(QueryType::Equation));
        assert_eq!(UnifiedLabel::SystemLinear.query_type(), Some(QueryType::System));
        assert_eq!(UnifiedLabel::Unknown.query_type(), None);
    }

    #[test]
    fn test_result_serializes_flat() {
        let r = ClassificationResult {
            label: UnifiedLabel::SystemLinear,
            confidence: 1.0,
            source: Source::Deterministic,
        };
        assert_eq!(
            serde_json::to_string(&r).unwrap_or_default(),
            r#"{"label":"system_linear","confidence":1.0,"source":"deterministic"}"#
        );
    }
}
