//! Solvers and analyzers behind the router
//!
//! Every public entry point here is total: it takes the expression string
//! and returns an [`AnalysisResult`]. Errors from parsing and solving are
//! caught at the outermost scope of each analyzer and turned into an
//! `Error` whose message names the failing phase.

mod convexity;
mod derivative;
mod equation;
mod expression;
mod integral;
mod system;

use std::fmt;

use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::{Map, Value};

use crate::{Expr, Symbol};

pub use convexity::{HessianReport, analyze_multivariable_convexity, solve_convexity};
pub use derivative::handle_derivative;
pub use equation::{solve_linear_equation, solve_nonlinear_equation};
pub use expression::analyze_expression;
pub use integral::handle_integral;
pub use system::{solve_linear_system_str, solve_nonlinear_system_str};

pub(crate) use equation::split_equation;
pub(crate) use system::parse_members;

/// Named, display-ready result fields
pub type Fields = Map<String, Value>;

/// Outcome of one analyzer call
#[derive(Debug, Clone, PartialEq)]
pub enum AnalysisResult {
    Ok(Fields),
    Error(String),
}

impl AnalysisResult {
    /// `Error` with the message prefixed by the phase that failed.
    pub fn failed(phase: &str, err: impl fmt::Display) -> Self {
        AnalysisResult::Error(format!("{}: {}", phase, err))
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, AnalysisResult::Ok(_))
    }

    pub fn is_error(&self) -> bool {
        matches!(self, AnalysisResult::Error(_))
    }

    pub fn error_message(&self) -> Option<&str> {
        match self {
            AnalysisResult::Error(msg) => Some(msg),
            AnalysisResult::Ok(_) => None,
        }
    }

    pub fn fields(&self) -> Option<&Fields> {
        match self {
            AnalysisResult::Ok(fields) => Some(fields),
            AnalysisResult::Error(_) => None,
        }
    }

    /// A single field of an `Ok` result.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields()?.get(key)
    }

    /// A string field of an `Ok` result.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key)?.as_str()
    }

    pub fn to_json(&self) -> Value {
        match self {
            AnalysisResult::Ok(fields) => Value::Object(fields.clone()),
            AnalysisResult::Error(msg) => {
                let mut m = Map::new();
                m.insert("error".into(), Value::String(msg.clone()));
                Value::Object(m)
            }
        }
    }
}

impl Serialize for AnalysisResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            AnalysisResult::Ok(fields) => fields.serialize(serializer),
            AnalysisResult::Error(msg) => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry("error", msg)?;
                map.end()
            }
        }
    }
}

/// Free symbols ordered by name.
pub(crate) fn sorted_variables(e: &Expr) -> Vec<Symbol> {
    // BTreeSet iteration is already ordered by name
    e.free_symbols().into_iter().collect()
}

pub(crate) fn latex_all(items: &[Expr]) -> Vec<String> {
    items.iter().map(Expr::to_latex).collect()
}

pub(crate) fn names(vars: &[Symbol]) -> Vec<String> {
    vars.iter().map(|v| v.name().to_string()).collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, reason = "Standard test relaxations")]
mod tests {
    use super::*;

    #[test]
    fn test_serialization_shapes() {
        let mut fields = Fields::new();
        fields.insert("solution".into(), Value::from(vec!["2"]));
        let ok = AnalysisResult::Ok(fields);
        assert_eq!(serde_json::to_string(&ok).unwrap(), r#"{"solution":["2"]}"#);

        let err = AnalysisResult::failed("Equation solve error", "no roots");
        assert_eq!(
            serde_json::to_string(&err).unwrap(),
            r#"{"error":"Equation solve error: no roots"}"#
        );
        assert_eq!(err.to_json()["error"], "Equation solve error: no roots");
    }
}
