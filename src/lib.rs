//! Symbolic query solving
//!
//! Classifies short math queries, routes them to the matching analyzer and
//! solves them symbolically.
//!
//! # Features
//! - Two-tier expression parser (natural notation first, strict second)
//! - Canonical expression form with exact rational arithmetic
//! - Unified classifier: deterministic rules, then a statistical model,
//!   then a fixed `unknown` label
//! - Equation, system, convexity, derivative and integral analyzers that
//!   never panic and report failures as values
//! - Step budgets that bound the work spent on adversarial input
//!
//! # Usage Examples
//!
//! ## Routing a query
//! ```
//! use symb_solve::config::SolveLimits;
//! use symb_solve::router::route_query;
//!
//! let out = route_query("equation", "x**2 - 4 = 0", &SolveLimits::default());
//! assert_eq!(out.get("number_of_solution"), Some(&2.into()));
//! ```
//!
//! ## Classifying free text
//! ```
//! use symb_solve::classify::{LinearTextModel, UnifiedClassifier, UnifiedLabel};
//! use symb_solve::config::ClassifierConfig;
//! use std::sync::Arc;
//!
//! let model = Arc::new(LinearTextModel::bundled().unwrap());
//! let classifier = UnifiedClassifier::new(model, ClassifierConfig::default());
//! assert_eq!(classifier.classify("x + y = 1, x - y = 3").label, UnifiedLabel::SystemLinear);
//! ```
//!
//! ## Working with expressions
//! ```
//! use symb_solve::{parse, simplify, sym};
//!
//! let f = parse("x**3 - 3*x").unwrap();
//! assert_eq!(simplify(&f.diff(&sym("x"))).to_string(), "3*x**2 - 3");
//! ```

mod ast;
mod differentiation;
mod display;
mod error;
mod eval;
pub mod functions;
mod helpers;
mod number;
mod parser;
mod poly;
mod simplification;
mod symbol;
pub(crate) mod traits;

pub mod analysis;
pub mod classify;
pub mod config;
pub mod integrate;
pub mod router;
pub mod solve;

#[cfg(feature = "parallel")]
pub mod parallel;

#[cfg(test)]
mod tests;

// Re-export key types for easier usage
pub use analysis::AnalysisResult;
pub use ast::{Constant, Expr, ExprKind, RelOp};
pub use display::{latex_list, latex_matrix, latex_tuple, plain_matrix};
pub use error::{ModelError, ParseError, SolveError, Span};
pub use eval::{eval_complex, eval_real};
pub use helpers::{gradient, gradient_str, hessian, hessian_str, leading_principal_minors};
pub use number::{Numeric, Rational};
pub use parser::{Tier, parse, parse_tier, parse_with_limits};
pub use simplification::{expand, simplify};
pub use symbol::{Symbol, sym};
