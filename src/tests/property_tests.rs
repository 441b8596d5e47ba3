//! Property-based tests
//!
//! Uses quickcheck for:
//! - Parser robustness on arbitrary input
//! - Canonical serialized form round trips
//! - Classifier determinism and confidence gating
//! - Total behavior of the equation solver on inputs without `=`
#![allow(clippy::unwrap_used, reason = "Standard test relaxations")]

use std::sync::Arc;

use quickcheck::{Arbitrary, Gen, QuickCheck, TestResult};

use crate::analysis::{AnalysisResult, solve_convexity};
use crate::classify::{
    LinearTextModel, Prediction, SequenceClassifier, StatisticalClassifier, UnifiedClassifier,
};
use crate::config::{ClassifierConfig, SolveLimits};
use crate::error::ModelError;
use crate::router::route_query;
use crate::{parse, simplify, sym};

// ============================================================
// GENERATORS
// ============================================================

/// Source text of a random polynomial-and-elementary expression in `x`
/// and `y`, never containing `=`.
#[derive(Debug, Clone)]
struct ExprSource(String);

fn gen_source(g: &mut Gen, depth: usize, vars: &[&str]) -> String {
    if depth == 0 {
        return match u8::arbitrary(g) % 3 {
            0 => (u8::arbitrary(g) % 9 + 1).to_string(),
            _ => g.choose(vars).copied().unwrap_or("x").to_string(),
        };
    }
    match u8::arbitrary(g) % 8 {
        0 | 1 => {
            let op = g.choose(&["+", "-", "*"]).copied().unwrap_or("+");
            format!(
                "({} {} {})",
                gen_source(g, depth - 1, vars),
                op,
                gen_source(g, depth - 1, vars)
            )
        }
        2 => format!("({})**{}", gen_source(g, depth - 1, vars), u8::arbitrary(g) % 3 + 2),
        3 => format!("({})/{}", gen_source(g, depth - 1, vars), u8::arbitrary(g) % 5 + 2),
        4 => {
            let f = g.choose(&["sin", "cos", "exp"]).copied().unwrap_or("sin");
            format!("{}({})", f, gen_source(g, depth - 1, vars))
        }
        5 => format!("-({})", gen_source(g, depth - 1, vars)),
        _ => gen_source(g, depth - 1, vars),
    }
}

impl Arbitrary for ExprSource {
    fn arbitrary(g: &mut Gen) -> Self {
        let depth = g.size().min(4);
        ExprSource(gen_source(g, depth, &["x", "y"]))
    }
}

/// Like [`ExprSource`] but in `x` alone.
#[derive(Debug, Clone)]
struct UnivariateSource(String);

impl Arbitrary for UnivariateSource {
    fn arbitrary(g: &mut Gen) -> Self {
        let depth = g.size().min(3);
        UnivariateSource(gen_source(g, depth, &["x"]))
    }
}

/// Returns the same two-label distribution for every input.
struct SplitModel {
    labels: Vec<String>,
    probs: Vec<f64>,
}

impl SequenceClassifier for SplitModel {
    fn model_id(&self) -> &str {
        "split"
    }

    fn labels(&self) -> &[String] {
        &self.labels
    }

    fn predict(&self, _text: &str, _max_length: usize) -> Result<Vec<f64>, ModelError> {
        Ok(self.probs.clone())
    }
}

// ============================================================
// PARSER
// ============================================================

#[test]
fn test_parser_never_panics_on_random_input() {
    fn prop(input: String) -> TestResult {
        let _ = parse(&input);
        TestResult::passed()
    }
    QuickCheck::new()
        .tests(1000)
        .quickcheck(prop as fn(String) -> TestResult);
}

#[test]
fn test_srepr_round_trip() {
    fn prop(src: ExprSource) -> TestResult {
        let Ok(e) = parse(&src.0) else {
            return TestResult::discard();
        };
        TestResult::from_bool(parse(&e.to_srepr()).is_ok_and(|back| back == e))
    }
    QuickCheck::new()
        .tests(300)
        .quickcheck(prop as fn(ExprSource) -> TestResult);
}

#[test]
fn test_parser_edge_cases() {
    for case in ["", "   ", "()", "+++", "1+", "sin()", "x^y^z", "1/0", "0/0", "((((x))))", "π"] {
        // may fail, must not panic
        let _ = parse(case);
    }
}

// ============================================================
// CLASSIFIER
// ============================================================

#[test]
fn test_classifier_is_idempotent() {
    fn prop(input: String) -> bool {
        let classifier = UnifiedClassifier::new(
            Arc::new(LinearTextModel::bundled().unwrap()),
            ClassifierConfig::default(),
        );
        classifier.classify(&input) == classifier.classify(&input)
    }
    QuickCheck::new()
        .tests(300)
        .quickcheck(prop as fn(String) -> bool);
}

#[test]
fn test_confidence_gating() {
    fn prop(p: u8, t: u8) -> bool {
        let p = f64::from(p) / 255.0;
        let threshold = f64::from(t) / 255.0;
        let model = SplitModel {
            labels: vec!["derivative".into(), "integral".into()],
            probs: vec![p, 1.0 - p],
        };
        let classifier = StatisticalClassifier::new(
            Arc::new(model),
            ClassifierConfig::default().with_threshold(threshold),
        );
        match classifier.classify("anything") {
            Prediction::Accepted { confidence, .. } => confidence >= threshold,
            Prediction::Rejected { confidence } => confidence < threshold,
            Prediction::Failed => false,
        }
    }
    QuickCheck::new()
        .tests(500)
        .quickcheck(prop as fn(u8, u8) -> bool);
}

// ============================================================
// ANALYZERS
// ============================================================

#[test]
fn test_missing_equals_is_not_an_equation() {
    fn prop(src: ExprSource) -> bool {
        route_query("equation", &src.0, &SolveLimits::default())
            == AnalysisResult::Error("Not an equation".into())
    }
    QuickCheck::new()
        .tests(200)
        .quickcheck(prop as fn(ExprSource) -> bool);
}

#[test]
fn test_arbitrary_text_without_equals() {
    fn prop(input: String) -> TestResult {
        if input.contains('=') {
            return TestResult::discard();
        }
        let out = route_query("equation", &input, &SolveLimits::default());
        TestResult::from_bool(out == AnalysisResult::Error("Not an equation".into()))
    }
    QuickCheck::new()
        .tests(300)
        .quickcheck(prop as fn(String) -> TestResult);
}

#[test]
fn test_second_derivative_differentiates_first() {
    fn prop(src: UnivariateSource) -> TestResult {
        let Ok(e) = parse(&src.0) else {
            return TestResult::discard();
        };
        if e.free_symbols().is_empty() {
            return TestResult::discard();
        }
        let out = solve_convexity(&src.0, &SolveLimits::default());
        let x = sym("x");
        let f1 = simplify(&e.diff(&x));
        let f2 = simplify(&f1.diff(&x));
        TestResult::from_bool(
            out.get_str("first_derivative") == Some(f1.to_latex().as_str())
                && out.get_str("second_derivative") == Some(f2.to_latex().as_str()),
        )
    }
    QuickCheck::new()
        .tests(100)
        .quickcheck(prop as fn(UnivariateSource) -> TestResult);
}
