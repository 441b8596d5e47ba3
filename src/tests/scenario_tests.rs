//! Queries taken through the router end to end, checked on the transport
//! mapping the caller receives.
#![allow(clippy::unwrap_used, reason = "Standard test relaxations")]

use serde_json::{Value, json};

use crate::config::SolveLimits;
use crate::router::route_query;

fn route(query_type: &str, expr: &str) -> Value {
    serde_json::to_value(route_query(query_type, expr, &SolveLimits::default())).unwrap()
}

#[test]
fn test_quadratic_equation() {
    let out = route("equation", "x**2 - 4 = 0");
    assert_eq!(out["solution"], json!(["-2", "2"]));
    assert_eq!(out["number_of_solution"], 2);
    assert_eq!(out["all_roots_real"], true);
    assert!(out.get("error").is_none());
}

#[test]
fn test_linear_system() {
    let out = route("system", "2*x + 3*y - 5, x - y - 1");
    assert_eq!(out["solution"], json!([{"x": r"\frac{8}{5}", "y": r"\frac{3}{5}"}]));
    let out = route("system", "x + y - 3, x - y - 1");
    assert_eq!(out["solution"], json!([{"x": "2", "y": "1"}]));
}

#[test]
fn test_derivative_of_cubic() {
    let out = route("derivative", "diff(x**3, x)");
    assert_eq!(out["first_derivative"], "3 x^{2}");
    assert_eq!(out["critical_points"][0]["point_latex"], "0");
    assert_eq!(out["critical_points"][0]["classification"], "inconclusive");
}

#[test]
fn test_two_variable_convexity() {
    let out = route("convexity", "x**2 + y**2");
    assert_eq!(out["gradient"], json!(["2 x", "2 y"]));
    assert_eq!(out["leading_principal_minors"], json!(["2", "4"]));
    assert_eq!(out["convex_verdict"], true);
}

#[test]
fn test_plain_integrand() {
    let out = route("integral", "x**2");
    assert_eq!(out["result"], "x**3/3");
    assert_eq!(out["method"], "integrate_wrt_x");
}

#[test]
fn test_rational_integrand() {
    let out = route("integral", "Integral(1/(x**2 + 1), x)");
    assert_eq!(out["result"], "atan(x)");
    assert_eq!(out["technique"], "partial_fractions");
}

#[test]
fn test_univariate_convexity_domain() {
    let out = route("convexity", "x**4 - 6*x**2");
    assert_eq!(out["second_derivative"], "12 x^{2} - 12");
    assert_eq!(
        out["convex_domain"],
        r"\left(-\infty < x \wedge x \leq -1\right) \vee \left(1 \leq x \wedge x < \infty\right)"
    );
}

#[test]
fn test_nonlinear_system_tuples() {
    let out = route("system", "x**2 + y**2 - 2, x - y");
    assert_eq!(out["solution"].as_array().unwrap().len(), 2);
}

#[test]
fn test_errors_are_single_field_mappings() {
    for (query_type, expr) in [
        ("equation", "x + 1"),
        ("limit", "x"),
        ("system", "x +, y"),
        ("integral", "7"),
    ] {
        let out = route(query_type, expr);
        let map = out.as_object().unwrap();
        assert_eq!(map.len(), 1, "{} {}", query_type, expr);
        assert!(map["error"].is_string());
    }
}

#[test]
fn test_budget_stops_solver() {
    let limits = SolveLimits::default().with_max_steps(0);
    let out = route_query("equation", "x**3 - 2 = 0", &limits);
    let msg = out.error_message().unwrap();
    assert!(msg.starts_with("Equation solve error: Computation budget exceeded"));
}

#[test]
fn test_reciprocal_derivative_latex() {
    let out = route("convexity", "log(x)");
    assert_eq!(out["first_derivative"], r"\frac{1}{x}");
}

#[test]
fn test_every_root_of_a_high_degree_binomial() {
    let out = route("equation", "x**100 - 1 = 0");
    assert_eq!(out["number_of_solution"], 100);
    let solutions = out["solution"].as_array().unwrap();
    assert!(solutions.iter().all(|s| !s.as_str().unwrap().contains("NaN")));
    assert_eq!(out["all_roots_real"], false);
}

#[test]
fn test_exact_cube_root() {
    let out = route("equation", "x**3 - 2 = 0");
    assert_eq!(out["number_of_solution"], 3);
    assert!(out["solution"].as_array().unwrap().contains(&json!(r"\sqrt[3]{2}")));
    assert_eq!(out["all_roots_real"], false);
}

#[test]
fn test_large_real_roots_stay_real() {
    let out = route("equation", "2**99999999 = x");
    assert_eq!(out["all_roots_real"], true);
    let out = route("equation", "10**1000*x**2 - 1 = 0");
    assert_eq!(out["number_of_solution"], 2);
    assert_eq!(out["all_roots_real"], true);
}

#[test]
fn test_trig_roots_one_per_turn() {
    let out = route("equation", "sin(x)**2 - 1 = 0");
    assert_eq!(out["number_of_solution"], 2);
    let half_turn = |s: &str| crate::parse(s).unwrap().to_latex();
    assert_eq!(out["solution"], json!([half_turn("-pi/2"), half_turn("pi/2")]));
}
