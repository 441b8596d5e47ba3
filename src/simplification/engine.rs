//! Core simplification engine with rule-based architecture
//!
//! Implements bottom-up tree traversal, rule application with memoization,
//! cycle detection, and configurable limits (iterations, depth).

use super::rules::{NodeKind, RuleContext, RuleRegistry};
use crate::Expr;
use crate::ast::ExprKind;
use rustc_hash::{FxHashMap, FxHashSet};
use std::sync::OnceLock;

/// Default cache capacity per rule before clearing (10K entries)
const DEFAULT_CACHE_CAPACITY: usize = 10_000;

/// Global rule registry singleton - built once, reused across all simplifications
fn global_registry() -> &'static RuleRegistry {
    static REGISTRY: OnceLock<RuleRegistry> = OnceLock::new();
    REGISTRY.get_or_init(|| {
        let mut registry = RuleRegistry::new();
        registry.load_all_rules();
        registry
    })
}

/// Main simplification engine with rule-based architecture
pub(crate) struct Simplifier {
    /// Per-rule caches - cleared when exceeding capacity to bound memory
    rule_caches: FxHashMap<&'static str, FxHashMap<u64, Option<Expr>>>,
    cache_capacity: usize,
    max_iterations: usize,
    max_depth: usize,
    context: RuleContext,
}

impl Default for Simplifier {
    fn default() -> Self {
        Self::new()
    }
}

impl Simplifier {
    pub(crate) fn new() -> Self {
        Self {
            rule_caches: FxHashMap::default(),
            cache_capacity: DEFAULT_CACHE_CAPACITY,
            max_iterations: 1000,
            max_depth: 50,
            context: RuleContext::default(),
        }
    }

    #[cfg(test)]
    pub(crate) fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Run passes until nothing changes, a cycle shows up or the iteration cap is hit
    pub(crate) fn simplify(&mut self, expr: Expr) -> Expr {
        let mut current = expr;
        let mut seen_hashes: FxHashSet<u64> = FxHashSet::default();

        for iteration in 0..self.max_iterations {
            let original = current.clone();
            current = self.apply_rules_bottom_up(&current, 0);
            tracing::trace!(iteration, from = %original, to = %current, "simplification pass");

            if current == original {
                return current;
            }

            // Structural hash repeating means the rules are cycling
            if !seen_hashes.insert(current.structural_hash()) {
                tracing::debug!(expr = %current, "simplification cycle detected");
                return current;
            }
        }

        tracing::warn!(
            max_iterations = self.max_iterations,
            "simplification exceeded maximum iterations"
        );
        current
    }

    /// Apply rules bottom-up through the expression tree
    fn apply_rules_bottom_up(&mut self, expr: &Expr, depth: usize) -> Expr {
        if depth > self.max_depth {
            return expr.clone();
        }
        let rebuilt = match expr.kind() {
            ExprKind::Number(_)
            | ExprKind::Float(_)
            | ExprKind::Constant(_)
            | ExprKind::Symbol(_) => expr.clone(),
            _ => {
                let children = expr.children();
                let simplified: Vec<Expr> = children
                    .iter()
                    .map(|c| self.apply_rules_bottom_up(c, depth + 1))
                    .collect();
                if simplified == children {
                    expr.clone()
                } else {
                    let mut next = simplified.into_iter();
                    expr.map_children(&mut |c| next.next().unwrap_or_else(|| c.clone()))
                }
            }
        };
        self.apply_rules_to_node(rebuilt, depth)
    }

    /// Apply all applicable rules to a single node in priority order
    fn apply_rules_to_node(&mut self, mut current: Expr, depth: usize) -> Expr {
        self.context.set_depth(depth);
        let kind = NodeKind::of(&current);

        for rule in global_registry().get_rules_for_kind(kind) {
            let rule_name = rule.name();
            let cache_key = current.structural_hash();

            if let Some(cached) = self
                .rule_caches
                .get(rule_name)
                .and_then(|cache| cache.get(&cache_key))
            {
                if let Some(new_expr) = cached {
                    current = new_expr.clone();
                }
                continue;
            }

            let result = rule.apply(&current, &self.context);
            if let Some(new_expr) = &result {
                tracing::trace!(rule = rule_name, from = %current, to = %new_expr, "rule applied");
            }

            let cache = self.rule_caches.entry(rule_name).or_default();
            // Bound memory: clear if exceeding capacity
            if cache.len() >= self.cache_capacity {
                cache.clear();
            }
            cache.insert(cache_key, result.clone());

            if let Some(new_expr) = result {
                current = new_expr;
                // The node may have changed kind; later rules for the old kind no longer apply
                if NodeKind::of(&current) != kind {
                    break;
                }
            }
        }

        current
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, reason = "Standard test relaxations")]
mod tests {
    use super::*;
    use crate::{parse, sym};

    #[test]
    fn test_nested_identity_is_found_bottom_up() {
        let e = parse("log(sin(x)**2 + cos(x)**2 + x)").unwrap();
        let out = Simplifier::new().simplify(e);
        assert_eq!(out, Expr::func1("log", sym("x").to_expr() + 1));
    }

    #[test]
    fn test_fixpoint_reached() {
        let e = parse("exp(2*log(x)) * sin(x) / cos(x)").unwrap();
        let out = Simplifier::new().simplify(e);
        let x = sym("x");
        assert_eq!(
            out,
            Expr::product(vec![x.pow(2), Expr::func1("tan", x.to_expr())])
        );
    }

    #[test]
    fn test_depth_limit_leaves_deep_nodes() {
        let e = parse("sin(sin(sin(x)**2 + cos(x)**2))").unwrap();
        let shallow = Simplifier::new().with_max_depth(0).simplify(e.clone());
        assert_eq!(shallow, e);
    }
}
