use crate::Expr;
use crate::ast::ExprKind;
use rustc_hash::FxHashMap;
use std::sync::Arc;

/// Node kind for fast rule filtering.
/// Rules declare which node kinds they can apply to.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub(crate) enum NodeKind {
    Atom,
    Sum,
    Product,
    Pow,
    Function,
    Construct,
}

impl NodeKind {
    /// Get the kind of an expression (cheap O(1) operation)
    #[inline]
    pub(crate) fn of(expr: &Expr) -> Self {
        match expr.kind() {
            ExprKind::Number(_)
            | ExprKind::Float(_)
            | ExprKind::Constant(_)
            | ExprKind::Symbol(_) => NodeKind::Atom,
            ExprKind::Sum(_) => NodeKind::Sum,
            ExprKind::Product(_) => NodeKind::Product,
            ExprKind::Pow(..) => NodeKind::Pow,
            ExprKind::Function { .. } => NodeKind::Function,
            ExprKind::Derivative { .. }
            | ExprKind::Integral { .. }
            | ExprKind::Relation { .. }
            | ExprKind::Tuple(_) => NodeKind::Construct,
        }
    }

    const ALL: [NodeKind; 6] = [
        NodeKind::Atom,
        NodeKind::Sum,
        NodeKind::Product,
        NodeKind::Pow,
        NodeKind::Function,
        NodeKind::Construct,
    ];
}

/// Core trait for all simplification rules
pub(crate) trait Rule: Send + Sync {
    fn name(&self) -> &'static str;
    fn priority(&self) -> i32;
    fn category(&self) -> RuleCategory;

    /// Which node kinds this rule can apply to.
    /// Rules will ONLY be checked against expressions matching these kinds.
    fn applies_to(&self) -> &'static [NodeKind];

    fn apply(&self, expr: &Expr, context: &RuleContext) -> Option<Expr>;
}

/// Categories of simplification rules
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub(crate) enum RuleCategory {
    Trigonometric,
    Hyperbolic,
    Exponential,
}

/// Context passed to rules during application
#[derive(Clone, Debug, Default)]
pub(crate) struct RuleContext {
    pub depth: usize,
}

impl RuleContext {
    pub(crate) fn set_depth(&mut self, depth: usize) {
        self.depth = depth;
    }
}

/// Declare a unit-struct rule.
///
/// `rule!(Name, "name", priority, Category, &[kinds], |expr, ctx| body)`
macro_rules! rule {
    ($ty:ident, $name:literal, $priority:expr, $category:ident, $kinds:expr, $body:expr) => {
        pub(crate) struct $ty;

        impl $crate::simplification::rules::Rule for $ty {
            fn name(&self) -> &'static str {
                $name
            }

            fn priority(&self) -> i32 {
                $priority
            }

            fn category(&self) -> $crate::simplification::rules::RuleCategory {
                $crate::simplification::rules::RuleCategory::$category
            }

            fn applies_to(&self) -> &'static [$crate::simplification::rules::NodeKind] {
                $kinds
            }

            fn apply(
                &self,
                expr: &$crate::Expr,
                context: &$crate::simplification::rules::RuleContext,
            ) -> Option<$crate::Expr> {
                let body: fn(
                    &$crate::Expr,
                    &$crate::simplification::rules::RuleContext,
                ) -> Option<$crate::Expr> = $body;
                body(expr, context)
            }
        }
    };
}

/// Exponential and logarithmic simplification rules
pub(crate) mod exponential;

/// Hyperbolic function simplification rules
pub(crate) mod hyperbolic;

/// Trigonometric simplification rules
pub(crate) mod trigonometric;

/// Rule registry with a per-kind index
pub(crate) struct RuleRegistry {
    pub(crate) rules: Vec<Arc<dyn Rule>>,
    /// Rules indexed by node kind for fast lookup
    rules_by_kind: FxHashMap<NodeKind, Vec<Arc<dyn Rule>>>,
}

impl RuleRegistry {
    pub(crate) fn new() -> Self {
        Self {
            rules: Vec::new(),
            rules_by_kind: FxHashMap::default(),
        }
    }

    pub(crate) fn load_all_rules(&mut self) {
        self.rules.extend(trigonometric::get_trigonometric_rules());
        self.rules.extend(hyperbolic::get_hyperbolic_rules());
        self.rules.extend(exponential::get_exponential_rules());

        // Higher priority runs first; category breaks ties for a stable order
        self.rules.sort_by_key(|r| {
            (
                std::cmp::Reverse(r.priority()),
                match r.category() {
                    RuleCategory::Exponential => 0,
                    RuleCategory::Trigonometric => 1,
                    RuleCategory::Hyperbolic => 2,
                },
            )
        });
        self.build_kind_index();
    }

    /// Build the index of rules by node kind
    fn build_kind_index(&mut self) {
        self.rules_by_kind.clear();
        for kind in NodeKind::ALL {
            self.rules_by_kind.insert(kind, Vec::new());
        }
        for rule in &self.rules {
            for &kind in rule.applies_to() {
                if let Some(rules) = self.rules_by_kind.get_mut(&kind) {
                    rules.push(Arc::clone(rule));
                }
            }
        }
    }

    /// Get only rules that apply to a specific node kind
    #[inline]
    pub(crate) fn get_rules_for_kind(&self, kind: NodeKind) -> &[Arc<dyn Rule>] {
        self.rules_by_kind
            .get(&kind)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_indexes_by_kind() {
        let mut registry = RuleRegistry::new();
        registry.load_all_rules();
        assert!(!registry.rules.is_empty());
        assert!(!registry.get_rules_for_kind(NodeKind::Sum).is_empty());
        assert!(registry.get_rules_for_kind(NodeKind::Atom).is_empty());
        let priorities: Vec<i32> = registry.rules.iter().map(|r| r.priority()).collect();
        assert!(priorities.windows(2).all(|w| w[0] >= w[1]));
    }

    #[test]
    fn test_rule_names_are_unique() {
        let mut registry = RuleRegistry::new();
        registry.load_all_rules();
        let mut names: Vec<&str> = registry.rules.iter().map(|r| r.name()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), registry.rules.len());
    }
}
