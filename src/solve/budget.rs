use crate::config::SolveLimits;
use crate::error::SolveError;
use crate::Expr;

/// Work counter for one request, checked against [`SolveLimits`].
#[derive(Debug, Clone)]
pub struct Budget {
    limits: SolveLimits,
    steps: usize,
}

impl Default for Budget {
    fn default() -> Self {
        Self::new(SolveLimits::default())
    }
}

impl Budget {
    pub fn new(limits: SolveLimits) -> Self {
        Self { limits, steps: 0 }
    }

    pub fn limits(&self) -> &SolveLimits {
        &self.limits
    }

    pub fn steps(&self) -> usize {
        self.steps
    }

    /// Count one solver step.
    pub fn tick(&mut self) -> Result<(), SolveError> {
        self.steps += 1;
        if self.steps > self.limits.max_steps {
            tracing::warn!(limit = self.limits.max_steps, "solver step budget exhausted");
            return Err(SolveError::BudgetExceeded {
                resource: "solver steps",
                limit: self.limits.max_steps,
            });
        }
        Ok(())
    }

    /// Reject intermediate expressions that outgrew the size limits.
    pub fn check_size(&self, expr: &Expr) -> Result<(), SolveError> {
        if expr.node_count() > self.limits.max_nodes {
            return Err(SolveError::BudgetExceeded {
                resource: "expression nodes",
                limit: self.limits.max_nodes,
            });
        }
        if expr.depth() > self.limits.max_depth {
            return Err(SolveError::BudgetExceeded {
                resource: "expression depth",
                limit: self.limits.max_depth,
            });
        }
        Ok(())
    }

    pub fn check_branches(&self, count: usize) -> Result<(), SolveError> {
        if count > self.limits.max_branches {
            return Err(SolveError::BudgetExceeded {
                resource: "solution branches",
                limit: self.limits.max_branches,
            });
        }
        Ok(())
    }

    pub fn max_terms(&self) -> usize {
        self.limits.max_terms
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_exhaustion() {
        let mut budget = Budget::new(SolveLimits::default().with_max_steps(2));
        assert!(budget.tick().is_ok());
        assert!(budget.tick().is_ok());
        assert_eq!(
            budget.tick(),
            Err(SolveError::BudgetExceeded {
                resource: "solver steps",
                limit: 2
            })
        );
    }

    #[test]
    fn test_size_limits() {
        let budget = Budget::new(SolveLimits::default().with_max_nodes(2));
        assert!(budget.check_size(&Expr::integer(3)).is_ok());
        assert!(budget.check_size(&(Expr::symbol("x") * 3 + 1)).is_err());
        assert!(budget.check_branches(257).is_err());
        assert!(budget.check_branches(256).is_ok());
    }
}
