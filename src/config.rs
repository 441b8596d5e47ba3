//! Runtime limits and classifier configuration.
//!
//! Every knob has a default and an environment override; the binary maps the
//! same knobs onto command-line flags.

use std::path::PathBuf;

/// Default maximum AST depth
pub const DEFAULT_MAX_DEPTH: usize = 100;
/// Default maximum AST node count
pub const DEFAULT_MAX_NODES: usize = 10_000;
/// Default number of solver steps before a computation is abandoned
pub const DEFAULT_MAX_STEPS: usize = 20_000;
/// Default number of simultaneous solution branches
pub const DEFAULT_MAX_BRANCHES: usize = 256;
/// Default number of terms an expansion may produce
pub const DEFAULT_MAX_TERMS: usize = 2_000;

/// Default confidence threshold of the statistical classifier
pub const DEFAULT_THRESHOLD: f64 = 0.70;
/// Default tokenizer truncation length
pub const DEFAULT_MAX_LENGTH: usize = 256;

/// Bounds on symbolic work done for a single request
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct SolveLimits {
    pub max_nodes: usize,
    pub max_depth: usize,
    pub max_steps: usize,
    pub max_branches: usize,
    pub max_terms: usize,
}

impl Default for SolveLimits {
    fn default() -> Self {
        SolveLimits {
            max_nodes: DEFAULT_MAX_NODES,
            max_depth: DEFAULT_MAX_DEPTH,
            max_steps: DEFAULT_MAX_STEPS,
            max_branches: DEFAULT_MAX_BRANCHES,
            max_terms: DEFAULT_MAX_TERMS,
        }
    }
}

impl SolveLimits {
    /// Defaults with `SYMB_SOLVE_MAX_NODES`, `SYMB_SOLVE_MAX_DEPTH` and
    /// `SYMB_SOLVE_MAX_STEPS` applied when set and valid.
    pub fn from_env() -> Self {
        let mut limits = SolveLimits::default();
        if let Some(v) = env_parse("SYMB_SOLVE_MAX_NODES") {
            limits.max_nodes = v;
        }
        if let Some(v) = env_parse("SYMB_SOLVE_MAX_DEPTH") {
            limits.max_depth = v;
        }
        if let Some(v) = env_parse("SYMB_SOLVE_MAX_STEPS") {
            limits.max_steps = v;
        }
        limits
    }

    pub fn with_max_nodes(mut self, n: usize) -> Self {
        self.max_nodes = n;
        self
    }

    pub fn with_max_depth(mut self, n: usize) -> Self {
        self.max_depth = n;
        self
    }

    pub fn with_max_steps(mut self, n: usize) -> Self {
        self.max_steps = n;
        self
    }

    pub fn with_max_branches(mut self, n: usize) -> Self {
        self.max_branches = n;
        self
    }

    pub fn with_max_terms(mut self, n: usize) -> Self {
        self.max_terms = n;
        self
    }
}

/// Statistical classifier settings
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
pub struct ClassifierConfig {
    /// Predictions below this probability are rejected
    pub threshold: f64,
    /// Tokens kept per input
    pub max_length: usize,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        ClassifierConfig {
            threshold: DEFAULT_THRESHOLD,
            max_length: DEFAULT_MAX_LENGTH,
        }
    }
}

impl ClassifierConfig {
    /// Defaults with `SYMB_SOLVE_THRESHOLD` applied when it is a probability.
    pub fn from_env() -> Self {
        let mut config = ClassifierConfig::default();
        if let Some(t) = env_parse::<f64>("SYMB_SOLVE_THRESHOLD")
            && (0.0..=1.0).contains(&t)
        {
            config.threshold = t;
        }
        config
    }

    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold.clamp(0.0, 1.0);
        self
    }

    pub fn with_max_length(mut self, max_length: usize) -> Self {
        self.max_length = max_length.max(1);
        self
    }
}

/// Everything a process needs to build its pipeline
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EngineConfig {
    pub limits: SolveLimits,
    pub classifier: ClassifierConfig,
    /// Statistical model artifact; `None` uses the bundled one
    pub model_path: Option<PathBuf>,
}

impl EngineConfig {
    pub fn from_env() -> Self {
        EngineConfig {
            limits: SolveLimits::from_env(),
            classifier: ClassifierConfig::from_env(),
            model_path: std::env::var_os("SYMB_SOLVE_MODEL").map(PathBuf::from),
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    let raw = std::env::var(key).ok()?;
    match raw.trim().parse() {
        Ok(v) => Some(v),
        Err(_) => {
            tracing::warn!(key, value = %raw, "ignoring unparseable environment override");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builders_override_defaults() {
        let limits = SolveLimits::default().with_max_steps(10).with_max_depth(5);
        assert_eq!(limits.max_steps, 10);
        assert_eq!(limits.max_depth, 5);
        assert_eq!(limits.max_nodes, DEFAULT_MAX_NODES);
    }

    #[test]
    fn test_threshold_is_clamped() {
        let c = ClassifierConfig::default().with_threshold(1.5);
        assert!((c.threshold - 1.0).abs() < f64::EPSILON);
        assert!((ClassifierConfig::default().threshold - 0.70).abs() < f64::EPSILON);
    }
}
