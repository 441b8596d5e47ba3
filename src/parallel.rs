//! Parallel batch classification and routing using Rayon
//!
//! Every query is independent; the classifier's model is shared read-only
//! through its `Arc`. Output order matches input order.
//!
//! Enable with the `parallel` feature:
//! ```toml
//! symb_solve = { version = "0.3", features = ["parallel"] }
//! ```

use rayon::prelude::*;

use crate::analysis::AnalysisResult;
use crate::classify::{ClassificationResult, UnifiedClassifier};
use crate::config::SolveLimits;
use crate::router::route_query;

/// A routed query: upstream query type and expression string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    pub query_type: String,
    pub expr: String,
}

impl Query {
    pub fn new(query_type: impl Into<String>, expr: impl Into<String>) -> Self {
        Query {
            query_type: query_type.into(),
            expr: expr.into(),
        }
    }
}

impl<A: Into<String>, B: Into<String>> From<(A, B)> for Query {
    fn from((query_type, expr): (A, B)) -> Self {
        Query::new(query_type, expr)
    }
}

/// Classify many inputs with one shared classifier.
///
/// # Example
/// ```
/// use std::sync::Arc;
/// use symb_solve::classify::{LinearTextModel, UnifiedClassifier, UnifiedLabel};
/// use symb_solve::config::ClassifierConfig;
/// use symb_solve::parallel::classify_batch;
///
/// let classifier = UnifiedClassifier::new(
///     Arc::new(LinearTextModel::bundled().unwrap()),
///     ClassifierConfig::default(),
/// );
/// let out = classify_batch(&classifier, &["x = 1", "diff(x**2, x)"]);
/// assert_eq!(out[1].label, UnifiedLabel::Derivative);
/// ```
pub fn classify_batch<S: AsRef<str> + Sync>(
    classifier: &UnifiedClassifier,
    inputs: &[S],
) -> Vec<ClassificationResult> {
    inputs
        .par_iter()
        .map(|s| classifier.classify(s.as_ref()))
        .collect()
}

/// Route many queries, each under the same limits.
pub fn route_batch(queries: &[Query], limits: &SolveLimits) -> Vec<AnalysisResult> {
    tracing::debug!(count = queries.len(), "routing batch");
    queries
        .par_iter()
        .map(|q| route_query(&q.query_type, &q.expr, limits))
        .collect()
}
