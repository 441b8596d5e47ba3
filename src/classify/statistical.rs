//! Threshold-gated statistical classification

use std::sync::Arc;

use super::UnifiedLabel;
use crate::config::{ClassifierConfig, SolveLimits};
use crate::error::ModelError;
use crate::parser::{Tier, parse_tier};

/// A pretrained text classifier producing a distribution over its labels.
///
/// Implementations are loaded once and only read afterwards.
pub trait SequenceClassifier: Send + Sync {
    fn model_id(&self) -> &str;

    /// Label table, index-aligned with [`predict`](Self::predict)'s output.
    fn labels(&self) -> &[String];

    /// Probabilities over [`labels`](Self::labels) for `text`, truncated to
    /// `max_length` tokens.
    fn predict(&self, text: &str, max_length: usize) -> Result<Vec<f64>, ModelError>;
}

/// Outcome of one statistical classification.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Prediction {
    Accepted { label: UnifiedLabel, confidence: f64 },
    /// Best label fell below the threshold
    Rejected { confidence: f64 },
    /// The model could not produce a usable distribution
    Failed,
}

impl Prediction {
    pub fn label(&self) -> Option<UnifiedLabel> {
        match self {
            Prediction::Accepted { label, .. } => Some(*label),
            _ => None,
        }
    }

    pub fn confidence(&self) -> Option<f64> {
        match self {
            Prediction::Accepted { confidence, .. } | Prediction::Rejected { confidence } => {
                Some(*confidence)
            }
            Prediction::Failed => None,
        }
    }
}

/// Stable model input: the canonical serialized form when `expr_str`
/// parses with names taken literally, the raw string otherwise. Free text
/// such as `area under x squared` therefore reaches the model as words.
pub fn canonicalize(expr_str: &str) -> String {
    parse_tier(expr_str, Tier::Strict, &SolveLimits::default())
        .map_or_else(|_| expr_str.to_string(), |e| e.to_srepr())
}

#[derive(Clone)]
pub struct StatisticalClassifier {
    model: Arc<dyn SequenceClassifier>,
    config: ClassifierConfig,
}

impl StatisticalClassifier {
    pub fn new(model: Arc<dyn SequenceClassifier>, config: ClassifierConfig) -> Self {
        StatisticalClassifier { model, config }
    }

    pub fn config(&self) -> &ClassifierConfig {
        &self.config
    }

    pub fn model_id(&self) -> &str {
        self.model.model_id()
    }

    pub fn classify(&self, expr_str: &str) -> Prediction {
        let input = canonicalize(expr_str);
        match self.infer(&input) {
            Ok((label, confidence)) if confidence >= self.config.threshold => {
                tracing::debug!(%label, confidence, "statistical prediction accepted");
                Prediction::Accepted { label, confidence }
            }
            Ok((label, confidence)) => {
                tracing::debug!(%label, confidence, threshold = self.config.threshold, "statistical prediction rejected");
                Prediction::Rejected { confidence }
            }
            Err(e) => {
                tracing::warn!(model_id = self.model.model_id(), error = %e, "statistical classification failed");
                Prediction::Failed
            }
        }
    }

    fn infer(&self, input: &str) -> Result<(UnifiedLabel, f64), ModelError> {
        let probs = self.model.predict(input, self.config.max_length)?;
        let labels = self.model.labels();
        if probs.len() != labels.len() {
            return Err(ModelError::Shape(format!(
                "{} probabilities for {} labels",
                probs.len(),
                labels.len()
            )));
        }
        let (best, confidence) = probs
            .iter()
            .copied()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(&b.1))
            .ok_or_else(|| ModelError::Inference("empty distribution".into()))?;
        if !(0.0..=1.0).contains(&confidence) {
            return Err(ModelError::Inference(format!("probability {} out of range", confidence)));
        }
        let label = labels[best]
            .parse::<UnifiedLabel>()
            .map_err(ModelError::Inference)?;
        Ok((label, confidence))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, reason = "Standard test relaxations")]
pub(crate) mod tests {
    use super::*;

    /// Returns a fixed distribution whatever the input.
    pub(crate) struct FixedModel {
        pub labels: Vec<String>,
        pub probs: Vec<f64>,
    }

    impl FixedModel {
        pub(crate) fn new(pairs: &[(&str, f64)]) -> Self {
            FixedModel {
                labels: pairs.iter().map(|(l, _)| l.to_string()).collect(),
                probs: pairs.iter().map(|(_, p)| *p).collect(),
            }
        }
    }

    impl SequenceClassifier for FixedModel {
        fn model_id(&self) -> &str {
            "fixed"
        }
        fn labels(&self) -> &[String] {
            &self.labels
        }
        fn predict(&self, _text: &str, _max_length: usize) -> Result<Vec<f64>, ModelError> {
            Ok(self.probs.clone())
        }
    }

    struct BrokenModel;

    impl SequenceClassifier for BrokenModel {
        fn model_id(&self) -> &str {
            "broken"
        }
        fn labels(&self) -> &[String] {
            &[]
        }
        fn predict(&self, _text: &str, _max_length: usize) -> Result<Vec<f64>, ModelError> {
            Err(ModelError::Inference("no runtime".into()))
        }
    }

    fn classifier(model: impl SequenceClassifier + 'static) -> StatisticalClassifier {
        StatisticalClassifier::new(Arc::new(model), ClassifierConfig::default())
    }

    #[test]
    fn test_threshold_gating() {
        let sure = classifier(FixedModel::new(&[("integral", 0.9), ("derivative", 0.1)]));
        assert_eq!(
            sure.classify("anything"),
            Prediction::Accepted { label: UnifiedLabel::Integral, confidence: 0.9 }
        );
        let unsure = classifier(FixedModel::new(&[("integral", 0.6), ("derivative", 0.4)]));
        let p = unsure.classify("anything");
        assert_eq!(p, Prediction::Rejected { confidence: 0.6 });
        assert_eq!(p.label(), None);
        assert_eq!(p.confidence(), Some(0.6));
    }

    #[test]
    fn test_errors_become_failed() {
        assert_eq!(classifier(BrokenModel).classify("x"), Prediction::Failed);
        let foreign = classifier(FixedModel::new(&[("limit", 0.95), ("integral", 0.05)]));
        assert_eq!(foreign.classify("x"), Prediction::Failed);
        let short = classifier(FixedModel { labels: vec!["integral".into()], probs: vec![] });
        assert_eq!(short.classify("x"), Prediction::Failed);
    }

    #[test]
    fn test_canonical_input() {
        assert_eq!(canonicalize("x**2"), "Pow(Symbol('x'), Integer(2))");
        assert_eq!(canonicalize("((("), "(((");
    }
}
