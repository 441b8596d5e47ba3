use std::sync::Arc;

use super::statistical::{Prediction, SequenceClassifier, StatisticalClassifier};
use super::{ClassificationResult, Source, UnifiedLabel, deterministic_classify};
use crate::config::ClassifierConfig;

/// Deterministic rules, then the statistical model, then `unknown`.
///
/// # Example
/// ```
/// use std::sync::Arc;
/// use symb_solve::classify::{LinearTextModel, Source, UnifiedClassifier, UnifiedLabel};
/// use symb_solve::config::ClassifierConfig;
///
/// let model = Arc::new(LinearTextModel::bundled().unwrap());
/// let classifier = UnifiedClassifier::new(model, ClassifierConfig::default());
/// let result = classifier.classify("diff(x**3, x)");
/// assert_eq!(result.label, UnifiedLabel::Derivative);
/// assert_eq!(result.source, Source::Deterministic);
/// ```
#[derive(Clone)]
pub struct UnifiedClassifier {
    statistical: StatisticalClassifier,
}

impl UnifiedClassifier {
    pub fn new(model: Arc<dyn SequenceClassifier>, config: ClassifierConfig) -> Self {
        UnifiedClassifier {
            statistical: StatisticalClassifier::new(model, config),
        }
    }

    pub fn statistical(&self) -> &StatisticalClassifier {
        &self.statistical
    }

    pub fn classify(&self, expr_str: &str) -> ClassificationResult {
        if let Some((label, confidence)) = deterministic_classify(expr_str) {
            tracing::debug!(%label, "classified by structural rules");
            return ClassificationResult {
                label,
                confidence,
                source: Source::Deterministic,
            };
        }

        if let Prediction::Accepted { label, confidence } = self.statistical.classify(expr_str) {
            return ClassificationResult {
                label,
                confidence,
                source: Source::Statistical,
            };
        }

        tracing::debug!("no tier accepted, falling back to unknown");
        ClassificationResult {
            label: UnifiedLabel::Unknown,
            confidence: 0.0,
            source: Source::Fallback,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::statistical::tests::FixedModel;

    fn unified(pairs: &[(&str, f64)]) -> UnifiedClassifier {
        UnifiedClassifier::new(Arc::new(FixedModel::new(pairs)), ClassifierConfig::default())
    }

    #[test]
    fn test_deterministic_tier_wins() {
        let c = unified(&[("integral", 0.99), ("derivative", 0.01)]);
        let r = c.classify("x - 1 = 0");
        assert_eq!(r.label, UnifiedLabel::EquationLinear);
        assert_eq!(r.source, Source::Deterministic);
        assert!((r.confidence - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_statistical_tier() {
        let c = unified(&[("integral", 0.99), ("derivative", 0.01)]);
        let r = c.classify("area under x squared");
        assert_eq!(r.label, UnifiedLabel::Integral);
        assert_eq!(r.source, Source::Statistical);
    }

    #[test]
    fn test_rejection_falls_back() {
        let c = unified(&[("integral", 0.5), ("derivative", 0.5)]);
        let r = c.classify("x**2 + 1");
        assert_eq!(r.label, UnifiedLabel::Unknown);
        assert_eq!(r.source, Source::Fallback);
        assert_eq!(r.confidence, 0.0);
    }
}
