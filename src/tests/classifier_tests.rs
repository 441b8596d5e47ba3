//! The unified classifier over the bundled text model
#![allow(clippy::unwrap_used, reason = "Standard test relaxations")]

use std::sync::Arc;

use crate::classify::{LinearTextModel, Source, UnifiedClassifier, UnifiedLabel};
use crate::config::ClassifierConfig;

fn classifier(config: ClassifierConfig) -> UnifiedClassifier {
    UnifiedClassifier::new(Arc::new(LinearTextModel::bundled().unwrap()), config)
}

#[test]
fn test_structure_is_decided_by_rules() {
    let c = classifier(ClassifierConfig::default());
    let cases = [
        ("diff(x**3, x)", UnifiedLabel::Derivative),
        ("integrate(x**2, x)", UnifiedLabel::Integral),
        ("2*x + 3 = 7", UnifiedLabel::EquationLinear),
        ("x**2 - 4 = 0", UnifiedLabel::EquationNonlinear),
        ("x + y = 1, x - y = 3", UnifiedLabel::SystemLinear),
        ("x*y - 1, x - y", UnifiedLabel::SystemNonlinear),
    ];
    for (input, label) in cases {
        let r = c.classify(input);
        assert_eq!(r.label, label, "{}", input);
        assert_eq!(r.source, Source::Deterministic);
    }
}

#[test]
fn test_free_text_reaches_the_model() {
    let c = classifier(ClassifierConfig::default());
    let r = c.classify("differentiate x squared");
    assert_eq!(r.label, UnifiedLabel::Derivative);
    assert_eq!(r.source, Source::Statistical);
    assert!(r.confidence >= 0.70 && r.confidence < 1.0);

    let r = c.classify("area under x squared");
    assert_eq!(r.label, UnifiedLabel::Integral);
}

#[test]
fn test_low_confidence_falls_back() {
    let c = classifier(ClassifierConfig::default());
    let r = c.classify("hello world");
    assert_eq!((r.label, r.source), (UnifiedLabel::Unknown, Source::Fallback));
    // a bare expression matches no rule and the model is unsure about it
    let r = c.classify("x**2 + 1");
    assert_eq!(r.source, Source::Fallback);
}

#[test]
fn test_threshold_is_configurable() {
    let strict = classifier(ClassifierConfig::default());
    assert_eq!(strict.classify("solve the quadratic").label, UnifiedLabel::Unknown);
    let lenient = classifier(ClassifierConfig::default().with_threshold(0.5));
    let r = lenient.classify("solve the quadratic");
    assert_eq!(r.label, UnifiedLabel::EquationNonlinear);
    assert_eq!(r.source, Source::Statistical);
}
