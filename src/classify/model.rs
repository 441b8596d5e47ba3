//! Bag-of-tokens linear text model
//!
//! The artifact is a JSON document with a model id, the label table, a token
//! vocabulary, one weight row per label and one bias per label. Inference is
//! a dot product per label followed by a softmax; it is pure and
//! deterministic, so one loaded model can be shared across threads.

use std::path::Path;

use rustc_hash::FxHashMap;
use serde::Deserialize;

use super::statistical::SequenceClassifier;
use crate::error::ModelError;

const BUNDLED: &str = include_str!("../../models/symbolic_classifier.json");

#[derive(Debug, Deserialize)]
struct Artifact {
    model_id: String,
    labels: Vec<String>,
    vocabulary: FxHashMap<String, usize>,
    weights: Vec<Vec<f64>>,
    bias: Vec<f64>,
}

#[derive(Debug, Clone)]
pub struct LinearTextModel {
    model_id: String,
    labels: Vec<String>,
    vocabulary: FxHashMap<String, usize>,
    weights: Vec<Vec<f64>>,
    bias: Vec<f64>,
}

impl LinearTextModel {
    /// Parse an artifact from its JSON text.
    ///
    /// # Errors
    /// `Format` for malformed JSON, `Shape` when the label table, weights,
    /// bias and vocabulary disagree in size.
    pub fn from_json(text: &str) -> Result<Self, ModelError> {
        let artifact: Artifact = serde_json::from_str(text)?;
        Self::validate(artifact)
    }

    /// Read an artifact from disk.
    pub fn load(path: &Path) -> Result<Self, ModelError> {
        let text = std::fs::read_to_string(path)?;
        let model = Self::from_json(&text)?;
        tracing::info!(model_id = %model.model_id, path = %path.display(), "loaded classifier model");
        Ok(model)
    }

    /// The artifact compiled into the crate.
    pub fn bundled() -> Result<Self, ModelError> {
        Self::from_json(BUNDLED)
    }

    fn validate(a: Artifact) -> Result<Self, ModelError> {
        let n = a.labels.len();
        if n == 0 {
            return Err(ModelError::Shape("empty label table".into()));
        }
        if a.weights.len() != n || a.bias.len() != n {
            return Err(ModelError::Shape(format!(
                "{} labels but {} weight rows and {} biases",
                n,
                a.weights.len(),
                a.bias.len()
            )));
        }
        let width = a.vocabulary.values().map(|&i| i + 1).max().unwrap_or(0);
        if let Some(row) = a.weights.iter().find(|row| row.len() < width) {
            return Err(ModelError::Shape(format!(
                "weight row of length {} for a vocabulary of {}",
                row.len(),
                width
            )));
        }
        Ok(LinearTextModel {
            model_id: a.model_id,
            labels: a.labels,
            vocabulary: a.vocabulary,
            weights: a.weights,
            bias: a.bias,
        })
    }
}

/// Lowercased identifier and number runs; every other visible character is
/// its own token.
pub(crate) fn tokenize(text: &str, max_length: usize) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut word = String::new();
    for c in text.chars() {
        if c.is_alphanumeric() || c == '_' || c == '.' {
            word.extend(c.to_lowercase());
            continue;
        }
        if !word.is_empty() {
            tokens.push(std::mem::take(&mut word));
        }
        if !c.is_whitespace() {
            tokens.push(c.to_string());
        }
    }
    if !word.is_empty() {
        tokens.push(word);
    }
    tokens.truncate(max_length);
    tokens
}

fn softmax(logits: &[f64]) -> Vec<f64> {
    let max = logits.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let exps: Vec<f64> = logits.iter().map(|&l| (l - max).exp()).collect();
    let sum: f64 = exps.iter().sum();
    exps.into_iter().map(|e| e / sum).collect()
}

impl SequenceClassifier for LinearTextModel {
    fn model_id(&self) -> &str {
        &self.model_id
    }

    fn labels(&self) -> &[String] {
        &self.labels
    }

    fn predict(&self, text: &str, max_length: usize) -> Result<Vec<f64>, ModelError> {
        let mut logits = self.bias.clone();
        for token in tokenize(text, max_length) {
            let Some(&idx) = self.vocabulary.get(&token) else {
                continue;
            };
            for (logit, row) in logits.iter_mut().zip(&self.weights) {
                *logit += row[idx];
            }
        }
        let probs = softmax(&logits);
        if probs.iter().any(|p| !p.is_finite()) {
            return Err(ModelError::Inference("non-finite probabilities".into()));
        }
        Ok(probs)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, reason = "Standard test relaxations")]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize() {
        assert_eq!(
            tokenize("Pow(Symbol('x'), Integer(2))", 256),
            vec!["pow", "(", "symbol", "(", "'", "x", "'", ")", ",", "integer", "(", "2", ")", ")"]
        );
        assert_eq!(tokenize("a b c d", 2), vec!["a", "b"]);
    }

    #[test]
    fn test_softmax_sums_to_one() {
        let p = softmax(&[1.0, 2.0, 3.0]);
        assert!((p.iter().sum::<f64>() - 1.0).abs() < 1e-12);
        assert!(p[2] > p[1] && p[1] > p[0]);
        // large logits stay finite
        assert!(softmax(&[1000.0, 0.0]).iter().all(|v| v.is_finite()));
    }

    #[test]
    fn test_bundled_model_loads() {
        let model = LinearTextModel::bundled().unwrap();
        assert_eq!(model.labels().len(), 6);
        let probs = model.predict("integrate", 256).unwrap();
        let best = probs
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(i, _)| i)
            .unwrap();
        assert_eq!(model.labels()[best], "integral");
        assert!(probs[best] >= 0.70);
    }

    #[test]
    fn test_shape_mismatch_rejected() {
        let bad = r#"{"model_id": "m", "labels": ["a", "b"], "vocabulary": {"x": 0},
                      "weights": [[1.0]], "bias": [0.0, 0.0]}"#;
        assert!(matches!(LinearTextModel::from_json(bad), Err(ModelError::Shape(_))));
        assert!(matches!(LinearTextModel::from_json("{"), Err(ModelError::Format(_))));
    }
}
