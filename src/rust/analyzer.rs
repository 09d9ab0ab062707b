use std::path::Path;

use log::{error, warn};
use serde::Serialize;

use crate::classifier::{ClassifierError, ClassifierHandle, SentimentLabel};

/// Score at or below which `threshold_met` is raised.
pub const DEFAULT_THRESHOLD: f64 = -0.5;

/// Longest input, in characters, passed to the classifier. Longer text is cut silently.
pub const MAX_TEXT_CHARS: usize = 10_000;

/// Outcome of analyzing one text.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AnalysisResult {
    /// Signed score in `[-1, 1]`: `-p_negative` for negative text, `p_positive` otherwise
    pub score: f64,
    /// `score <= threshold`
    pub threshold_met: bool,
    pub label: SentimentLabel,
    /// `max(p_negative, p_positive)`
    pub confidence: f64,
}

impl AnalysisResult {
    /// The fixed result returned when no real inference took place.
    pub const fn neutral() -> Self {
        Self {
            score: 0.0,
            threshold_met: false,
            label: SentimentLabel::Neutral,
            confidence: 0.5,
        }
    }

    /// Builds a live result from a predicted label and `[p_negative, p_positive]`.
    pub fn from_prediction(label: SentimentLabel, proba: [f64; 2], threshold: f64) -> Self {
        let [p_negative, p_positive] = proba;
        let score = match label {
            SentimentLabel::Negative => -p_negative,
            _ => p_positive,
        };
        Self {
            score,
            threshold_met: score <= threshold,
            label,
            confidence: p_negative.max(p_positive),
        }
    }
}

/// Applies the classifier to a single text and maps its output onto the
/// score/label/confidence contract.
#[derive(Debug, Clone)]
pub struct SentimentAnalyzer {
    threshold: f64,
    classifier: Option<ClassifierHandle>,
}

impl SentimentAnalyzer {
    /// Loads the artifact at `path` and builds an analyzer around it.
    pub fn load(path: impl AsRef<Path>, threshold: f64) -> Result<Self, ClassifierError> {
        let classifier = ClassifierHandle::load(path)?;
        Ok(Self::new(classifier, threshold))
    }

    pub fn new(classifier: ClassifierHandle, threshold: f64) -> Self {
        Self {
            threshold,
            classifier: Some(classifier),
        }
    }

    /// An analyzer with no classifier attached; every non-empty analysis fails
    /// with `ModelNotLoaded`.
    pub fn without_classifier(threshold: f64) -> Self {
        Self {
            threshold,
            classifier: None,
        }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn classifier(&self) -> Option<&ClassifierHandle> {
        self.classifier.as_ref()
    }

    /// Analyzes `text`.
    ///
    /// Empty input and inference failures both come back as
    /// [`AnalysisResult::neutral`]. The only error is `ModelNotLoaded`.
    pub fn analyze(&self, text: &str) -> Result<AnalysisResult, ClassifierError> {
        if text.trim().is_empty() {
            return Ok(AnalysisResult::neutral());
        }

        let text = truncate_chars(text, MAX_TEXT_CHARS);
        let classifier = self.classifier.as_ref().ok_or(ClassifierError::ModelNotLoaded)?;

        match self.infer(classifier, text) {
            Ok(result) => Ok(result),
            Err(e) => {
                error!("Prediction failed: {}", e);
                Ok(AnalysisResult::neutral())
            }
        }
    }

    fn infer(&self, classifier: &ClassifierHandle, text: &str) -> Result<AnalysisResult, ClassifierError> {
        let label = classifier.predict(text)?;
        let proba = classifier.predict_proba(text)?;
        if label == SentimentLabel::Neutral {
            return Err(ClassifierError::InferenceFailure(
                "Classifier produced a neutral label".into(),
            ));
        }
        if proba.iter().any(|p| !p.is_finite()) {
            return Err(ClassifierError::InferenceFailure(format!(
                "Non-finite probabilities {:?}",
                proba
            )));
        }
        Ok(AnalysisResult::from_prediction(label, proba, self.threshold))
    }
}

/// Returns the first `max_chars` characters of `text`.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_index, _)) => {
            warn!(
                "Input of {} bytes truncated to {} characters",
                text.len(),
                max_chars
            );
            &text[..byte_index]
        }
        None => text,
    }
}
