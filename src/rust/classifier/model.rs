use serde::Serialize;

use super::error::ClassifierError;
use super::SentimentLabel;

/// A named stage of a fitted pipeline, reported for diagnostics.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PipelineStep {
    /// Stage name as stored in the artifact
    #[serde(rename = "step")]
    pub name: String,
    /// Concrete stage type, e.g. `TfidfVectorizer`
    #[serde(rename = "type")]
    pub step_type: String,
}

/// A pre-fit sentiment classifier operating on raw text.
///
/// Implementations are read-only after construction and must be safe to call
/// from many requests at once. Only `predict` and `predict_proba` take part in
/// inference. The remaining methods are best-effort diagnostics that default
/// to "not available"; an error from them is reported, never propagated.
pub trait TextClassifier: Send + Sync {
    /// Returns the most likely label, always `Positive` or `Negative`.
    fn predict(&self, text: &str) -> Result<SentimentLabel, ClassifierError>;

    /// Returns `[p_negative, p_positive]`, summing to 1.0.
    fn predict_proba(&self, text: &str) -> Result<[f64; 2], ClassifierError>;

    /// Short name of the concrete model, e.g. `Pipeline`.
    fn model_type(&self) -> &str;

    /// Stage names and types if the model is a staged pipeline.
    fn pipeline_steps(&self) -> Result<Option<Vec<PipelineStep>>, ClassifierError> {
        Ok(None)
    }

    /// Class ordering of the final estimator, if it exposes one.
    fn classes(&self) -> Result<Option<Vec<String>>, ClassifierError> {
        Ok(None)
    }
}
