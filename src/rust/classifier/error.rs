use std::path::PathBuf;

/// Represents the different types of errors that can occur while analyzing sentiment.
#[derive(Debug, thiserror::Error)]
pub enum ClassifierError {
    /// The caller submitted text that is empty after trimming
    #[error("Text cannot be empty")]
    EmptyInput,
    /// No classifier artifact has been loaded yet
    #[error("Sentiment model not loaded")]
    ModelNotLoaded,
    /// The normalizer was handed something other than a string or a sequence of strings
    #[error("Input must be a string or a sequence of strings, got {0}")]
    UnsupportedInputType(String),
    /// The classifier failed while running a prediction
    #[error("Inference failed: {0}")]
    InferenceFailure(String),
    /// The artifact could not be read, parsed or validated
    #[error("Failed to load model from {path:?}: {reason}")]
    ArtifactLoadFailure { path: PathBuf, reason: String },
}

impl ClassifierError {
    pub(crate) fn load_failure(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Self::ArtifactLoadFailure {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}
