use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use log::{error, info};

use super::error::ClassifierError;
use super::model::{PipelineStep, TextClassifier};
use super::pipeline::TextPipeline;
use super::SentimentLabel;

/// Owns the one pre-fit classifier and exposes it for read-only inference.
///
/// # Thread Safety
///
/// The handle is `Send + Sync` and cheap to clone: the model sits behind an
/// `Arc` and is never mutated after loading, so any number of requests can
/// call `predict` and `predict_proba` at the same time.
///
/// ```rust,no_run
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// use amygdala::ClassifierHandle;
///
/// let handle = ClassifierHandle::load("models/sentiment_model.json")?;
/// let label = handle.predict("What a lovely walk this morning")?;
/// let [p_negative, p_positive] = handle.predict_proba("What a lovely walk this morning")?;
/// println!("{} ({:.2} / {:.2})", label, p_negative, p_positive);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct ClassifierHandle {
    path: Option<PathBuf>,
    model: Arc<dyn TextClassifier>,
}

// Compile-time verification of thread-safety
const _: () = {
    fn assert_send_sync<T: Send + Sync>() {}
    fn verify_thread_safety() {
        assert_send_sync::<ClassifierHandle>();
    }
};

impl fmt::Debug for ClassifierHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassifierHandle")
            .field("path", &self.path)
            .field("model_type", &self.model.model_type())
            .finish()
    }
}

impl ClassifierHandle {
    /// Loads the pipeline artifact at `path`.
    ///
    /// A missing or malformed artifact is a hard failure; nothing is retried here.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ClassifierError> {
        let path = path.as_ref();
        let start = Instant::now();
        info!("Loading sentiment model from {:?}", path);

        let pipeline = TextPipeline::from_file(path).map_err(|e| {
            error!("Failed to load model: {}", e);
            e
        })?;
        pipeline.log_summary();
        info!("Sentiment model loaded successfully in {:.2?}", start.elapsed());

        Ok(Self {
            path: Some(path.to_path_buf()),
            model: Arc::new(pipeline),
        })
    }

    /// Wraps an already constructed classifier backend.
    pub fn from_classifier(model: Arc<dyn TextClassifier>) -> Self {
        Self { path: None, model }
    }

    /// Path the artifact was loaded from, if it came from disk.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn predict(&self, text: &str) -> Result<SentimentLabel, ClassifierError> {
        self.model.predict(text)
    }

    pub fn predict_proba(&self, text: &str) -> Result<[f64; 2], ClassifierError> {
        self.model.predict_proba(text)
    }

    pub fn model_type(&self) -> &str {
        self.model.model_type()
    }

    pub fn pipeline_steps(&self) -> Result<Option<Vec<PipelineStep>>, ClassifierError> {
        self.model.pipeline_steps()
    }

    pub fn classes(&self) -> Result<Option<Vec<String>>, ClassifierError> {
        self.model.classes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::thread;

    const ARTIFACT: &str = r#"{
        "model_type": "Pipeline",
        "steps": [
            {"name": "preprocess", "type": "FunctionTransformer", "function": "preprocess_text"},
            {"name": "tfidf", "type": "TfidfVectorizer", "vocabulary": {"calm": 0, "angry": 1}, "idf": [1.0, 1.0]},
            {"name": "clf", "type": "LogisticRegression", "classes": ["negative", "positive"], "coef": [3.0, -3.0]}
        ]
    }"#;

    #[test]
    fn test_load_from_disk() -> Result<(), Box<dyn std::error::Error>> {
        let mut file = tempfile::NamedTempFile::new()?;
        file.write_all(ARTIFACT.as_bytes())?;

        let handle = ClassifierHandle::load(file.path())?;
        assert_eq!(handle.path(), Some(file.path()));
        assert_eq!(handle.model_type(), "Pipeline");
        assert_eq!(handle.predict("So calm.")?, SentimentLabel::Positive);
        assert_eq!(handle.predict("ANGRY!!")?, SentimentLabel::Negative);
        assert_eq!(handle.classes()?, Some(vec!["negative".to_string(), "positive".to_string()]));
        assert_eq!(handle.pipeline_steps()?.map(|s| s.len()), Some(3));
        Ok(())
    }

    #[test]
    fn test_load_garbage_fails() -> Result<(), Box<dyn std::error::Error>> {
        let mut file = tempfile::NamedTempFile::new()?;
        file.write_all(b"not json at all")?;
        let err = ClassifierHandle::load(file.path()).unwrap_err();
        assert!(matches!(err, ClassifierError::ArtifactLoadFailure { .. }));
        Ok(())
    }

    #[test]
    fn test_concurrent_reads() -> Result<(), Box<dyn std::error::Error>> {
        let handle = ClassifierHandle::from_classifier(Arc::new(TextPipeline::from_json(ARTIFACT)?));
        let workers: Vec<_> = (0..8)
            .map(|i| {
                let handle = handle.clone();
                thread::spawn(move || {
                    let text = if i % 2 == 0 { "calm" } else { "angry" };
                    handle.predict(text).unwrap()
                })
            })
            .collect();
        for (i, worker) in workers.into_iter().enumerate() {
            let expected = if i % 2 == 0 {
                SentimentLabel::Positive
            } else {
                SentimentLabel::Negative
            };
            assert_eq!(worker.join().unwrap(), expected);
        }
        Ok(())
    }
}
