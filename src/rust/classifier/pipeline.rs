use std::fs;
use std::path::Path;

use log::{debug, info};
use ndarray::Array1;
use serde::Deserialize;

use super::error::ClassifierError;
use super::estimator::{Estimator, LogisticRegression, MultinomialNb};
use super::model::{PipelineStep, TextClassifier};
use super::vectorizer::TfidfVectorizer;
use super::SentimentLabel;
use crate::preprocessing;

/// Name under which the text normalizer is referenced from an artifact.
pub const PREPROCESS_FUNCTION: &str = "preprocess_text";

fn default_model_type() -> String {
    "Pipeline".to_string()
}

#[derive(Debug, Deserialize)]
struct ArtifactFile {
    #[serde(default = "default_model_type")]
    model_type: String,
    steps: Vec<StepSpec>,
}

#[derive(Debug, Deserialize)]
struct StepSpec {
    name: String,
    #[serde(flatten)]
    stage: StageSpec,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
enum StageSpec {
    FunctionTransformer { function: String },
    TfidfVectorizer(TfidfVectorizer),
    LogisticRegression(LogisticRegression),
    #[serde(rename = "MultinomialNB")]
    MultinomialNb(MultinomialNb),
}

#[derive(Debug, Clone)]
enum TextTransform {
    Preprocess,
}

impl TextTransform {
    fn apply(&self, text: String) -> String {
        match self {
            Self::Preprocess => preprocessing::normalize(&text),
        }
    }
}

/// A fitted text pipeline: string transforms, a vectorizer, and a final estimator.
#[derive(Debug, Clone)]
pub struct TextPipeline {
    model_type: String,
    transforms: Vec<(String, TextTransform)>,
    vectorizer: (String, TfidfVectorizer),
    estimator: (String, Estimator),
    negative_index: usize,
    positive_index: usize,
}

impl TextPipeline {
    /// Reads and validates a pipeline artifact from disk.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ClassifierError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|e| ClassifierError::load_failure(path, e))?;
        Self::from_json(&contents).map_err(|e| match e {
            ClassifierError::ArtifactLoadFailure { reason, .. } => ClassifierError::load_failure(path, reason),
            other => other,
        })
    }

    /// Parses and validates a pipeline artifact from a JSON document.
    pub fn from_json(json: &str) -> Result<Self, ClassifierError> {
        let artifact: ArtifactFile =
            serde_json::from_str(json).map_err(|e| ClassifierError::load_failure("<memory>", e))?;
        Self::from_artifact(artifact).map_err(|reason| ClassifierError::load_failure("<memory>", reason))
    }

    fn from_artifact(artifact: ArtifactFile) -> Result<Self, String> {
        let mut transforms = Vec::new();
        let mut vectorizer: Option<(String, TfidfVectorizer)> = None;
        let mut estimator: Option<(String, Estimator)> = None;

        for step in artifact.steps {
            if estimator.is_some() {
                return Err(format!("Step {:?} follows the final estimator", step.name));
            }
            match step.stage {
                StageSpec::FunctionTransformer { function } => {
                    if vectorizer.is_some() {
                        return Err(format!("Text transform {:?} follows the vectorizer", step.name));
                    }
                    if function != PREPROCESS_FUNCTION {
                        return Err(format!("Unknown transform function {:?}", function));
                    }
                    transforms.push((step.name, TextTransform::Preprocess));
                }
                StageSpec::TfidfVectorizer(tfidf) => {
                    if vectorizer.is_some() {
                        return Err("Pipeline has more than one vectorizer".into());
                    }
                    tfidf.validate()?;
                    vectorizer = Some((step.name, tfidf));
                }
                StageSpec::LogisticRegression(spec) => {
                    let n_features = features_for(&vectorizer, &step.name)?;
                    estimator = Some((step.name, Estimator::from_logistic(spec, n_features)?));
                }
                StageSpec::MultinomialNb(spec) => {
                    let n_features = features_for(&vectorizer, &step.name)?;
                    estimator = Some((step.name, Estimator::from_naive_bayes(spec, n_features)?));
                }
            }
        }

        let vectorizer = vectorizer.ok_or("Pipeline has no vectorizer")?;
        let estimator = estimator.ok_or("Pipeline has no final estimator")?;
        let class_index = |label: &str| {
            estimator
                .1
                .classes()
                .iter()
                .position(|c| c == label)
                .ok_or_else(|| format!("Estimator has no {:?} class", label))
        };
        let negative_index = class_index("negative")?;
        let positive_index = class_index("positive")?;

        Ok(Self {
            model_type: artifact.model_type,
            transforms,
            vectorizer,
            estimator,
            negative_index,
            positive_index,
        })
    }

    fn features(&self, text: &str) -> Result<Array1<f64>, ClassifierError> {
        let text = self
            .transforms
            .iter()
            .fold(text.to_string(), |acc, (_, transform)| transform.apply(acc));
        debug!("Transformed input: {:?}", text);
        self.vectorizer.1.transform(&text)
    }
}

fn features_for(vectorizer: &Option<(String, TfidfVectorizer)>, step: &str) -> Result<usize, String> {
    vectorizer
        .as_ref()
        .map(|(_, v)| v.n_features())
        .ok_or_else(|| format!("Estimator {:?} has no vectorizer before it", step))
}

impl TextClassifier for TextPipeline {
    fn predict(&self, text: &str) -> Result<SentimentLabel, ClassifierError> {
        let features = self.features(text)?;
        let index = self.estimator.1.predict_index(&features);
        let class = &self.estimator.1.classes()[index];
        class
            .parse()
            .map_err(|_| ClassifierError::InferenceFailure(format!("Unexpected class {:?}", class)))
    }

    fn predict_proba(&self, text: &str) -> Result<[f64; 2], ClassifierError> {
        let features = self.features(text)?;
        let proba = self.estimator.1.predict_proba(&features);
        let result = [proba[self.negative_index], proba[self.positive_index]];
        if result.iter().any(|p| !p.is_finite()) {
            return Err(ClassifierError::InferenceFailure(format!(
                "Non-finite probabilities {:?}",
                result
            )));
        }
        Ok(result)
    }

    fn model_type(&self) -> &str {
        &self.model_type
    }

    fn pipeline_steps(&self) -> Result<Option<Vec<PipelineStep>>, ClassifierError> {
        let mut steps: Vec<PipelineStep> = self
            .transforms
            .iter()
            .map(|(name, _)| PipelineStep {
                name: name.clone(),
                step_type: "FunctionTransformer".to_string(),
            })
            .collect();
        steps.push(PipelineStep {
            name: self.vectorizer.0.clone(),
            step_type: "TfidfVectorizer".to_string(),
        });
        steps.push(PipelineStep {
            name: self.estimator.0.clone(),
            step_type: self.estimator.1.type_name().to_string(),
        });
        Ok(Some(steps))
    }

    fn classes(&self) -> Result<Option<Vec<String>>, ClassifierError> {
        Ok(Some(self.estimator.1.classes().to_vec()))
    }
}

impl TextPipeline {
    /// Logs a one-line summary of the loaded stages.
    pub(crate) fn log_summary(&self) {
        info!(
            "Pipeline ready: {} transform(s), {} features, estimator {}",
            self.transforms.len(),
            self.vectorizer.1.n_features(),
            self.estimator.1.type_name()
        );
    }
}
