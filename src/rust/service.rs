//! The shared analysis service.
//!
//! One [`AnalysisService`] is built at process start and handed to the HTTP
//! layer behind an `Arc`. It owns the analyzer (once the artifact has loaded),
//! counts analysis attempts, and serves the health, model-info and statistics
//! views.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::time::{Duration, Instant};

use log::{error, info};
use serde::Serialize;

use crate::analyzer::{AnalysisResult, SentimentAnalyzer};
use crate::classifier::{ClassifierError, PipelineStep};
use crate::config::ServiceConfig;

pub const SERVICE_NAME: &str = "sentiment-analysis";
pub const NOT_TRACKED: &str = "Not tracked yet";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceStatus {
    Healthy,
    Unhealthy,
}

/// An analysis result tagged with its attempt number.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Prediction {
    #[serde(flatten)]
    pub result: AnalysisResult,
    pub prediction_id: u64,
    pub service_status: ServiceStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UptimeInfo {
    pub model_load_time_seconds: Option<f64>,
    pub ready_for_predictions: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HealthReport {
    pub service_name: &'static str,
    pub status: ServiceStatus,
    pub model_loaded: bool,
    pub predictions_served: u64,
    pub uptime_info: UptimeInfo,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_info: Option<ModelInfo>,
    /// Why the model could not be loaded, when a load was just attempted and failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Human-readable description of the response fields.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutputFormat {
    pub score: &'static str,
    pub threshold_met: &'static str,
    pub label: &'static str,
    pub confidence: &'static str,
}

const OUTPUT_FORMAT: OutputFormat = OutputFormat {
    score: "float (-1 to 1)",
    threshold_met: "boolean",
    label: "string (positive/negative)",
    confidence: "float (0 to 1)",
};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelDetails {
    pub model_type: String,
    pub threshold: f64,
    pub preprocessing_enabled: bool,
    pub supported_languages: Vec<&'static str>,
    pub input_format: &'static str,
    pub output_format: OutputFormat,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pipeline_steps: Option<Vec<PipelineStep>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub classes: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_details_error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ModelInfo {
    Loaded(ModelDetails),
    Unavailable { error: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Statistics {
    pub total_predictions: u64,
    pub model_loaded: bool,
    pub load_time_seconds: Option<f64>,
    pub average_processing_time: &'static str,
    pub error_rate: &'static str,
}

#[derive(Debug)]
struct LoadedModel {
    analyzer: SentimentAnalyzer,
    load_duration: Duration,
}

/// Process-wide sentiment service: the loaded analyzer plus usage counters.
///
/// Built once and shared by reference. The model slot starts empty; a failed
/// load leaves it empty and the next [`ensure_loaded`](Self::ensure_loaded)
/// tries again.
#[derive(Debug)]
pub struct AnalysisService {
    model_path: PathBuf,
    threshold: f64,
    model: RwLock<Option<Arc<LoadedModel>>>,
    load_lock: Mutex<()>,
    prediction_count: AtomicU64,
}

impl AnalysisService {
    /// Creates an unloaded service; call [`ensure_loaded`](Self::ensure_loaded) to load the model.
    pub fn new(config: &ServiceConfig) -> Self {
        Self {
            model_path: config.model_path.clone(),
            threshold: config.threshold,
            model: RwLock::new(None),
            load_lock: Mutex::new(()),
            prediction_count: AtomicU64::new(0),
        }
    }

    /// Creates a service that is already loaded with `analyzer`.
    pub fn with_analyzer(analyzer: SentimentAnalyzer) -> Self {
        let service = Self {
            model_path: PathBuf::new(),
            threshold: analyzer.threshold(),
            model: RwLock::new(None),
            load_lock: Mutex::new(()),
            prediction_count: AtomicU64::new(0),
        };
        service.install(analyzer, Duration::ZERO);
        service
    }

    pub fn model_path(&self) -> &Path {
        &self.model_path
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    fn loaded(&self) -> Option<Arc<LoadedModel>> {
        self.model
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn install(&self, analyzer: SentimentAnalyzer, load_duration: Duration) {
        let mut slot = self.model.write().unwrap_or_else(PoisonError::into_inner);
        *slot = Some(Arc::new(LoadedModel {
            analyzer,
            load_duration,
        }));
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded().is_some()
    }

    /// Loads the model from `model_path`, replacing any model already loaded.
    ///
    /// On failure the previous state is kept and the error is returned.
    pub fn load(&self) -> Result<(), ClassifierError> {
        let _guard = self.load_lock.lock().unwrap_or_else(PoisonError::into_inner);
        self.load_locked()
    }

    /// Loads the model unless it is already loaded.
    ///
    /// Concurrent callers wait for a single load. On failure the service
    /// stays unloaded and the error goes to this caller only.
    pub fn ensure_loaded(&self) -> Result<(), ClassifierError> {
        if self.is_loaded() {
            return Ok(());
        }
        let _guard = self.load_lock.lock().unwrap_or_else(PoisonError::into_inner);
        if self.is_loaded() {
            return Ok(());
        }
        self.load_locked()
    }

    fn load_locked(&self) -> Result<(), ClassifierError> {
        let start = Instant::now();
        match SentimentAnalyzer::load(&self.model_path, self.threshold) {
            Ok(analyzer) => {
                let load_duration = start.elapsed();
                info!(
                    "Sentiment analyzer initialized in {:.2}s",
                    load_duration.as_secs_f64()
                );
                self.install(analyzer, load_duration);
                Ok(())
            }
            Err(e) => {
                error!("Failed to initialize sentiment analyzer: {}", e);
                Err(e)
            }
        }
    }

    /// Analyzes `text` and tags the result with the attempt number.
    ///
    /// The counter moves before the analyzer runs, so attempts whose inference
    /// degraded to a neutral result are counted too.
    pub fn analyze_sentiment(&self, text: &str) -> Result<Prediction, ClassifierError> {
        let model = self.loaded().ok_or(ClassifierError::ModelNotLoaded)?;
        let prediction_id = self.prediction_count.fetch_add(1, Ordering::SeqCst) + 1;

        let result = model.analyzer.analyze(text).map_err(|e| {
            error!("Sentiment analysis failed: {}", e);
            e
        })?;

        Ok(Prediction {
            result,
            prediction_id,
            service_status: ServiceStatus::Healthy,
        })
    }

    pub fn prediction_count(&self) -> u64 {
        self.prediction_count.load(Ordering::SeqCst)
    }

    pub fn load_duration(&self) -> Option<Duration> {
        self.loaded().map(|m| m.load_duration)
    }

    pub fn health_check(&self) -> HealthReport {
        let model = self.loaded();
        let loaded = model.is_some();
        HealthReport {
            service_name: SERVICE_NAME,
            status: if loaded {
                ServiceStatus::Healthy
            } else {
                ServiceStatus::Unhealthy
            },
            model_loaded: loaded,
            predictions_served: self.prediction_count(),
            uptime_info: UptimeInfo {
                model_load_time_seconds: model.as_ref().map(|m| m.load_duration.as_secs_f64()),
                ready_for_predictions: loaded,
            },
            model_info: model.as_deref().map(Self::describe),
            error: None,
        }
    }

    /// Health report for a service whose load attempt just failed.
    pub fn unhealthy_report(&self, error: &ClassifierError) -> HealthReport {
        HealthReport {
            error: Some(error.to_string()),
            ..self.health_check()
        }
    }

    pub fn get_model_info(&self) -> ModelInfo {
        match self.loaded() {
            Some(model) => Self::describe(&model),
            None => ModelInfo::Unavailable {
                error: "Model not loaded".to_string(),
            },
        }
    }

    fn describe(model: &LoadedModel) -> ModelInfo {
        let analyzer = &model.analyzer;
        let Some(classifier) = analyzer.classifier() else {
            return ModelInfo::Unavailable {
                error: "Model not loaded".to_string(),
            };
        };

        let mut details = ModelDetails {
            model_type: classifier.model_type().to_string(),
            threshold: analyzer.threshold(),
            preprocessing_enabled: true,
            supported_languages: vec!["english"],
            input_format: "text string",
            output_format: OUTPUT_FORMAT,
            pipeline_steps: None,
            classes: None,
            model_details_error: None,
        };

        // Each field is filled on its own; the first failure is the one reported.
        match classifier.pipeline_steps() {
            Ok(steps) => details.pipeline_steps = steps,
            Err(e) => details.model_details_error = Some(e.to_string()),
        }
        match classifier.classes() {
            Ok(classes) => details.classes = classes,
            Err(e) => {
                details.model_details_error.get_or_insert_with(|| e.to_string());
            }
        }

        ModelInfo::Loaded(details)
    }

    pub fn get_statistics(&self) -> Statistics {
        Statistics {
            total_predictions: self.prediction_count(),
            model_loaded: self.is_loaded(),
            load_time_seconds: self.load_duration().map(|d| d.as_secs_f64()),
            average_processing_time: NOT_TRACKED,
            error_rate: NOT_TRACKED,
        }
    }
}
