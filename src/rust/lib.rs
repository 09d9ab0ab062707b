//! A small HTTP service around a pre-fit text sentiment classifier.
//!
//! Text goes through a frozen normalizer and a fitted TF-IDF pipeline. The
//! pipeline's class probabilities become a signed score, a label, a
//! confidence, and a "threshold met" flag for the journal's alerting feature.
//!
//! # Basic Usage
//!
//! ```rust,no_run
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use amygdala::{SentimentAnalyzer, DEFAULT_THRESHOLD};
//!
//! let analyzer = SentimentAnalyzer::load("models/sentiment_model.json", DEFAULT_THRESHOLD)?;
//! let result = analyzer.analyze("I couldn't sleep and everything feels heavy")?;
//! println!("{} (score {:.2}, alert: {})", result.label, result.score, result.threshold_met);
//! # Ok(())
//! # }
//! ```
//!
//! # Sharing the service
//!
//! One [`AnalysisService`] is built at startup and shared with `Arc`:
//!
//! ```rust,no_run
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use amygdala::{AnalysisService, ServiceConfig};
//! use std::sync::Arc;
//! use std::thread;
//!
//! let service = Arc::new(AnalysisService::new(&ServiceConfig::default()));
//! service.ensure_loaded()?;
//!
//! let mut handles = vec![];
//! for _ in 0..3 {
//!     let service = Arc::clone(&service);
//!     handles.push(thread::spawn(move || {
//!         service.analyze_sentiment("a quiet, happy morning").unwrap();
//!     }));
//! }
//!
//! for handle in handles {
//!     handle.join().unwrap();
//! }
//! assert_eq!(service.prediction_count(), 3);
//! # Ok(())
//! # }
//! ```

pub mod analyzer;
pub mod classifier;
pub mod config;
pub mod model_manager;
pub mod preprocessing;
pub mod server;
pub mod service;

pub use analyzer::{AnalysisResult, SentimentAnalyzer, DEFAULT_THRESHOLD, MAX_TEXT_CHARS};
pub use classifier::{ClassifierError, ClassifierHandle, PipelineStep, SentimentLabel, TextClassifier, TextPipeline};
pub use config::ServiceConfig;
pub use model_manager::{ArtifactSource, ModelError, ModelManager};
pub use service::{AnalysisService, HealthReport, ModelInfo, Prediction, ServiceStatus, Statistics};

pub fn init_logger() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
}
