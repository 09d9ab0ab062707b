use serde::{Deserialize, Serialize};

use crate::classifier::SentimentLabel;
use crate::service::{Prediction, ServiceStatus};

/// Body of `POST /api/analyze`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SentimentRequest {
    pub text: String,
    /// Accepted for compatibility with existing clients; not used.
    #[serde(default)]
    pub mood: Option<i64>,
}

/// Successful response of `POST /api/analyze`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentimentResponse {
    pub score: f64,
    pub threshold_met: bool,
    pub label: SentimentLabel,
    pub confidence: f64,
    pub prediction_id: u64,
    pub service_status: String,
}

impl From<Prediction> for SentimentResponse {
    fn from(prediction: Prediction) -> Self {
        let status = match prediction.service_status {
            ServiceStatus::Healthy => "healthy",
            ServiceStatus::Unhealthy => "unhealthy",
        };
        Self {
            score: prediction.result.score,
            threshold_met: prediction.result.threshold_met,
            label: prediction.result.label,
            confidence: prediction.result.confidence,
            prediction_id: prediction.prediction_id,
            service_status: status.to_string(),
        }
    }
}

/// Error body, shaped like `{"detail": "..."}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub detail: String,
}
