use std::sync::Arc;

use axum::extract::State;
use axum::response::{IntoResponse, Response};
use axum::Json;
use log::{error, warn};
use serde_json::json;
use tokio::task::JoinError;

use super::dto::{SentimentRequest, SentimentResponse};
use super::error::ApiError;
use crate::classifier::ClassifierError;
use crate::service::{AnalysisService, ModelInfo, Statistics, SERVICE_NAME};

/// Runs `f` against the service on the blocking pool.
///
/// Loading the artifact reads from disk and inference is CPU-bound, so neither
/// runs on the async workers.
async fn run_blocking<T, F>(service: Arc<AnalysisService>, f: F) -> Result<T, JoinError>
where
    F: FnOnce(&AnalysisService) -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(move || f(&service)).await
}

pub async fn analyze_sentiment(
    State(service): State<Arc<AnalysisService>>,
    Json(request): Json<SentimentRequest>,
) -> Result<Json<SentimentResponse>, ApiError> {
    if request.text.trim().is_empty() {
        warn!("Rejected analysis request: {}", ClassifierError::EmptyInput);
        return Err(ApiError::BadRequest("Text cannot be empty"));
    }

    let outcome = run_blocking(service, move |service| -> Result<_, ClassifierError> {
        service.ensure_loaded()?;
        service.analyze_sentiment(&request.text)
    })
    .await;

    match outcome {
        Ok(Ok(prediction)) => Ok(Json(prediction.into())),
        Ok(Err(e)) => {
            error!("Sentiment analysis error: {}", e);
            Err(ApiError::Internal("Sentiment analysis failed"))
        }
        Err(e) => {
            error!("Sentiment analysis task failed: {}", e);
            Err(ApiError::Internal("Sentiment analysis failed"))
        }
    }
}

pub async fn health_check(State(service): State<Arc<AnalysisService>>) -> Response {
    let report = run_blocking(service, |service| match service.ensure_loaded() {
        Ok(()) => service.health_check(),
        Err(e) => service.unhealthy_report(&e),
    })
    .await;

    match report {
        Ok(report) => Json(report).into_response(),
        Err(e) => {
            error!("Health check failed: {}", e);
            Json(json!({
                "service_name": SERVICE_NAME,
                "status": "unhealthy",
                "error": e.to_string(),
            }))
            .into_response()
        }
    }
}

pub async fn get_model_info(
    State(service): State<Arc<AnalysisService>>,
) -> Result<Json<ModelInfo>, ApiError> {
    let info = run_blocking(service, |service| {
        service.ensure_loaded().map(|()| service.get_model_info())
    })
    .await;

    match info {
        Ok(Ok(info)) => Ok(Json(info)),
        Ok(Err(e)) => {
            error!("Model info retrieval failed: {}", e);
            Err(ApiError::Internal("Could not retrieve model information"))
        }
        Err(e) => {
            error!("Model info retrieval failed: {}", e);
            Err(ApiError::Internal("Could not retrieve model information"))
        }
    }
}

pub async fn get_statistics(
    State(service): State<Arc<AnalysisService>>,
) -> Result<Json<Statistics>, ApiError> {
    let stats = run_blocking(service, |service| {
        service.ensure_loaded().map(|()| service.get_statistics())
    })
    .await;

    match stats {
        Ok(Ok(stats)) => Ok(Json(stats)),
        Ok(Err(e)) => {
            error!("Statistics retrieval failed: {}", e);
            Err(ApiError::Internal("Could not retrieve service statistics"))
        }
        Err(e) => {
            error!("Statistics retrieval failed: {}", e);
            Err(ApiError::Internal("Could not retrieve service statistics"))
        }
    }
}
