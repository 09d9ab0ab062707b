use std::net::SocketAddr;
use std::sync::Arc;

use amygdala::server::{create_router, ErrorBody, SentimentResponse};
use amygdala::{AnalysisService, SentimentLabel, ServiceConfig};
use env_logger::{Builder, Env};
use reqwest::StatusCode;
use serde_json::{json, Value};
use tokio::net::TcpListener;

const FIXTURE: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/sentiment_model.json");
const ORIGIN: &str = "http://localhost:3000";

fn init() {
    let _ = Builder::from_env(Env::default().default_filter_or("warn")).try_init();
}

/// Serves the API for `model_path` on an ephemeral port and returns its base URL.
async fn spawn_server(model_path: &str) -> String {
    init();
    let service = Arc::new(AnalysisService::new(&ServiceConfig::with_model_path(model_path)));
    let router = create_router(service, ORIGIN).expect("router builds");
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr: SocketAddr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("server runs");
    });
    format!("http://{}/api", addr)
}

#[tokio::test]
async fn test_analyze_negative_text() -> Result<(), Box<dyn std::error::Error>> {
    let base = spawn_server(FIXTURE).await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{}/analyze", base))
        .json(&json!({"text": "Everything is awful and I feel so anxious", "mood": 2}))
        .send()
        .await?;
    assert_eq!(response.status(), StatusCode::OK);

    let body: SentimentResponse = response.json().await?;
    assert_eq!(body.label, SentimentLabel::Negative);
    assert!(body.score < -0.5);
    assert!(body.threshold_met);
    assert_eq!(body.prediction_id, 1);
    assert_eq!(body.service_status, "healthy");
    Ok(())
}

#[tokio::test]
async fn test_response_fields_are_snake_case() -> Result<(), Box<dyn std::error::Error>> {
    let base = spawn_server(FIXTURE).await;
    let body: Value = reqwest::Client::new()
        .post(format!("{}/analyze", base))
        .json(&json!({"text": "love and calm"}))
        .send()
        .await?
        .json()
        .await?;

    let mut keys: Vec<_> = body.as_object().unwrap().keys().cloned().collect();
    keys.sort();
    assert_eq!(
        keys,
        ["confidence", "label", "prediction_id", "score", "service_status", "threshold_met"]
    );
    assert_eq!(body["label"], "positive");
    Ok(())
}

#[tokio::test]
async fn test_empty_text_is_rejected() -> Result<(), Box<dyn std::error::Error>> {
    let base = spawn_server(FIXTURE).await;
    let client = reqwest::Client::new();

    for text in ["", "   \n"] {
        let response = client
            .post(format!("{}/analyze", base))
            .json(&json!({ "text": text }))
            .send()
            .await?;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body: ErrorBody = response.json().await?;
        assert_eq!(body.detail, "Text cannot be empty");
    }

    // Rejected requests never reach the counter.
    let stats: Value = client.get(format!("{}/statistics", base)).send().await?.json().await?;
    assert_eq!(stats["total_predictions"], 0);
    Ok(())
}

#[tokio::test]
async fn test_malformed_body_is_a_client_error() -> Result<(), Box<dyn std::error::Error>> {
    let base = spawn_server(FIXTURE).await;
    let response = reqwest::Client::new()
        .post(format!("{}/analyze", base))
        .json(&json!({"mood": 3}))
        .send()
        .await?;
    assert!(response.status().is_client_error());
    Ok(())
}

#[tokio::test]
async fn test_health_and_statistics_track_predictions() -> Result<(), Box<dyn std::error::Error>> {
    let base = spawn_server(FIXTURE).await;
    let client = reqwest::Client::new();

    for text in ["happy", "sad", "great"] {
        let response = client
            .post(format!("{}/analyze", base))
            .json(&json!({ "text": text }))
            .send()
            .await?;
        assert_eq!(response.status(), StatusCode::OK);
    }

    let health: Value = client.get(format!("{}/health", base)).send().await?.json().await?;
    assert_eq!(health["service_name"], "sentiment-analysis");
    assert_eq!(health["status"], "healthy");
    assert_eq!(health["model_loaded"], true);
    assert_eq!(health["predictions_served"], 3);
    assert_eq!(health["model_info"]["model_type"], "Pipeline");

    let stats: Value = client.get(format!("{}/statistics", base)).send().await?.json().await?;
    assert_eq!(stats["total_predictions"], 3);
    assert_eq!(stats["model_loaded"], true);
    assert_eq!(stats["average_processing_time"], "Not tracked yet");
    assert_eq!(stats["error_rate"], "Not tracked yet");
    Ok(())
}

#[tokio::test]
async fn test_model_info() -> Result<(), Box<dyn std::error::Error>> {
    let base = spawn_server(FIXTURE).await;
    let response = reqwest::get(format!("{}/model-info", base)).await?;
    assert_eq!(response.status(), StatusCode::OK);

    let info: Value = response.json().await?;
    assert_eq!(info["threshold"], -0.5);
    assert_eq!(info["classes"], json!(["negative", "positive"]));
    assert_eq!(info["pipeline_steps"][1], json!({"step": "tfidf", "type": "TfidfVectorizer"}));
    assert_eq!(info["output_format"]["score"], "float (-1 to 1)");
    Ok(())
}

#[tokio::test]
async fn test_missing_model() -> Result<(), Box<dyn std::error::Error>> {
    let base = spawn_server("/nonexistent/amygdala/sentiment_model.json").await;
    let client = reqwest::Client::new();

    let response = client.get(format!("{}/health", base)).send().await?;
    assert_eq!(response.status(), StatusCode::OK);
    let health: Value = response.json().await?;
    assert_eq!(health["status"], "unhealthy");
    assert_eq!(health["model_loaded"], false);
    assert!(health["error"].is_string());

    let response = client
        .post(format!("{}/analyze", base))
        .json(&json!({"text": "hello there"}))
        .send()
        .await?;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: ErrorBody = response.json().await?;
    assert_eq!(body.detail, "Sentiment analysis failed");

    let response = client.get(format!("{}/model-info", base)).send().await?;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: ErrorBody = response.json().await?;
    assert_eq!(body.detail, "Could not retrieve model information");

    let response = client.get(format!("{}/statistics", base)).send().await?;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: ErrorBody = response.json().await?;
    assert_eq!(body.detail, "Could not retrieve service statistics");
    Ok(())
}

#[tokio::test]
async fn test_cors_allows_the_frontend_origin() -> Result<(), Box<dyn std::error::Error>> {
    let base = spawn_server(FIXTURE).await;
    let client = reqwest::Client::new();

    let preflight = client
        .request(reqwest::Method::OPTIONS, format!("{}/analyze", base))
        .header("Origin", ORIGIN)
        .header("Access-Control-Request-Method", "POST")
        .header("Access-Control-Request-Headers", "content-type")
        .send()
        .await?;
    assert!(preflight.status().is_success());
    let headers = preflight.headers();
    assert_eq!(headers["access-control-allow-origin"], ORIGIN);
    assert_eq!(headers["access-control-allow-credentials"], "true");
    assert_eq!(headers["access-control-allow-methods"], "POST");

    let response = client
        .get(format!("{}/health", base))
        .header("Origin", "http://evil.example")
        .send()
        .await?;
    assert!(response.headers().get("access-control-allow-origin").is_none());
    Ok(())
}
