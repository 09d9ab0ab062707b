use std::fs;

use amygdala::{ArtifactSource, ModelError, ModelManager, SentimentAnalyzer, DEFAULT_THRESHOLD};
use axum::http::StatusCode;
use axum::routing::get;
use axum::Router;
use sha2::{Digest, Sha256};
use tokio::net::TcpListener;

const FIXTURE: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/sentiment_model.json");

fn sha256_hex(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}

/// Serves the fixture at `/sentiment_model.json`; everything else is 404.
async fn spawn_artifact_host() -> String {
    let body = fs::read_to_string(FIXTURE).expect("fixture readable");
    let router = Router::new()
        .route("/sentiment_model.json", get(move || async move { body }))
        .fallback(|| async { StatusCode::NOT_FOUND });
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("server runs");
    });
    format!("http://{}", addr)
}

#[tokio::test]
async fn test_artifact_download() -> Result<(), Box<dyn std::error::Error>> {
    let host = spawn_artifact_host().await;
    let dir = tempfile::tempdir()?;
    let manager = ModelManager::new(dir.path().join("models").join("sentiment_model.json"));
    let source = ArtifactSource {
        url: format!("{}/sentiment_model.json", host),
        sha256: Some(sha256_hex(&fs::read(FIXTURE)?)),
    };

    assert!(!manager.is_artifact_present());
    manager.ensure_artifact(Some(&source), None, false).await?;
    assert!(manager.is_artifact_present());
    assert!(manager.verify_artifact(source.sha256.as_deref().unwrap())?);

    // The downloaded file is a loadable artifact.
    let analyzer = SentimentAnalyzer::load(manager.artifact_path(), DEFAULT_THRESHOLD)?;
    assert!(analyzer.analyze("wonderful")?.score > 0.5);
    Ok(())
}

#[tokio::test]
async fn test_download_hash_mismatch_writes_nothing() -> Result<(), Box<dyn std::error::Error>> {
    let host = spawn_artifact_host().await;
    let dir = tempfile::tempdir()?;
    let manager = ModelManager::new(dir.path().join("sentiment_model.json"));
    let source = ArtifactSource {
        url: format!("{}/sentiment_model.json", host),
        sha256: Some("0".repeat(64)),
    };

    let err = manager.download_artifact(&source).await.unwrap_err();
    assert!(matches!(err, ModelError::HashMismatch { .. }));
    assert!(!manager.is_artifact_present());
    Ok(())
}

#[tokio::test]
async fn test_download_bad_status() -> Result<(), Box<dyn std::error::Error>> {
    let host = spawn_artifact_host().await;
    let dir = tempfile::tempdir()?;
    let manager = ModelManager::new(dir.path().join("sentiment_model.json"));
    let source = ArtifactSource {
        url: format!("{}/missing.json", host),
        sha256: None,
    };

    match manager.download_artifact(&source).await {
        Err(ModelError::BadStatus { status, .. }) => assert_eq!(status.as_u16(), 404),
        other => panic!("unexpected result: {:?}", other),
    }
    Ok(())
}

#[tokio::test]
async fn test_fresh_replaces_a_stale_artifact() -> Result<(), Box<dyn std::error::Error>> {
    let host = spawn_artifact_host().await;
    let dir = tempfile::tempdir()?;
    let manager = ModelManager::new(dir.path().join("sentiment_model.json"));
    fs::write(manager.artifact_path(), "stale")?;

    let source = ArtifactSource {
        url: format!("{}/sentiment_model.json", host),
        sha256: None,
    };
    manager.ensure_artifact(Some(&source), None, true).await?;
    assert_eq!(fs::read(manager.artifact_path())?, fs::read(FIXTURE)?);
    Ok(())
}

#[test]
fn test_local_artifact_without_source() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("sentiment_model.json");
    fs::copy(FIXTURE, &path)?;
    let manager = ModelManager::new(&path);
    let hash = sha256_hex(&fs::read(FIXTURE)?);

    tokio_test::block_on(manager.ensure_artifact(None, Some(&hash), false))?;

    let result = tokio_test::block_on(manager.ensure_artifact(None, Some(&"f".repeat(64)), false));
    assert!(matches!(result, Err(ModelError::HashMismatch { .. })));
    Ok(())
}
