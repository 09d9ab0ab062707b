use std::path::PathBuf;
use std::sync::Arc;

use amygdala::{server, AnalysisService, ArtifactSource, ModelManager, ServiceConfig};
use clap::Parser;
use log::{error, info, warn};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Address to bind
    #[arg(long, default_value = amygdala::config::DEFAULT_HOST)]
    host: String,

    /// Port to listen on
    #[arg(short, long, default_value_t = amygdala::config::DEFAULT_PORT)]
    port: u16,

    /// Path to the classifier artifact [default: $AMYGDALA_MODEL or <app root>/models/sentiment_model.json]
    #[arg(short, long)]
    model: Option<PathBuf>,

    /// Score at or below which threshold_met is set
    #[arg(long, default_value_t = amygdala::DEFAULT_THRESHOLD, allow_hyphen_values = true)]
    threshold: f64,

    /// Browser origin allowed to call the API
    #[arg(long, default_value = amygdala::config::DEFAULT_CORS_ORIGIN)]
    cors_origin: String,

    /// Fetch the artifact from this URL when it is missing
    #[arg(long)]
    artifact_url: Option<String>,

    /// Expected SHA-256 of the artifact
    #[arg(long)]
    artifact_sha256: Option<String>,

    /// Force a fresh download of the artifact (requires --artifact-url)
    #[arg(short, long)]
    fresh: bool,
}

impl Args {
    fn into_config(self) -> ServiceConfig {
        let defaults = ServiceConfig::default();
        ServiceConfig {
            host: self.host,
            port: self.port,
            model_path: self.model.unwrap_or(defaults.model_path),
            threshold: self.threshold,
            cors_origin: self.cors_origin,
            artifact_source: self.artifact_url.map(|url| ArtifactSource {
                url,
                sha256: self.artifact_sha256.clone(),
            }),
            artifact_sha256: self.artifact_sha256,
        }
    }
}

async fn prepare_artifact(config: &ServiceConfig, fresh: bool) -> anyhow::Result<()> {
    if config.artifact_source.is_none() && config.artifact_sha256.is_none() {
        return Ok(());
    }
    let manager = ModelManager::new(&config.model_path);
    manager
        .ensure_artifact(
            config.artifact_source.as_ref(),
            config.artifact_sha256.as_deref(),
            fresh,
        )
        .await?;
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    amygdala::init_logger();
    let args = Args::parse();
    let fresh = args.fresh;
    let config = args.into_config();

    info!("Starting ML Sentiment Service...");
    info!("=== Wellness Journal Sentiment Analysis v{} ===", env!("CARGO_PKG_VERSION"));
    info!("Model artifact: {:?}", config.model_path);

    // Fetch or verify once; an unavailable artifact here is fatal.
    prepare_artifact(&config, fresh).await?;

    let service = Arc::new(AnalysisService::new(&config));
    let loader = Arc::clone(&service);
    match tokio::task::spawn_blocking(move || loader.ensure_loaded()).await? {
        Ok(()) => info!("Sentiment service ready (threshold {})", config.threshold),
        Err(e) => {
            error!("Sentiment model unavailable at startup: {}", e);
            warn!("Serving in unhealthy state; loading is retried on each request");
        }
    }

    server::serve(service, &config).await
}
