use std::net::SocketAddr;
use std::path::PathBuf;

use crate::analyzer::DEFAULT_THRESHOLD;
use crate::model_manager::{ArtifactSource, ModelManager};

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 3002;
pub const DEFAULT_CORS_ORIGIN: &str = "http://localhost:3000";

/// Settings for the sentiment service and its HTTP boundary.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub host: String,
    pub port: u16,
    /// Location of the pre-fit classifier artifact
    pub model_path: PathBuf,
    /// Score at or below which `threshold_met` is set
    pub threshold: f64,
    /// Origin allowed to call the API from a browser
    pub cors_origin: String,
    /// Optional remote copy of the artifact, fetched once when missing
    pub artifact_source: Option<ArtifactSource>,
    /// Optional checksum the local artifact must match
    pub artifact_sha256: Option<String>,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            model_path: ModelManager::get_default_artifact_path(),
            threshold: DEFAULT_THRESHOLD,
            cors_origin: DEFAULT_CORS_ORIGIN.to_string(),
            artifact_source: None,
            artifact_sha256: None,
        }
    }
}

impl ServiceConfig {
    /// Default settings with the artifact at `model_path`.
    pub fn with_model_path(model_path: impl Into<PathBuf>) -> Self {
        Self {
            model_path: model_path.into(),
            ..Self::default()
        }
    }

    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    /// Socket address to bind, or an error naming the bad host.
    pub fn bind_address(&self) -> anyhow::Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| anyhow::anyhow!("Invalid bind address {}:{}: {}", self.host, self.port, e))
    }
}
