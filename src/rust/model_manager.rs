use std::path::{Path, PathBuf};
use std::fs;
use std::io;
use std::sync::Arc;
use std::env;
use tokio::sync::Mutex;
use reqwest;
use sha2::{Sha256, Digest};
use log;

/// File name of the artifact inside the models directory.
pub const ARTIFACT_FILE_NAME: &str = "sentiment_model.json";

#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("Model artifact not found at {0:?}")]
    NotFound(PathBuf),
    #[error("Download error: {0}")]
    DownloadError(#[from] reqwest::Error),
    #[error("Download of {url} failed with status {status}")]
    BadStatus { url: String, status: reqwest::StatusCode },
    #[error("IO error: {0}")]
    IoError(#[from] io::Error),
    #[error("Hash mismatch: expected {expected}, got {actual} for {path:?}")]
    HashMismatch {
        path: PathBuf,
        expected: String,
        actual: String,
    },
}

/// Where to fetch the artifact from when it is not present locally.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactSource {
    pub url: String,
    /// Expected lowercase hex SHA-256 of the artifact, if known
    pub sha256: Option<String>,
}

/// Locates, verifies and (optionally) fetches the classifier artifact.
#[derive(Clone, Debug)]
pub struct ModelManager {
    artifact_path: PathBuf,
    download_lock: Arc<Mutex<()>>,
}

impl ModelManager {
    /// Returns the application root the artifact path is resolved against
    pub fn get_app_root() -> PathBuf {
        Self::app_root_from(env::var_os("AMYGDALA_HOME").map(PathBuf::from))
    }

    /// Returns the default artifact path
    pub fn get_default_artifact_path() -> PathBuf {
        Self::artifact_path_from(
            env::var_os("AMYGDALA_MODEL").map(PathBuf::from),
            env::var_os("AMYGDALA_HOME").map(PathBuf::from),
        )
    }

    fn app_root_from(home: Option<PathBuf>) -> PathBuf {
        // 1. Explicit application root
        if let Some(home) = home {
            return home;
        }

        // 2. Fall back to the working directory, then to a relative path
        env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
    }

    fn artifact_path_from(model: Option<PathBuf>, home: Option<PathBuf>) -> PathBuf {
        match model {
            Some(model) => model,
            None => Self::app_root_from(home).join("models").join(ARTIFACT_FILE_NAME),
        }
    }

    pub fn new<P: AsRef<Path>>(artifact_path: P) -> Self {
        Self {
            artifact_path: artifact_path.as_ref().to_path_buf(),
            download_lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn artifact_path(&self) -> &Path {
        &self.artifact_path
    }

    pub fn is_artifact_present(&self) -> bool {
        let present = self.artifact_path.is_file();
        log::info!("Model artifact {:?} (exists: {})", self.artifact_path, present);
        present
    }

    fn file_hash(path: &Path) -> Result<String, ModelError> {
        let bytes = fs::read(path)?;
        Ok(Self::hash_bytes(&bytes))
    }

    fn hash_bytes(bytes: &[u8]) -> String {
        let mut hasher = Sha256::new();
        hasher.update(bytes);
        format!("{:x}", hasher.finalize())
    }

    /// Checks the artifact against `expected_hash`. A missing file verifies as `false`.
    pub fn verify_artifact(&self, expected_hash: &str) -> Result<bool, ModelError> {
        if !self.artifact_path.exists() {
            log::info!("Artifact {:?} does not exist", self.artifact_path);
            return Ok(false);
        }
        let hash = Self::file_hash(&self.artifact_path)?;
        log::debug!("Calculated hash: {}", hash);
        log::debug!("Expected hash:   {}", expected_hash);
        Ok(hash.eq_ignore_ascii_case(expected_hash))
    }

    /// Downloads the artifact from `source`, verifying it before it is written.
    pub async fn download_artifact(&self, source: &ArtifactSource) -> Result<(), ModelError> {
        let _lock = self.download_lock.lock().await;

        log::info!("Downloading model artifact from {} to {:?}", source.url, self.artifact_path);
        let response = reqwest::get(&source.url).await?;
        if !response.status().is_success() {
            return Err(ModelError::BadStatus {
                url: source.url.clone(),
                status: response.status(),
            });
        }
        let bytes = response.bytes().await?;
        log::info!("Downloaded {} bytes", bytes.len());

        if let Some(expected) = &source.sha256 {
            let hash = Self::hash_bytes(&bytes);
            if !hash.eq_ignore_ascii_case(expected) {
                log::error!("Artifact hash mismatch: expected {}, got {}", expected, hash);
                return Err(ModelError::HashMismatch {
                    path: self.artifact_path.clone(),
                    expected: expected.clone(),
                    actual: hash,
                });
            }
        }

        if let Some(parent) = self.artifact_path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.artifact_path, &bytes)?;
        log::info!("Model artifact written to {:?}", self.artifact_path);
        Ok(())
    }

    pub fn remove_artifact(&self) -> Result<(), ModelError> {
        if self.artifact_path.exists() {
            fs::remove_file(&self.artifact_path)?;
        }
        Ok(())
    }

    /// Makes sure a usable artifact is on disk before the service loads it.
    ///
    /// With no source configured this only checks presence (and the checksum,
    /// if one is given). With a source, a missing or mismatching artifact is
    /// fetched once. Anything still unavailable afterwards is an error.
    pub async fn ensure_artifact(
        &self,
        source: Option<&ArtifactSource>,
        expected_hash: Option<&str>,
        fresh: bool,
    ) -> Result<(), ModelError> {
        let expected_hash = expected_hash.or_else(|| source.and_then(|s| s.sha256.as_deref()));

        if fresh && source.is_some() {
            log::info!("Fresh download requested - removing any existing artifact...");
            self.remove_artifact()?;
        }

        if self.is_artifact_present() {
            let Some(expected) = expected_hash else {
                return Ok(());
            };
            if self.verify_artifact(expected)? {
                log::info!("Artifact verification successful");
                return Ok(());
            }
            log::warn!("Artifact verification failed");
            match source {
                Some(source) => {
                    self.remove_artifact()?;
                    self.download_artifact(source).await?;
                }
                None => {
                    return Err(ModelError::HashMismatch {
                        path: self.artifact_path.clone(),
                        expected: expected.to_string(),
                        actual: Self::file_hash(&self.artifact_path)?,
                    })
                }
            }
        } else {
            match source {
                Some(source) => self.download_artifact(source).await?,
                None => return Err(ModelError::NotFound(self.artifact_path.clone())),
            }
        }

        Ok(())
    }
}
