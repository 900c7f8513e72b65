//! Lazily loads the model artifact once per process.

use reqwest::Client;
use sha2::{Digest, Sha256};
use std::{
    fs,
    io::Write,
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};
use tempfile::NamedTempFile;
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

use crate::{
    error::{Error, Result},
    predictor::{ModelArtifact, ModelBundle},
};

#[derive(Debug, Clone, PartialEq)]
pub struct ModelSource {
    pub path: PathBuf,
    pub url: Option<String>,
    /// Lowercase hex SHA-256 the artifact bytes must match.
    pub sha256: Option<String>,
    pub download_timeout: Duration,
}

impl ModelSource {
    pub fn local(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            url: None,
            sha256: None,
            download_timeout: Duration::from_secs(crate::config::DEFAULT_DOWNLOAD_TIMEOUT_SECS),
        }
    }
}

/// Memoized handle to the one model this process serves.
///
/// Concurrent first calls to [`ModelLoader::get`] perform a single load. A
/// failed load is not cached.
#[derive(Debug)]
pub struct ModelLoader {
    source: ModelSource,
    http: Client,
    cell: OnceCell<Arc<ModelBundle>>,
}

impl ModelLoader {
    pub fn new(source: ModelSource) -> Result<Self> {
        let http = Client::builder().timeout(source.download_timeout).build().map_err(|e| {
            Error::Download {
                url: source.url.clone().unwrap_or_default(),
                reason: format!("could not build HTTP client: {e}"),
            }
        })?;

        Ok(Self { source, http, cell: OnceCell::new() })
    }

    /// True when the artifact is absent locally and will be fetched on first use.
    pub fn needs_download(&self) -> bool {
        self.source.url.is_some() && !self.source.path.exists()
    }

    pub async fn get(&self) -> Result<Arc<ModelBundle>> {
        self.cell.get_or_try_init(|| self.load()).await.cloned()
    }

    async fn load(&self) -> Result<Arc<ModelBundle>> {
        let path = &self.source.path;

        let cached = if path.exists() {
            debug!(path = %path.display(), "reading cached model artifact");
            match (self.read_cached(path), &self.source.url) {
                (Ok(bundle), _) => Some(bundle),
                (Err(e), Some(url)) => {
                    warn!(
                        path = %path.display(),
                        url = url.as_str(),
                        error = %e,
                        "cached model unusable, fetching again"
                    );
                    None
                }
                (Err(e), None) => return Err(e),
            }
        } else {
            None
        };

        let bundle = match (cached, &self.source.url) {
            (Some(bundle), _) => bundle,
            (None, Some(url)) => {
                let bytes = self.download(url).await?;
                self.verify(&bytes)?;
                // Parse before writing so a bad download never becomes the cached copy.
                let bundle = parse(path, &bytes)?;
                write_atomically(path, &bytes)?;
                info!(path = %path.display(), bytes = bytes.len(), "cached downloaded model");
                bundle
            }
            (None, None) => return Err(Error::ModelMissing { path: path.clone() }),
        };

        info!(
            path = %path.display(),
            features = bundle.features_used().len(),
            "model loaded"
        );
        Ok(Arc::new(bundle))
    }

    fn read_cached(&self, path: &Path) -> Result<ModelBundle> {
        let bytes = fs::read(path)
            .map_err(|source| Error::ModelIo { path: path.to_path_buf(), source })?;
        self.verify(&bytes)?;
        parse(path, &bytes)
    }

    async fn download(&self, url: &str) -> Result<Vec<u8>> {
        info!(url, "downloading model");

        let fail = |reason: String| Error::Download { url: url.to_string(), reason };

        let res = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| fail(format!("request failed: {e}")))?;

        let status = res.status();
        let body = res.bytes().await.map_err(|e| fail(format!("failed to read body: {e}")))?;

        if !status.is_success() {
            warn!(url, %status, "model download rejected");
            return Err(fail(format!(
                "server answered {status}: {}",
                truncate_body(&String::from_utf8_lossy(&body))
            )));
        }

        Ok(body.to_vec())
    }

    fn verify(&self, bytes: &[u8]) -> Result<()> {
        let Some(expected) = &self.source.sha256 else {
            return Ok(());
        };
        let actual = sha256_hex(bytes);
        if &actual != expected {
            return Err(Error::Checksum { expected: expected.clone(), actual });
        }
        Ok(())
    }
}

pub fn sha256_hex(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}

fn parse(path: &Path, bytes: &[u8]) -> Result<ModelBundle> {
    let artifact: ModelArtifact = serde_json::from_slice(bytes)
        .map_err(|source| Error::ModelCorrupt { path: path.to_path_buf(), source })?;
    Ok(artifact.into())
}

/// Write to a sibling temp file, then rename over `path`.
fn write_atomically(path: &Path, bytes: &[u8]) -> Result<()> {
    let io_err = |source: std::io::Error| Error::ModelIo { path: path.to_path_buf(), source };

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir).map_err(io_err)?;

    let mut tmp = NamedTempFile::new_in(dir).map_err(io_err)?;
    tmp.write_all(bytes).map_err(io_err)?;
    tmp.persist(path).map_err(|e| io_err(e.error))?;
    Ok(())
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}
