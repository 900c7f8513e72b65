use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf, time::Duration};

use crate::loader::ModelSource;

pub const DEFAULT_DOWNLOAD_TIMEOUT_SECS: u64 = 60;

/// Where the model artifact lives and how to fetch it.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct ModelConfig {
    /// Local artifact path. Defaults to `<cache dir>/model.json`.
    pub path: Option<PathBuf>,

    /// Download URL used when the local artifact is absent.
    pub url: Option<String>,

    /// Optional lowercase hex SHA-256 of the artifact.
    pub sha256: Option<String>,

    pub download_timeout_secs: Option<u64>,
}

/// Top-level configuration stored on disk.
///
/// Example TOML:
/// [model]
/// path = "/srv/pm25/model.json"
/// url = "https://example.org/model.json"
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub model: ModelConfig,
}

impl Config {
    /// Load config from disk, or return an empty default if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        let path = Self::config_file_path()?;
        if !path.exists() {
            // First run: no config file, return empty.
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::from_toml(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_file_path()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(&path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    fn project_dirs() -> Result<ProjectDirs> {
        ProjectDirs::from("dev", "pm25-predictor", "pm25-cli")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        Ok(Self::project_dirs()?.config_dir().join("config.toml"))
    }

    /// Where a downloaded model is cached when no explicit path is configured.
    pub fn default_model_path() -> Result<PathBuf> {
        Ok(Self::project_dirs()?.cache_dir().join("model.json"))
    }

    pub fn download_timeout(&self) -> Duration {
        Duration::from_secs(
            self.model.download_timeout_secs.unwrap_or(DEFAULT_DOWNLOAD_TIMEOUT_SECS),
        )
    }

    /// Resolve the configured model location into a loader source.
    pub fn model_source(&self) -> Result<ModelSource> {
        let path = match &self.model.path {
            Some(path) => path.clone(),
            None => Self::default_model_path()?,
        };

        let sha256 = self.model.sha256.as_deref().map(normalize_checksum).transpose()?;

        Ok(ModelSource {
            path,
            url: self.model.url.clone(),
            sha256,
            download_timeout: self.download_timeout(),
        })
    }
}

fn normalize_checksum(raw: &str) -> Result<String> {
    let hex = raw.trim().to_lowercase();
    if hex.len() != 64 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(anyhow!(
            "Invalid sha256 '{raw}': expected 64 hexadecimal characters.\n\
             Hint: run `pm25 configure` to fix it."
        ));
    }
    Ok(hex)
}
