use crate::error::{Result, VolfetchError};
use crate::utils::fs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_VOLUME_ROOT: &str = "/data";
pub const DEFAULT_CHUNK_SIZE: usize = 1 << 20;
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// One download: where the bytes come from and where they land under the volume root.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct TransferJob {
    pub destination: PathBuf,
    pub source: String,
}

impl TransferJob {
    pub fn new<P: Into<PathBuf>, S: Into<String>>(destination: P, source: S) -> Self {
        Self {
            destination: destination.into(),
            source: source.into(),
        }
    }
}

/// What to do when a job's destination is already published at start.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ExistingPolicy {
    /// Keep the published file and go straight to extraction.
    #[default]
    Skip,
    /// Download the source again and replace the published file.
    Redownload,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct Config {
    pub volume_root: PathBuf,
    pub chunk_size: usize,
    pub connect_timeout_secs: u64,
    pub read_timeout_secs: u64,
    pub user_agent: String,
    pub existing: ExistingPolicy,
    pub jobs: Vec<TransferJob>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            volume_root: PathBuf::from(DEFAULT_VOLUME_ROOT),
            chunk_size: DEFAULT_CHUNK_SIZE,
            connect_timeout_secs: DEFAULT_TIMEOUT_SECS,
            read_timeout_secs: DEFAULT_TIMEOUT_SECS,
            user_agent: format!("volfetch/{}", env!("CARGO_PKG_VERSION")),
            existing: ExistingPolicy::default(),
            jobs: default_jobs(),
        }
    }
}

fn default_jobs() -> Vec<TransferJob> {
    vec![
        TransferJob::new(
            "data/scenes.zip",
            "https://springernature.figshare.com/ndownloader/files/49062316",
        ),
        TransferJob::new(
            "data/meta.zip",
            "https://springernature.figshare.com/ndownloader/files/49061617",
        ),
    ]
}

impl Config {
    /// Loads `explicit` if given, else the user config file when present, else defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let path = match explicit {
            Some(path) => Some(path.to_path_buf()),
            None => get_config_path().filter(|p| p.exists()),
        };

        let config = match path {
            Some(path) => {
                tracing::debug!(path = %path.display(), "loading configuration");
                Self::from_file(&path)?
            }
            None => Config::default(),
        };

        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            VolfetchError::config_error(format!("cannot read {}: {e}", path.display()))
        })?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn validate(&self) -> Result<()> {
        if self.jobs.is_empty() {
            return Err(VolfetchError::config_error("no jobs configured"));
        }
        if self.chunk_size == 0 {
            return Err(VolfetchError::config_error("chunk_size must be positive"));
        }
        for job in &self.jobs {
            if !fs::is_contained_relative(&job.destination) {
                return Err(VolfetchError::config_error(format!(
                    "destination '{}' must be a relative path inside the volume",
                    job.destination.display()
                )));
            }
            if job.source.trim().is_empty() {
                return Err(VolfetchError::config_error(format!(
                    "job '{}' has no source",
                    job.destination.display()
                )));
            }
        }
        Ok(())
    }

    pub fn with_volume_root(mut self, root: PathBuf) -> Self {
        self.volume_root = root;
        self
    }

    pub fn resolve_destination(&self, job: &TransferJob) -> PathBuf {
        self.volume_root.join(&job.destination)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_secs(self.read_timeout_secs)
    }
}

fn get_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("volfetch").join("config.toml"))
}
