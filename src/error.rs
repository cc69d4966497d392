use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, VolfetchError>;

#[derive(Error, Debug)]
pub enum VolfetchError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP transport error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Request to {url} failed with status {status}")]
    HttpStatus { url: String, status: u16 },

    #[error("Archive error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("Archive {archive} contains unsafe entry '{entry}'")]
    UnsafeArchiveEntry { archive: PathBuf, entry: String },

    #[error("Unsupported archive format: {path}")]
    UnsupportedArchive { path: PathBuf },

    #[error("Permission denied: {path}")]
    PermissionDenied { path: PathBuf },

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid configuration file: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("Job for {destination} failed: {source}")]
    JobFailed {
        destination: PathBuf,
        #[source]
        source: Box<VolfetchError>,
    },
}

impl VolfetchError {
    pub fn config_error<S: Into<String>>(message: S) -> Self {
        VolfetchError::ConfigError {
            message: message.into(),
        }
    }

    pub fn job_failed(destination: PathBuf, source: VolfetchError) -> Self {
        VolfetchError::JobFailed {
            destination,
            source: Box::new(source),
        }
    }
}
