use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum FinderError {
    #[error("storage unavailable at {bucket}/{object}: {message}")]
    StorageUnavailable {
        bucket: String,
        object: String,
        message: String,
    },

    #[error("manifest request failed: {0}")]
    ManifestHttp(String),

    #[error("manifest endpoint returned status {status}: {message}")]
    ManifestStatus { status: u16, message: String },

    #[error("failed to parse manifest: {0}")]
    ManifestParse(String),

    #[error("missing config file meta-finder.json and no object source given")]
    MissingConfig,

    #[error("failed to read config file at {0}")]
    ConfigRead(PathBuf),

    #[error("failed to parse JSON config: {0}")]
    ConfigParse(String),

    #[error("filesystem error: {0}")]
    Filesystem(String),

    #[error("invalid bucket name: {0}")]
    InvalidBucketName(String),

    #[error("invalid file path: {0}")]
    InvalidFilePath(String),

    #[error("invalid catalog key (expected key=value): {0}")]
    InvalidCatalogKey(String),

    #[error("invalid similarity threshold {0} (expected a value in (0, 1])")]
    InvalidThreshold(f64),

    #[error("invalid base url: {0}")]
    InvalidBaseUrl(String),
}

impl FinderError {
    pub fn storage(bucket: &str, object: &str, message: impl Into<String>) -> Self {
        FinderError::StorageUnavailable {
            bucket: bucket.to_string(),
            object: object.to_string(),
            message: message.into(),
        }
    }
}
