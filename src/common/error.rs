//! Error types for hellopi

use std::path::{Path, PathBuf};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    // === I/O Errors ===
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // === Validation Errors ===
    #[error("Text cannot be empty")]
    EmptyText,

    #[error("Text too long (max {max} characters)")]
    TextTooLong { max: usize },

    // === Storage Errors ===
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Corrupted data: {0}")]
    Corrupted(String),

    // === Network Errors ===
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    // === Reporter Errors ===
    #[error("{file} not found in {searched:?}")]
    AddressFileMissing { file: String, searched: Vec<PathBuf> },

    #[error("Could not read {path}: {reason}")]
    AddressFileUnreadable { path: PathBuf, reason: String },

    #[error("Failed to mount {mount_point}: {reason}")]
    MountFailed { mount_point: PathBuf, reason: String },

    #[error("Permission denied opening log file {0}")]
    LogPermission(PathBuf),

    #[error("Failed to set up logging: {0}")]
    Logging(String),

    // === Config Errors ===
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // === Generic ===
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Can the caller fix this by changing the request?
    pub fn is_validation(&self) -> bool {
        matches!(self, Error::EmptyText | Error::TextTooLong { .. })
    }

    /// Convert to HTTP status code
    pub fn to_http_status(&self) -> axum::http::StatusCode {
        use axum::http::StatusCode;
        match self {
            Error::EmptyText | Error::TextTooLong { .. } => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message safe to show to an HTTP caller. Internal detail stays in the logs.
    pub fn public_message(&self) -> String {
        if self.is_validation() {
            self.to_string()
        } else {
            "Internal server error".to_string()
        }
    }

    /// Failure to open the reporter's log file
    pub fn log_file(path: &Path, err: std::io::Error) -> Self {
        if err.kind() == std::io::ErrorKind::PermissionDenied {
            Error::LogPermission(path.to_path_buf())
        } else {
            Error::Logging(format!("{}: {}", path.display(), err))
        }
    }

    /// Process exit code for a fatal reporter error
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::MountFailed { .. } => 10,
            Error::LogPermission(_) => 11,
            Error::Logging(_) => 12,
            Error::AddressFileUnreadable { .. } => 20,
            Error::AddressFileMissing { .. } => 21,
            _ => 99,
        }
    }
}

impl From<config::ConfigError> for Error {
    fn from(e: config::ConfigError) -> Self {
        Error::InvalidConfig(e.to_string())
    }
}
