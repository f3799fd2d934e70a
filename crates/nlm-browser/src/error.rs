use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Unsupported platform: {0}")]
    UnsupportedPlatform(String),

    #[error("Chrome profile directory not found: {0}")]
    ProfileNotFound(PathBuf),

    #[error("Failed to copy profile data ({file}): {source}")]
    ProfileCopyFailed {
        file: String,
        source: std::io::Error,
    },

    #[error("Browser error: {0}")]
    Browser(String),

    #[error("Page navigation failed: {0}")]
    NavigationFailed(String),

    #[error("Script evaluation failed: {0}")]
    EvaluationFailed(String),

    #[error("Browser session timed out")]
    SessionTimeout,

    #[error("Authentication data not found before the deadline (current URL: {url})")]
    AuthNotFound { url: String },

    #[error("Failed to extract a complete token and cookie pair")]
    ExtractionFailed,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
