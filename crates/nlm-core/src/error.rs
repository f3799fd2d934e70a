use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Failed to access credential file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to serialize credentials: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Could not determine home directory")]
    NoHomeDir,
}

pub type Result<T> = std::result::Result<T, Error>;
