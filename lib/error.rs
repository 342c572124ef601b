//! The crate-wide error type.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Binary parsing error: {0}")]
    Goblin(#[from] goblin::error::Error),
    #[error("An I/O error occured: {0}")]
    Io(#[from] std::io::Error),
    #[error("Json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Could not build the worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
    #[error("Unsupported architecture: {0}")]
    UnsupportedArchitecture(String),
    #[error("Malformed subroutine boundary: {0}")]
    MalformedBoundary(String),
    #[error("Malformed operation {mnemonic} at 0x{address:x}: {reason}")]
    MalformedOperation {
        address: u64,
        mnemonic: String,
        reason: String,
    },
    #[error("Unsupported operation {mnemonic} at 0x{address:x}")]
    UnsupportedOperation { address: u64, mnemonic: String },
    #[error("Extraction was cancelled")]
    Cancelled,
    #[error("{0}")]
    Custom(String),
}

impl From<&str> for Error {
    fn from(s: &str) -> Error {
        Error::Custom(s.to_string())
    }
}

impl From<String> for Error {
    fn from(s: String) -> Error {
        Error::Custom(s)
    }
}
