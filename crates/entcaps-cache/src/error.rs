use std::path::PathBuf;

use entcaps_core::CapsError;
use thiserror::Error;

/// Failures of the persistent tier. The cache itself logs these and carries
/// on in memory.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Cache store I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Cache store document error: {0}")]
    Document(#[from] CapsError),

    #[error("Cache directory {} does not exist or is not a directory", .0.display())]
    InvalidDirectory(PathBuf),
}

pub type Result<T> = std::result::Result<T, StoreError>;
