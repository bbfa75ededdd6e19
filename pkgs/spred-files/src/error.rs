//! Error types for file namespace operations.

use std::path::PathBuf;
use thiserror::Error;

/// Errors from file namespace operations.
///
/// Validation failures keep the size that tripped the bound so callers can
/// build a precise user-facing message.
#[derive(Error, Debug)]
pub enum FileServiceError {
    #[error("file does not exist: {0}")]
    NotFound(PathBuf),
    #[error("file is too small (minimum 1KB): {size} bytes")]
    TooSmall { size: u64 },
    #[error("file is too large (maximum 2GB): {size} bytes")]
    TooLarge { size: u64 },
    #[error("not a regular file: {0}")]
    NotAFile(PathBuf),
    #[error("filesystem backend unavailable: {0}")]
    Backend(String),
    #[error("failed to initialize storage directories: {0}")]
    DirectorySetup(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
