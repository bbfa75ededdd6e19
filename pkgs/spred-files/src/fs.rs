//! Filesystem boundary.
//!
//! The original app routes every filesystem call through a wrapper that
//! degrades to failure results when the native module is missing. The
//! Rust equivalent is a trait: `TokioFs` is the real backend, tests
//! substitute stubs, and a missing backend surfaces as
//! `FileServiceError::Backend` rather than a panic.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};

use crate::error::FileServiceError;

/// Metadata subset the service needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileStat {
    pub size: u64,
    pub modified: DateTime<Utc>,
    pub is_file: bool,
}

/// One entry from a directory scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    pub name: String,
    pub path: PathBuf,
    pub is_file: bool,
}

/// The filesystem operations the service performs.
#[async_trait]
pub trait FileSystem: Send + Sync {
    async fn exists(&self, path: &Path) -> bool;
    async fn mkdir(&self, path: &Path) -> Result<(), FileServiceError>;
    async fn stat(&self, path: &Path) -> Result<FileStat, FileServiceError>;
    async fn copy_file(&self, from: &Path, to: &Path) -> Result<(), FileServiceError>;
    async fn move_file(&self, from: &Path, to: &Path) -> Result<(), FileServiceError>;
    async fn read_dir(&self, path: &Path) -> Result<Vec<DirEntry>, FileServiceError>;
    async fn unlink(&self, path: &Path) -> Result<(), FileServiceError>;
}

/// Real backend on top of `tokio::fs`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioFs;

#[async_trait]
impl FileSystem for TokioFs {
    async fn exists(&self, path: &Path) -> bool {
        tokio::fs::try_exists(path).await.unwrap_or(false)
    }

    async fn mkdir(&self, path: &Path) -> Result<(), FileServiceError> {
        tokio::fs::create_dir_all(path).await?;
        Ok(())
    }

    async fn stat(&self, path: &Path) -> Result<FileStat, FileServiceError> {
        let meta = tokio::fs::metadata(path).await?;
        let modified = meta
            .modified()
            .map(DateTime::<Utc>::from)
            .unwrap_or_else(|_| Utc::now());
        Ok(FileStat {
            size: meta.len(),
            modified,
            is_file: meta.is_file(),
        })
    }

    async fn copy_file(&self, from: &Path, to: &Path) -> Result<(), FileServiceError> {
        tokio::fs::copy(from, to).await?;
        Ok(())
    }

    async fn move_file(&self, from: &Path, to: &Path) -> Result<(), FileServiceError> {
        // Rename first; fall back to copy+unlink across mount points.
        match tokio::fs::rename(from, to).await {
            Ok(()) => Ok(()),
            Err(_) => {
                tokio::fs::copy(from, to).await?;
                tokio::fs::remove_file(from).await?;
                Ok(())
            }
        }
    }

    async fn read_dir(&self, path: &Path) -> Result<Vec<DirEntry>, FileServiceError> {
        let mut entries = Vec::new();
        let mut reader = tokio::fs::read_dir(path).await?;
        while let Some(entry) = reader.next_entry().await? {
            let is_file = entry
                .file_type()
                .await
                .map(|t| t.is_file())
                .unwrap_or(false);
            entries.push(DirEntry {
                name: entry.file_name().to_string_lossy().into_owned(),
                path: entry.path(),
                is_file,
            });
        }
        Ok(entries)
    }

    async fn unlink(&self, path: &Path) -> Result<(), FileServiceError> {
        tokio::fs::remove_file(path).await?;
        Ok(())
    }
}
