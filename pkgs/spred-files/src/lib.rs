//! # Spred Files
//!
//! File namespace management for Spred P2P transfers.
//!
//! The service owns a four-directory layout under the application root:
//!
//! ```text
//! <root>/Spred/
//!   Downloads/   files fetched from the catalog
//!   Received/    files accepted over P2P
//!   Temp/        staging area for in-flight transfers
//!   Thumbnails/  preview images
//! ```
//!
//! Responsibilities:
//! - **Validation**: existence, size bounds \[1 KiB, 2 GiB\] (inclusive),
//!   extension-derived MIME type and category
//! - **Staging**: copy-to-temp before send, move-to-received after a
//!   transfer completes
//! - **Hygiene**: filename sanitization, temp entries expired after 1 hour
//! - **Progress**: a callback registry keyed by transfer id
//!
//! All filesystem access goes through the [`FileSystem`] trait so the
//! service returns failure results instead of panicking when no backend
//! is present.

pub mod error;
pub mod fs;
pub mod types;

pub use error::FileServiceError;
pub use fs::{DirEntry, FileStat, FileSystem, TokioFs};
pub use types::{
    mime_for_extension, FileCategory, SpredFile, StagingArea, TransferProgress, TransferStatus,
};

use chrono::{Duration as ChronoDuration, Utc};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Minimum transferable file size in bytes (1 KiB, inclusive).
pub const MIN_FILE_SIZE: u64 = 1024;

/// Maximum transferable file size in bytes (2 GiB, inclusive).
pub const MAX_FILE_SIZE: u64 = 2 * 1024 * 1024 * 1024;

/// Temp entries older than this are removed by [`FileService::cleanup_temp_files`].
pub const TEMP_MAX_AGE: Duration = Duration::from_secs(60 * 60);

/// Callback invoked with progress updates for a registered transfer.
pub type ProgressCallback = Box<dyn Fn(&TransferProgress) + Send + Sync>;

/// Configuration for the file namespace.
#[derive(Debug, Clone)]
pub struct FileServiceConfig {
    /// Application root; the `Spred/` tree is created beneath it.
    pub base_dir: PathBuf,
    pub min_file_size: u64,
    pub max_file_size: u64,
    pub temp_max_age: Duration,
}

impl FileServiceConfig {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
            min_file_size: MIN_FILE_SIZE,
            max_file_size: MAX_FILE_SIZE,
            temp_max_age: TEMP_MAX_AGE,
        }
    }
}

/// Resolved directory layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Directories {
    pub base: PathBuf,
    pub downloads: PathBuf,
    pub received: PathBuf,
    pub temp: PathBuf,
    pub thumbnails: PathBuf,
}

/// File namespace manager.
pub struct FileService {
    config: FileServiceConfig,
    fs: Arc<dyn FileSystem>,
    transfer_callbacks: Mutex<HashMap<String, ProgressCallback>>,
}

impl FileService {
    /// Create a service backed by the real filesystem.
    pub fn new(config: FileServiceConfig) -> Self {
        Self::with_filesystem(config, Arc::new(TokioFs))
    }

    /// Create a service with an injected backend (tests, platforms with
    /// mediated file access).
    pub fn with_filesystem(config: FileServiceConfig, fs: Arc<dyn FileSystem>) -> Self {
        Self {
            config,
            fs,
            transfer_callbacks: Mutex::new(HashMap::new()),
        }
    }

    /// The managed directory layout.
    pub fn directories(&self) -> Directories {
        let base = self.config.base_dir.join("Spred");
        Directories {
            downloads: base.join("Downloads"),
            received: base.join("Received"),
            temp: base.join("Temp"),
            thumbnails: base.join("Thumbnails"),
            base,
        }
    }

    /// Create the directory tree. Idempotent; falls back to creating just
    /// the base directory when a subdirectory fails, so the app can still
    /// operate degraded.
    pub async fn initialize_directories(&self) -> Result<(), FileServiceError> {
        let dirs = self.directories();
        let all = [
            &dirs.base,
            &dirs.downloads,
            &dirs.received,
            &dirs.temp,
            &dirs.thumbnails,
        ];

        let mut first_failure = None;
        for dir in all {
            if self.fs.exists(dir).await {
                continue;
            }
            if let Err(e) = self.fs.mkdir(dir).await {
                warn!(dir = %dir.display(), error = %e, "directory creation failed");
                first_failure.get_or_insert(e);
            }
        }

        match first_failure {
            None => {
                info!(base = %dirs.base.display(), "file namespace initialized");
                Ok(())
            }
            Some(e) => {
                // Base directory alone is enough to keep transfers working.
                self.fs
                    .mkdir(&dirs.base)
                    .await
                    .map_err(|fallback| FileServiceError::DirectorySetup(fallback.to_string()))?;
                warn!(error = %e, "subdirectory setup incomplete, using base directory fallback");
                Ok(())
            }
        }
    }

    /// Validate a file for transfer: it must exist, be a regular file,
    /// and sit inside the size bounds. Returns the described file.
    pub async fn validate_file(&self, path: &Path) -> Result<SpredFile, FileServiceError> {
        if !self.fs.exists(path).await {
            return Err(FileServiceError::NotFound(path.to_path_buf()));
        }

        let stat = self.fs.stat(path).await?;
        if !stat.is_file {
            return Err(FileServiceError::NotAFile(path.to_path_buf()));
        }
        if stat.size < self.config.min_file_size {
            return Err(FileServiceError::TooSmall { size: stat.size });
        }
        if stat.size > self.config.max_file_size {
            return Err(FileServiceError::TooLarge { size: stat.size });
        }

        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default();
        let mime_type = mime_for_extension(extension);
        let category = FileCategory::from_mime(&mime_type);
        let path_str = path.to_string_lossy();

        Ok(SpredFile {
            id: file_id(path),
            name: file_name(path),
            path: path.to_path_buf(),
            size: stat.size,
            category,
            mime_type,
            created_at: stat.modified,
            is_downloaded: path_str.contains("Downloads"),
            is_received: path_str.contains("Received"),
        })
    }

    /// Whether a path exists on the backend.
    pub async fn exists(&self, path: &Path) -> bool {
        self.fs.exists(path).await
    }

    /// Resolve a sanitized filename into one of the staging directories.
    pub fn safe_file_path(&self, file_name: &str, area: StagingArea) -> PathBuf {
        let dirs = self.directories();
        let target = match area {
            StagingArea::Download => dirs.downloads,
            StagingArea::Received => dirs.received,
            StagingArea::Temp => dirs.temp,
        };
        target.join(sanitize_file_name(file_name))
    }

    /// Validate and copy a file into `Temp/` ahead of a send.
    pub async fn prepare_file_for_send(&self, source: &Path) -> Result<PathBuf, FileServiceError> {
        let file = self.validate_file(source).await?;
        let temp_path = self.safe_file_path(&file.name, StagingArea::Temp);
        self.fs.copy_file(source, &temp_path).await?;
        debug!(from = %source.display(), to = %temp_path.display(), "staged file for send");
        Ok(temp_path)
    }

    /// Validate a file landed in `Temp/` and move it to `Received/`.
    pub async fn handle_received_file(
        &self,
        temp_path: &Path,
        original_name: &str,
    ) -> Result<PathBuf, FileServiceError> {
        self.validate_file(temp_path).await?;

        let dirs = self.directories();
        if !self.fs.exists(&dirs.received).await {
            self.fs.mkdir(&dirs.received).await?;
        }

        let final_path = self.safe_file_path(original_name, StagingArea::Received);
        self.fs.move_file(temp_path, &final_path).await?;
        info!(path = %final_path.display(), "received file placed");
        Ok(final_path)
    }

    /// All files in `Downloads/` and `Received/`, newest first.
    /// Scan failures degrade to an empty list for that directory.
    pub async fn list_files(&self) -> Vec<SpredFile> {
        let dirs = self.directories();
        let mut files = self.scan_directory(&dirs.downloads).await;
        files.extend(self.scan_directory(&dirs.received).await);
        files.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        files
    }

    async fn scan_directory(&self, dir: &Path) -> Vec<SpredFile> {
        if !self.fs.exists(dir).await {
            return Vec::new();
        }
        let entries = match self.fs.read_dir(dir).await {
            Ok(entries) => entries,
            Err(e) => {
                warn!(dir = %dir.display(), error = %e, "directory scan failed");
                return Vec::new();
            }
        };

        let mut files = Vec::new();
        for entry in entries.into_iter().filter(|e| e.is_file) {
            match self.validate_file(&entry.path).await {
                Ok(file) => files.push(file),
                Err(e) => debug!(path = %entry.path.display(), error = %e, "skipping entry"),
            }
        }
        files
    }

    /// Remove temp entries older than the configured age.
    pub async fn cleanup_temp_files(&self) -> usize {
        let temp = self.directories().temp;
        if !self.fs.exists(&temp).await {
            return 0;
        }
        let entries = match self.fs.read_dir(&temp).await {
            Ok(entries) => entries,
            Err(e) => {
                warn!(error = %e, "temp cleanup scan failed");
                return 0;
            }
        };

        let cutoff = Utc::now()
            - ChronoDuration::from_std(self.config.temp_max_age)
                .unwrap_or_else(|_| ChronoDuration::hours(1));
        let mut removed = 0;
        for entry in entries.into_iter().filter(|e| e.is_file) {
            let stat = match self.fs.stat(&entry.path).await {
                Ok(stat) => stat,
                Err(_) => continue,
            };
            if stat.modified < cutoff {
                if let Err(e) = self.fs.unlink(&entry.path).await {
                    warn!(path = %entry.path.display(), error = %e, "temp unlink failed");
                } else {
                    removed += 1;
                }
            }
        }
        if removed > 0 {
            info!(removed, "expired temp files removed");
        }
        removed
    }

    /// Register a progress callback for a transfer id.
    pub fn register_progress_callback(&self, transfer_id: impl Into<String>, cb: ProgressCallback) {
        self.transfer_callbacks.lock().insert(transfer_id.into(), cb);
    }

    /// Remove the callback for a transfer id.
    pub fn unregister_progress_callback(&self, transfer_id: &str) {
        self.transfer_callbacks.lock().remove(transfer_id);
    }

    /// Dispatch a progress update to its registered callback, if any.
    pub fn update_transfer_progress(&self, progress: &TransferProgress) {
        let callbacks = self.transfer_callbacks.lock();
        if let Some(cb) = callbacks.get(&progress.id) {
            cb(progress);
        }
    }
}

/// Stable id for a file path: first 16 hex chars of its BLAKE3 hash.
pub fn file_id(path: &Path) -> String {
    let hash = blake3::hash(path.to_string_lossy().as_bytes());
    hash.to_hex()[..16].to_string()
}

/// Final path component, or "unknown" when absent.
pub fn file_name(path: &Path) -> String {
    path.file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("unknown")
        .to_string()
}

/// Strip characters the platforms reject, cap length, default empty names.
pub fn sanitize_file_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| match c {
            '<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*' => '_',
            c => c,
        })
        .take(255)
        .collect();
    let trimmed = cleaned.trim();
    if trimmed.is_empty() {
        "untitled".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Human-readable size, e.g. `2.5 MB`.
pub fn format_file_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
    if bytes == 0 {
        return "0 B".to_string();
    }
    let exp = ((bytes as f64).ln() / 1024f64.ln()).floor() as usize;
    let exp = exp.min(UNITS.len() - 1);
    let value = bytes as f64 / 1024f64.powi(exp as i32);
    format!("{} {}", (value * 100.0).round() / 100.0, UNITS[exp])
}
