//! Types for the Spred file namespace.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Broad content category, derived from the extension-based MIME type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileCategory {
    Video,
    Audio,
    Image,
    Other,
}

impl FileCategory {
    /// Classify by MIME type prefix.
    pub fn from_mime(mime: &str) -> Self {
        if mime.starts_with("video/") {
            Self::Video
        } else if mime.starts_with("audio/") {
            Self::Audio
        } else if mime.starts_with("image/") {
            Self::Image
        } else {
            Self::Other
        }
    }
}

/// Which managed directory a file path resolves into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StagingArea {
    Download,
    Received,
    Temp,
}

/// A validated file in the Spred namespace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpredFile {
    /// Stable identifier derived from the path.
    pub id: String,
    pub name: String,
    pub path: PathBuf,
    pub size: u64,
    pub category: FileCategory,
    pub mime_type: String,
    pub created_at: DateTime<Utc>,
    /// Lives under `Downloads/`.
    pub is_downloaded: bool,
    /// Lives under `Received/`.
    pub is_received: bool,
}

/// Lifecycle of an in-flight transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransferStatus {
    Preparing,
    Transferring,
    Completed,
    Failed,
    Cancelled,
}

/// Transient record of an in-flight transfer. Created when a send/receive
/// begins, updated on native progress callbacks, discarded on completion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransferProgress {
    pub id: String,
    pub file_name: String,
    /// Percentage in `0.0..=100.0`.
    pub progress: f64,
    pub bytes_transferred: u64,
    pub total_bytes: u64,
    /// Bytes per second, 0 while unknown.
    pub speed: f64,
    pub status: TransferStatus,
}

impl TransferProgress {
    pub fn preparing(id: impl Into<String>, file_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            file_name: file_name.into(),
            progress: 0.0,
            bytes_transferred: 0,
            total_bytes: 0,
            speed: 0.0,
            status: TransferStatus::Preparing,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self.status,
            TransferStatus::Completed | TransferStatus::Failed | TransferStatus::Cancelled
        )
    }
}

/// MIME type for a file extension.
///
/// The table covers the media formats the app actually ships; anything
/// else falls through to `mime_guess`, then to octet-stream.
pub fn mime_for_extension(extension: &str) -> String {
    let ext = extension.to_ascii_lowercase();
    let known = match ext.as_str() {
        "mp4" => Some("video/mp4"),
        "avi" => Some("video/x-msvideo"),
        "mov" => Some("video/quicktime"),
        "wmv" => Some("video/x-ms-wmv"),
        "flv" => Some("video/x-flv"),
        "webm" => Some("video/webm"),
        "mkv" => Some("video/x-matroska"),
        "mp3" => Some("audio/mpeg"),
        "wav" => Some("audio/wav"),
        "aac" => Some("audio/aac"),
        "flac" => Some("audio/flac"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "png" => Some("image/png"),
        "gif" => Some("image/gif"),
        "webp" => Some("image/webp"),
        _ => None,
    };
    if let Some(mime) = known {
        return mime.to_string();
    }
    mime_guess::from_ext(&ext)
        .first_raw()
        .unwrap_or("application/octet-stream")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_follows_mime_prefix() {
        assert_eq!(FileCategory::from_mime("video/mp4"), FileCategory::Video);
        assert_eq!(FileCategory::from_mime("audio/wav"), FileCategory::Audio);
        assert_eq!(FileCategory::from_mime("image/png"), FileCategory::Image);
        assert_eq!(
            FileCategory::from_mime("application/pdf"),
            FileCategory::Other
        );
    }

    #[test]
    fn unknown_extension_falls_back_to_octet_stream() {
        assert_eq!(mime_for_extension("sprd"), "application/octet-stream");
        assert_eq!(mime_for_extension("MKV"), "video/x-matroska");
    }

    #[test]
    fn progress_serializes_lowercase_for_the_ui() {
        let progress = TransferProgress {
            status: TransferStatus::Transferring,
            ..TransferProgress::preparing("t1", "clip.mp4")
        };

        let json = serde_json::to_string(&progress).unwrap();
        assert!(json.contains(r#""status":"transferring""#));
    }
}
