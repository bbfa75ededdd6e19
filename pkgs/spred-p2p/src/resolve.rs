//! Resolving catalog videos to files already on disk.
//!
//! Catalog entries carry a title, a backend key, and sometimes a `src`
//! hint that may be a streaming URL rather than a path. Before a send the
//! service tries the hint, then falls back to fuzzy-matching managed
//! directories, because received and downloaded copies rarely keep the
//! exact catalog name.

use url::Url;

/// What the catalog knows about a video.
#[derive(Debug, Clone, Default)]
pub struct VideoDescriptor {
    pub title: String,
    pub video_key: String,
    /// Playback source; may be a local path, a remote URL, or a bare
    /// backend key depending on where the entry came from.
    pub src: Option<String>,
}

/// Whether `candidate` names a file on the local filesystem, as opposed
/// to a remote URL or a bare backend key.
pub fn is_local_media_path(candidate: &str) -> bool {
    if let Ok(url) = Url::parse(candidate) {
        if matches!(url.scheme(), "http" | "https" | "content") {
            return false;
        }
    }
    candidate.starts_with('/')
}

fn normalize(s: &str) -> String {
    s.trim().to_lowercase()
}

fn compact(s: &str) -> String {
    s.chars()
        .filter(|c| !matches!(c, ' ' | '-' | '_' | '.'))
        .collect()
}

/// Whether a file stem plausibly names the descriptor's video.
///
/// Matches on the title or the backend key, exactly or as a substring,
/// ignoring case and common filename separators.
pub fn stem_matches(stem: &str, video: &VideoDescriptor) -> bool {
    let stem_norm = normalize(stem);
    let stem_compact = compact(&stem_norm);

    for candidate in [&video.title, &video.video_key] {
        if candidate.trim().is_empty() {
            continue;
        }
        let norm = normalize(candidate);
        if stem_norm == norm || stem_norm.contains(&norm) {
            return true;
        }
        let cmp = compact(&norm);
        if !cmp.is_empty() && (stem_compact == cmp || stem_compact.contains(&cmp)) {
            return true;
        }
    }
    false
}
