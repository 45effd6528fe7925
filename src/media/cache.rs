// On-disk media cache keyed by the remote file name, sorted into one folder per media kind.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};
use url::{form_urlencoded, Url};

use super::preload::PreloadOutcome;
use super::stats::MediaStats;
use super::MediaError;
use crate::source::traits::MediaSource;

/// Path of the local proxy route.
pub const PROXY_PATH: &str = "/media_proxy";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Image,
    Video,
    Audio,
    Misc,
}

impl MediaKind {
    /// Classify by lowercase extension (with leading dot).
    pub fn from_extension(ext: &str) -> Self {
        match ext {
            ".jpg" | ".jpeg" | ".png" | ".gif" | ".webp" => MediaKind::Image,
            ".mp4" | ".mov" | ".webm" => MediaKind::Video,
            ".mp3" | ".wav" | ".aac" => MediaKind::Audio,
            _ => MediaKind::Misc,
        }
    }

    pub fn folder(self) -> &'static str {
        match self {
            MediaKind::Image => "images",
            MediaKind::Video => "videos",
            MediaKind::Audio => "audio",
            MediaKind::Misc => "misc",
        }
    }
}

/// Response content type for a cached file name.
pub fn content_type_for(file_name: &str) -> &'static str {
    match extension(file_name).as_str() {
        ".jpg" | ".jpeg" => "image/jpeg",
        ".png" => "image/png",
        ".gif" => "image/gif",
        ".webp" => "image/webp",
        ".mp4" => "video/mp4",
        ".mov" => "video/quicktime",
        ".webm" => "video/webm",
        ".mp3" => "audio/mpeg",
        ".wav" => "audio/wav",
        ".aac" => "audio/aac",
        _ => "application/octet-stream",
    }
}

/// Lowercase extension including the dot, or empty.
fn extension(file_name: &str) -> String {
    match file_name.rfind('.') {
        Some(0) | None => String::new(),
        Some(idx) => file_name[idx..].to_ascii_lowercase(),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedPath {
    pub path: PathBuf,
    pub kind: MediaKind,
    pub file_name: String,
}

#[derive(Debug)]
pub enum CacheLookup {
    /// Served from disk.
    Hit { cached: CachedPath, size: u64 },
    /// Fetched just now and stored.
    Downloaded { cached: CachedPath, size: u64 },
    /// The URL has no file name to cache under.
    Uncacheable,
}

pub struct MediaCache {
    root: PathBuf,
    source: Arc<dyn MediaSource>,
    stats: MediaStats,
    proxy_timeout: Duration,
    preload_timeout: Duration,
    next_part: AtomicU64,
}

impl MediaCache {
    pub fn new(
        root: impl Into<PathBuf>,
        source: Arc<dyn MediaSource>,
        proxy_timeout: Duration,
        preload_timeout: Duration,
    ) -> Self {
        Self {
            root: root.into(),
            source,
            stats: MediaStats::new(),
            proxy_timeout,
            preload_timeout,
            next_part: AtomicU64::new(0),
        }
    }

    pub fn stats(&self) -> &MediaStats {
        &self.stats
    }

    /// Local location for `url`, or `None` when its path has no file name.
    pub fn cache_path(&self, url: &str) -> Option<CachedPath> {
        let file_name = file_name_of(url)?;
        let kind = MediaKind::from_extension(&extension(&file_name));
        Some(CachedPath {
            path: self.root.join(kind.folder()).join(&file_name),
            kind,
            file_name,
        })
    }

    pub fn is_cached(&self, url: &str) -> bool {
        self.cache_path(url).is_some_and(|c| c.path.exists())
    }

    /// URL a page should use for `url`.
    ///
    /// Cached files (or any file when `force` is set) go through the local
    /// proxy; everything else is left for the browser to fetch directly.
    pub fn local_url(&self, url: &str, force: bool) -> String {
        if url.is_empty() {
            return String::new();
        }
        if force || self.is_cached(url) {
            return proxy_url(url);
        }
        url.to_string()
    }

    /// Proxy semantics: serve from disk, or download on miss.
    pub async fn lookup_or_fetch(&self, url: &str) -> Result<CacheLookup, MediaError> {
        let Some(cached) = self.cache_path(url) else {
            return Ok(CacheLookup::Uncacheable);
        };

        if let Ok(meta) = tokio::fs::metadata(&cached.path).await {
            let size = meta.len();
            self.stats.record_hit(size);
            info!(
                "[CACHE HIT] Served {} from disk. Saved {:.2} KB of CDN traffic.",
                cached.file_name,
                kb(size)
            );
            return Ok(CacheLookup::Hit { cached, size });
        }

        self.stats.record_miss();
        info!("[CACHE MISS] Downloading {} from CDN...", cached.file_name);
        match self.download(url, &cached, self.proxy_timeout).await {
            Ok(size) => {
                info!(
                    "[DOWNLOAD] Saved {} ({:.2} KB) to cache.",
                    cached.file_name,
                    kb(size)
                );
                Ok(CacheLookup::Downloaded { cached, size })
            }
            Err(e) => {
                warn!("[ERROR] Cache download failed for {}: {}", url, e);
                Err(e)
            }
        }
    }

    /// Bulk-download semantics: skip what is already present and non-empty.
    pub async fn preload(&self, url: &str) -> PreloadOutcome {
        if !url.starts_with("http") {
            return PreloadOutcome::InvalidUrl;
        }
        let Some(cached) = self.cache_path(url) else {
            return PreloadOutcome::PathError;
        };
        if tokio::fs::metadata(&cached.path)
            .await
            .is_ok_and(|m| m.len() > 0)
        {
            return PreloadOutcome::AlreadyExists;
        }

        match self.download(url, &cached, self.preload_timeout).await {
            Ok(_) => PreloadOutcome::Downloaded,
            Err(MediaError::UpstreamStatus(status)) => PreloadOutcome::Failed(status),
            Err(e) => PreloadOutcome::Error(e.to_string()),
        }
    }

    /// Fetch into a private `.part` file, then move it into place.
    async fn download(
        &self,
        url: &str,
        cached: &CachedPath,
        timeout: Duration,
    ) -> Result<u64, MediaError> {
        if let Some(dir) = cached.path.parent() {
            tokio::fs::create_dir_all(dir).await?;
        }

        let seq = self.next_part.fetch_add(1, Ordering::Relaxed);
        let part = cached
            .path
            .with_file_name(format!("{}.{}.part", cached.file_name, seq));

        let result = match self.source.fetch_to_file(url, &part, timeout).await {
            Ok(size) => tokio::fs::rename(&part, &cached.path)
                .await
                .map(|_| size)
                .map_err(MediaError::from),
            Err(e) => Err(e),
        };

        match result {
            Ok(size) => {
                self.stats.record_download(size);
                Ok(size)
            }
            Err(e) => {
                let _ = tokio::fs::remove_file(&part).await;
                self.stats.record_failure();
                Err(e)
            }
        }
    }
}

/// `/media_proxy?url=<encoded>`
pub fn proxy_url(url: &str) -> String {
    let query = form_urlencoded::Serializer::new(String::new())
        .append_pair("url", url)
        .finish();
    format!("{PROXY_PATH}?{query}")
}

/// Last segment of the URL path; `None` for unparsable URLs or directory paths.
fn file_name_of(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let name = parsed.path().rsplit('/').next()?;
    if name.is_empty() || name == "." || name == ".." {
        return None;
    }
    Some(name.to_string())
}

fn kb(bytes: u64) -> f64 {
    bytes as f64 / 1024.0
}
