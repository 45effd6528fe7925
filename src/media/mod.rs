//! Disk mirror of the vendor's CDN media.
//!
//! Remote image, video and audio URLs are mapped to
//! `<cache root>/<kind>/<file name>`. Pages link to the local proxy when a
//! file is already on disk (or when asked to force it); the proxy downloads
//! misses on first request. There is no eviction.

pub mod assets;
pub mod cache;
pub mod preload;
pub mod stats;

use thiserror::Error;

pub use cache::{CacheLookup, CachedPath, MediaCache, MediaKind};
pub use preload::PreloadOutcome;
pub use stats::{MediaStats, MediaStatsSnapshot};

#[derive(Debug, Error)]
pub enum MediaError {
    #[error("upstream returned HTTP {0}")]
    UpstreamStatus(u16),

    #[error("download failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("cache I/O: {0}")]
    Io(#[from] std::io::Error),
}
