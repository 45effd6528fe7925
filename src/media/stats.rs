// Media cache counters for hits, misses and bytes moved.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct MediaStatsSnapshot {
    pub hits: u64,
    pub misses: u64,
    pub downloads: u64,
    pub failures: u64,
    pub served_bytes: u64,
    pub downloaded_bytes: u64,
    pub hit_rate: f64,
    pub uptime_secs: u64,
}

pub struct MediaStats {
    hits: AtomicU64,
    misses: AtomicU64,
    downloads: AtomicU64,
    failures: AtomicU64,
    served_bytes: AtomicU64,
    downloaded_bytes: AtomicU64,
    started: Instant,
}

impl MediaStats {
    pub fn new() -> Self {
        Self {
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            downloads: AtomicU64::new(0),
            failures: AtomicU64::new(0),
            served_bytes: AtomicU64::new(0),
            downloaded_bytes: AtomicU64::new(0),
            started: Instant::now(),
        }
    }

    /// A request answered from disk; `bytes` is CDN traffic saved.
    pub fn record_hit(&self, bytes: u64) {
        self.hits.fetch_add(1, Ordering::Relaxed);
        self.served_bytes.fetch_add(bytes, Ordering::Relaxed);
    }

    pub fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_download(&self, bytes: u64) {
        self.downloads.fetch_add(1, Ordering::Relaxed);
        self.downloaded_bytes.fetch_add(bytes, Ordering::Relaxed);
    }

    pub fn record_failure(&self) {
        self.failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MediaStatsSnapshot {
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        let lookups = hits + misses;
        let hit_rate = if lookups > 0 {
            hits as f64 / lookups as f64
        } else {
            0.0
        };

        MediaStatsSnapshot {
            hits,
            misses,
            downloads: self.downloads.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
            served_bytes: self.served_bytes.load(Ordering::Relaxed),
            downloaded_bytes: self.downloaded_bytes.load(Ordering::Relaxed),
            hit_rate,
            uptime_secs: self.started.elapsed().as_secs(),
        }
    }
}

impl Default for MediaStats {
    fn default() -> Self {
        Self::new()
    }
}
