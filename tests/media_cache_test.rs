// Integration tests for MediaCache backed by HttpSource and a fake CDN.

mod common;

use std::sync::Arc;
use std::time::Duration;

use speediance_manager::media::{CacheLookup, MediaCache, MediaError, MediaKind, PreloadOutcome};
use speediance_manager::source::HttpSource;

use common::{start_cdn, CDN_IMAGE};

fn cache(root: &std::path::Path) -> MediaCache {
    MediaCache::new(
        root,
        Arc::new(HttpSource::new()),
        Duration::from_secs(5),
        Duration::from_secs(5),
    )
}

#[tokio::test]
async fn test_miss_then_hit() {
    let dir = tempfile::tempdir().unwrap();
    let (cdn, base) = start_cdn().await;
    let cache = cache(dir.path());
    let url = format!("{base}/img/cover1.jpg?sig=abc");

    assert!(!cache.is_cached(&url));
    assert_eq!(cache.local_url(&url, false), url);

    match cache.lookup_or_fetch(&url).await.unwrap() {
        CacheLookup::Downloaded { cached, size } => {
            assert_eq!(cached.kind, MediaKind::Image);
            assert_eq!(cached.file_name, "cover1.jpg");
            assert_eq!(size, CDN_IMAGE.len() as u64);
            assert_eq!(std::fs::read(&cached.path).unwrap(), CDN_IMAGE);
            assert_eq!(cached.path, dir.path().join("images").join("cover1.jpg"));
        }
        other => panic!("expected download, got {other:?}"),
    }

    assert!(cache.is_cached(&url));
    assert!(cache.local_url(&url, false).starts_with("/media_proxy?url="));

    match cache.lookup_or_fetch(&url).await.unwrap() {
        CacheLookup::Hit { size, .. } => assert_eq!(size, CDN_IMAGE.len() as u64),
        other => panic!("expected hit, got {other:?}"),
    }
    assert_eq!(cdn.hits_for("/img/cover1.jpg"), 1);

    let snap = cache.stats().snapshot();
    assert_eq!(snap.hits, 1);
    assert_eq!(snap.misses, 1);
    assert_eq!(snap.downloads, 1);
}

#[tokio::test]
async fn test_upstream_error_leaves_no_file() {
    let dir = tempfile::tempdir().unwrap();
    let (_cdn, base) = start_cdn().await;
    let cache = cache(dir.path());
    let url = format!("{base}/video/missing.mp4");

    let err = cache.lookup_or_fetch(&url).await.unwrap_err();
    assert!(matches!(err, MediaError::UpstreamStatus(404)));
    assert!(!cache.is_cached(&url));

    let videos = dir.path().join("videos");
    let leftovers = std::fs::read_dir(&videos)
        .map(|entries| entries.count())
        .unwrap_or(0);
    assert_eq!(leftovers, 0);
    assert_eq!(cache.stats().snapshot().failures, 1);
}

#[tokio::test]
async fn test_url_without_file_name_is_uncacheable() {
    let dir = tempfile::tempdir().unwrap();
    let (_cdn, base) = start_cdn().await;
    let cache = cache(dir.path());

    let lookup = cache.lookup_or_fetch(&format!("{base}/")).await.unwrap();
    assert!(matches!(lookup, CacheLookup::Uncacheable));
}

#[tokio::test]
async fn test_preload_outcomes() {
    let dir = tempfile::tempdir().unwrap();
    let (_cdn, base) = start_cdn().await;
    let cache = cache(dir.path());

    let video = format!("{base}/video/main1.mp4");
    assert_eq!(cache.preload(&video).await, PreloadOutcome::Downloaded);
    assert_eq!(cache.preload(&video).await, PreloadOutcome::AlreadyExists);
    assert_eq!(
        cache.preload(&format!("{base}/audio/missing.mp3")).await,
        PreloadOutcome::Failed(404)
    );
    assert_eq!(cache.preload("ftp://cdn/x.mp3").await, PreloadOutcome::InvalidUrl);

    let stored = dir.path().join("videos").join("main1.mp4");
    assert_eq!(std::fs::metadata(stored).unwrap().len(), 64 * 1024);
}
