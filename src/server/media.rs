// Media proxy, bulk preload stream and cache statistics.

use std::convert::Infallible;

use axum::{
    body::Body,
    extract::{Query, State},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Redirect, Response},
    Json,
};
use bytes::Bytes;
use futures_util::stream;
use serde::Deserialize;
use tokio::sync::mpsc;
use tokio_util::io::ReaderStream;
use tracing::{debug, warn};

use super::state::SharedState;
use crate::media::cache::content_type_for;
use crate::media::preload::run_preload;
use crate::media::{CacheLookup, CachedPath};

const PRELOAD_CHANNEL_DEPTH: usize = 64;

#[derive(Debug, Deserialize)]
pub struct ProxyParams {
    url: Option<String>,
}

/// GET /media_proxy?url=...: serve from the disk cache, downloading on miss.
pub async fn media_proxy(
    State(state): State<SharedState>,
    Query(params): Query<ProxyParams>,
) -> Response {
    let Some(url) = params.url.filter(|u| !u.is_empty()) else {
        return (StatusCode::BAD_REQUEST, "No URL provided").into_response();
    };
    // The URL is echoed in `Location` on every fallback.
    if HeaderValue::from_str(&url).is_err() {
        return (StatusCode::BAD_REQUEST, "Invalid URL").into_response();
    }

    match state.media.lookup_or_fetch(&url).await {
        Ok(CacheLookup::Hit { cached, size }) | Ok(CacheLookup::Downloaded { cached, size }) => {
            serve_file(&cached, size, &url).await
        }
        Ok(CacheLookup::Uncacheable) => {
            debug!("no cache path for {}, redirecting", url);
            Redirect::to(&url).into_response()
        }
        Err(_) => Redirect::to(&url).into_response(),
    }
}

async fn serve_file(cached: &CachedPath, size: u64, url: &str) -> Response {
    let file = match tokio::fs::File::open(&cached.path).await {
        Ok(file) => file,
        Err(e) => {
            warn!("[ERROR] Cannot open cached {}: {}", cached.path.display(), e);
            return Redirect::to(url).into_response();
        }
    };

    (
        [
            (header::CONTENT_TYPE, content_type_for(&cached.file_name).to_string()),
            (header::CONTENT_LENGTH, size.to_string()),
        ],
        Body::from_stream(ReaderStream::new(file)),
    )
        .into_response()
}

/// GET /settings/preload: stream progress lines while every asset downloads.
pub async fn preload(State(state): State<SharedState>) -> Response {
    if !state.client.is_logged_in() {
        return (StatusCode::UNAUTHORIZED, "Unauthorized").into_response();
    }

    let (tx, rx) = mpsc::channel::<String>(PRELOAD_CHANNEL_DEPTH);
    tokio::spawn(run_preload(state.client.clone(), state.media.clone(), tx));

    let lines = stream::unfold(rx, |mut rx| async move {
        rx.recv()
            .await
            .map(|line| (Ok::<_, Infallible>(Bytes::from(line)), rx))
    });

    (
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        Body::from_stream(lines),
    )
        .into_response()
}

/// GET /api/media/stats
pub async fn media_stats(State(state): State<SharedState>) -> impl IntoResponse {
    Json(state.media.stats().snapshot())
}
