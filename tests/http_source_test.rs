use std::time::Duration;

use axum::extract::Path;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use tokio::net::TcpListener;

use speediance_manager::media::MediaError;
use speediance_manager::source::http_source::HttpSource;
use speediance_manager::source::traits::MediaSource;

const TEST_SIZE: usize = 1024 * 1024; // 1 MB

async fn serve_file(Path(name): Path<String>) -> impl IntoResponse {
    match name.as_str() {
        "clip.mp4" => {
            let body: Vec<u8> = (0..TEST_SIZE).map(|i| (i % 256) as u8).collect();
            (
                StatusCode::OK,
                [(header::CONTENT_TYPE, "video/mp4")],
                body,
            )
                .into_response()
        }
        "slow.mp3" => {
            tokio::time::sleep(Duration::from_secs(5)).await;
            (StatusCode::OK, Vec::new()).into_response()
        }
        "moved.png" => (StatusCode::NO_CONTENT, Vec::new()).into_response(),
        _ => (StatusCode::NOT_FOUND, "gone").into_response(),
    }
}

async fn start_server() -> String {
    let app = Router::new().route("/media/{name}", get(serve_file));
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}/media")
}

#[tokio::test]
async fn test_fetch_streams_body_to_file() {
    let base = start_server().await;
    let dir = tempfile::tempdir().unwrap();
    let dest = dir.path().join("clip.mp4");

    let source = HttpSource::new();
    let written = source
        .fetch_to_file(&format!("{base}/clip.mp4"), &dest, Duration::from_secs(5))
        .await
        .unwrap();

    assert_eq!(written, TEST_SIZE as u64);
    let data = std::fs::read(&dest).unwrap();
    assert_eq!(data.len(), TEST_SIZE);
    assert!(data.iter().enumerate().all(|(i, b)| *b == (i % 256) as u8));
}

#[tokio::test]
async fn test_non_ok_status_is_an_error() {
    let base = start_server().await;
    let dir = tempfile::tempdir().unwrap();
    let source = HttpSource::new();

    for (name, expected) in [("nothing.jpg", 404), ("moved.png", 204)] {
        let dest = dir.path().join(name);
        let err = source
            .fetch_to_file(&format!("{base}/{name}"), &dest, Duration::from_secs(5))
            .await
            .unwrap_err();
        assert!(
            matches!(err, MediaError::UpstreamStatus(status) if status == expected),
            "{name}: {err}"
        );
        assert!(!dest.exists());
    }
}

#[tokio::test]
async fn test_timeout() {
    let base = start_server().await;
    let dir = tempfile::tempdir().unwrap();
    let source = HttpSource::new();

    let err = source
        .fetch_to_file(
            &format!("{base}/slow.mp3"),
            &dir.path().join("slow.mp3"),
            Duration::from_millis(200),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, MediaError::Transport(_)));
}
