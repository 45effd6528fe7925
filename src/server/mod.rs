// Axum web front-end: routes, shared state and server lifecycle.

pub mod flash;
pub mod media;
pub mod pages;
pub mod state;
pub mod templates;

use anyhow::Result;
use axum::{
    routing::{get, post},
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

pub use state::{AppState, SharedState};

/// All routes of the web front-end.
pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/", get(pages::index))
        .route("/settings", get(pages::settings_page).post(pages::save_settings))
        .route("/settings/unit", post(pages::update_unit))
        .route("/settings/preload", get(media::preload))
        .route("/login", post(pages::login))
        .route("/logout", get(pages::logout))
        .route("/library", get(pages::library))
        .route("/exercise/{id}", get(pages::exercise_page))
        .route("/api/exercise/{id}", get(pages::exercise_json))
        .route("/edit/{code}", get(pages::edit_page))
        .route("/create", get(pages::create_page).post(pages::save_workout))
        .route("/delete/{id}", get(pages::delete_workout))
        .route("/api_docs", get(pages::api_docs))
        .route("/media_proxy", get(media::media_proxy))
        .route("/api/media/stats", get(media::media_stats))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub struct WebServer {
    port: u16,
    shutdown_tx: Option<oneshot::Sender<()>>,
    task: JoinHandle<()>,
}

impl WebServer {
    /// Bind `addr` (use port 0 for a random one) and serve in the background.
    pub async fn start(state: SharedState, addr: &str) -> Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        let port = listener.local_addr()?.port();
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

        let app = router(state);
        let task = tokio::spawn(async move {
            let served = axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    let _ = shutdown_rx.await;
                })
                .await;
            if let Err(e) = served {
                error!("server stopped with error: {}", e);
            }
        });

        info!("listening on {} (port {})", addr, port);
        Ok(Self {
            port,
            shutdown_tx: Some(shutdown_tx),
            task,
        })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Base URL reachable from this machine.
    pub fn local_url(&self) -> String {
        format!("http://127.0.0.1:{}", self.port)
    }

    /// Stop accepting connections and wait for in-flight requests.
    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        let _ = self.task.await;
    }
}
