use anyhow::{Context, Result};
use tokio::signal::ctrl_c;
#[cfg(unix)]
use tokio::signal::unix::{signal, SignalKind};
use tracing::{info, warn};

use speediance_manager::config::AppConfig;
use speediance_manager::init_tracing;
use speediance_manager::server::{AppState, WebServer};

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let config = AppConfig::load().context("loading configuration")?;
    let bind = config.bind_address();
    info!(
        "config file={} cache dir={}",
        config.config_file.display(),
        config.cache_dir.display()
    );

    let state = AppState::new(config).context("building application state")?;
    let server = WebServer::start(state, &bind)
        .await
        .with_context(|| format!("binding {bind}"))?;
    info!("open {} in a browser", server.local_url());

    shutdown_signal().await;
    server.shutdown().await;
    info!("server shut down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match ctrl_c().await {
            Ok(()) => info!("received Ctrl+C, shutting down"),
            Err(e) => {
                warn!("cannot listen for Ctrl+C: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("received terminate signal, shutting down");
            }
            Err(e) => {
                warn!("cannot install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
