// Bulk download of every accessory image and exercise asset, reported line by line.

use std::fmt;
use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{info, warn};
use url::Url;

use super::assets::exercise_media_urls;
use super::cache::MediaCache;
use crate::api::SpeedianceClient;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PreloadOutcome {
    InvalidUrl,
    PathError,
    AlreadyExists,
    Downloaded,
    Failed(u16),
    Error(String),
}

impl fmt::Display for PreloadOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PreloadOutcome::InvalidUrl => f.write_str("Skipped (Invalid URL)"),
            PreloadOutcome::PathError => f.write_str("Skipped (Path error)"),
            PreloadOutcome::AlreadyExists => f.write_str("Skipped (Already exists)"),
            PreloadOutcome::Downloaded => f.write_str("Downloaded"),
            PreloadOutcome::Failed(status) => write!(f, "Failed (Status {status})"),
            PreloadOutcome::Error(e) => write!(f, "Error: {e}"),
        }
    }
}

/// Walk accessories and the full library, downloading every asset.
///
/// Progress lines are sent on `progress`; the run stops early when the
/// receiver goes away (the browser tab was closed).
pub async fn run_preload(
    client: Arc<SpeedianceClient>,
    cache: Arc<MediaCache>,
    progress: mpsc::Sender<String>,
) {
    let report = Reporter { tx: progress };
    if run(&client, &cache, &report).await.is_err() {
        info!("preload cancelled: progress receiver dropped");
    }
}

struct Reporter {
    tx: mpsc::Sender<String>,
}

struct Cancelled;

impl Reporter {
    async fn line(&self, text: impl Into<String>) -> Result<(), Cancelled> {
        self.tx.send(text.into()).await.map_err(|_| Cancelled)
    }
}

async fn run(
    client: &SpeedianceClient,
    cache: &MediaCache,
    report: &Reporter,
) -> Result<(), Cancelled> {
    report
        .line("Starting deep discovery and download of assets...\n")
        .await?;
    report
        .line("This process fetches full details for every exercise to ensure no video is missed.\n")
        .await?;
    report
        .line("It may take several minutes. Please do not close this tab.\n\n")
        .await?;

    report.line("--- Processing Accessories ---\n").await?;
    match client.accessories().await {
        Ok(accessories) => {
            for accessory in accessories {
                let Some(img) = accessory.img.as_deref().filter(|s| !s.is_empty()) else {
                    continue;
                };
                let outcome = cache.preload(img).await;
                let name = if accessory.name.is_empty() {
                    "Unknown"
                } else {
                    accessory.name.as_str()
                };
                report.line(format!("Accessory {name}: {outcome}\n")).await?;
            }
        }
        Err(e) => {
            warn!("preload: accessories failed: {}", e);
            report.line(format!("Error scanning accessories: {e}\n")).await?;
        }
    }

    report.line("\n--- Processing Exercise Library ---\n").await?;
    match client.library().await {
        Ok(library) => {
            let total = library.len();
            for (i, group) in library.iter().enumerate() {
                let title = if group.title.is_empty() {
                    format!("ID {}", group.id)
                } else {
                    group.title.clone()
                };
                report
                    .line(format!("[{}/{}] Processing: {} ... ", i + 1, total, title))
                    .await?;

                // The list endpoint can omit variants; always use the full detail.
                let detail = match client.exercise_detail(group.id).await {
                    Ok(Some(detail)) => detail,
                    Ok(None) => {
                        report.line("Failed to fetch details.\n").await?;
                        continue;
                    }
                    Err(e) => {
                        report.line(format!("Error fetching details: {e}\n")).await?;
                        continue;
                    }
                };

                let urls = exercise_media_urls(&detail);
                report.line(format!("Found {} assets.\n", urls.len())).await?;

                for url in &urls {
                    let outcome = cache.preload(url).await;
                    if outcome == PreloadOutcome::Downloaded {
                        report
                            .line(format!("    -> {}: {}\n", display_name(url), outcome))
                            .await?;
                    }
                }
            }
        }
        Err(e) => {
            warn!("preload: library failed: {}", e);
            report.line(format!("Error scanning library: {e}\n")).await?;
        }
    }

    let snap = cache.stats().snapshot();
    info!(
        "preload finished downloads={} failures={} downloaded_bytes={}",
        snap.downloads, snap.failures, snap.downloaded_bytes
    );
    report
        .line("\nDone! All assets have been processed.")
        .await
}

fn display_name(url: &str) -> String {
    Url::parse(url)
        .ok()
        .and_then(|u| u.path().rsplit('/').next().map(str::to_string))
        .unwrap_or_else(|| url.to_string())
}
