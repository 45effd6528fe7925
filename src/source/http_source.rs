use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

use super::traits::MediaSource;
use crate::media::MediaError;

/// CDN downloader backed by a shared reqwest client.
#[derive(Clone, Default)]
pub struct HttpSource {
    client: Client,
}

impl HttpSource {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
        }
    }
}

#[async_trait]
impl MediaSource for HttpSource {
    async fn fetch_to_file(
        &self,
        url: &str,
        dest: &Path,
        timeout: Duration,
    ) -> Result<u64, MediaError> {
        let mut resp = self.client.get(url).timeout(timeout).send().await?;

        let status = resp.status();
        debug!("http fetch status={} url={}", status.as_u16(), url);
        if status != StatusCode::OK {
            warn!("http fetch failed status={} url={}", status.as_u16(), url);
            return Err(MediaError::UpstreamStatus(status.as_u16()));
        }

        let mut file = File::create(dest).await?;
        let mut written = 0u64;
        while let Some(chunk) = resp.chunk().await? {
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        file.flush().await?;

        Ok(written)
    }
}
