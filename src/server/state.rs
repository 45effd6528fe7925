use std::sync::Arc;

use axum::response::Html;
use minijinja::{context, Value};

use super::flash::FlashQueue;
use super::templates::Templates;
use crate::api::SpeedianceClient;
use crate::config::AppConfig;
use crate::error::AppError;
use crate::media::MediaCache;
use crate::source::HttpSource;

pub type SharedState = Arc<AppState>;

/// Everything a request handler needs.
pub struct AppState {
    pub client: Arc<SpeedianceClient>,
    pub media: Arc<MediaCache>,
    pub templates: Templates,
    pub flashes: FlashQueue,
}

impl AppState {
    /// Build the client and an HTTP-backed media cache from `config`.
    pub fn new(config: AppConfig) -> Result<SharedState, AppError> {
        let media = Arc::new(MediaCache::new(
            &config.cache_dir,
            Arc::new(HttpSource::new()),
            config.proxy_timeout,
            config.preload_timeout,
        ));
        let client = Arc::new(SpeedianceClient::new(config)?);
        Self::from_parts(client, media)
    }

    pub fn from_parts(
        client: Arc<SpeedianceClient>,
        media: Arc<MediaCache>,
    ) -> Result<SharedState, AppError> {
        let templates = Templates::new(media.clone())?;
        Ok(Arc::new(Self {
            client,
            media,
            templates,
            flashes: FlashQueue::new(),
        }))
    }

    /// Render a page, consuming pending flash messages.
    pub fn page(&self, name: &str, ctx: Value) -> Result<Html<String>, AppError> {
        let flashes = self.flashes.take();
        let logged_in = self.client.is_logged_in();
        let body = self
            .templates
            .render(name, context! { flashes, logged_in, ..ctx })?;
        Ok(Html(body))
    }
}
