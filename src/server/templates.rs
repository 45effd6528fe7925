// Embedded minijinja templates for the HTML pages.

use std::sync::Arc;

use minijinja::Environment;
use serde::Serialize;

use crate::media::MediaCache;

const TEMPLATES: &[(&str, &str)] = &[
    ("base.html", include_str!("../../templates/base.html")),
    ("index.html", include_str!("../../templates/index.html")),
    ("settings.html", include_str!("../../templates/settings.html")),
    ("library.html", include_str!("../../templates/library.html")),
    ("exercise_detail.html", include_str!("../../templates/exercise_detail.html")),
    ("create.html", include_str!("../../templates/create.html")),
    ("api_docs.html", include_str!("../../templates/api_docs.html")),
];

pub struct Templates {
    env: Environment<'static>,
}

impl Templates {
    /// Load all pages and register the `local_cache(force=false)` URL filter.
    pub fn new(media: Arc<MediaCache>) -> Result<Self, minijinja::Error> {
        let mut env = Environment::new();
        for &(name, source) in TEMPLATES {
            env.add_template(name, source)?;
        }

        env.add_filter(
            "local_cache",
            move |url: Option<String>, force: Option<bool>| -> String {
                media.local_url(url.as_deref().unwrap_or_default(), force.unwrap_or(false))
            },
        );

        Ok(Self { env })
    }

    pub fn render<S: Serialize>(&self, name: &str, ctx: S) -> Result<String, minijinja::Error> {
        self.env.get_template(name)?.render(ctx)
    }
}
