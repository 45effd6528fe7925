use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;

use crate::media::MediaError;

/// Where cache misses are fetched from.
#[async_trait]
pub trait MediaSource: Send + Sync {
    /// Download `url` into `dest`, returning the number of bytes written.
    ///
    /// Anything other than HTTP 200 is an error and may leave a partial file
    /// behind; the caller owns cleanup of `dest`.
    async fn fetch_to_file(&self, url: &str, dest: &Path, timeout: Duration)
        -> Result<u64, MediaError>;
}
