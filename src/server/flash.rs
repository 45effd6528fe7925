// One-shot status messages shown on the next rendered page.
//
// The app serves a single local user, so the queue lives in process instead
// of a signed session cookie.

use parking_lot::Mutex;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FlashCategory {
    Success,
    Error,
    Info,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Flash {
    pub category: FlashCategory,
    pub message: String,
}

#[derive(Debug, Default)]
pub struct FlashQueue {
    pending: Mutex<Vec<Flash>>,
}

impl FlashQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, category: FlashCategory, message: impl Into<String>) {
        self.pending.lock().push(Flash {
            category,
            message: message.into(),
        });
    }

    pub fn success(&self, message: impl Into<String>) {
        self.push(FlashCategory::Success, message);
    }

    pub fn error(&self, message: impl Into<String>) {
        self.push(FlashCategory::Error, message);
    }

    pub fn info(&self, message: impl Into<String>) {
        self.push(FlashCategory::Info, message);
    }

    /// Drain everything queued so far.
    pub fn take(&self) -> Vec<Flash> {
        std::mem::take(&mut *self.pending.lock())
    }
}
