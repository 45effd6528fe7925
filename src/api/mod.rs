//! Client for the Speediance mobile backend.
//!
//! The backend is undocumented; everything here mirrors what the official
//! app sends. Responses are wrapped in an [`models::Envelope`] whose `code`
//! is `0` on success.

pub mod client;
pub mod de;
pub mod headers;
pub mod models;

use thiserror::Error;

use crate::config::ConfigError;

pub use client::{LoginOutcome, SpeedianceClient};

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("not logged in")]
    NotLoggedIn,

    #[error("HTTP request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("request rejected (code {code}): {message}")]
    Rejected { code: i64, message: String },

    #[error("unexpected response: {0}")]
    Decode(String),

    #[error("invalid {0} header value")]
    InvalidHeader(String),

    #[error("invalid endpoint URL: {0}")]
    Url(#[from] url::ParseError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}
