use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::error;

use crate::{api::ApiError, config::ConfigError};

#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("Template error: {0}")]
    Template(#[from] minijinja::Error),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::Api(ApiError::NotLoggedIn) => StatusCode::UNAUTHORIZED,
            AppError::Api(_) => StatusCode::BAD_GATEWAY,
            AppError::Template(_) | AppError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        error!("request failed status={} error={}", status.as_u16(), self);
        (status, self.to_string()).into_response()
    }
}
