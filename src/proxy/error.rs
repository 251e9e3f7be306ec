use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;
use tracing::error;

use crate::catalog::{ProductsEnvelope, LOAD_FAILED_MESSAGE};
use crate::source::{CredentialError, SourceError};

#[derive(Debug, Error)]
pub enum ProxyError {
    #[error("configuration error: {0}")]
    Configuration(#[from] CredentialError),

    #[error("upstream error: {0}")]
    Upstream(#[from] SourceError),
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        // Detail stays in the log; clients only ever see the generic message.
        match &self {
            ProxyError::Configuration(e) => error!(error = %e, "proxy is misconfigured"),
            ProxyError::Upstream(e) => error!(error = %e, "record store request failed"),
        }

        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ProductsEnvelope::failure(LOAD_FAILED_MESSAGE)),
        )
            .into_response()
    }
}
