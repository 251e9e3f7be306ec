use reqwest::header::CONTENT_TYPE;
use reqwest::Url;
use thiserror::Error;
use tracing::debug;

use crate::catalog::{Product, ProductsEnvelope};

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("proxy request failed: {source}")]
    Transport {
        #[source]
        source: reqwest::Error,
    },

    #[error("proxy responded with status {status}")]
    Status { status: u16 },

    #[error("malformed proxy response: {message}")]
    Malformed { message: String },
}

/// Fetches the product list from the proxy endpoint.
#[derive(Clone, Debug)]
pub struct ProductLoader {
    client: reqwest::Client,
    endpoint: Url,
}

impl ProductLoader {
    pub fn new(client: reqwest::Client, endpoint: Url) -> Self {
        Self { client, endpoint }
    }

    pub async fn fetch(&self) -> Result<Vec<Product>, LoadError> {
        debug!(endpoint = %self.endpoint, "loading products");
        let response = self
            .client
            .get(self.endpoint.clone())
            .header(CONTENT_TYPE, "application/json")
            .send()
            .await
            .map_err(|e| LoadError::Transport { source: e })?;

        let status = response.status();
        if !status.is_success() {
            return Err(LoadError::Status {
                status: status.as_u16(),
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| LoadError::Transport { source: e })?;
        parse_envelope(&body)
    }
}

pub fn parse_envelope(body: &[u8]) -> Result<Vec<Product>, LoadError> {
    let envelope: ProductsEnvelope =
        serde_json::from_slice(body).map_err(|e| LoadError::Malformed {
            message: e.to_string(),
        })?;

    if !envelope.success {
        return Err(LoadError::Malformed {
            message: envelope
                .error
                .unwrap_or_else(|| "unknown error".to_string()),
        });
    }

    envelope.products.ok_or_else(|| LoadError::Malformed {
        message: "missing products".to_string(),
    })
}
