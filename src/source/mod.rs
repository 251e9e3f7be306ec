//! Read-only client for the upstream record store (Airtable).

use std::env;
use std::fmt;
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE, USER_AGENT};
use reqwest::Url;
use thiserror::Error;
use tracing::{debug, warn};

use crate::catalog::{RecordPage, FIELD_ACTIVE, FIELD_ORDER};

pub const DEFAULT_API_BASE: &str = "https://api.airtable.com/v0/";
pub const DEFAULT_TABLE: &str = "Produits";
pub const DEFAULT_TOKEN_ENV: &str = "AIRTABLE_PERSONAL_ACCESS_TOKEN";
pub const DEFAULT_BASE_ID_ENV: &str = "AIRTABLE_BASE_ID";

#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("missing required setting {name}")]
    Missing { name: String },
}

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("record store responded with status {status}: {detail}")]
    Status { status: u16, detail: String },

    #[error("record store request failed: {source}")]
    Transport {
        #[source]
        source: reqwest::Error,
    },

    #[error("record store response could not be decoded: {source}")]
    Decode {
        #[source]
        source: reqwest::Error,
    },

    #[error("api base cannot carry a path: {url}")]
    InvalidApiBase { url: String },

    #[error("failed to build HTTP client: {source}")]
    HttpClientBuild {
        #[source]
        source: reqwest::Error,
    },

    #[error("failed to setup proxy: {proxy}: {source}")]
    ProxySetup {
        proxy: String,
        #[source]
        source: reqwest::Error,
    },
}

#[derive(Clone)]
pub struct Credentials {
    pub token: String,
    pub base_id: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("token", &"<redacted>")
            .field("base_id", &self.base_id)
            .finish()
    }
}

/// Where the access token and store id come from. `Env` is resolved on every
/// call so that rotated secrets are picked up without a restart.
#[derive(Clone)]
pub enum CredentialSource {
    Env { token_var: String, base_id_var: String },
    Fixed { token: Option<String>, base_id: Option<String> },
}

impl fmt::Debug for CredentialSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Env {
                token_var,
                base_id_var,
            } => f
                .debug_struct("Env")
                .field("token_var", token_var)
                .field("base_id_var", base_id_var)
                .finish(),
            Self::Fixed { base_id, .. } => f
                .debug_struct("Fixed")
                .field("token", &"<redacted>")
                .field("base_id", base_id)
                .finish(),
        }
    }
}

impl CredentialSource {
    pub fn from_env(token_var: impl Into<String>, base_id_var: impl Into<String>) -> Self {
        Self::Env {
            token_var: token_var.into(),
            base_id_var: base_id_var.into(),
        }
    }

    pub fn resolve(&self) -> Result<Credentials, CredentialError> {
        match self {
            Self::Env {
                token_var,
                base_id_var,
            } => Ok(Credentials {
                token: present(env::var(token_var).ok(), token_var)?,
                base_id: present(env::var(base_id_var).ok(), base_id_var)?,
            }),
            Self::Fixed { token, base_id } => Ok(Credentials {
                token: present(token.clone(), "token")?,
                base_id: present(base_id.clone(), "base id")?,
            }),
        }
    }
}

fn present(value: Option<String>, name: &str) -> Result<String, CredentialError> {
    value
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| CredentialError::Missing {
            name: name.to_string(),
        })
}

pub fn build_http_client(
    timeout_seconds: u64,
    proxy: Option<&str>,
) -> Result<reqwest::Client, SourceError> {
    let mut headers = HeaderMap::new();
    headers.insert(
        USER_AGENT,
        HeaderValue::from_static(concat!(
            env!("CARGO_PKG_NAME"),
            "/",
            env!("CARGO_PKG_VERSION")
        )),
    );

    let mut builder = reqwest::Client::builder()
        .default_headers(headers)
        .timeout(Duration::from_secs(timeout_seconds.max(1)));

    if let Some(proxy) = proxy.filter(|p| !p.trim().is_empty()) {
        let proxy = reqwest::Proxy::all(proxy).map_err(|e| SourceError::ProxySetup {
            proxy: proxy.to_string(),
            source: e,
        })?;
        builder = builder.proxy(proxy);
    }

    builder
        .build()
        .map_err(|e| SourceError::HttpClientBuild { source: e })
}

#[derive(Clone, Debug)]
pub struct RecordSource {
    client: reqwest::Client,
    api_base: Url,
    table: String,
}

impl RecordSource {
    pub fn new(client: reqwest::Client, api_base: Url, table: impl Into<String>) -> Self {
        Self {
            client,
            api_base,
            table: table.into(),
        }
    }

    /// Active records only, sorted ascending by display order.
    pub fn query_url(&self, base_id: &str) -> Result<Url, SourceError> {
        let mut url = self.api_base.clone();
        url.path_segments_mut()
            .map_err(|_| SourceError::InvalidApiBase {
                url: self.api_base.to_string(),
            })?
            .pop_if_empty()
            .push(base_id)
            .push(&self.table);
        url.query_pairs_mut()
            .append_pair("filterByFormula", &format!("{{{FIELD_ACTIVE}}}=1"))
            .append_pair("sort[0][field]", FIELD_ORDER)
            .append_pair("sort[0][direction]", "asc");
        Ok(url)
    }

    /// Issues a single list request. Pagination is not followed: when the
    /// store reports more pages only the first one is returned.
    pub async fn fetch_active(&self, credentials: &Credentials) -> Result<RecordPage, SourceError> {
        let url = self.query_url(&credentials.base_id)?;
        debug!(table = %self.table, "querying record store");

        let response = self
            .client
            .get(url)
            .bearer_auth(&credentials.token)
            .header(CONTENT_TYPE, "application/json")
            .send()
            .await
            .map_err(|e| SourceError::Transport { source: e })?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(SourceError::Status {
                status: status.as_u16(),
                detail,
            });
        }

        let page: RecordPage = response
            .json()
            .await
            .map_err(|e| SourceError::Decode { source: e })?;

        if page.offset.is_some() {
            warn!(
                records = page.records.len(),
                "record store result is paginated, serving the first page only"
            );
        }
        Ok(page)
    }
}
