//! Catalog sources: where raw items come from before normalization.
//!
//! `JellyfinSource` pulls every audio item from a Jellyfin server in one
//! request; `JsonFileSource` reads a saved copy of the same response, which is
//! handy for offline runs and tests.

use reqwest::blocking::Client;
use reqwest::header::ACCEPT;
use reqwest::Url;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::models::{CatalogResponse, RawItem};

const USER_AGENT: &str = concat!("jellyfin-index/", env!("CARGO_PKG_VERSION"));

/// Anything that can produce the raw catalog for one sync run.
pub trait CatalogSource {
    /// Human-readable origin for logs. Must not include credentials.
    fn describe(&self) -> String;

    fn fetch(&self) -> Result<Vec<RawItem>>;
}

/// Decode an `/Items` response body.
pub fn parse_catalog(body: &[u8]) -> Result<Vec<RawItem>> {
    let response: CatalogResponse = serde_json::from_slice(body)?;
    Ok(response.items)
}

// ============================================================================
// Jellyfin
// ============================================================================

pub struct JellyfinSource {
    base: Url,
    api_key: String,
    timeout: Duration,
    client: Client,
}

impl JellyfinSource {
    /// `addr` is `host:port`, optionally with an `http://`/`https://` scheme.
    pub fn new(addr: &str, api_key: &str, timeout: Duration) -> Result<Self> {
        let with_scheme = if addr.starts_with("http://") || addr.starts_with("https://") {
            addr.trim_end_matches('/').to_string()
        } else {
            format!("http://{}", addr.trim_end_matches('/'))
        };
        let base = Url::parse(&format!("{}/Items/", with_scheme))
            .map_err(|e| Error::Fetch(format!("invalid Jellyfin address {addr:?}: {e}")))?;

        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Fetch(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            base,
            api_key: api_key.to_string(),
            timeout,
            client,
        })
    }

    /// Full request URL, api key included.
    pub fn items_url(&self) -> Url {
        let mut url = self.base.clone();
        url.query_pairs_mut()
            .append_pair("apiKey", &self.api_key)
            .append_pair("recursive", "true")
            .append_pair("includeItemTypes", "Audio");
        url
    }
}

impl CatalogSource for JellyfinSource {
    fn describe(&self) -> String {
        self.base.to_string()
    }

    fn fetch(&self) -> Result<Vec<RawItem>> {
        let timeout = self.timeout;
        let to_error = |e: reqwest::Error| {
            if e.is_timeout() {
                Error::FetchTimeout(timeout)
            } else {
                Error::Fetch(e.without_url().to_string())
            }
        };

        debug!(url = %self.base, "requesting catalog");
        let response = self
            .client
            .get(self.items_url())
            .header(ACCEPT, "application/json")
            .send()
            .map_err(to_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Fetch(format!("{} returned {}", self.base, status)));
        }

        let body = response.bytes().map_err(to_error)?;
        let items = parse_catalog(&body)?;
        info!(items = items.len(), source = %self.base, "catalog fetched");
        Ok(items)
    }
}

// ============================================================================
// JSON dump
// ============================================================================

pub struct JsonFileSource {
    path: PathBuf,
}

impl JsonFileSource {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl CatalogSource for JsonFileSource {
    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    fn fetch(&self) -> Result<Vec<RawItem>> {
        let body = std::fs::read(&self.path)?;
        let items = parse_catalog(&body)?;
        info!(items = items.len(), source = %self.path.display(), "catalog loaded");
        Ok(items)
    }
}
