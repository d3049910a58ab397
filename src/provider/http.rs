//! Production [`Transport`]: a blocking `reqwest` client with a request timeout.

use anyhow::{Context, Result};
use std::time::Duration;

use super::service::Transport;
use super::ProviderError;
use crate::events::SourceKind;

pub struct HttpTransport {
    client: reqwest::blocking::Client,
    base_url: String,
}

impl HttpTransport {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .user_agent(concat!("skyarc/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}

impl Transport for HttpTransport {
    fn get(&self, path: &str, query: &[(&str, String)]) -> Result<String, ProviderError> {
        let url = self.url(path);
        log_debug!("GET {url}");

        let response = self
            .client
            .get(&url)
            .query(query)
            .send()
            .map_err(|e| {
                let reason = if e.is_timeout() {
                    format!("request to {path} timed out")
                } else {
                    format!("request to {path} failed: {e}")
                };
                ProviderError::unavailable(SourceKind::Service, reason)
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProviderError::unavailable(
                SourceKind::Service,
                format!("{path} answered with status {status}"),
            ));
        }

        response.text().map_err(|e| {
            ProviderError::unavailable(SourceKind::Service, format!("reading {path} failed: {e}"))
        })
    }
}
