//! HTTP probe -- `GET` requests with `Accept: application/json`
//!
//! Every request is bounded by the `[http]` timeout. Transport failures map to
//! [`ConnectionError::Unreachable`]; a body that is not JSON maps to
//! [`ConnectionError::InvalidResponse`] only when the caller asks for JSON.

use std::time::Duration;

use reqwest::header::ACCEPT;
use serde_json::Value;
use tracing::debug;
use url::Url;

use tradespec_core::error::ConnectionError;

/// Reusable HTTP client for suite requests.
#[derive(Debug, Clone)]
pub struct HttpProbe {
    client: reqwest::Client,
}

/// Status and raw body of one response.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub url: String,
    pub status: u16,
    pub body: String,
}

impl HttpProbe {
    /// Build a probe whose requests time out after `timeout`.
    pub fn new(timeout: Duration) -> Result<Self, ConnectionError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ConnectionError::Unreachable {
                endpoint: "http client".to_owned(),
                reason: e.to_string(),
            })?;
        Ok(Self { client })
    }

    /// Issue `GET url` and read the whole body.
    pub async fn get(&self, url: &Url) -> Result<HttpResponse, ConnectionError> {
        let unreachable = |e: reqwest::Error| ConnectionError::Unreachable {
            endpoint: url.to_string(),
            reason: e.to_string(),
        };

        let response = self
            .client
            .get(url.clone())
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(unreachable)?;
        let status = response.status().as_u16();
        let body = response.text().await.map_err(unreachable)?;

        debug!(url = %url, status, bytes = body.len(), "http response");
        Ok(HttpResponse {
            url: url.to_string(),
            status,
            body,
        })
    }
}

impl HttpResponse {
    /// Decode the body as JSON.
    pub fn json(&self) -> Result<Value, ConnectionError> {
        serde_json::from_str(&self.body).map_err(|e| ConnectionError::InvalidResponse {
            endpoint: self.url.clone(),
            reason: e.to_string(),
        })
    }
}
