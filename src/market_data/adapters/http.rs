// Thin reqwest wrapper shared by every adapter.
// Maps transport, status and body failures onto distinct MarketDataError kinds.

use std::time::Duration;

use serde::de::DeserializeOwned;
use tracing::{debug, trace};

use crate::market_data::error::{MarketDataError, Result};

#[derive(Debug, Clone)]
pub struct HttpClient {
    inner: reqwest::Client,
    timeout: Duration,
}

impl HttpClient {
    /// Client with a bounded per-request timeout.
    pub fn new(timeout: Duration) -> Result<Self> {
        let inner = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .build()
            .map_err(|e| MarketDataError::Client(e.to_string()))?;
        Ok(Self { inner, timeout })
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// GET `url` and decode the JSON body into `T`.
    pub async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        debug!(url, "GET");
        let response = self
            .inner
            .get(url)
            .send()
            .await
            .map_err(|e| self.network_error(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(MarketDataError::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| self.network_error(url, e))?;
        trace!(url, bytes = body.len(), "response body received");

        serde_json::from_slice(&body).map_err(|e| MarketDataError::Parse {
            url: url.to_string(),
            message: e.to_string(),
        })
    }

    fn network_error(&self, url: &str, err: reqwest::Error) -> MarketDataError {
        let message = if err.is_timeout() {
            format!("timed out after {:?}", self.timeout)
        } else {
            err.to_string()
        };
        MarketDataError::Network {
            url: url.to_string(),
            message,
        }
    }
}
