use thiserror::Error;

use crate::market_data::types::SourceId;

/// Errors surfaced by adapters, the cache store and the aggregator.
///
/// `Clone` because one single-flight outcome is handed to every waiter.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MarketDataError {
    #[error("network error requesting {url}: {message}")]
    Network { url: String, message: String },

    #[error("{url} answered with HTTP {status}")]
    HttpStatus { url: String, status: u16 },

    #[error("malformed response from {url}: {message}")]
    Parse { url: String, message: String },

    #[error("market data source {0} is not registered")]
    SourceNotFound(SourceId),

    #[error("all {} market data sources failed: {}", .0.len(), summarize(.0))]
    AllSourcesFailed(Vec<(SourceId, MarketDataError)>),

    #[error("fetch task for {source_id} aborted: {reason}")]
    TaskAborted { source_id: SourceId, reason: String },

    #[error("http client setup failed: {0}")]
    Client(String),
}

impl MarketDataError {
    /// Connection failures and timeouts, including a missed fan-out deadline.
    pub fn is_network(&self) -> bool {
        matches!(self, MarketDataError::Network { .. })
    }
}

fn summarize(errors: &[(SourceId, MarketDataError)]) -> String {
    errors
        .iter()
        .map(|(source, err)| format!("{source}: {err}"))
        .collect::<Vec<_>>()
        .join("; ")
}

pub type Result<T> = std::result::Result<T, MarketDataError>;
