use async_trait::async_trait;
use thiserror::Error;

use crate::models::{DateRange, RawPriceRow};

#[derive(Debug, Error)]
pub enum PriceProviderError {
    #[error("network error: {0}")]
    Network(String),

    #[error("bad response: {0}")]
    BadResponse(String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("rate limited")]
    RateLimited,

    #[error("no data available for ticker")]
    NotFound,
}

/// Read-only source of daily closing prices.
///
/// Implementations return the rows they have for `ticker` inside `range`
/// (end exclusive), in any order and possibly with missing values. An empty
/// vector means the source has nothing for that ticker and window.
#[async_trait]
pub trait PriceProvider: Send + Sync {
    async fn fetch_price_history(
        &self,
        ticker: &str,
        range: DateRange,
    ) -> Result<Vec<RawPriceRow>, PriceProviderError>;

    /// Short identifier used in log lines.
    fn name(&self) -> &'static str;
}
