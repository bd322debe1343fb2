use crate::external::price_provider::{PriceProvider, PriceProviderError};
use crate::models::{DateRange, RawPriceRow};
use async_trait::async_trait;
use chrono::{DateTime, NaiveTime};
use serde::Deserialize;
use std::time::Duration;

const CHART_URL: &str = "https://query1.finance.yahoo.com/v8/finance/chart";

/// Yahoo Finance chart API. No API key required.
pub struct YahooFinanceProvider {
    client: reqwest::Client,
    adjusted_close: bool,
}

impl YahooFinanceProvider {
    pub fn new(adjusted_close: bool) -> Self {
        Self {
            client: reqwest::Client::builder()
                .user_agent("Mozilla/5.0 (compatible; Trendcast/0.1)")
                .connect_timeout(Duration::from_secs(10))
                .build()
                .unwrap_or_else(|_| reqwest::Client::new()),
            adjusted_close,
        }
    }
}

#[derive(Debug, Deserialize)]
struct YahooChartResponse {
    chart: YahooChart,
}

#[derive(Debug, Deserialize)]
struct YahooChart {
    result: Option<Vec<YahooResult>>,
    error: Option<YahooError>,
}

#[derive(Debug, Deserialize)]
struct YahooError {
    #[serde(default)]
    code: String,
    #[serde(default)]
    description: String,
}

#[derive(Debug, Deserialize)]
struct YahooResult {
    #[serde(default)]
    meta: Option<YahooMeta>,
    // Absent when the symbol had no sessions inside the window.
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: YahooIndicators,
}

#[derive(Debug, Deserialize)]
struct YahooMeta {
    #[serde(default)]
    gmtoffset: i64,
}

#[derive(Debug, Deserialize)]
struct YahooIndicators {
    #[serde(default)]
    quote: Vec<YahooQuote>,
    #[serde(default)]
    adjclose: Vec<YahooAdjClose>,
}

#[derive(Debug, Deserialize)]
struct YahooQuote {
    #[serde(default)]
    close: Vec<Option<f64>>,
}

#[derive(Debug, Deserialize)]
struct YahooAdjClose {
    #[serde(default)]
    adjclose: Vec<Option<f64>>,
}

/// Converts a chart response into raw rows for `range`.
fn parse_chart(
    body: YahooChartResponse,
    range: DateRange,
    adjusted_close: bool,
) -> Result<Vec<RawPriceRow>, PriceProviderError> {
    if let Some(error) = body.chart.error {
        if error.code == "Not Found" || error.description.contains("No data found") {
            return Err(PriceProviderError::NotFound);
        }
        return Err(PriceProviderError::BadResponse(error.description));
    }

    let Some(result) = body.chart.result.and_then(|r| r.into_iter().next()) else {
        return Ok(Vec::new());
    };

    if result.timestamp.is_empty() {
        return Ok(Vec::new());
    }

    let adjusted = result
        .indicators
        .adjclose
        .first()
        .map(|a| &a.adjclose)
        .filter(|a| adjusted_close && !a.is_empty());

    let closes = match adjusted {
        Some(adj) => adj,
        None => &result
            .indicators
            .quote
            .first()
            .ok_or_else(|| PriceProviderError::BadResponse("No quote data in response".into()))?
            .close,
    };

    if closes.len() != result.timestamp.len() {
        return Err(PriceProviderError::Parse(format!(
            "timestamp and close arrays differ in length ({} vs {})",
            result.timestamp.len(),
            closes.len()
        )));
    }

    // Session timestamps are UTC; shift into exchange time before taking the date.
    let gmtoffset = result.meta.map(|m| m.gmtoffset).unwrap_or(0);

    let rows = result
        .timestamp
        .iter()
        .zip(closes.iter())
        .map(|(ts, close)| RawPriceRow {
            date: DateTime::from_timestamp(ts + gmtoffset, 0).map(|dt| dt.date_naive()),
            close: *close,
        })
        .filter(|row| row.date.map_or(true, |d| range.contains(d)))
        .collect();

    Ok(rows)
}

#[async_trait]
impl PriceProvider for YahooFinanceProvider {
    async fn fetch_price_history(
        &self,
        ticker: &str,
        range: DateRange,
    ) -> Result<Vec<RawPriceRow>, PriceProviderError> {
        let url = format!("{}/{}", CHART_URL, ticker);
        let period1 = range.start.and_time(NaiveTime::MIN).and_utc().timestamp();
        let period2 = range.end.and_time(NaiveTime::MIN).and_utc().timestamp();

        let resp = self
            .client
            .get(&url)
            .query(&[
                ("period1", period1.to_string()),
                ("period2", period2.to_string()),
                ("interval", "1d".to_string()),
                ("includeAdjustedClose", "true".to_string()),
                ("events", "div,split".to_string()),
            ])
            .send()
            .await
            .map_err(|e| PriceProviderError::Network(e.to_string()))?;

        let status = resp.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(PriceProviderError::RateLimited);
        }
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(PriceProviderError::NotFound);
        }
        if !status.is_success() {
            return Err(PriceProviderError::BadResponse(format!("HTTP {}", status)));
        }

        let body: YahooChartResponse = resp
            .json()
            .await
            .map_err(|e| PriceProviderError::Parse(e.to_string()))?;

        parse_chart(body, range, self.adjusted_close)
    }

    fn name(&self) -> &'static str {
        "yahoo"
    }
}
