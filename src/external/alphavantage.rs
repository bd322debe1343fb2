use crate::external::price_provider::{PriceProvider, PriceProviderError};
use crate::models::{DateRange, RawPriceRow};
use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Deserialize;
use std::collections::BTreeMap;

const QUERY_URL: &str = "https://www.alphavantage.co/query";

pub struct AlphaVantageProvider {
    client: reqwest::Client,
    api_key: String,
    adjusted_close: bool,
}

impl AlphaVantageProvider {
    pub fn new(api_key: String, adjusted_close: bool) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
            adjusted_close,
        }
    }

    fn function(&self) -> &'static str {
        if self.adjusted_close {
            "TIME_SERIES_DAILY_ADJUSTED"
        } else {
            "TIME_SERIES_DAILY"
        }
    }
}

#[derive(Debug, Deserialize)]
struct AvDailyResponse {
    // Both daily functions use the same key.
    #[serde(rename = "Time Series (Daily)")]
    time_series: Option<BTreeMap<String, AvDailyBar>>,

    // Throttle response: { "Note": "Thank you for using Alpha Vantage! ... 5 calls per minute ..." }
    #[serde(rename = "Note")]
    note: Option<String>,

    // Daily quota and premium-endpoint notices.
    #[serde(rename = "Information")]
    information: Option<String>,

    // Unknown symbol: { "Error Message": "Invalid API call. ..." }
    #[serde(rename = "Error Message")]
    error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AvDailyBar {
    #[serde(rename = "4. close")]
    close: Option<String>,
    #[serde(rename = "5. adjusted close")]
    adjusted_close: Option<String>,
}

fn parse_daily(
    body: AvDailyResponse,
    range: DateRange,
    adjusted_close: bool,
) -> Result<Vec<RawPriceRow>, PriceProviderError> {
    if body.note.is_some() {
        return Err(PriceProviderError::RateLimited);
    }

    if let Some(info) = body.information {
        if info.to_lowercase().contains("rate limit") {
            return Err(PriceProviderError::RateLimited);
        }
        return Err(PriceProviderError::BadResponse(info));
    }

    if body.error_message.is_some() {
        return Err(PriceProviderError::NotFound);
    }

    let series = body
        .time_series
        .ok_or_else(|| PriceProviderError::BadResponse("missing time series".into()))?;

    let mut out = Vec::with_capacity(series.len());

    // series is keyed by "YYYY-MM-DD" strings; BTreeMap iterates ascending
    for (date_str, bar) in series {
        let date = NaiveDate::parse_from_str(&date_str, "%Y-%m-%d")
            .map_err(|e| PriceProviderError::Parse(e.to_string()))?;

        if !range.contains(date) {
            continue;
        }

        let raw_close = if adjusted_close {
            bar.adjusted_close.or(bar.close)
        } else {
            bar.close
        };

        let close = raw_close
            .filter(|s| !s.trim().is_empty())
            .map(|s| {
                s.trim()
                    .parse::<f64>()
                    .map_err(|e| PriceProviderError::Parse(format!("close '{}': {}", s, e)))
            })
            .transpose()?;

        out.push(RawPriceRow {
            date: Some(date),
            close,
        });
    }

    Ok(out)
}

#[async_trait]
impl PriceProvider for AlphaVantageProvider {
    async fn fetch_price_history(
        &self,
        ticker: &str,
        range: DateRange,
    ) -> Result<Vec<RawPriceRow>, PriceProviderError> {
        // compact only covers ~100 sessions; a multi-year window needs full
        let resp = self
            .client
            .get(QUERY_URL)
            .query(&[
                ("function", self.function()),
                ("symbol", ticker),
                ("outputsize", "full"),
                ("apikey", self.api_key.as_str()),
            ])
            .send()
            .await
            .map_err(|e| PriceProviderError::Network(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(PriceProviderError::BadResponse(format!("HTTP {}", resp.status())));
        }

        let body = resp
            .json::<AvDailyResponse>()
            .await
            .map_err(|e| PriceProviderError::Parse(e.to_string()))?;

        parse_daily(body, range, self.adjusted_close)
    }

    fn name(&self) -> &'static str {
        "alphavantage"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn window() -> DateRange {
        DateRange::new(
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 5).unwrap(),
        )
        .unwrap()
    }

    fn parse(json: &str, adjusted: bool) -> Result<Vec<RawPriceRow>, PriceProviderError> {
        let body: AvDailyResponse = serde_json::from_str(json).unwrap();
        parse_daily(body, window(), adjusted)
    }

    const DAILY: &str = r#"{
        "Meta Data": {"2. Symbol": "IBM"},
        "Time Series (Daily)": {
            "2024-01-05": {"4. close": "159.1600", "5. adjusted close": "153.01"},
            "2024-01-04": {"4. close": "158.6800", "5. adjusted close": "152.55"},
            "2024-01-03": {"4. close": "", "5. adjusted close": ""},
            "2024-01-02": {"4. close": "158.6000", "5. adjusted close": "152.47"},
            "2023-12-29": {"4. close": "163.5500", "5. adjusted close": "157.23"}
        }
    }"#;

    #[test]
    fn test_filters_to_window_in_ascending_order() {
        let rows = parse(DAILY, false).unwrap();
        let dates: Vec<_> = rows.iter().map(|r| r.date.unwrap().to_string()).collect();
        assert_eq!(dates, vec!["2024-01-02", "2024-01-03", "2024-01-04"]);
        assert_eq!(rows[0].close, Some(158.6));
        assert_eq!(rows[1].close, None);
    }

    #[test]
    fn test_reads_adjusted_close_when_enabled() {
        let rows = parse(DAILY, true).unwrap();
        assert_eq!(rows[0].close, Some(152.47));
        assert_eq!(rows[2].close, Some(152.55));
    }

    #[test]
    fn test_classifies_error_bodies() {
        let throttled = r#"{"Note": "Thank you for using Alpha Vantage! Our standard API call frequency is 5 calls per minute"}"#;
        assert!(matches!(parse(throttled, false), Err(PriceProviderError::RateLimited)));

        let unknown = r#"{"Error Message": "Invalid API call. Please retry or visit the documentation"}"#;
        assert!(matches!(parse(unknown, false), Err(PriceProviderError::NotFound)));

        let premium = r#"{"Information": "This is a premium endpoint."}"#;
        assert!(matches!(parse(premium, false), Err(PriceProviderError::BadResponse(_))));
    }

    #[test]
    fn test_garbled_close_is_a_parse_error() {
        let json = r#"{"Time Series (Daily)": {"2024-01-02": {"4. close": "n/a"}}}"#;
        assert!(matches!(parse(json, false), Err(PriceProviderError::Parse(_))));
    }
}
