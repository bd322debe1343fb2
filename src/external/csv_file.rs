use crate::external::price_provider::{PriceProvider, PriceProviderError};
use crate::models::{DateRange, RawPriceRow};
use async_trait::async_trait;
use chrono::NaiveDate;
use csv::{ReaderBuilder, StringRecord, Trim};
use std::path::PathBuf;

/// Reads `<data_dir>/<TICKER>.csv` exports with at least `Date` and `Close`
/// columns. Useful for frozen, reproducible runs without network access.
pub struct CsvPriceProvider {
    data_dir: PathBuf,
    adjusted_close: bool,
}

impl CsvPriceProvider {
    pub fn new(data_dir: PathBuf, adjusted_close: bool) -> Self {
        Self {
            data_dir,
            adjusted_close,
        }
    }

    fn path_for(&self, ticker: &str) -> PathBuf {
        self.data_dir.join(format!("{}.csv", ticker))
    }
}

fn column(headers: &StringRecord, name: &str) -> Option<usize> {
    headers.iter().position(|h| h.eq_ignore_ascii_case(name))
}

fn parse_date_cell(cell: &str) -> Result<Option<NaiveDate>, PriceProviderError> {
    if cell.is_empty() {
        return Ok(None);
    }
    // Exports sometimes carry a time and offset after the date.
    let day = cell.get(..10).unwrap_or(cell);
    NaiveDate::parse_from_str(day, "%Y-%m-%d")
        .map(Some)
        .map_err(|e| PriceProviderError::Parse(format!("date '{}': {}", cell, e)))
}

fn parse_close_cell(cell: &str) -> Result<Option<f64>, PriceProviderError> {
    if cell.is_empty() || cell.eq_ignore_ascii_case("null") {
        return Ok(None);
    }
    cell.parse::<f64>()
        .map(Some)
        .map_err(|e| PriceProviderError::Parse(format!("close '{}': {}", cell, e)))
}

fn parse_csv(
    bytes: &[u8],
    range: DateRange,
    adjusted_close: bool,
) -> Result<Vec<RawPriceRow>, PriceProviderError> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .trim(Trim::All)
        .flexible(true)
        .from_reader(bytes);

    let headers = reader
        .headers()
        .map_err(|e| PriceProviderError::Parse(e.to_string()))?
        .clone();

    let date_idx = column(&headers, "Date")
        .ok_or_else(|| PriceProviderError::BadResponse("missing Date column".into()))?;
    let adj_idx = column(&headers, "Adj Close").filter(|_| adjusted_close);
    let close_idx = adj_idx
        .or_else(|| column(&headers, "Close"))
        .ok_or_else(|| PriceProviderError::BadResponse("missing Close column".into()))?;

    let mut out = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| PriceProviderError::Parse(e.to_string()))?;

        let date = parse_date_cell(record.get(date_idx).unwrap_or(""))?;
        if let Some(d) = date {
            if !range.contains(d) {
                continue;
            }
        }

        let close = parse_close_cell(record.get(close_idx).unwrap_or(""))?;
        out.push(RawPriceRow { date, close });
    }

    Ok(out)
}

#[async_trait]
impl PriceProvider for CsvPriceProvider {
    async fn fetch_price_history(
        &self,
        ticker: &str,
        range: DateRange,
    ) -> Result<Vec<RawPriceRow>, PriceProviderError> {
        let path = self.path_for(ticker);

        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(PriceProviderError::BadResponse(format!(
                    "failed to read {}: {}",
                    path.display(),
                    e
                )))
            }
        };

        parse_csv(&bytes, range, self.adjusted_close)
    }

    fn name(&self) -> &'static str {
        "csv"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn window() -> DateRange {
        DateRange::new(
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(),
        )
        .unwrap()
    }

    const EXPORT: &str = "Date,Open,High,Low,Close,Adj Close,Volume\n\
        2023-12-29,10,11,9,10.5,10.4,100\n\
        2024-01-02,10,11,9,11.0,10.9,100\n\
        2024-01-03 00:00:00-05:00,10,11,9,,,100\n\
        2024-01-04,10,11,9,12.0,11.9,100\n";

    #[test]
    fn test_reads_rows_inside_window() {
        let rows = parse_csv(EXPORT.as_bytes(), window(), false).unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].close, Some(11.0));
        assert_eq!(rows[1].date.unwrap().to_string(), "2024-01-03");
        assert_eq!(rows[1].close, None);
    }

    #[test]
    fn test_prefers_adj_close_column() {
        let rows = parse_csv(EXPORT.as_bytes(), window(), true).unwrap();
        assert_eq!(rows[0].close, Some(10.9));
        assert_eq!(rows[2].close, Some(11.9));
    }

    #[test]
    fn test_falls_back_to_close_without_adj_column() {
        let csv = "date,close\n2024-01-02,5.5\n";
        let rows = parse_csv(csv.as_bytes(), window(), true).unwrap();
        assert_eq!(rows[0].close, Some(5.5));
    }

    #[test]
    fn test_missing_columns_are_rejected() {
        let csv = "Day,Price\n2024-01-02,5.5\n";
        assert!(matches!(
            parse_csv(csv.as_bytes(), window(), false),
            Err(PriceProviderError::BadResponse(_))
        ));
    }

    #[tokio::test]
    async fn test_unknown_ticker_returns_no_rows() {
        let dir = tempdir().unwrap();
        let provider = CsvPriceProvider::new(dir.path().to_path_buf(), true);

        let rows = provider.fetch_price_history("ZZZZINVALID", window()).await.unwrap();
        assert!(rows.is_empty());
    }

    #[tokio::test]
    async fn test_reads_file_named_after_ticker() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("MSFT.csv"), EXPORT).unwrap();
        let provider = CsvPriceProvider::new(dir.path().to_path_buf(), false);

        let rows = provider.fetch_price_history("MSFT", window()).await.unwrap();
        assert_eq!(rows.len(), 3);
    }
}
