use std::sync::Arc;

use thiserror::Error;
use tokio::time::timeout;
use tracing::{error, info, warn};

use crate::config::PredictionConfig;
use crate::external::price_provider::{PriceProvider, PriceProviderError};
use crate::models::{PredictionPayload, PriceSeries, Ticker};
use crate::services::dataset::{chronological_split, featurize, DatasetView};
use crate::services::regression::Regressor;

pub const INTERNAL_PREDICTION_MESSAGE: &str =
    "An internal server error occurred while processing the data.";

/// Terminal non-success outcomes of a prediction run.
#[derive(Debug, Error, PartialEq)]
pub enum PredictionError {
    #[error("No data found for ticker '{0}'. Please check the symbol.")]
    NoDataFound(String),

    #[error("Not enough historical data for '{ticker}' to create a prediction.")]
    InsufficientData {
        ticker: String,
        rows: usize,
        required: usize,
    },

    #[error("Not enough recent data for '{0}' to form a valid test set.")]
    EmptyTestSet(String),

    /// Carries the concrete failure for logs only; its `Display` is generic.
    #[error("An internal server error occurred while processing the data.")]
    Internal(String),
}

/// Fits a trend line on the early part of a ticker's history and reports how
/// it tracks the held-out tail.
#[derive(Clone)]
pub struct PredictionService {
    provider: Arc<dyn PriceProvider>,
    regressor: Arc<dyn Regressor>,
    config: PredictionConfig,
}

impl PredictionService {
    pub fn new(
        provider: Arc<dyn PriceProvider>,
        regressor: Arc<dyn Regressor>,
        config: PredictionConfig,
    ) -> Self {
        Self {
            provider,
            regressor,
            config,
        }
    }

    pub fn config(&self) -> &PredictionConfig {
        &self.config
    }

    pub async fn predict(&self, ticker: &Ticker) -> Result<PredictionPayload, PredictionError> {
        info!(
            "Starting prediction for {} ({} to {}, provider={})",
            ticker,
            self.config.window.start,
            self.config.window.end,
            self.provider.name()
        );

        let fetch = self
            .provider
            .fetch_price_history(ticker.as_str(), self.config.window);

        let rows = match timeout(self.config.fetch_timeout, fetch).await {
            Ok(Ok(rows)) => rows,
            Ok(Err(PriceProviderError::NotFound)) => Vec::new(),
            Ok(Err(e)) => {
                return Err(internal(ticker, format!("price retrieval failed: {}", e)));
            }
            Err(_) => {
                return Err(internal(
                    ticker,
                    format!(
                        "price retrieval timed out after {}s",
                        self.config.fetch_timeout.as_secs_f64()
                    ),
                ));
            }
        };

        let raw_rows = rows.len();
        let series = PriceSeries::from_raw(rows);

        if series.is_empty() {
            warn!("No usable price data for {} ({} raw rows)", ticker, raw_rows);
            return Err(PredictionError::NoDataFound(ticker.to_string()));
        }

        let dataset = featurize(&series);
        let required = self.config.min_history_rows;

        if dataset.len() < required {
            warn!(
                "Insufficient data for {}: {} rows, need at least {}",
                ticker,
                dataset.len(),
                required
            );
            return Err(PredictionError::InsufficientData {
                ticker: ticker.to_string(),
                rows: dataset.len(),
                required,
            });
        }

        let split = chronological_split(&dataset, self.config.train_ratio);

        if split.test.is_empty() {
            warn!("Test set for {} is empty after split", ticker);
            return Err(PredictionError::EmptyTestSet(ticker.to_string()));
        }

        // Only reachable with a small ratio configured; one point defines no line.
        if split.train.len() < 2 {
            warn!(
                "Training set for {} has {} rows after split",
                ticker,
                split.train.len()
            );
            return Err(PredictionError::InsufficientData {
                ticker: ticker.to_string(),
                rows: dataset.len(),
                required,
            });
        }

        let model = self
            .regressor
            .fit(split.train.features, split.train.labels)
            .map_err(|e| internal(ticker, format!("model fit failed: {}", e)))?;

        let predicted = model.predict(split.test.features);

        let payload = shape_payload(split.test, predicted.iter().copied().collect())
            .map_err(|e| internal(ticker, e))?;

        info!(
            "Prediction for {} complete: {} train rows, {} test rows, slope={:.6}, intercept={:.4}",
            ticker,
            split.train.len(),
            split.test.len(),
            model.slope(),
            model.intercept()
        );

        Ok(payload)
    }
}

fn internal(ticker: &Ticker, detail: String) -> PredictionError {
    error!("Unexpected error while predicting {}: {}", ticker, detail);
    PredictionError::Internal(detail)
}

/// Builds the chart payload for the test rows. `predicted` must hold exactly
/// one finite value per test row.
fn shape_payload(test: DatasetView<'_>, predicted: Vec<f64>) -> Result<PredictionPayload, String> {
    if let Some(bad) = predicted.iter().find(|p| !p.is_finite()) {
        return Err(format!("model produced a non-finite prediction ({})", bad));
    }

    let dates = test
        .dates
        .iter()
        .map(|d| d.format("%Y-%m-%d").to_string())
        .collect();

    PredictionPayload::new(dates, test.labels.to_vec(), predicted)
}
