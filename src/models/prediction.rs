use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Body of `POST /predict`. The ticker is kept loosely typed so that a
/// non-string value is reported as a validation error instead of a
/// deserialization failure.
#[derive(Debug, Clone, Deserialize)]
pub struct PredictRequest {
    #[serde(default)]
    pub ticker: Option<Value>,
}

impl PredictRequest {
    pub fn ticker_str(&self) -> Option<&str> {
        self.ticker.as_ref().and_then(Value::as_str)
    }
}

/// Actual versus predicted closes for the held-out tail of the window.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionPayload {
    dates: Vec<String>,
    actual: Vec<f64>,
    predicted: Vec<f64>,
}

impl PredictionPayload {
    pub fn new(dates: Vec<String>, actual: Vec<f64>, predicted: Vec<f64>) -> Result<Self, String> {
        if dates.len() != actual.len() || actual.len() != predicted.len() {
            return Err(format!(
                "payload sequences differ in length: dates={}, actual={}, predicted={}",
                dates.len(),
                actual.len(),
                predicted.len()
            ));
        }
        Ok(Self { dates, actual, predicted })
    }

    pub fn dates(&self) -> &[String] {
        &self.dates
    }

    pub fn actual(&self) -> &[f64] {
        &self.actual
    }

    pub fn predicted(&self) -> &[f64] {
        &self.predicted
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

impl ErrorBody {
    pub fn new(error: impl Into<String>) -> Self {
        Self { error: error.into() }
    }
}
