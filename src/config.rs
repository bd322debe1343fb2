use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use chrono::NaiveDate;
use thiserror::Error;

use crate::models::DateRange;

pub const DEFAULT_HISTORY_START: &str = "2020-01-01";
pub const DEFAULT_HISTORY_END: &str = "2024-12-31";
pub const DEFAULT_MIN_HISTORY_ROWS: usize = 20;
pub const DEFAULT_TRAIN_RATIO: f64 = 0.8;
pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{var} has an invalid value '{value}': {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },
    #[error("{0} must be set")]
    Missing(&'static str),
}

/// Which historical price source backs the pipeline.
#[derive(Debug, Clone, PartialEq)]
pub enum ProviderKind {
    Yahoo,
    AlphaVantage { api_key: String },
    Csv { data_dir: PathBuf },
}

/// Parameters of the prediction pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct PredictionConfig {
    pub window: DateRange,
    pub min_history_rows: usize,
    pub train_ratio: f64,
    pub fetch_timeout: Duration,
    pub adjusted_close: bool,
}

impl Default for PredictionConfig {
    fn default() -> Self {
        Self {
            window: DateRange {
                start: NaiveDate::from_ymd_opt(2020, 1, 1).unwrap_or_default(),
                end: NaiveDate::from_ymd_opt(2024, 12, 31).unwrap_or_default(),
            },
            min_history_rows: DEFAULT_MIN_HISTORY_ROWS,
            train_ratio: DEFAULT_TRAIN_RATIO,
            fetch_timeout: Duration::from_secs(DEFAULT_FETCH_TIMEOUT_SECS),
            adjusted_close: true,
        }
    }
}

impl PredictionConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.window.start >= self.window.end {
            return Err(ConfigError::Invalid {
                var: "HISTORY_START",
                value: self.window.start.to_string(),
                reason: format!("must be before HISTORY_END ({})", self.window.end),
            });
        }
        if self.min_history_rows < 2 {
            return Err(ConfigError::Invalid {
                var: "MIN_HISTORY_ROWS",
                value: self.min_history_rows.to_string(),
                reason: "must be at least 2".into(),
            });
        }
        if !(self.train_ratio > 0.0 && self.train_ratio < 1.0) {
            return Err(ConfigError::Invalid {
                var: "TRAIN_RATIO",
                value: self.train_ratio.to_string(),
                reason: "must lie strictly between 0 and 1".into(),
            });
        }
        if self.fetch_timeout.is_zero() {
            return Err(ConfigError::Invalid {
                var: "FETCH_TIMEOUT_SECS",
                value: "0".into(),
                reason: "must be greater than zero".into(),
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub provider: ProviderKind,
    pub prediction: PredictionConfig,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup so it can be
    /// exercised without touching the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let start = parse_var(&lookup, "HISTORY_START", DEFAULT_HISTORY_START, parse_date)?;
        let end = parse_var(&lookup, "HISTORY_END", DEFAULT_HISTORY_END, parse_date)?;
        let min_history_rows = parse_var(&lookup, "MIN_HISTORY_ROWS", "20", parse_from_str::<usize>)?;
        let train_ratio = parse_var(&lookup, "TRAIN_RATIO", "0.8", parse_from_str::<f64>)?;
        let timeout_secs = parse_var(&lookup, "FETCH_TIMEOUT_SECS", "30", parse_from_str::<u64>)?;
        let adjusted_close = parse_var(&lookup, "ADJUSTED_CLOSE", "true", parse_bool)?;
        let bind_addr = parse_var(&lookup, "BIND_ADDR", "0.0.0.0:5000", parse_from_str::<SocketAddr>)?;

        let prediction = PredictionConfig {
            window: DateRange { start, end },
            min_history_rows,
            train_ratio,
            fetch_timeout: Duration::from_secs(timeout_secs),
            adjusted_close,
        };
        prediction.validate()?;

        let provider_name = lookup("PRICE_PROVIDER").unwrap_or_else(|| "yahoo".to_string());
        let provider = match provider_name.trim().to_lowercase().as_str() {
            "yahoo" => ProviderKind::Yahoo,
            "alphavantage" => ProviderKind::AlphaVantage {
                api_key: lookup("ALPHAVANTAGE_API_KEY")
                    .filter(|k| !k.trim().is_empty())
                    .ok_or(ConfigError::Missing("ALPHAVANTAGE_API_KEY"))?,
            },
            "csv" => ProviderKind::Csv {
                data_dir: PathBuf::from(lookup("PRICE_DATA_DIR").unwrap_or_else(|| "./data".to_string())),
            },
            _ => {
                return Err(ConfigError::Invalid {
                    var: "PRICE_PROVIDER",
                    value: provider_name,
                    reason: "must be 'yahoo', 'alphavantage' or 'csv'".into(),
                })
            }
        };

        Ok(Self {
            bind_addr,
            provider,
            prediction,
        })
    }
}

fn parse_var<F, T>(
    lookup: &F,
    var: &'static str,
    default: &str,
    parse: fn(&str) -> Result<T, String>,
) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let value = lookup(var).unwrap_or_else(|| default.to_string());
    parse(value.trim()).map_err(|reason| ConfigError::Invalid { var, value, reason })
}

fn parse_date(value: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|e| format!("expected YYYY-MM-DD ({})", e))
}

fn parse_bool(value: &str) -> Result<bool, String> {
    match value.to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err("expected true or false".into()),
    }
}

fn parse_from_str<T>(value: &str) -> Result<T, String>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value.parse::<T>().map_err(|e| e.to_string())
}
