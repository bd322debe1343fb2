use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::errors::AppError;

pub const MAX_TICKER_LEN: usize = 16;

static TICKER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z0-9.\-^=]+$").expect("static ticker pattern"));

// Normalized security symbol: trimmed, uppercased, non-empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Ticker(String);

impl Ticker {
    pub fn parse(raw: &str) -> Result<Self, AppError> {
        let symbol = raw.trim().to_uppercase();

        if symbol.is_empty() {
            return Err(AppError::Validation(
                "Ticker symbol must be a non-empty string.".to_string(),
            ));
        }

        if symbol.chars().count() > MAX_TICKER_LEN || !TICKER_RE.is_match(&symbol) {
            return Err(AppError::Validation(format!(
                "Ticker symbol '{}' is not valid. Use at most {} letters, digits or . - ^ = characters.",
                symbol, MAX_TICKER_LEN
            )));
        }

        Ok(Self(symbol))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Ticker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Ticker {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
