use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;

/// A row as delivered by a data source. Either field may be absent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawPriceRow {
    pub date: Option<NaiveDate>,
    pub close: Option<f64>,
}

impl RawPriceRow {
    pub fn new(date: NaiveDate, close: f64) -> Self {
        Self {
            date: Some(date),
            close: Some(close),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub close: f64,
}

/// Historical window requested from a data source. `end` is exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, String> {
        if start >= end {
            return Err(format!(
                "history window start {} must be before end {}",
                start, end
            ));
        }
        Ok(Self { start, end })
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date < self.end
    }
}

/// Cleaned closing prices, strictly ascending by date with no gaps in the values.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PriceSeries {
    points: Vec<PricePoint>,
}

impl PriceSeries {
    /// Drops incomplete rows and orders the remainder by date.
    ///
    /// Rows with a missing date, a missing close or a non-finite close are
    /// discarded. When a date appears more than once the last row wins.
    pub fn from_raw(rows: impl IntoIterator<Item = RawPriceRow>) -> Self {
        let mut by_date: BTreeMap<NaiveDate, f64> = BTreeMap::new();

        for row in rows {
            let (Some(date), Some(close)) = (row.date, row.close) else {
                continue;
            };
            if !close.is_finite() {
                continue;
            }
            by_date.insert(date, close);
        }

        Self {
            points: by_date
                .into_iter()
                .map(|(date, close)| PricePoint { date, close })
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn points(&self) -> &[PricePoint] {
        &self.points
    }
}
