use chrono::{Datelike, NaiveDate};
use ndarray::{s, Array1, ArrayView1};

use crate::models::PriceSeries;

/// Proleptic Gregorian ordinal: 0001-01-01 is day 1.
pub fn date_ordinal(date: NaiveDate) -> f64 {
    f64::from(date.num_days_from_ce())
}

/// Regression inputs derived from a cleaned series, one row per session.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    dates: Vec<NaiveDate>,
    features: Array1<f64>,
    labels: Array1<f64>,
}

/// Borrowed, contiguous run of dataset rows.
#[derive(Debug, Clone, Copy)]
pub struct DatasetView<'a> {
    pub dates: &'a [NaiveDate],
    pub features: ArrayView1<'a, f64>,
    pub labels: ArrayView1<'a, f64>,
}

impl DatasetView<'_> {
    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }
}

/// Chronological train/test partition. `train` always precedes `test`.
#[derive(Debug, Clone, Copy)]
pub struct Split<'a> {
    pub train: DatasetView<'a>,
    pub test: DatasetView<'a>,
}

impl Dataset {
    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    pub fn view(&self) -> DatasetView<'_> {
        DatasetView {
            dates: &self.dates,
            features: self.features.view(),
            labels: self.labels.view(),
        }
    }
}

/// Encodes each date as its ordinal (the sole feature) with the close as label.
pub fn featurize(series: &PriceSeries) -> Dataset {
    let points = series.points();
    Dataset {
        dates: points.iter().map(|p| p.date).collect(),
        features: points.iter().map(|p| date_ordinal(p.date)).collect(),
        labels: points.iter().map(|p| p.close).collect(),
    }
}

/// Index of the first test row: `floor(train_ratio * n)`, clamped to `n`.
pub fn split_index(n: usize, train_ratio: f64) -> usize {
    ((n as f64 * train_ratio).floor() as usize).min(n)
}

/// Splits at `split_index` without reordering rows.
pub fn chronological_split(dataset: &Dataset, train_ratio: f64) -> Split<'_> {
    let k = split_index(dataset.len(), train_ratio);
    let (train_dates, test_dates) = dataset.dates.split_at(k);

    Split {
        train: DatasetView {
            dates: train_dates,
            features: dataset.features.slice(s![..k]),
            labels: dataset.labels.slice(s![..k]),
        },
        test: DatasetView {
            dates: test_dates,
            features: dataset.features.slice(s![k..]),
            labels: dataset.labels.slice(s![k..]),
        },
    }
}
