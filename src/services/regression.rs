//! Single-feature ordinary least squares.
//!
//! Fitting sits behind [`Regressor`] so the prediction pipeline can be driven
//! with deterministic fakes in tests.

use ndarray::{Array1, ArrayView1};
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum RegressionError {
    #[error("need at least 2 samples to fit, got {0}")]
    TooFewSamples(usize),

    #[error("feature and label lengths differ ({features} vs {labels})")]
    LengthMismatch { features: usize, labels: usize },

    #[error("feature has zero variance")]
    ZeroVariance,

    #[error("fit produced non-finite coefficients")]
    NonFinite,
}

/// A fitted `y = intercept + slope * x` model.
pub trait LinearModel: Send + Sync {
    /// One prediction per input row, same order.
    fn predict(&self, features: ArrayView1<'_, f64>) -> Array1<f64>;

    fn intercept(&self) -> f64;

    fn slope(&self) -> f64;
}

pub trait Regressor: Send + Sync {
    fn fit(
        &self,
        features: ArrayView1<'_, f64>,
        labels: ArrayView1<'_, f64>,
    ) -> Result<Box<dyn LinearModel>, RegressionError>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct OrdinaryLeastSquares;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FittedLine {
    slope: f64,
    x_mean: f64,
    y_mean: f64,
}

impl LinearModel for FittedLine {
    fn predict(&self, features: ArrayView1<'_, f64>) -> Array1<f64> {
        // Centred form keeps precision with ordinal-sized features.
        features.mapv(|x| self.y_mean + self.slope * (x - self.x_mean))
    }

    fn intercept(&self) -> f64 {
        self.y_mean - self.slope * self.x_mean
    }

    fn slope(&self) -> f64 {
        self.slope
    }
}

impl Regressor for OrdinaryLeastSquares {
    fn fit(
        &self,
        features: ArrayView1<'_, f64>,
        labels: ArrayView1<'_, f64>,
    ) -> Result<Box<dyn LinearModel>, RegressionError> {
        if features.len() != labels.len() {
            return Err(RegressionError::LengthMismatch {
                features: features.len(),
                labels: labels.len(),
            });
        }
        if features.len() < 2 {
            return Err(RegressionError::TooFewSamples(features.len()));
        }

        let x_mean = features.mean().ok_or(RegressionError::TooFewSamples(0))?;
        let y_mean = labels.mean().ok_or(RegressionError::TooFewSamples(0))?;

        let dx = features.mapv(|x| x - x_mean);
        let dy = labels.mapv(|y| y - y_mean);

        let sxx = dx.dot(&dx);
        let sxy = dx.dot(&dy);

        if sxx == 0.0 {
            return Err(RegressionError::ZeroVariance);
        }

        let slope = sxy / sxx;
        if !(slope.is_finite() && x_mean.is_finite() && y_mean.is_finite()) {
            return Err(RegressionError::NonFinite);
        }

        Ok(Box::new(FittedLine { slope, x_mean, y_mean }))
    }
}
