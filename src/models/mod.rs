mod prediction;
mod price_series;
mod ticker;

pub use prediction::{ErrorBody, PredictRequest, PredictionPayload};
pub use price_series::{DateRange, PricePoint, PriceSeries, RawPriceRow};
pub use ticker::{Ticker, MAX_TICKER_LEN};
