pub mod alphavantage;
pub mod csv_file;
pub mod price_provider;
pub mod yahoofinance;

use std::sync::Arc;

use crate::config::ProviderKind;
use price_provider::PriceProvider;

/// Builds the provider selected in configuration.
pub fn build_provider(kind: &ProviderKind, adjusted_close: bool) -> Arc<dyn PriceProvider> {
    match kind {
        ProviderKind::Yahoo => Arc::new(yahoofinance::YahooFinanceProvider::new(adjusted_close)),
        ProviderKind::AlphaVantage { api_key } => Arc::new(
            alphavantage::AlphaVantageProvider::new(api_key.clone(), adjusted_close),
        ),
        ProviderKind::Csv { data_dir } => {
            Arc::new(csv_file::CsvPriceProvider::new(data_dir.clone(), adjusted_close))
        }
    }
}
