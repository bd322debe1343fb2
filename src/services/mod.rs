pub mod dataset;
pub mod prediction_service;
pub mod regression;
