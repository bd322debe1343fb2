use crate::services::prediction_service::PredictionService;

#[derive(Clone)]
pub struct AppState {
    pub prediction: PredictionService,
}
