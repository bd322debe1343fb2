use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use tracing::{info, warn};

use crate::errors::AppError;
use crate::models::{PredictRequest, PredictionPayload, Ticker};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/", post(predict))
}

/// Actual versus trend-line closes for the held-out tail of a ticker's history.
///
/// # Example
/// ```text
/// POST /predict
/// {"ticker": "aapl"}
/// ```
pub async fn predict(
    State(state): State<AppState>,
    body: Result<Json<PredictRequest>, JsonRejection>,
) -> Result<Json<PredictionPayload>, AppError> {
    let Json(req) = body.map_err(|rejection| match rejection {
        JsonRejection::MissingJsonContentType(_) => AppError::UnsupportedMediaType(
            "Invalid request: Content-Type must be application/json".to_string(),
        ),
        other => {
            warn!("POST /predict - rejected body: {}", other.body_text());
            AppError::Validation("Ticker symbol must be a non-empty string.".to_string())
        }
    })?;

    let raw = req.ticker_str().ok_or_else(|| {
        AppError::Validation("Ticker symbol must be a non-empty string.".to_string())
    })?;
    let ticker = Ticker::parse(raw)?;

    info!("POST /predict - Received prediction request for {}", ticker);

    let payload = state.prediction.predict(&ticker).await?;
    Ok(Json(payload))
}
