//! Router-level tests for `POST /predict` driven through `tower::ServiceExt::oneshot`.
//! Every data source here is an in-memory fake.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use chrono::{Duration, NaiveDate};
use serde_json::{json, Value};
use tower::ServiceExt;

use trendcast_backend::app::create_app;
use trendcast_backend::config::PredictionConfig;
use trendcast_backend::external::price_provider::{PriceProvider, PriceProviderError};
use trendcast_backend::models::{DateRange, RawPriceRow};
use trendcast_backend::services::prediction_service::PredictionService;
use trendcast_backend::services::regression::OrdinaryLeastSquares;
use trendcast_backend::state::AppState;

#[derive(Clone, Copy)]
enum Behaviour {
    Linear(usize),
    Empty,
    Fail,
}

struct FakeProvider {
    behaviour: Behaviour,
    calls: AtomicUsize,
    last_ticker: std::sync::Mutex<Option<String>>,
}

impl FakeProvider {
    fn new(behaviour: Behaviour) -> Arc<Self> {
        Arc::new(Self {
            behaviour,
            calls: AtomicUsize::new(0),
            last_ticker: std::sync::Mutex::new(None),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PriceProvider for FakeProvider {
    async fn fetch_price_history(
        &self,
        ticker: &str,
        range: DateRange,
    ) -> Result<Vec<RawPriceRow>, PriceProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_ticker.lock().unwrap() = Some(ticker.to_string());

        match self.behaviour {
            Behaviour::Linear(n) => Ok((0..n)
                .map(|i| RawPriceRow::new(range.start + Duration::days(i as i64), 100.0 + i as f64))
                .collect()),
            Behaviour::Empty => Ok(Vec::new()),
            Behaviour::Fail => Err(PriceProviderError::Network(
                "connection refused (os error 111) at 10.0.0.7:443".into(),
            )),
        }
    }

    fn name(&self) -> &'static str {
        "fake"
    }
}

fn app_with(provider: Arc<FakeProvider>) -> Router {
    let config = PredictionConfig {
        window: DateRange::new(
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 12, 31).unwrap(),
        )
        .unwrap(),
        ..PredictionConfig::default()
    };
    create_app(AppState {
        prediction: PredictionService::new(provider, Arc::new(OrdinaryLeastSquares), config),
    })
}

fn json_request(body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/predict")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

#[tokio::test]
async fn test_success_returns_parallel_arrays() {
    let provider = FakeProvider::new(Behaviour::Linear(25));
    let (status, body) = send(app_with(provider.clone()), json_request(r#"{"ticker": "  lin "}"#)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(provider.last_ticker.lock().unwrap().as_deref(), Some("LIN"));

    let dates = body["dates"].as_array().unwrap();
    let actual = body["actual"].as_array().unwrap();
    let predicted = body["predicted"].as_array().unwrap();

    assert_eq!(dates.len(), 5);
    assert_eq!(actual.len(), 5);
    assert_eq!(predicted.len(), 5);
    assert_eq!(dates[0], json!("2024-01-21"));
    assert_eq!(dates[4], json!("2024-01-25"));
    assert!(predicted.iter().all(Value::is_number));

    for (p, a) in predicted.iter().zip(actual) {
        assert!((p.as_f64().unwrap() - a.as_f64().unwrap()).abs() < 1.0);
    }
}

#[tokio::test]
async fn test_unknown_ticker_is_404_with_message() {
    let provider = FakeProvider::new(Behaviour::Empty);
    let (status, body) = send(app_with(provider), json_request(r#"{"ticker": "ZZZZINVALID"}"#)).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(
        body,
        json!({"error": "No data found for ticker 'ZZZZINVALID'. Please check the symbol."})
    );
}

#[tokio::test]
async fn test_short_history_is_404() {
    let provider = FakeProvider::new(Behaviour::Linear(12));
    let (status, body) = send(app_with(provider), json_request(r#"{"ticker": "NEWCO"}"#)).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(
        body["error"],
        json!("Not enough historical data for 'NEWCO' to create a prediction.")
    );
}

#[tokio::test]
async fn test_source_failure_is_500_without_detail() {
    let provider = FakeProvider::new(Behaviour::Fail);
    let (status, body) = send(app_with(provider), json_request(r#"{"ticker": "AAPL"}"#)).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({"error": "An unexpected internal server error occurred."}));
    assert!(!body.to_string().contains("10.0.0.7"));
}

#[tokio::test]
async fn test_malformed_bodies_are_400_and_never_fetch() {
    let cases = [
        r#"{"ticker": ""}"#,
        r#"{"ticker": "   "}"#,
        r#"{"ticker": 123}"#,
        r#"{"ticker": null}"#,
        r#"{"ticker": ["AAPL"]}"#,
        r#"{"symbol": "AAPL"}"#,
        r#"{"ticker": "AA PL"}"#,
        r#"{"ticker": "#,
        r#""AAPL""#,
    ];

    for case in cases {
        let provider = FakeProvider::new(Behaviour::Linear(25));
        let (status, body) = send(app_with(provider.clone()), json_request(case)).await;

        assert_eq!(status, StatusCode::BAD_REQUEST, "body {}", case);
        assert!(body["error"].is_string(), "body {}", case);
        assert_eq!(provider.calls(), 0, "body {}", case);
    }
}

#[tokio::test]
async fn test_non_json_content_type_is_415() {
    let provider = FakeProvider::new(Behaviour::Linear(25));
    let request = Request::builder()
        .method("POST")
        .uri("/predict")
        .header(header::CONTENT_TYPE, "text/plain")
        .body(Body::from(r#"{"ticker": "AAPL"}"#))
        .unwrap();

    let (status, body) = send(app_with(provider.clone()), request).await;

    assert_eq!(status, StatusCode::UNSUPPORTED_MEDIA_TYPE);
    assert_eq!(
        body,
        json!({"error": "Invalid request: Content-Type must be application/json"})
    );
    assert_eq!(provider.calls(), 0);
}

#[tokio::test]
async fn test_identical_requests_give_identical_payloads() {
    let provider = FakeProvider::new(Behaviour::Linear(250));
    let app = app_with(provider);

    let (_, first) = send(app.clone(), json_request(r#"{"ticker": "SPY"}"#)).await;
    let (_, second) = send(app, json_request(r#"{"ticker": "spy"}"#)).await;

    assert_eq!(first, second);
    assert_eq!(first["dates"].as_array().unwrap().len(), 50);
}

#[tokio::test]
async fn test_health_check() {
    let provider = FakeProvider::new(Behaviour::Empty);
    let request = Request::builder().uri("/health").body(Body::empty()).unwrap();

    let response = app_with(provider).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}
