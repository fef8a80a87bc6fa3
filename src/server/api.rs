use crate::constants::{COMPANIES_FILE, HISTORY_RANGE};
use crate::error::{AppError, Result};
use crate::models::{
    drop_missing, load_companies, Company, PredictionResult, PricePoint, SimplePrediction,
    TrainReport,
};
use crate::server::AppState;
use axum::{extract::State, response::Json};
use axum_extra::extract::Query;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{info, instrument, warn};

/// Query parameters for endpoints keyed by ticker only
#[derive(Debug, Deserialize, Clone)]
pub struct TickerQuery {
    pub ticker: String,
}

/// Query parameters for /api/predict
#[derive(Debug, Deserialize, Clone)]
pub struct PredictQuery {
    /// Ticker symbol like RELIANCE.NS
    pub ticker: String,

    /// Year to predict for, e.g. 2027
    pub year: i32,

    /// Month to predict for (1-12)
    #[serde(default = "default_month")]
    pub month: u32,

    /// Day to predict for (1-31)
    #[serde(default = "default_day")]
    pub day: u32,
}

fn default_month() -> u32 {
    1
}

fn default_day() -> u32 {
    1
}

/// Query parameters for /api/predict-simple
#[derive(Debug, Deserialize, Clone)]
pub struct SimplePredictQuery {
    pub ticker: String,
    pub year: i32,
}

/// GET / - liveness probe
pub async fn root_handler() -> Json<Value> {
    Json(json!({ "status": "Backend is running" }))
}

/// GET /api/companies - static list of supported companies
#[instrument(skip(app_state))]
pub async fn get_companies_handler(
    State(app_state): State<AppState>,
) -> Result<Json<Vec<Company>>> {
    let companies = load_companies(app_state.data_dir.join(COMPANIES_FILE))?;
    info!(count = companies.len(), "Returning companies list");
    Ok(Json(companies))
}

/// GET /api/historical?ticker=RELIANCE.NS - 5 years of daily closes,
/// chronological
#[instrument(skip(app_state))]
pub async fn get_historical_handler(
    State(app_state): State<AppState>,
    Query(params): Query<TickerQuery>,
) -> Result<Json<Vec<PricePoint>>> {
    let rows = app_state
        .market
        .get_history(&params.ticker, HISTORY_RANGE)
        .await
        .map_err(|e| {
            warn!(ticker = %params.ticker, error = %e, "Historical fetch failed");
            AppError::Upstream(format!("Failed to fetch historical data: {}", e))
        })?;

    let points = drop_missing(rows);
    info!(
        ticker = %params.ticker,
        records = points.len(),
        "Returning historical data"
    );
    Ok(Json(points))
}

/// GET /api/predict?ticker=...&year=...&month=1&day=1 - full prediction
/// with a fresh current price
#[instrument(skip(app_state))]
pub async fn predict_handler(
    State(app_state): State<AppState>,
    Query(params): Query<PredictQuery>,
) -> Result<Json<PredictionResult>> {
    let result = app_state
        .predictor
        .predict(&params.ticker, params.year, params.month, params.day)
        .await;

    if let Err(e) = &result {
        warn!(ticker = %params.ticker, error = %e, "Prediction failed");
    }
    result.map(Json)
}

/// GET /api/predict-simple?ticker=...&year=... - legacy single-feature
/// prediction, kept for backward compatibility
#[instrument(skip(app_state))]
pub async fn predict_simple_handler(
    State(app_state): State<AppState>,
    Query(params): Query<SimplePredictQuery>,
) -> Result<Json<SimplePrediction>> {
    let result = app_state
        .predictor
        .predict_simple(&params.ticker, params.year)
        .await;

    if let Err(e) = &result {
        warn!(ticker = %params.ticker, error = %e, "Simple prediction failed");
    }
    result.map(Json)
}

/// POST /api/train?ticker=... - (re)train the ticker's model and install it
/// without a restart
#[instrument(skip(app_state))]
pub async fn train_handler(
    State(app_state): State<AppState>,
    Query(params): Query<TickerQuery>,
) -> Result<Json<TrainReport>> {
    let result = app_state.trainer.train(&params.ticker).await;

    match &result {
        Ok(report) => info!(
            ticker = %params.ticker,
            model_file = %report.model_file,
            "Training complete"
        ),
        Err(e) => warn!(ticker = %params.ticker, error = %e, "Training failed"),
    }
    result.map(Json)
}
