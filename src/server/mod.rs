pub mod api;

use crate::services::{PredictionService, SharedMarketData, SharedModelRegistry, TrainingService};
use axum::{
    extract::FromRef,
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub registry: SharedModelRegistry,
    pub market: SharedMarketData,
    pub predictor: Arc<PredictionService>,
    pub trainer: Arc<TrainingService>,
    pub data_dir: Arc<PathBuf>,
}

// FromRef implementations to extract specific state components
impl FromRef<AppState> for SharedModelRegistry {
    fn from_ref(app_state: &AppState) -> SharedModelRegistry {
        app_state.registry.clone()
    }
}

impl FromRef<AppState> for SharedMarketData {
    fn from_ref(app_state: &AppState) -> SharedMarketData {
        app_state.market.clone()
    }
}

impl FromRef<AppState> for Arc<PredictionService> {
    fn from_ref(app_state: &AppState) -> Arc<PredictionService> {
        app_state.predictor.clone()
    }
}

impl FromRef<AppState> for Arc<TrainingService> {
    fn from_ref(app_state: &AppState) -> Arc<TrainingService> {
        app_state.trainer.clone()
    }
}

/// Build the application router with CORS for the known frontends
pub fn build_router(app_state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin([
            "https://stock-price-prediction-system-lemon.vercel.app"
                .parse()
                .unwrap(),
            "http://localhost:5173".parse().unwrap(), // Vite dev server
            "http://localhost:3000".parse().unwrap(),
            "http://127.0.0.1:5173".parse().unwrap(), // Vite dev server
            "http://127.0.0.1:3000".parse().unwrap(),
        ])
        .allow_methods([
            axum::http::Method::GET,
            axum::http::Method::POST,
            axum::http::Method::OPTIONS,
        ])
        .allow_headers(Any);

    Router::new()
        .route("/", get(api::root_handler))
        .route("/api/companies", get(api::get_companies_handler))
        .route("/api/historical", get(api::get_historical_handler))
        .route("/api/predict", get(api::predict_handler))
        .route("/api/predict-simple", get(api::predict_simple_handler))
        .route("/api/train", post(api::train_handler))
        .layer(cors)
        .with_state(app_state)
}

/// Start the axum server
pub async fn serve(app_state: AppState, port: u16) -> Result<(), Box<dyn std::error::Error>> {
    tracing::info!("Starting stockcast server");

    tracing::info!("Registering routes:");
    tracing::info!("  GET  /");
    tracing::info!("  GET  /api/companies");
    tracing::info!("  GET  /api/historical?ticker=RELIANCE.NS");
    tracing::info!("  GET  /api/predict?ticker=RELIANCE.NS&year=2027&month=3&day=15");
    tracing::info!("  GET  /api/predict-simple?ticker=RELIANCE.NS&year=2027");
    tracing::info!("  POST /api/train?ticker=RELIANCE.NS");

    let app = build_router(app_state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!(%addr, "Server listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
