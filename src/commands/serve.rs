use crate::constants::PROVIDER_RATE_LIMIT_PER_MINUTE;
use crate::server::{self, AppState};
use crate::services::{MarketDataClient, ModelRegistry, PredictionService, TrainingService};
use crate::utils::{get_data_dir, get_models_dir};
use std::sync::Arc;

pub async fn run(port: u16) {
    println!("🚀 Starting stockcast server on port {}", port);

    let models_dir = get_models_dir();
    println!("📁 Models directory: {}", models_dir.display());

    let registry = Arc::new(ModelRegistry::load_all(&models_dir));
    let tickers = registry.tickers().await;
    if tickers.is_empty() {
        eprintln!("⚠️  Warning: no models loaded. Train one with 'stockcast train <TICKER>' or POST /api/train.");
    } else {
        println!("✅ Loaded {} model(s): {}", tickers.len(), tickers.join(", "));
    }

    let market = match MarketDataClient::new(true, PROVIDER_RATE_LIMIT_PER_MINUTE) {
        Ok(client) => Arc::new(client),
        Err(e) => {
            eprintln!("❌ Failed to create market data client: {}", e);
            std::process::exit(1);
        }
    };

    let predictor = Arc::new(PredictionService::new(registry.clone(), market.clone()));
    let trainer = Arc::new(TrainingService::new(
        registry.clone(),
        market.clone(),
        models_dir,
    ));

    let app_state = AppState {
        registry,
        market,
        predictor,
        trainer,
        data_dir: Arc::new(get_data_dir()),
    };

    if let Err(e) = server::serve(app_state, port).await {
        eprintln!("❌ Server error: {}", e);
        std::process::exit(1);
    }
}
