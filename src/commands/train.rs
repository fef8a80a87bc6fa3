use crate::constants::{COMPANIES_FILE, PROVIDER_RATE_LIMIT_PER_MINUTE};
use crate::models::load_companies;
use crate::services::{MarketDataClient, ModelRegistry, TrainingService};
use crate::utils::{get_data_dir, get_models_dir};
use std::sync::Arc;

pub async fn run(ticker: Option<String>) {
    let tickers = match ticker {
        Some(ticker) => vec![ticker],
        None => {
            let companies_file = get_data_dir().join(COMPANIES_FILE);
            match load_companies(&companies_file) {
                Ok(companies) => companies.into_iter().map(|c| c.ticker).collect(),
                Err(e) => {
                    eprintln!("❌ Cannot read {}: {}", companies_file.display(), e);
                    std::process::exit(1);
                }
            }
        }
    };

    let market = match MarketDataClient::new(true, PROVIDER_RATE_LIMIT_PER_MINUTE) {
        Ok(client) => Arc::new(client),
        Err(e) => {
            eprintln!("❌ Failed to create market data client: {}", e);
            std::process::exit(1);
        }
    };

    let models_dir = get_models_dir();
    println!("📁 Models directory: {}", models_dir.display());

    let registry = Arc::new(ModelRegistry::new());
    let trainer = TrainingService::new(registry, market, models_dir);

    let mut failures = 0usize;
    for ticker in &tickers {
        println!("[+] Training model for: {}", ticker);
        match trainer.train(ticker).await {
            Ok(report) => {
                println!("[✓] Model saved: {}", report.model_file);
                println!("[✓] Meta saved: {}", report.meta_file);
            }
            Err(e) => {
                eprintln!("[!] Error training {}: {}", ticker, e);
                failures += 1;
            }
        }
    }

    if failures > 0 {
        eprintln!("⚠️  {}/{} tickers failed", failures, tickers.len());
        if failures == tickers.len() {
            std::process::exit(1);
        }
    }
}
