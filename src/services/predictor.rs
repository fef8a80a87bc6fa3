use crate::constants::PREDICTION_CONFIDENCE;
use crate::error::{AppError, Result};
use crate::models::{
    legacy_features, prediction_features, round2, trading_days, PredictionResult, SimplePrediction,
};
use crate::services::market_data::SharedMarketData;
use crate::services::registry::SharedModelRegistry;
use chrono::{NaiveDate, Utc};
use tracing::info;

/// Orchestrates a prediction: validate the request, build the feature
/// vector for the model's feature space, invoke the model, and pair the
/// output with a fresh quote from the provider.
pub struct PredictionService {
    registry: SharedModelRegistry,
    market: SharedMarketData,
}

impl PredictionService {
    pub fn new(registry: SharedModelRegistry, market: SharedMarketData) -> Self {
        Self { registry, market }
    }

    pub async fn predict(
        &self,
        ticker: &str,
        year: i32,
        month: u32,
        day: u32,
    ) -> Result<PredictionResult> {
        // Ticker check runs first: an unknown ticker is NotFound no matter
        // how broken the date is
        let entry = self
            .registry
            .get(ticker)
            .await
            .ok_or_else(|| AppError::NotFound(format!("Model for '{}' not found", ticker)))?;

        let today = Utc::now().date_naive();
        let target = validate_target_date(year, month, day, today)?;
        let days_ahead = (target - today).num_days();

        let features = prediction_features(&entry.features, days_ahead, target);
        let predicted = entry.regressor.predict(&features)?;

        let current = match self.market.latest_close(ticker).await {
            Ok(Some(price)) => price,
            Ok(None) => {
                return Err(AppError::NotFound(format!(
                    "Failed to fetch current price for '{}'",
                    ticker
                )))
            }
            Err(e) => return Err(AppError::Internal(format!("Internal error: {}", e))),
        };

        info!(
            ticker,
            year,
            month,
            day,
            days_ahead,
            predicted_price = predicted,
            current_price = current,
            "Prediction served"
        );

        Ok(PredictionResult {
            ticker: ticker.to_string(),
            year,
            month,
            day,
            predicted_price: round2(predicted),
            current_price: round2(current),
            confidence: PREDICTION_CONFIDENCE,
            created_at: Utc::now(),
        })
    }

    /// Legacy single-feature prediction: no metadata, no current-price
    /// fetch, no date validation. Retained for backward compatibility.
    pub async fn predict_simple(&self, ticker: &str, year: i32) -> Result<SimplePrediction> {
        let entry = self
            .registry
            .get(ticker)
            .await
            .ok_or_else(|| AppError::NotFound(format!("No model found for ticker '{}'", ticker)))?;

        let today = Utc::now().date_naive();
        let horizon = simple_horizon(year, today)?;
        let predicted = entry
            .regressor
            .predict(&legacy_features(horizon))
            .map_err(|_| AppError::Internal("Model prediction failed".to_string()))?;

        info!(ticker, year, horizon, "Simple prediction served");

        Ok(SimplePrediction {
            ticker: ticker.to_string(),
            year,
            predicted_price: round2(predicted),
        })
    }
}

/// Validate a target calendar date against today, in request order: month
/// range, day range (with the month's true upper bound in the message),
/// then the past-date check. Same-day targets are valid.
pub fn validate_target_date(year: i32, month: u32, day: u32, today: NaiveDate) -> Result<NaiveDate> {
    if !(1..=12).contains(&month) {
        return Err(AppError::InvalidInput(
            "Month must be between 1 and 12".to_string(),
        ));
    }

    let upper = days_in_month(year, month)
        .ok_or_else(|| AppError::InvalidInput(format!("Year {} is out of range", year)))?;
    if day < 1 || day > upper {
        return Err(AppError::InvalidInput(format!(
            "Day must be between 1 and {} for month {}",
            upper, month
        )));
    }

    let target = NaiveDate::from_ymd_opt(year, month, day)
        .ok_or_else(|| AppError::InvalidInput(format!("Year {} is out of range", year)))?;
    if target < today {
        return Err(AppError::InvalidInput(
            "Cannot predict for past dates".to_string(),
        ));
    }
    Ok(target)
}

/// Trading-day horizon for the legacy endpoint: today to January 1st of the
/// target year, through the truncating ratio. Past years yield a negative
/// horizon, as the legacy contract always allowed.
pub fn simple_horizon(year: i32, today: NaiveDate) -> Result<i64> {
    let target = NaiveDate::from_ymd_opt(year, 1, 1)
        .ok_or_else(|| AppError::InvalidInput(format!("Year {} is out of range", year)))?;
    Ok(trading_days((target - today).num_days()))
}

fn days_in_month(year: i32, month: u32) -> Option<u32> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let next = if month == 12 {
        NaiveDate::from_ymd_opt(year.checked_add(1)?, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)?
    };
    Some((next - first).num_days() as u32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{FeatureSpace, ModelMetadata};
    use crate::services::registry::{ModelEntry, ModelRegistry};
    use crate::services::regressor::Regressor;
    use std::sync::Arc;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_month_out_of_range() {
        let err = validate_target_date(2027, 13, 1, date(2026, 8, 7)).unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
        assert_eq!(err.to_string(), "Month must be between 1 and 12");
    }

    #[test]
    fn test_day_bound_names_month_length() {
        // Non-leap February
        let err = validate_target_date(2027, 2, 30, date(2026, 8, 7)).unwrap_err();
        assert_eq!(err.to_string(), "Day must be between 1 and 28 for month 2");

        // Leap February is fine on the 29th
        assert!(validate_target_date(2028, 2, 29, date(2026, 8, 7)).is_ok());
    }

    #[test]
    fn test_past_date_rejected_same_day_allowed() {
        let today = date(2026, 8, 7);
        let err = validate_target_date(2026, 8, 6, today).unwrap_err();
        assert_eq!(err.to_string(), "Cannot predict for past dates");

        assert_eq!(validate_target_date(2026, 8, 7, today).unwrap(), today);
    }

    #[test]
    fn test_validation_order_month_before_past_date() {
        // A bad month wins over the fact that the year is long gone
        let err = validate_target_date(1990, 0, 1, date(2026, 8, 7)).unwrap_err();
        assert_eq!(err.to_string(), "Month must be between 1 and 12");
    }

    #[test]
    fn test_simple_horizon_truncates() {
        // 2026-08-07 -> 2027-01-01 is 147 days; 147 * 252 / 365 = 101
        assert_eq!(simple_horizon(2027, date(2026, 8, 7)).unwrap(), 101);
        // Past year gives a negative horizon
        assert!(simple_horizon(2020, date(2026, 8, 7)).unwrap() < 0);
    }

    /// Records the feature vector it was invoked with
    struct Probe(std::sync::Mutex<Vec<Vec<f64>>>, f64);

    impl Regressor for Probe {
        fn predict(&self, features: &[f64]) -> Result<f64> {
            self.0.lock().unwrap().push(features.to_vec());
            Ok(self.1)
        }
    }

    #[tokio::test]
    async fn test_unknown_ticker_is_not_found_before_date_checks() {
        let registry = Arc::new(ModelRegistry::new());
        let market = Arc::new(
            crate::services::market_data::MarketDataClient::new(false, 30).unwrap(),
        );
        let service = PredictionService::new(registry, market);

        // Date is nonsense too, but the ticker check comes first
        let err = service.predict("GHOST", 2020, 99, 99).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
        assert_eq!(err.to_string(), "Model for 'GHOST' not found");
    }

    #[tokio::test]
    async fn test_predict_simple_uses_single_feature() {
        let probe = Arc::new(Probe(std::sync::Mutex::new(Vec::new()), 321.987));
        let registry = Arc::new(ModelRegistry::new());
        registry
            .put(
                "FPT",
                ModelEntry {
                    regressor: probe.clone(),
                    features: FeatureSpace::Calendar(ModelMetadata {
                        last_day_index: 10,
                        last_date: date(2026, 1, 1),
                    }),
                },
            )
            .await;
        let market = Arc::new(
            crate::services::market_data::MarketDataClient::new(false, 30).unwrap(),
        );
        let service = PredictionService::new(registry, market);

        let result = service.predict_simple("FPT", 2100).await.unwrap();
        assert_eq!(result.ticker, "FPT");
        assert_eq!(result.predicted_price, 321.99);

        // Legacy path ignores the metadata and sends one column
        let calls = probe.0.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].len(), 1);
    }
}
