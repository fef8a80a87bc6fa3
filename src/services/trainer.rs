use crate::constants::{HISTORY_RANGE, META_FILE_SUFFIX, MODEL_FILE_EXT, TRAIN_SPLIT_RATIO};
use crate::error::{AppError, Result};
use crate::models::{drop_missing, training_features, FeatureSpace, ModelMetadata, TrainReport};
use crate::services::market_data::SharedMarketData;
use crate::services::registry::{ModelEntry, SharedModelRegistry};
use crate::services::regressor::{ForestRegressor, Regressor};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

/// Orchestrates (re)training of a single ticker: fetch history, build
/// features, fit, persist model + metadata sidecar, and install the new
/// entry into the registry so the next prediction uses it immediately.
pub struct TrainingService {
    registry: SharedModelRegistry,
    market: SharedMarketData,
    models_dir: PathBuf,
}

struct Holdout {
    count: usize,
    rmse: f64,
}

impl TrainingService {
    pub fn new(
        registry: SharedModelRegistry,
        market: SharedMarketData,
        models_dir: PathBuf,
    ) -> Self {
        Self {
            registry,
            market,
            models_dir,
        }
    }

    pub async fn train(&self, ticker: &str) -> Result<TrainReport> {
        let rows = self
            .market
            .get_history(ticker, HISTORY_RANGE)
            .await
            .map_err(|e| {
                warn!(ticker, error = %e, "History fetch failed");
                AppError::NotFound(format!("No historical data for '{}'", ticker))
            })?;

        let points = drop_missing(rows);
        if points.is_empty() {
            return Err(AppError::NotFound(format!(
                "No historical data for '{}'",
                ticker
            )));
        }

        let (features, labels) = training_features(&points);

        // Time-series split: first 80% trains, the tail is held out.
        // No shuffling, the rows stay in time order.
        let split = (points.len() as f64 * TRAIN_SPLIT_RATIO) as usize;
        if split == 0 {
            return Err(AppError::Internal(format!(
                "Not enough history to train a model for '{}'",
                ticker
            )));
        }

        let metadata = ModelMetadata {
            last_day_index: points.len() as u32,
            last_date: points[points.len() - 1].date,
        };

        info!(
            ticker,
            rows = points.len(),
            train_rows = split,
            last_date = %metadata.last_date,
            "Training model"
        );

        let ticker_owned = ticker.to_string();
        let meta_for_task = metadata.clone();
        let models_dir = self.models_dir.clone();
        let (model, holdout, model_file, meta_file) = tokio::task::spawn_blocking(move || {
            fit_and_persist(
                &ticker_owned,
                features,
                labels,
                split,
                &meta_for_task,
                &models_dir,
            )
        })
        .await
        .map_err(|e| AppError::Internal(format!("Training task failed: {}", e)))??;

        if let Some(holdout) = holdout {
            info!(
                ticker,
                holdout_rows = holdout.count,
                holdout_rmse = holdout.rmse,
                "Holdout evaluation"
            );
        }

        // Installed atomically: a prediction arriving right after this line
        // already runs against the new model. The persisted files stay the
        // source of truth for the next process start.
        self.registry
            .put(
                ticker,
                ModelEntry {
                    regressor: Arc::new(model),
                    features: FeatureSpace::Calendar(metadata),
                },
            )
            .await;

        Ok(TrainReport {
            status: "ok".to_string(),
            model_file: model_file.display().to_string(),
            meta_file: meta_file.display().to_string(),
        })
    }
}

/// CPU-bound tail of the pipeline, run on the blocking pool: fit, score the
/// holdout, and write the model file plus metadata sidecar.
fn fit_and_persist(
    ticker: &str,
    features: Vec<Vec<f64>>,
    labels: Vec<f64>,
    split: usize,
    metadata: &ModelMetadata,
    models_dir: &Path,
) -> Result<(ForestRegressor, Option<Holdout>, PathBuf, PathBuf)> {
    let train_x = features[..split].to_vec();
    let train_y = labels[..split].to_vec();
    let model = ForestRegressor::fit(train_x, train_y)?;

    let holdout = if split < features.len() {
        let mut sq_err = 0.0;
        let mut count = 0usize;
        for (row, label) in features[split..].iter().zip(&labels[split..]) {
            if let Ok(predicted) = model.predict(row) {
                sq_err += (predicted - label).powi(2);
                count += 1;
            }
        }
        (count > 0).then(|| Holdout {
            count,
            rmse: (sq_err / count as f64).sqrt(),
        })
    } else {
        None
    };

    std::fs::create_dir_all(models_dir)?;

    let model_file = models_dir.join(format!("{}.{}", ticker, MODEL_FILE_EXT));
    model.save(&model_file)?;

    let meta_file = models_dir.join(format!("{}{}", ticker, META_FILE_SUFFIX));
    let content = serde_json::to_string(metadata)
        .map_err(|e| AppError::Internal(format!("Metadata serialization failed: {}", e)))?;
    std::fs::write(&meta_file, content)?;

    Ok((model, holdout, model_file, meta_file))
}
