use crate::constants::{META_FILE_SUFFIX, MODEL_FILE_EXT};
use crate::models::{FeatureSpace, ModelMetadata};
use crate::services::regressor::{ForestRegressor, Regressor};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{info, warn};

/// A fitted model and the feature shape it was trained against.
///
/// Entries are immutable once installed; (re)training replaces the whole
/// entry in one step, so in-flight predictions keep the model they resolved.
pub struct ModelEntry {
    pub regressor: Arc<dyn Regressor>,
    pub features: FeatureSpace,
}

// Shared registry for passing between handlers
pub type SharedModelRegistry = Arc<ModelRegistry>;

/// Process-wide ticker -> model mapping.
///
/// Populated once at startup from the model directory and updated in place
/// by the training service. Readers clone the entry `Arc` out of the map
/// under a read lock, so a concurrent `put` can never expose a half-updated
/// entry.
#[derive(Default)]
pub struct ModelRegistry {
    entries: RwLock<HashMap<String, Arc<ModelEntry>>>,
}

impl ModelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Scan the model directory once and register every loadable model.
    ///
    /// The filename stem (minus extension) is the ticker key. A model file
    /// that fails to deserialize is skipped with a warning; a missing or
    /// corrupt metadata sidecar still registers the ticker, on the legacy
    /// single-feature path. Startup never aborts on a per-ticker failure.
    pub fn load_all(dir: &Path) -> Self {
        let mut entries = HashMap::new();

        let read_dir = match std::fs::read_dir(dir) {
            Ok(read_dir) => read_dir,
            Err(e) => {
                warn!(
                    dir = %dir.display(),
                    error = %e,
                    "Model directory not readable, starting with an empty registry"
                );
                return Self {
                    entries: RwLock::new(entries),
                };
            }
        };

        for dir_entry in read_dir.flatten() {
            let path = dir_entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some(MODEL_FILE_EXT) {
                continue;
            }
            let Some(ticker) = path.file_stem().and_then(|s| s.to_str()).map(str::to_string)
            else {
                continue;
            };

            let regressor = match ForestRegressor::load(&path) {
                Ok(model) => model,
                Err(e) => {
                    warn!(ticker = %ticker, error = %e, "Failed to load model, skipping");
                    continue;
                }
            };

            let features = load_sidecar(dir, &ticker);
            info!(
                ticker = %ticker,
                calendar_features = matches!(features, FeatureSpace::Calendar(_)),
                "Registered model"
            );
            entries.insert(
                ticker,
                Arc::new(ModelEntry {
                    regressor: Arc::new(regressor),
                    features,
                }),
            );
        }

        Self {
            entries: RwLock::new(entries),
        }
    }

    pub async fn get(&self, ticker: &str) -> Option<Arc<ModelEntry>> {
        self.entries.read().await.get(ticker).cloned()
    }

    /// Atomically insert or replace a ticker's entry. Predictions issued
    /// after this returns see the new model; no restart required.
    pub async fn put(&self, ticker: &str, entry: ModelEntry) {
        self.entries
            .write()
            .await
            .insert(ticker.to_string(), Arc::new(entry));
        info!(ticker, "Installed model in registry");
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    /// Registered tickers, sorted
    pub async fn tickers(&self) -> Vec<String> {
        let mut tickers: Vec<String> = self.entries.read().await.keys().cloned().collect();
        tickers.sort();
        tickers
    }
}

fn load_sidecar(dir: &Path, ticker: &str) -> FeatureSpace {
    let meta_path = dir.join(format!("{}{}", ticker, META_FILE_SUFFIX));
    if !meta_path.exists() {
        warn!(ticker, "No metadata sidecar, using legacy single-feature input");
        return FeatureSpace::Legacy;
    }

    let parsed = std::fs::read_to_string(&meta_path)
        .map_err(|e| e.to_string())
        .and_then(|content| {
            serde_json::from_str::<ModelMetadata>(&content).map_err(|e| e.to_string())
        });

    match parsed {
        Ok(meta) => FeatureSpace::Calendar(meta),
        Err(e) => {
            warn!(
                ticker,
                error = %e,
                "Failed to read metadata sidecar, using legacy single-feature input"
            );
            FeatureSpace::Legacy
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Result;
    use crate::models::calendar_features;
    use chrono::NaiveDate;

    struct FixedRegressor(f64);

    impl Regressor for FixedRegressor {
        fn predict(&self, _features: &[f64]) -> Result<f64> {
            Ok(self.0)
        }
    }

    fn fitted_forest() -> ForestRegressor {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let features: Vec<Vec<f64>> = (1..=40)
            .map(|i| calendar_features(i, start + chrono::Duration::days(i)))
            .collect();
        let labels: Vec<f64> = (1..=40).map(|i| 100.0 + i as f64).collect();
        ForestRegressor::fit(features, labels).unwrap()
    }

    #[tokio::test]
    async fn test_get_unknown_ticker_is_none() {
        let registry = ModelRegistry::new();
        assert!(registry.get("UNKNOWN").await.is_none());
    }

    #[tokio::test]
    async fn test_put_replaces_entry_atomically() {
        let registry = ModelRegistry::new();
        registry
            .put(
                "VCB",
                ModelEntry {
                    regressor: Arc::new(FixedRegressor(1.0)),
                    features: FeatureSpace::Legacy,
                },
            )
            .await;

        let before = registry.get("VCB").await.unwrap();
        assert_eq!(before.regressor.predict(&[0.0]).unwrap(), 1.0);

        // Retraining swaps the whole entry; the old Arc stays valid
        registry
            .put(
                "VCB",
                ModelEntry {
                    regressor: Arc::new(FixedRegressor(2.0)),
                    features: FeatureSpace::Legacy,
                },
            )
            .await;

        let after = registry.get("VCB").await.unwrap();
        assert_eq!(after.regressor.predict(&[0.0]).unwrap(), 2.0);
        assert_eq!(before.regressor.predict(&[0.0]).unwrap(), 1.0);
        assert_eq!(registry.len().await, 1);
    }

    #[tokio::test]
    async fn test_load_all_registers_models_and_sidecars() {
        let dir = tempfile::tempdir().unwrap();
        let model = fitted_forest();
        model.save(&dir.path().join("AAA.model")).unwrap();
        model.save(&dir.path().join("BBB.model")).unwrap();
        std::fs::write(
            dir.path().join("AAA_meta.json"),
            r#"{"last_day_index": 40, "last_date": "2024-02-10"}"#,
        )
        .unwrap();

        let registry = ModelRegistry::load_all(dir.path());
        assert_eq!(registry.tickers().await, vec!["AAA", "BBB"]);

        let with_meta = registry.get("AAA").await.unwrap();
        assert!(matches!(with_meta.features, FeatureSpace::Calendar(_)));

        // No sidecar falls back to the legacy single-feature path
        let without_meta = registry.get("BBB").await.unwrap();
        assert!(matches!(without_meta.features, FeatureSpace::Legacy));
    }

    #[tokio::test]
    async fn test_load_all_skips_corrupt_model_and_sidecar() {
        let dir = tempfile::tempdir().unwrap();
        let model = fitted_forest();
        model.save(&dir.path().join("GOOD.model")).unwrap();
        std::fs::write(dir.path().join("GOOD_meta.json"), b"{broken").unwrap();
        std::fs::write(dir.path().join("CORRUPT.model"), b"not a model").unwrap();

        let registry = ModelRegistry::load_all(dir.path());
        assert_eq!(registry.tickers().await, vec!["GOOD"]);
        // Corrupt sidecar is non-fatal: the model is still served, legacy-shaped
        let entry = registry.get("GOOD").await.unwrap();
        assert!(matches!(entry.features, FeatureSpace::Legacy));
    }

    #[tokio::test]
    async fn test_load_all_missing_dir_is_empty() {
        let registry = ModelRegistry::load_all(Path::new("/nonexistent/models"));
        assert!(registry.is_empty().await);
    }
}
