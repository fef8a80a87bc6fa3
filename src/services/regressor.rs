use crate::constants::{FOREST_MAX_DEPTH, FOREST_TREES};
use crate::error::{AppError, Result};
use smartcore::ensemble::random_forest_regressor::{
    RandomForestRegressor, RandomForestRegressorParameters,
};
use smartcore::linalg::basic::matrix::DenseMatrix;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

/// Narrow interface over a fitted regression model.
///
/// Prediction and feature-building code only depends on this trait, so the
/// training library can be swapped or stubbed without touching either.
pub trait Regressor: Send + Sync {
    /// Predict a price from a single feature vector
    fn predict(&self, features: &[f64]) -> Result<f64>;
}

type Forest = RandomForestRegressor<f64, f64, DenseMatrix<f64>, Vec<f64>>;

/// Ensemble regressor persisted one file per ticker.
pub struct ForestRegressor {
    model: Forest,
}

impl ForestRegressor {
    /// Fit on a feature matrix and labels. Rows must be non-empty and of
    /// uniform width.
    pub fn fit(features: Vec<Vec<f64>>, labels: Vec<f64>) -> Result<Self> {
        let x = DenseMatrix::from_2d_vec(&features)
            .map_err(|e| AppError::Internal(format!("Matrix creation failed: {}", e)))?;

        let params = RandomForestRegressorParameters::default()
            .with_n_trees(FOREST_TREES)
            .with_max_depth(FOREST_MAX_DEPTH);

        let model = Forest::fit(&x, &labels, params)
            .map_err(|e| AppError::Internal(format!("Model training failed: {}", e)))?;

        Ok(Self { model })
    }

    /// Deserialize a model file
    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        let model: Forest = serde_json::from_reader(BufReader::new(file))
            .map_err(|e| AppError::Internal(format!("Model deserialization failed: {}", e)))?;
        Ok(Self { model })
    }

    /// Serialize the model to a file
    pub fn save(&self, path: &Path) -> Result<()> {
        let file = File::create(path)?;
        serde_json::to_writer(BufWriter::new(file), &self.model)
            .map_err(|e| AppError::Internal(format!("Model serialization failed: {}", e)))?;
        Ok(())
    }
}

impl Regressor for ForestRegressor {
    fn predict(&self, features: &[f64]) -> Result<f64> {
        let input = DenseMatrix::from_2d_vec(&vec![features.to_vec()])
            .map_err(|e| AppError::Internal(format!("Matrix creation failed: {}", e)))?;

        let predictions = self
            .model
            .predict(&input)
            .map_err(|e| AppError::Internal(format!("Prediction failed: {}", e)))?;

        predictions
            .first()
            .copied()
            .ok_or_else(|| AppError::Internal("No prediction returned".to_string()))
    }
}
