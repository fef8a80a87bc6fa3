//! Shared constants for the prediction and training pipeline.
//!
//! The feature arithmetic constants are load-bearing: a model trained with
//! one trading-day ratio will silently mispredict when served with another,
//! so every call site goes through these values.

/// Approximate number of trading days in a calendar year
pub const TRADING_DAYS_PER_YEAR: i64 = 252;

/// Calendar days per year, denominator of the trading-day approximation
pub const CALENDAR_DAYS_PER_YEAR: i64 = 365;

/// History range requested from the provider for training and the
/// historical endpoint
pub const HISTORY_RANGE: &str = "5y";

/// Range requested for a current-price quote
pub const QUOTE_RANGE: &str = "1d";

/// Placeholder confidence reported with every prediction.
/// No calibrated confidence is computed by this service.
pub const PREDICTION_CONFIDENCE: u32 = 90;

/// Chronological train/holdout split: first 80% of rows train the model
pub const TRAIN_SPLIT_RATIO: f64 = 0.8;

/// Number of trees in the ensemble regressor
pub const FOREST_TREES: usize = 200;

/// Maximum tree depth of the ensemble regressor
pub const FOREST_MAX_DEPTH: u16 = 4;

/// Extension of serialized model files; the file stem is the ticker key
pub const MODEL_FILE_EXT: &str = "model";

/// Suffix of the metadata sidecar file next to each model file
pub const META_FILE_SUFFIX: &str = "_meta.json";

/// Static companies list served by GET /api/companies
pub const COMPANIES_FILE: &str = "companies.json";

/// Default HTTP listen port
pub const DEFAULT_PORT: u16 = 8000;

/// Outbound requests per minute allowed against the market-data provider
pub const PROVIDER_RATE_LIMIT_PER_MINUTE: u32 = 30;
