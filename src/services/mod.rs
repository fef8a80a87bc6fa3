pub mod market_data;
pub mod predictor;
pub mod registry;
pub mod regressor;
pub mod trainer;

pub use market_data::{MarketDataClient, MarketError, SharedMarketData};
pub use predictor::PredictionService;
pub use registry::{ModelEntry, ModelRegistry, SharedModelRegistry};
pub use regressor::{ForestRegressor, Regressor};
pub use trainer::TrainingService;
