mod company;
mod features;
mod metadata;
mod prediction;
mod quote;

pub use company::{load_companies, Company};
pub use features::{
    calendar_features, legacy_features, prediction_features, trading_days, training_features,
    FeatureSpace,
};
pub use metadata::ModelMetadata;
pub use prediction::{round2, PredictionResult, SimplePrediction, TrainReport};
pub use quote::{drop_missing, HistoryRow, PricePoint};
