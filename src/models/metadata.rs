use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Trailing edge of a model's training window, persisted as a JSON sidecar
/// next to the model file.
///
/// `last_day_index` is the 1-based ordinal of the most recent training
/// observation; `last_date` is that observation's calendar date. Together
/// they anchor the model's feature space to calendar time: a future target
/// date translates to `last_day_index + trading_days(now -> target)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelMetadata {
    pub last_day_index: u32,
    pub last_date: NaiveDate,
}
