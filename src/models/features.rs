use crate::constants::{CALENDAR_DAYS_PER_YEAR, TRADING_DAYS_PER_YEAR};
use crate::models::{ModelMetadata, PricePoint};
use chrono::{Datelike, NaiveDate};

/// Feature shape a model was trained against, carried alongside every
/// registry entry.
///
/// Models persisted without a metadata sidecar only understand the original
/// single-column input; models with a sidecar consume the calendar-aware
/// five-column input. Both the training path and the prediction path must
/// build vectors through the functions below — column order and arithmetic
/// are part of the model contract.
#[derive(Debug, Clone)]
pub enum FeatureSpace {
    /// Single column: trading days into the future
    Legacy,
    /// Five columns anchored to the training window's trailing edge
    Calendar(ModelMetadata),
}

/// Approximate trading days in a calendar-day span.
///
/// Integer truncation toward zero, not rounding.
pub fn trading_days(calendar_days: i64) -> i64 {
    calendar_days * TRADING_DAYS_PER_YEAR / CALENDAR_DAYS_PER_YEAR
}

/// Calendar-aware feature vector: `[day_index, day_index^2, weekday (Mon=0),
/// month, day_of_month]`, all derived from the observation's own date.
pub fn calendar_features(day_index: i64, date: NaiveDate) -> Vec<f64> {
    let idx = day_index as f64;
    vec![
        idx,
        idx * idx,
        f64::from(date.weekday().num_days_from_monday()),
        f64::from(date.month()),
        f64::from(date.day()),
    ]
}

/// Legacy single-column feature vector.
pub fn legacy_features(future_trading_days: i64) -> Vec<f64> {
    vec![future_trading_days as f64]
}

/// Build the prediction-time vector for a model's feature space.
///
/// `calendar_days` is the span from today to the target date; the calendar
/// columns come from the target date itself, not from today.
pub fn prediction_features(
    space: &FeatureSpace,
    calendar_days: i64,
    target: NaiveDate,
) -> Vec<f64> {
    let horizon = trading_days(calendar_days);
    match space {
        FeatureSpace::Calendar(meta) => {
            let future_index = i64::from(meta.last_day_index) + horizon;
            calendar_features(future_index, target)
        }
        FeatureSpace::Legacy => legacy_features(horizon),
    }
}

/// Training-time feature matrix and labels.
///
/// `day_index` starts at 1 for the earliest retained observation, so rows
/// must already be dense (missing closes dropped) and chronological.
pub fn training_features(points: &[PricePoint]) -> (Vec<Vec<f64>>, Vec<f64>) {
    points
        .iter()
        .enumerate()
        .map(|(i, point)| (calendar_features(i as i64 + 1, point.date), point.close))
        .unzip()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_trading_days_truncates_toward_zero() {
        assert_eq!(trading_days(365), 252);
        assert_eq!(trading_days(364), 251);
        assert_eq!(trading_days(1), 0);
        assert_eq!(trading_days(0), 0);
        assert_eq!(trading_days(-100), -69);
    }

    #[test]
    fn test_calendar_features_column_order() {
        // 2026-03-15 is a Sunday: weekday 6, month 3, day 15
        let features = calendar_features(150, date(2026, 3, 15));
        assert_eq!(features, vec![150.0, 22500.0, 6.0, 3.0, 15.0]);
    }

    #[test]
    fn test_weekday_is_monday_based() {
        // 2026-03-16 is a Monday
        let features = calendar_features(1, date(2026, 3, 16));
        assert_eq!(features[2], 0.0);
    }

    #[test]
    fn test_prediction_features_legacy_shape() {
        let features = prediction_features(&FeatureSpace::Legacy, 365, date(2027, 8, 7));
        assert_eq!(features, vec![252.0]);
    }

    #[test]
    fn test_prediction_features_round_trip_on_last_date() {
        let meta = ModelMetadata {
            last_day_index: 1255,
            last_date: date(2026, 8, 6),
        };
        let space = FeatureSpace::Calendar(meta);
        // Predicting for last_date itself: zero days ahead keeps the index
        let features = prediction_features(&space, 0, date(2026, 8, 6));
        assert_eq!(features[0], 1255.0);
    }

    #[test]
    fn test_future_index_monotone_in_target_date() {
        let meta = ModelMetadata {
            last_day_index: 100,
            last_date: date(2026, 1, 1),
        };
        let space = FeatureSpace::Calendar(meta);

        let mut previous = f64::NEG_INFINITY;
        for days_ahead in 0..400 {
            let target = date(2026, 1, 1) + chrono::Duration::days(days_ahead);
            let features = prediction_features(&space, days_ahead, target);
            assert!(features[0] >= previous);
            previous = features[0];
        }
    }

    #[test]
    fn test_training_features_day_index_starts_at_one() {
        let points = vec![
            PricePoint {
                date: date(2024, 1, 2),
                close: 100.0,
            },
            PricePoint {
                date: date(2024, 1, 3),
                close: 101.0,
            },
        ];

        let (features, labels) = training_features(&points);
        assert_eq!(features.len(), 2);
        assert_eq!(features[0][0], 1.0);
        assert_eq!(features[0][1], 1.0);
        assert_eq!(features[1][0], 2.0);
        assert_eq!(features[1][1], 4.0);
        assert_eq!(labels, vec![100.0, 101.0]);
    }
}
