use chrono::NaiveDate;
use serde::Serialize;

/// A single daily close observation, as served by the historical endpoint.
///
/// `date` serializes as `YYYY-MM-DD`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub close: f64,
}

/// Raw provider row before missing-close rows are dropped.
///
/// The provider reports gaps (halts, partial sessions) as null closes; those
/// rows never reach training or the wire.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryRow {
    pub date: NaiveDate,
    pub close: Option<f64>,
}

/// Drop rows with a missing close price, preserving chronological order.
pub fn drop_missing(rows: Vec<HistoryRow>) -> Vec<PricePoint> {
    rows.into_iter()
        .filter_map(|row| {
            row.close.map(|close| PricePoint {
                date: row.date,
                close,
            })
        })
        .collect()
}
