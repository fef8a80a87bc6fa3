use chrono::{DateTime, Utc};
use serde::Serialize;

/// Full prediction response, camelCase on the wire for the frontend.
///
/// Created fresh per request, never persisted.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictionResult {
    pub ticker: String,
    pub year: i32,
    pub month: u32,
    pub day: u32,
    pub predicted_price: f64,
    pub current_price: f64,
    pub confidence: u32,
    pub created_at: DateTime<Utc>,
}

/// Response of the legacy single-feature prediction endpoint.
/// Unlike the full result, this wire shape predates the frontend's
/// camelCase convention and stays snake_case.
#[derive(Debug, Clone, Serialize)]
pub struct SimplePrediction {
    pub ticker: String,
    pub year: i32,
    pub predicted_price: f64,
}

/// Response of the training endpoint: where the model and its metadata
/// sidecar were persisted.
#[derive(Debug, Clone, Serialize)]
pub struct TrainReport {
    pub status: String,
    pub model_file: String,
    pub meta_file: String,
}

/// Round to two decimal places for price fields.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round2() {
        assert_eq!(round2(123.456), 123.46);
        assert_eq!(round2(123.454), 123.45);
        assert_eq!(round2(0.005), 0.01);
    }

    #[test]
    fn test_prediction_result_is_camel_case() {
        let result = PredictionResult {
            ticker: "RELIANCE.NS".to_string(),
            year: 2027,
            month: 3,
            day: 15,
            predicted_price: 2501.25,
            current_price: 2400.5,
            confidence: 90,
            created_at: Utc::now(),
        };

        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["predictedPrice"], 2501.25);
        assert_eq!(json["currentPrice"], 2400.5);
        assert!(json.get("createdAt").is_some());
        assert!(json.get("predicted_price").is_none());
    }

    #[test]
    fn test_simple_prediction_stays_snake_case() {
        let result = SimplePrediction {
            ticker: "VCB".to_string(),
            year: 2027,
            predicted_price: 99.5,
        };
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["predicted_price"], 99.5);
    }

    #[test]
    fn test_train_report_keys() {
        let report = TrainReport {
            status: "ok".to_string(),
            model_file: "models/VCB.model".to_string(),
            meta_file: "models/VCB_meta.json".to_string(),
        };
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["status"], "ok");
        assert_eq!(json["model_file"], "models/VCB.model");
    }
}
