use crate::constants::QUOTE_RANGE;
use crate::models::HistoryRow;
use chrono::{DateTime, Utc};
use isahc::{config::Configurable, prelude::*, HttpClient};
use serde_json::Value;
use std::sync::Arc;
use std::time::{Duration as StdDuration, SystemTime};
use tokio::sync::Mutex as TokioMutex;
use tokio::time::sleep;

#[derive(Debug)]
pub enum MarketError {
    Http(isahc::Error),
    Serialization(serde_json::Error),
    InvalidResponse(String),
    NoData,
}

impl From<isahc::Error> for MarketError {
    fn from(error: isahc::Error) -> Self {
        MarketError::Http(error)
    }
}

impl From<serde_json::Error> for MarketError {
    fn from(error: serde_json::Error) -> Self {
        MarketError::Serialization(error)
    }
}

impl std::fmt::Display for MarketError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MarketError::Http(e) => write!(f, "HTTP error: {}", e),
            MarketError::Serialization(e) => write!(f, "Serialization error: {}", e),
            MarketError::InvalidResponse(s) => write!(f, "Invalid response: {}", s),
            MarketError::NoData => write!(f, "No data available"),
        }
    }
}

impl std::error::Error for MarketError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            MarketError::Http(e) => Some(e),
            MarketError::Serialization(e) => Some(e),
            _ => None,
        }
    }
}

// Shared client for passing between handlers
pub type SharedMarketData = Arc<MarketDataClient>;

/// Chart-API client for the market-data provider.
///
/// One HTTP client with a fixed timeout; outbound calls go through a
/// sliding-window rate limiter so batch training cannot hammer the provider.
/// Calls are not retried: a provider failure propagates immediately.
pub struct MarketDataClient {
    client: HttpClient,
    base_url: String,
    user_agents: Vec<String>,
    random_agent: bool,
    rate_limit_per_minute: u32,
    request_timestamps: TokioMutex<Vec<SystemTime>>,
}

impl MarketDataClient {
    pub fn new(random_agent: bool, rate_limit_per_minute: u32) -> Result<Self, MarketError> {
        let client = HttpClient::builder()
            .timeout(StdDuration::from_secs(30))
            .build()?;

        let user_agents = vec![
            "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36".to_string(),
            "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36".to_string(),
            "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:120.0) Gecko/20100101 Firefox/120.0".to_string(),
            "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/16.3 Safari/605.1.15".to_string(),
            "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36 Edg/120.0.0.0".to_string(),
        ];

        Ok(MarketDataClient {
            client,
            base_url: "https://query1.finance.yahoo.com/v8/finance/chart/".to_string(),
            user_agents,
            random_agent,
            rate_limit_per_minute,
            request_timestamps: TokioMutex::new(Vec::new()),
        })
    }

    fn get_user_agent(&self) -> String {
        if self.random_agent {
            use rand::seq::SliceRandom;
            self.user_agents
                .choose(&mut rand::thread_rng())
                .unwrap_or(&self.user_agents[0])
                .clone()
        } else {
            self.user_agents[0].clone()
        }
    }

    /// Enforce rate limiting using a sliding window over the last minute
    async fn enforce_rate_limit(&self) {
        let current_time = SystemTime::now();
        let mut timestamps = self.request_timestamps.lock().await;

        // Remove timestamps older than 1 minute
        timestamps.retain(|&timestamp| {
            current_time
                .duration_since(timestamp)
                .unwrap_or(StdDuration::from_secs(0))
                < StdDuration::from_secs(60)
        });

        if timestamps.len() >= self.rate_limit_per_minute as usize {
            if let Some(&oldest_request) = timestamps.first() {
                let wait_time = StdDuration::from_secs(60)
                    - current_time
                        .duration_since(oldest_request)
                        .unwrap_or(StdDuration::from_secs(0));

                if !wait_time.is_zero() {
                    // Drop lock before sleeping so other tasks can check
                    drop(timestamps);
                    sleep(wait_time + StdDuration::from_millis(100)).await;
                    let mut timestamps = self.request_timestamps.lock().await;
                    timestamps.push(current_time);
                    return;
                }
            }
        }
        timestamps.push(current_time);
    }

    async fn make_request(&self, url: &str) -> Result<Value, MarketError> {
        self.enforce_rate_limit().await;

        let user_agent = self.get_user_agent();
        tracing::debug!(url, "Market data request");

        let request = isahc::Request::builder()
            .uri(url)
            .method("GET")
            .header("Accept", "application/json, text/plain, */*")
            .header("Accept-Language", "en-US,en;q=0.9")
            .header("User-Agent", &user_agent)
            .body(())
            .map_err(|e| MarketError::InvalidResponse(format!("Request build error: {}", e)))?;

        let mut response = self.client.send_async(request).await?;
        let status = response.status();

        if !status.is_success() {
            // The provider answers 404 for unknown or delisted symbols
            if status.as_u16() == 404 {
                return Err(MarketError::NoData);
            }
            let reason = status.canonical_reason().unwrap_or("Unknown");
            return Err(MarketError::InvalidResponse(format!(
                "HTTP error ({}) - {}",
                status.as_u16(),
                reason
            )));
        }

        let text = response
            .text()
            .await
            .map_err(|e| MarketError::InvalidResponse(format!("Response body error: {}", e)))?;

        Ok(serde_json::from_str::<Value>(&text)?)
    }

    /// Fetch daily history for a symbol over a provider range string
    /// (`"5y"`, `"1d"`, ...), sorted and deduplicated by date.
    pub async fn get_history(
        &self,
        symbol: &str,
        range: &str,
    ) -> Result<Vec<HistoryRow>, MarketError> {
        let url = format!("{}{}?range={}&interval=1d", self.base_url, symbol, range);
        let response = self.make_request(&url).await?;
        let rows = parse_chart_response(&response)?;

        tracing::debug!(symbol, range, records = rows.len(), "Fetched history");
        Ok(rows)
    }

    /// Most recent close from a 1-day quote, or None when the provider
    /// returned nothing usable for the symbol.
    pub async fn latest_close(&self, symbol: &str) -> Result<Option<f64>, MarketError> {
        let rows = match self.get_history(symbol, QUOTE_RANGE).await {
            Ok(rows) => rows,
            Err(MarketError::NoData) => return Ok(None),
            Err(e) => return Err(e),
        };
        Ok(rows.into_iter().rev().find_map(|row| row.close))
    }
}

/// Extract dated close rows from a chart-API response body.
fn parse_chart_response(response: &Value) -> Result<Vec<HistoryRow>, MarketError> {
    if let Some(error) = response["chart"]["error"].as_object() {
        let description = error
            .get("description")
            .and_then(|d| d.as_str())
            .unwrap_or("unknown provider error");
        return Err(MarketError::InvalidResponse(format!(
            "Provider error: {}",
            description
        )));
    }

    let results = response["chart"]["result"]
        .as_array()
        .ok_or(MarketError::NoData)?;
    if results.is_empty() {
        return Err(MarketError::NoData);
    }

    let item = &results[0];
    // Symbols with no observations come back without a timestamp array
    let timestamps = item["timestamp"].as_array().ok_or(MarketError::NoData)?;
    let closes = item["indicators"]["quote"][0]["close"]
        .as_array()
        .ok_or_else(|| MarketError::InvalidResponse("Missing close series".to_string()))?;

    if closes.len() != timestamps.len() {
        return Err(MarketError::InvalidResponse(
            "Inconsistent array lengths".to_string(),
        ));
    }

    let mut rows = Vec::with_capacity(timestamps.len());
    for (i, ts) in timestamps.iter().enumerate() {
        let timestamp = ts.as_i64().ok_or_else(|| {
            MarketError::InvalidResponse(format!("Invalid timestamp at index {}", i))
        })?;
        let time = DateTime::<Utc>::from_timestamp(timestamp, 0).ok_or_else(|| {
            MarketError::InvalidResponse(format!(
                "Cannot convert timestamp {} at index {}",
                timestamp, i
            ))
        })?;

        rows.push(HistoryRow {
            date: time.date_naive(),
            close: closes[i].as_f64(),
        });
    }

    // Intraday quotes can repeat a date; keep the latest observation
    rows.sort_by_key(|row| row.date);
    rows.dedup_by(|later, earlier| {
        if later.date == earlier.date {
            earlier.close = later.close.or(earlier.close);
            true
        } else {
            false
        }
    });

    if rows.is_empty() {
        return Err(MarketError::NoData);
    }
    Ok(rows)
}
