//! Weather toolkit.
//!
//! Wraps the weatherapi.com current-conditions endpoint. Failure handling
//! is degrade-to-string rather than degrade-to-fault: whatever happens, the
//! tool returns a line the agent can relay verbatim to the user.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::config::WeatherConfig;
use crate::error::{DeskbotError, Result};
use crate::tool::Tool;

/// Typed view of the fields we relay from the weather API.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct WeatherReport {
    pub location: WeatherLocation,
    pub current: CurrentConditions,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct WeatherLocation {
    pub name: String,
    pub region: String,
    pub country: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CurrentConditions {
    pub last_updated: String,
    pub temp_c: f64,
    pub temp_f: f64,
    pub wind_kph: f64,
    pub cloud: i64,
    pub humidity: i64,
    pub condition: WeatherCondition,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct WeatherCondition {
    pub text: String,
}

impl fmt::Display for WeatherReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}, {}, {}, last updated {}, {}°C, {}°F, {}, cloud {}%, humidity {}%, wind {} kph",
            self.location.name,
            self.location.region,
            self.location.country,
            self.current.last_updated,
            self.current.temp_c,
            self.current.temp_f,
            self.current.condition.text,
            self.current.cloud,
            self.current.humidity,
            self.current.wind_kph,
        )
    }
}

pub fn parse_report(body: &str) -> Result<WeatherReport> {
    Ok(serde_json::from_str(body)?)
}

/// Fetch current weather for a city.
pub struct WeatherTool {
    http: reqwest::Client,
    config: WeatherConfig,
}

impl WeatherTool {
    pub fn new(config: WeatherConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|err| DeskbotError::Config(format!("http client error: {err}")))?;
        Ok(Self { http, config })
    }

    /// Always returns a displayable line: current conditions on success,
    /// an error marker string otherwise.
    async fn current_conditions(&self, city: &str) -> String {
        let key = self.config.api_key.as_deref().unwrap_or_default();
        let response = self
            .http
            .get(&self.config.endpoint)
            .query(&[("key", key), ("q", city), ("aqi", "no")])
            .send()
            .await
            .and_then(|resp| resp.error_for_status());

        let response = match response {
            Ok(resp) => resp,
            Err(err) => return format!("Error fetching weather data for {city}: {err}"),
        };

        let body = match response.text().await {
            Ok(body) => body,
            Err(err) => return format!("Error fetching weather data for {city}: {err}"),
        };

        match parse_report(&body) {
            Ok(report) => report.to_string(),
            Err(err) => {
                tracing::debug!(%err, "weather response did not match the expected shape");
                "Could not parse weather data.".to_string()
            }
        }
    }
}

#[async_trait]
impl Tool for WeatherTool {
    fn name(&self) -> &str {
        "get_weather"
    }

    fn description(&self) -> &str {
        "Fetch current weather for a given city."
    }

    fn parameters(&self) -> Option<Value> {
        Some(json!({
            "type": "object",
            "properties": {
                "city": {"type": "string", "description": "City name to look up"}
            },
            "required": ["city"]
        }))
    }

    async fn call(&self, input: Value) -> Result<Value> {
        let city = input
            .get("city")
            .and_then(Value::as_str)
            .ok_or_else(|| DeskbotError::Protocol("missing `city` for get_weather".into()))?;

        Ok(Value::String(self.current_conditions(city).await))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_payload() -> String {
        json!({
            "location": {"name": "Karachi", "region": "Sindh", "country": "Pakistan"},
            "current": {
                "last_updated": "2024-06-01 14:30",
                "temp_c": 34.0,
                "temp_f": 93.2,
                "wind_kph": 18.4,
                "cloud": 25,
                "humidity": 60,
                "condition": {"text": "Partly cloudy"}
            }
        })
        .to_string()
    }

    #[test]
    fn formats_all_nine_fields_in_order() {
        let report = parse_report(&sample_payload()).unwrap();
        let line = report.to_string();

        assert_eq!(
            line,
            "Karachi, Sindh, Pakistan, last updated 2024-06-01 14:30, 34°C, 93.2°F, Partly cloudy, cloud 25%, humidity 60%, wind 18.4 kph"
        );
    }

    #[test]
    fn malformed_body_fails_to_parse() {
        assert!(parse_report(r#"{"error": {"message": "bad key"}}"#).is_err());
        assert!(parse_report("not json at all").is_err());
    }

    #[tokio::test]
    async fn unreachable_endpoint_degrades_to_error_string() {
        let config = WeatherConfig {
            api_key: Some("key".into()),
            endpoint: "http://127.0.0.1:9/current.json".into(),
            timeout_secs: 1,
        };
        let tool = WeatherTool::new(config).unwrap();

        let output = tool.call(json!({"city": "Karachi"})).await.unwrap();
        let text = output.as_str().unwrap();
        assert!(text.starts_with("Error fetching weather data for Karachi:"));
    }

    #[tokio::test]
    async fn missing_city_is_a_protocol_error() {
        let tool = WeatherTool::new(WeatherConfig::default()).unwrap();
        let err = tool.call(json!({})).await.unwrap_err();
        assert!(matches!(err, DeskbotError::Protocol(_)));
    }
}
