use std::env;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{DeskbotError, Result};

/// Model-provider settings. The demo drives Gemini through its
/// OpenAI-compatible chat-completions surface.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ModelConfig {
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub endpoint: Option<String>,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            api_key: None,
            endpoint: None,
        }
    }
}

fn default_model() -> String {
    "gemini-2.0-flash".into()
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WeatherConfig {
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_weather_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_weather_timeout")]
    pub timeout_secs: u64,
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            endpoint: default_weather_endpoint(),
            timeout_secs: default_weather_timeout(),
        }
    }
}

fn default_weather_endpoint() -> String {
    "http://api.weatherapi.com/v1/current.json".into()
}

fn default_weather_timeout() -> u64 {
    5
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EscalationConfig {
    #[serde(default = "default_trigger_phrases")]
    pub trigger_phrases: Vec<String>,
}

impl Default for EscalationConfig {
    fn default() -> Self {
        Self {
            trigger_phrases: default_trigger_phrases(),
        }
    }
}

fn default_trigger_phrases() -> Vec<String> {
    vec!["password".into(), "billing".into()]
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AppConfig {
    #[serde(default)]
    pub model: ModelConfig,
    #[serde(default)]
    pub weather: WeatherConfig,
    #[serde(default)]
    pub escalation: EscalationConfig,
}

impl AppConfig {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let raw = fs::read_to_string(path)?;
        let cfg: Self = toml::from_str(&raw)
            .map_err(|err| DeskbotError::Config(format!("failed to parse configuration: {err}")))?;
        Ok(cfg)
    }

    pub fn from_env_or_file(path: impl AsRef<Path>) -> Result<Self> {
        let mut cfg = Self::from_file(path)?;
        cfg.apply_env();
        cfg.validate()?;
        Ok(cfg)
    }

    /// Pure-environment configuration, the path the demo binary takes when
    /// no config file is given.
    pub fn from_env() -> Result<Self> {
        let mut cfg = Self::default();
        cfg.apply_env();
        cfg.validate()?;
        Ok(cfg)
    }

    fn apply_env(&mut self) {
        if let Ok(key) = env::var("GEMINI_API_KEY") {
            self.model.api_key = Some(key);
        }
        if let Ok(key) = env::var("WEATHER_API_KEY") {
            self.weather.api_key = Some(key);
        }
        if let Ok(model) = env::var("DESKBOT_MODEL") {
            self.model.model = model;
        }
        if let Ok(endpoint) = env::var("DESKBOT_MODEL_ENDPOINT") {
            self.model.endpoint = Some(endpoint);
        }
        if let Ok(endpoint) = env::var("DESKBOT_WEATHER_ENDPOINT") {
            self.weather.endpoint = endpoint;
        }
        if let Ok(triggers) = env::var("DESKBOT_ESCALATION_TRIGGERS") {
            let phrases: Vec<String> = triggers
                .split(',')
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(str::to_string)
                .collect();
            if !phrases.is_empty() {
                self.escalation.trigger_phrases = phrases;
            }
        }
    }

    /// The model-provider key is the one secret startup cannot proceed
    /// without; the weather key only degrades the weather tool.
    fn validate(&self) -> Result<()> {
        if self.model.api_key.as_deref().unwrap_or("").is_empty() {
            return Err(DeskbotError::Config(
                "GEMINI_API_KEY not set (environment or [model] api_key)".into(),
            ));
        }
        if self.weather.api_key.is_none() {
            tracing::warn!("WEATHER_API_KEY not set; the weather tool will report errors");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn loads_file_and_applies_env_overrides() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[model]\nmodel='gemini-1.5-pro'\napi_key='from-file'\n[weather]\napi_key='w'"
        )
        .unwrap();

        env::remove_var("GEMINI_API_KEY");
        env::set_var("DESKBOT_MODEL", "gemini-2.0-flash");
        let cfg = AppConfig::from_env_or_file(file.path()).unwrap();
        env::remove_var("DESKBOT_MODEL");

        assert_eq!(cfg.model.model, "gemini-2.0-flash");
        assert_eq!(cfg.model.api_key.as_deref(), Some("from-file"));
        assert_eq!(cfg.weather.timeout_secs, 5);
    }

    #[test]
    fn missing_model_key_is_fatal() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[weather]\napi_key='w'").unwrap();

        env::remove_var("GEMINI_API_KEY");
        let err = AppConfig::from_env_or_file(file.path()).unwrap_err();
        assert!(matches!(err, DeskbotError::Config(_)));
    }

    #[test]
    fn splits_escalation_triggers() {
        let mut cfg = AppConfig::default();
        env::set_var("DESKBOT_ESCALATION_TRIGGERS", "refund, chargeback");
        cfg.apply_env();
        env::remove_var("DESKBOT_ESCALATION_TRIGGERS");

        assert_eq!(cfg.escalation.trigger_phrases, vec!["refund", "chargeback"]);
    }
}
