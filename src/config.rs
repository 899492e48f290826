//! Service configuration.
//!
//! Loaded from environment variables prefixed `TRAVEL_PLANNER`, with `__`
//! separating nested keys (`TRAVEL_PLANNER__OPENAI__API_KEY`,
//! `TRAVEL_PLANNER__RESPONDERS__MAX_AUTO_REPLIES`). A `.env` file is read
//! first when present. Every value except the OpenAI key has a default.

use serde::Deserialize;
use tracing::warn;

use crate::error::ConfigError;
use crate::gateway::TurnBudget;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub openai: OpenAiConfig,
    #[serde(default)]
    pub google: GoogleConfig,
    #[serde(default)]
    pub responders: ResponderConfig,
    #[serde(default)]
    pub log: LogConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl ServerConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct OpenAiConfig {
    pub api_key: Option<String>,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_temperature")]
    pub temperature: f64,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: default_model(),
            temperature: default_temperature(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct GoogleConfig {
    pub api_key: Option<String>,
    pub search_engine_id: Option<String>,
    #[serde(default = "default_search_base_url")]
    pub base_url: String,
}

impl Default for GoogleConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            search_engine_id: None,
            base_url: default_search_base_url(),
        }
    }
}

impl GoogleConfig {
    pub fn is_configured(&self) -> bool {
        self.api_key.as_ref().is_some_and(|k| !k.is_empty())
            && self.search_engine_id.as_ref().is_some_and(|id| !id.is_empty())
    }
}

/// Turn budgets, result counts and thresholds for responder calls.
#[derive(Debug, Clone, Deserialize)]
pub struct ResponderConfig {
    #[serde(default = "default_max_auto_replies")]
    pub max_auto_replies: usize,
    #[serde(default = "default_max_output_tokens")]
    pub max_output_tokens: u64,
    #[serde(default = "default_synthesis_max_auto_replies")]
    pub synthesis_max_auto_replies: usize,
    #[serde(default = "default_synthesis_max_output_tokens")]
    pub synthesis_max_output_tokens: u64,
    #[serde(default = "default_insight_results")]
    pub insight_results: usize,
    #[serde(default = "default_image_results")]
    pub image_results: usize,
    #[serde(default = "default_image_target")]
    pub image_target: usize,
    /// Formatted insights shorter than this are replaced by the fallback document.
    #[serde(default = "default_min_insights_chars")]
    pub min_insights_chars: usize,
}

impl Default for ResponderConfig {
    fn default() -> Self {
        Self {
            max_auto_replies: default_max_auto_replies(),
            max_output_tokens: default_max_output_tokens(),
            synthesis_max_auto_replies: default_synthesis_max_auto_replies(),
            synthesis_max_output_tokens: default_synthesis_max_output_tokens(),
            insight_results: default_insight_results(),
            image_results: default_image_results(),
            image_target: default_image_target(),
            min_insights_chars: default_min_insights_chars(),
        }
    }
}

impl ResponderConfig {
    pub fn content_budget(&self) -> TurnBudget {
        TurnBudget {
            max_auto_replies: self.max_auto_replies,
            max_output_tokens: self.max_output_tokens,
        }
    }

    pub fn synthesis_budget(&self) -> TurnBudget {
        TurnBudget {
            max_auto_replies: self.synthesis_max_auto_replies,
            max_output_tokens: self.synthesis_max_output_tokens,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    #[serde(default = "default_log_filter")]
    pub filter: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    8000
}
fn default_model() -> String {
    "gpt-4o-mini".to_string()
}
fn default_temperature() -> f64 {
    0.7
}
fn default_search_base_url() -> String {
    "https://www.googleapis.com/customsearch/v1".to_string()
}
fn default_max_auto_replies() -> usize {
    10
}
fn default_max_output_tokens() -> u64 {
    1500
}
fn default_synthesis_max_auto_replies() -> usize {
    15
}
fn default_synthesis_max_output_tokens() -> u64 {
    4000
}
fn default_insight_results() -> usize {
    5
}
fn default_image_results() -> usize {
    10
}
fn default_image_target() -> usize {
    5
}
fn default_min_insights_chars() -> usize {
    200
}
fn default_log_filter() -> String {
    "travel_plan_service=debug,graph_flow=info,tower_http=info".to_string()
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("TRAVEL_PLANNER")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        match self.openai.api_key.as_deref() {
            Some(key) if key.len() >= 20 => {}
            _ => {
                return Err(ConfigError::Validation(
                    "missing or invalid OpenAI API key (TRAVEL_PLANNER__OPENAI__API_KEY)".to_string(),
                ))
            }
        }

        if self.responders.max_auto_replies == 0 || self.responders.synthesis_max_auto_replies == 0 {
            return Err(ConfigError::Validation(
                "auto-reply budgets must be at least 1".to_string(),
            ));
        }

        if !self.google.is_configured() {
            warn!("Google search credentials missing; insights and images will use fallback content");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::Mutex;

    // env vars are process-global
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    #[test]
    fn defaults() {
        let config = AppConfig::default();
        assert_eq!(config.server.bind_addr(), "0.0.0.0:8000");
        assert_eq!(config.openai.model, "gpt-4o-mini");
        assert_eq!(config.responders.content_budget().max_auto_replies, 10);
        assert_eq!(config.responders.synthesis_budget().max_output_tokens, 4000);
        assert!(
            config.responders.synthesis_budget().max_auto_replies
                > config.responders.content_budget().max_auto_replies
        );
        assert!(!config.google.is_configured());
    }

    #[test]
    fn loads_nested_values_from_environment() {
        let _guard = ENV_MUTEX.lock().unwrap();
        env::set_var("TRAVEL_PLANNER__OPENAI__API_KEY", "sk-test-0123456789abcdef");
        env::set_var("TRAVEL_PLANNER__SERVER__PORT", "9100");
        env::set_var("TRAVEL_PLANNER__RESPONDERS__MIN_INSIGHTS_CHARS", "50");
        let result = AppConfig::load();
        env::remove_var("TRAVEL_PLANNER__OPENAI__API_KEY");
        env::remove_var("TRAVEL_PLANNER__SERVER__PORT");
        env::remove_var("TRAVEL_PLANNER__RESPONDERS__MIN_INSIGHTS_CHARS");

        let config = result.unwrap();
        assert_eq!(config.server.port, 9100);
        assert_eq!(config.responders.min_insights_chars, 50);
        assert_eq!(config.responders.max_auto_replies, 10);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn rejects_missing_key_and_zero_budget() {
        assert!(AppConfig::default().validate().is_err());

        let mut config = AppConfig::default();
        config.openai.api_key = Some("sk-test-0123456789abcdef".to_string());
        config.responders.max_auto_replies = 0;
        assert!(config.validate().is_err());
    }
}
