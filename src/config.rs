//! Application configuration
//!
//! Read once at startup from the environment (and `.env`). The resulting
//! values are handed to the engine explicitly; nothing reads the environment
//! after `from_env` returns.

use crate::agent::GeminiAgent;
use crate::error::QueryError;
use crate::resolver::{EngineConfig, DEFAULT_AGENT_TIMEOUT};
use crate::Result;
use std::env;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

pub const DEFAULT_DATA_FILE: &str = "data/stocks.csv";
pub const DEFAULT_RESULTS_FILE: &str = "results/analysis_results.csv";
pub const DEFAULT_TEMPERATURE: f32 = 0.5;
pub const DEFAULT_PORT: u16 = 8080;

const PLACEHOLDER_KEYS: &[&str] = &["your_gemini_api_key_here", "mock_key"];

#[derive(Debug, Clone)]
pub struct AppConfig {
    /// `None` means the reasoning agent is not configured
    pub api_key: Option<String>,
    pub data_file: PathBuf,
    pub results_file: PathBuf,
    pub temperature: f32,
    pub agent_timeout: Duration,
    pub port: u16,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            data_file: PathBuf::from(DEFAULT_DATA_FILE),
            results_file: PathBuf::from(DEFAULT_RESULTS_FILE),
            temperature: DEFAULT_TEMPERATURE,
            agent_timeout: DEFAULT_AGENT_TIMEOUT,
            port: DEFAULT_PORT,
        }
    }
}

impl AppConfig {
    /// Load `.env` (if present) and read settings from the environment
    pub fn from_env() -> Result<Self> {
        if let Err(e) = dotenv::dotenv() {
            info!("No .env file loaded: {}", e);
        }

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a config from any key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let api_key = lookup("GEMINI_API_KEY").and_then(normalize_key);

        let temperature = match lookup("MODEL_TEMPERATURE") {
            Some(raw) => parse_var("MODEL_TEMPERATURE", &raw)?,
            None => defaults.temperature,
        };

        let agent_timeout = match lookup("AGENT_TIMEOUT_SECS") {
            Some(raw) => Duration::from_secs(parse_var("AGENT_TIMEOUT_SECS", &raw)?),
            None => defaults.agent_timeout,
        };

        let port = match lookup("PORT").or_else(|| lookup("API_PORT")) {
            Some(raw) => parse_var("PORT", &raw)?,
            None => defaults.port,
        };

        Ok(Self {
            api_key,
            data_file: lookup("CSV_FILE_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.data_file),
            results_file: lookup("RESULTS_FILE_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.results_file),
            temperature,
            agent_timeout,
            port,
        })
    }

    /// Override the key (e.g. from a CLI flag)
    pub fn with_api_key(mut self, key: Option<String>) -> Self {
        if let Some(key) = key.and_then(normalize_key) {
            self.api_key = Some(key);
        }
        self
    }

    /// Engine configuration; the agent is attached only when a key is set
    pub fn engine_config(&self) -> Result<EngineConfig> {
        match &self.api_key {
            Some(key) => {
                let agent = GeminiAgent::new(key.clone(), self.temperature)?;
                info!("Reasoning agent: gemini");
                Ok(EngineConfig::with_agent(Arc::new(agent), self.agent_timeout))
            }
            None => {
                warn!("GEMINI_API_KEY not set; unclassified questions get the fallback answer");
                Ok(EngineConfig::offline())
            }
        }
    }
}

fn normalize_key(raw: String) -> Option<String> {
    let key = raw.trim();
    if key.is_empty() || PLACEHOLDER_KEYS.contains(&key) {
        None
    } else {
        Some(key.to_string())
    }
}

fn parse_var<T: std::str::FromStr>(name: &str, raw: &str) -> Result<T> {
    raw.trim()
        .parse()
        .map_err(|_| QueryError::ConfigError(format!("{} has invalid value '{}'", name, raw)))
}
