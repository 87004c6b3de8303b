//! Runtime configuration, read from environment variables.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::error::{FlowError, Result};
use crate::imputation::ImputationTable;
use crate::schema::Domain;

/// Where and how predictions are requested
#[derive(Debug, Clone, PartialEq)]
pub struct PredictionApiConfig {
    pub base_url: String,
    pub delay_endpoint: String,
    pub cost_overrun_endpoint: String,
    pub timeout: Duration,
}

impl PredictionApiConfig {
    pub fn endpoint(&self, domain: Domain) -> String {
        let path = match domain {
            Domain::Delay => &self.delay_endpoint,
            Domain::CostOverrun => &self.cost_overrun_endpoint,
        };
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

impl Default for PredictionApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000/api".to_string(),
            delay_endpoint: "/predict/delay".to_string(),
            cost_overrun_endpoint: "/predict/cost-overrun".to_string(),
            timeout: Duration::from_secs(30),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AssistantConfig {
    pub prediction: PredictionApiConfig,
    /// Pause before each assistant reply
    pub reply_delay: Duration,
    /// Inputs held while a prediction is in flight
    pub pending_input_limit: usize,
    pub imputation_table: Option<PathBuf>,
    /// Sessions untouched for this long are discarded
    pub session_idle_ttl: Duration,
    pub port: u16,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            prediction: PredictionApiConfig::default(),
            reply_delay: Duration::from_millis(300),
            pending_input_limit: 8,
            imputation_table: None,
            session_idle_ttl: Duration::from_secs(30 * 60),
            port: 3000,
        }
    }
}

fn parse_var<T: FromStr>(name: &str, raw: Option<String>, fallback: T) -> Result<T> {
    match raw {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| FlowError::Config(format!("{name} has an invalid value `{value}`"))),
        None => Ok(fallback),
    }
}

impl AssistantConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from an arbitrary variable source
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = Self::default();
        let api = defaults.prediction;

        let timeout_secs = parse_var(
            "PREDICTION_TIMEOUT_SECS",
            lookup("PREDICTION_TIMEOUT_SECS"),
            api.timeout.as_secs(),
        )?;
        let reply_delay_ms = parse_var(
            "REPLY_DELAY_MS",
            lookup("REPLY_DELAY_MS"),
            defaults.reply_delay.as_millis() as u64,
        )?;

        let idle_ttl_secs = parse_var(
            "SESSION_IDLE_TTL_SECS",
            lookup("SESSION_IDLE_TTL_SECS"),
            defaults.session_idle_ttl.as_secs(),
        )?;

        let config = Self {
            prediction: PredictionApiConfig {
                base_url: lookup("PREDICTION_API_URL").unwrap_or(api.base_url),
                delay_endpoint: lookup("DELAY_ENDPOINT").unwrap_or(api.delay_endpoint),
                cost_overrun_endpoint: lookup("COST_OVERRUN_ENDPOINT")
                    .unwrap_or(api.cost_overrun_endpoint),
                timeout: Duration::from_secs(timeout_secs),
            },
            reply_delay: Duration::from_millis(reply_delay_ms),
            pending_input_limit: parse_var(
                "PENDING_INPUT_LIMIT",
                lookup("PENDING_INPUT_LIMIT"),
                defaults.pending_input_limit,
            )?,
            imputation_table: lookup("IMPUTATION_TABLE")
                .filter(|p| !p.trim().is_empty())
                .map(PathBuf::from),
            session_idle_ttl: Duration::from_secs(idle_ttl_secs),
            port: parse_var("PORT", lookup("PORT"), defaults.port)?,
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.prediction.timeout.is_zero() {
            return Err(FlowError::Config(
                "PREDICTION_TIMEOUT_SECS must be greater than zero".to_string(),
            ));
        }
        if self.session_idle_ttl.is_zero() {
            return Err(FlowError::Config(
                "SESSION_IDLE_TTL_SECS must be greater than zero".to_string(),
            ));
        }
        if self.pending_input_limit == 0 {
            return Err(FlowError::Config(
                "PENDING_INPUT_LIMIT must be greater than zero".to_string(),
            ));
        }
        if !self.prediction.base_url.starts_with("http://")
            && !self.prediction.base_url.starts_with("https://")
        {
            return Err(FlowError::Config(format!(
                "PREDICTION_API_URL must be an http(s) URL, got `{}`",
                self.prediction.base_url
            )));
        }
        Ok(())
    }

    /// The configured table, or the built-in one when no file is set
    pub fn load_imputation_table(&self) -> Result<ImputationTable> {
        match &self.imputation_table {
            Some(path) => ImputationTable::from_path(path),
            None => Ok(ImputationTable::default()),
        }
    }
}
