use std::path::PathBuf;
use std::time::Duration;
use tracing::Level;

use crate::cli::Cli;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingVar(String),
    #[error("Invalid value for environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub openai_api_key: String,
    pub api_base: String,
    pub chat_model: String,
    pub log_level: Level,
    pub profiles_path: PathBuf,
    pub prompts_path: Option<PathBuf>,
    pub request_timeout: Duration,
    pub max_attempts: u32,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// Fails fast when `OPENAI_API_KEY` is absent so the session never starts
    /// without credentials.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Only load from .env in non-test mode to avoid contamination
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }

        let openai_api_key = std::env::var("OPENAI_API_KEY")
            .ok()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingVar("OPENAI_API_KEY".to_string()))?;

        let api_base = std::env::var("OPENAI_API_BASE")
            .unwrap_or_else(|_| "https://api.openai.com/v1".to_string());

        let chat_model =
            std::env::var("CHAT_MODEL").unwrap_or_else(|_| "gpt-3.5-turbo".to_string());

        let log_level_str = std::env::var("RUST_LOG").unwrap_or_else(|_| "WARN".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        let profiles_path = std::env::var("PROFILES_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("./assistant_profiles.json"));

        let prompts_path = std::env::var("PROMPTS_PATH").ok().map(PathBuf::from);

        let timeout_secs = parse_var::<u64>("LLM_TIMEOUT_SECS", 30)?;
        if timeout_secs == 0 {
            return Err(ConfigError::InvalidValue(
                "LLM_TIMEOUT_SECS".to_string(),
                "must be greater than zero".to_string(),
            ));
        }
        let max_attempts = parse_var::<u32>("LLM_MAX_ATTEMPTS", 3)?;

        Ok(Self {
            openai_api_key,
            api_base,
            chat_model,
            log_level,
            profiles_path,
            prompts_path,
            request_timeout: Duration::from_secs(timeout_secs),
            max_attempts,
        })
    }

    /// Applies command-line overrides on top of the environment.
    pub fn apply_cli(&mut self, cli: &Cli) {
        if let Some(path) = &cli.profiles {
            self.profiles_path = path.clone();
        }
        if let Some(path) = &cli.prompts {
            self.prompts_path = Some(path.clone());
        }
        if let Some(model) = &cli.model {
            self.chat_model = model.clone();
        }
    }
}

fn parse_var<T: std::str::FromStr>(name: &str, default: T) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    match std::env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| ConfigError::InvalidValue(name.to_string(), e.to_string())),
        Err(_) => Ok(default),
    }
}
