use anyhow::{Context, Result};
use dirs::{config_dir, data_dir};
use secrecy::SecretString;
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_FEED_URL: &str = "https://cointelegraph.com/rss/tag/blockchain";
pub const DEFAULT_MODEL: &str = "meta-llama/llama-4-maverick-17b-128e-instruct";
pub const DEFAULT_LLM_API_BASE: &str = "https://api.groq.com/openai/v1";
pub const DEFAULT_X_API_BASE: &str = "https://api.twitter.com";
pub const DEFAULT_CONTENT_SELECTOR: &str = "div.post-content p";
pub const DEFAULT_TITLE_SELECTOR: &str = "h1.post__title";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("environment variable {0} is not set")]
    MissingEnv(&'static str),
}

/// Shape of config.toml on disk
///
/// Example:
/// feed_url = "https://cointelegraph.com/rss/tag/blockchain"
/// history_file = "/some/custom/tweet_history.json"
/// topics_file = "/some/custom/topics.json"
/// poll_interval_secs = 300
/// model = "meta-llama/llama-4-maverick-17b-128e-instruct"
/// content_selector = "div.post-content p"
#[derive(Debug, Default, Deserialize)]
pub struct RawConfig {
    pub feed_url: Option<String>,
    pub history_file: Option<String>,
    pub topics_file: Option<String>,
    pub poll_interval_secs: Option<u64>,
    pub request_timeout_secs: Option<u64>,
    pub model: Option<String>,
    pub llm_api_base: Option<String>,
    pub x_api_base: Option<String>,
    pub content_selector: Option<String>,
    pub title_selector: Option<String>,
}

/// Resolved config used by the app
#[derive(Debug, Clone)]
pub struct Config {
    pub feed_url: String,
    pub history_path: PathBuf,
    pub topics_path: PathBuf,
    pub poll_interval: Duration,
    pub request_timeout: Duration,
    pub model: String,
    pub llm_api_base: String,
    pub x_api_base: String,
    pub content_selector: String,
    pub title_selector: String,
}

/// API credentials, read from the environment (or `.env`).
#[derive(Debug)]
pub struct Credentials {
    pub api_key: SecretString,
    pub api_key_secret: SecretString,
    pub access_token: SecretString,
    pub access_token_secret: SecretString,
    pub groq_api_key: SecretString,
}

impl Credentials {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            api_key: secret_var("API_KEY")?,
            api_key_secret: secret_var("API_KEY_SECRET")?,
            access_token: secret_var("ACCESS_TOKEN")?,
            access_token_secret: secret_var("ACCESS_TOKEN_SECRET")?,
            groq_api_key: secret_var("GROQ_API_KEY")?,
        })
    }
}

fn secret_var(name: &'static str) -> Result<SecretString, ConfigError> {
    match env::var(name) {
        Ok(v) if !v.trim().is_empty() => Ok(SecretString::from(v)),
        _ => Err(ConfigError::MissingEnv(name)),
    }
}

fn default_config_path() -> PathBuf {
    if let Ok(custom) = env::var("FEEDPOST_CONFIG") {
        return PathBuf::from(custom);
    }
    config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("feedpost")
        .join("config.toml")
}

fn default_data_file(name: &str) -> PathBuf {
    data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("feedpost")
        .join(name)
}

/// Load config from ~/.config/feedpost/config.toml (or `$FEEDPOST_CONFIG`)
/// if it exists, otherwise use defaults.
pub fn load_config() -> Result<Config> {
    let config_path = default_config_path();

    let raw = if config_path.exists() {
        let contents = fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config '{}'", config_path.display()))?;
        toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config '{}'", config_path.display()))?
    } else {
        RawConfig::default()
    };

    Ok(resolve(raw))
}

/// Fill every unset key with its default.
pub fn resolve(raw: RawConfig) -> Config {
    Config {
        feed_url: raw.feed_url.unwrap_or_else(|| DEFAULT_FEED_URL.to_string()),
        history_path: raw
            .history_file
            .map(PathBuf::from)
            .unwrap_or_else(|| default_data_file("tweet_history.json")),
        topics_path: raw
            .topics_file
            .map(PathBuf::from)
            .unwrap_or_else(|| default_data_file("topics.json")),
        poll_interval: Duration::from_secs(raw.poll_interval_secs.unwrap_or(300)),
        request_timeout: Duration::from_secs(raw.request_timeout_secs.unwrap_or(30)),
        model: raw.model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
        llm_api_base: raw
            .llm_api_base
            .unwrap_or_else(|| DEFAULT_LLM_API_BASE.to_string()),
        x_api_base: raw
            .x_api_base
            .unwrap_or_else(|| DEFAULT_X_API_BASE.to_string()),
        content_selector: raw
            .content_selector
            .unwrap_or_else(|| DEFAULT_CONTENT_SELECTOR.to_string()),
        title_selector: raw
            .title_selector
            .unwrap_or_else(|| DEFAULT_TITLE_SELECTOR.to_string()),
    }
}

/// Shared blocking HTTP client handed to every component.
pub fn http_client(cfg: &Config) -> Result<reqwest::blocking::Client> {
    let client = reqwest::blocking::Client::builder()
        .user_agent(concat!("feedpost/", env!("CARGO_PKG_VERSION")))
        .timeout(cfg.request_timeout)
        .build()
        .context("Failed to build HTTP client")?;
    Ok(client)
}
