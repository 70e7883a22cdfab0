//! Configuration types and loading.
//!
//! Config is loaded from a JSON file (e.g. `~/.weatherbot/config.json`) and environment.
//! Credentials come from the environment first (`OWM_API_KEY`, `TELEGRAM_API_KEY`) and fall back
//! to the file. Both are required before the polling loop may start.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Env var holding the OpenWeather API key.
pub const WEATHER_API_KEY_ENV: &str = "OWM_API_KEY";
/// Env var holding the Telegram bot token.
pub const TELEGRAM_TOKEN_ENV: &str = "TELEGRAM_API_KEY";

pub const DEFAULT_TELEGRAM_API_BASE: &str = "https://api.telegram.org";
pub const DEFAULT_WEATHER_API_URL: &str = "https://api.openweathermap.org/data/2.5/weather";

/// Top-level application config.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Telegram bot settings.
    #[serde(default)]
    pub telegram: TelegramConfig,

    /// Weather provider settings.
    #[serde(default)]
    pub weather: WeatherConfig,

    /// Poll loop timing.
    #[serde(default)]
    pub polling: PollingConfig,
}

/// Telegram Bot API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TelegramConfig {
    /// Bot token from BotFather. Overridden by TELEGRAM_API_KEY env when set.
    pub bot_token: Option<String>,

    /// Bot API base URL (default "https://api.telegram.org").
    #[serde(default = "default_telegram_api_base")]
    pub api_base: String,
}

/// OpenWeather current-weather settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeatherConfig {
    /// API key. Overridden by OWM_API_KEY env when set.
    pub api_key: Option<String>,

    /// Full URL of the current-weather endpoint.
    #[serde(default = "default_weather_api_url")]
    pub api_url: String,

    /// Language of the condition description (default "en").
    #[serde(default = "default_weather_lang")]
    pub lang: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PollingConfig {
    /// Pause between ticks in seconds (default 3, minimum 1).
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,

    /// Per-request timeout for both providers. Unset means the transport default (none).
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,
}

const MIN_INTERVAL_SECS: u64 = 1;

fn default_telegram_api_base() -> String {
    DEFAULT_TELEGRAM_API_BASE.to_string()
}

fn default_weather_api_url() -> String {
    DEFAULT_WEATHER_API_URL.to_string()
}

fn default_weather_lang() -> String {
    "en".to_string()
}

fn default_interval_secs() -> u64 {
    3
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            bot_token: None,
            api_base: default_telegram_api_base(),
        }
    }
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_url: default_weather_api_url(),
            lang: default_weather_lang(),
        }
    }
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
            request_timeout_secs: None,
        }
    }
}

impl PollingConfig {
    /// Pause between ticks. Zero is raised to one second so the loop never spins on getUpdates.
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs.max(MIN_INTERVAL_SECS))
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }
}

/// Startup configuration failures. These are the only fatal errors of the bot.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{what} is not set (export {env} or set it in the config file)")]
    MissingCredential {
        what: &'static str,
        env: &'static str,
    },
}

/// Both credentials the bot needs, resolved from env and config.
#[derive(Clone)]
pub struct Credentials {
    pub weather_api_key: String,
    pub telegram_token: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials").finish_non_exhaustive()
    }
}

impl Credentials {
    /// Resolve both credentials. The weather key is checked first.
    pub fn resolve(config: &Config) -> Result<Self, ConfigError> {
        let weather_api_key =
            resolve_weather_api_key(config).ok_or(ConfigError::MissingCredential {
                what: "OpenWeather API key",
                env: WEATHER_API_KEY_ENV,
            })?;
        let telegram_token =
            resolve_telegram_token(config).ok_or(ConfigError::MissingCredential {
                what: "Telegram API key",
                env: TELEGRAM_TOKEN_ENV,
            })?;
        Ok(Self {
            weather_api_key,
            telegram_token,
        })
    }
}

fn non_empty(s: &str) -> Option<String> {
    let t = s.trim();
    if t.is_empty() {
        None
    } else {
        Some(t.to_string())
    }
}

/// Resolve the Telegram bot token: env TELEGRAM_API_KEY overrides config.
pub fn resolve_telegram_token(config: &Config) -> Option<String> {
    std::env::var(TELEGRAM_TOKEN_ENV)
        .ok()
        .and_then(|s| non_empty(&s))
        .or_else(|| config.telegram.bot_token.as_deref().and_then(non_empty))
}

/// Resolve the OpenWeather API key: env OWM_API_KEY overrides config.
pub fn resolve_weather_api_key(config: &Config) -> Option<String> {
    std::env::var(WEATHER_API_KEY_ENV)
        .ok()
        .and_then(|s| non_empty(&s))
        .or_else(|| config.weather.api_key.as_deref().and_then(non_empty))
}

/// Resolve config path from env or default.
pub fn default_config_path() -> PathBuf {
    std::env::var("WEATHERBOT_CONFIG_PATH")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            dirs::home_dir()
                .map(|h| h.join(".weatherbot").join("config.json"))
                .unwrap_or_else(|| PathBuf::from("config.json"))
        })
}

/// Load config from the given path (or the default). Missing file => default config.
/// Returns the config and the path that was used.
pub fn load_config(path: Option<PathBuf>) -> Result<(Config, PathBuf)> {
    let path = path.unwrap_or_else(default_config_path);
    let config = if !path.exists() {
        log::debug!("config file not found, using defaults: {}", path.display());
        Config::default()
    } else {
        let s = std::fs::read_to_string(&path)
            .with_context(|| format!("reading config from {}", path.display()))?;
        serde_json::from_str(&s)
            .with_context(|| format!("parsing config from {}", path.display()))?
    };
    Ok((config, path))
}
