use std::fmt;
use std::fs::read_to_string;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use reqwest::Url;

use serde::Deserialize;
use thiserror::Error;

pub const DEFAULT_CONFIG_PATH: &str = "weatherboard.toml";

const DEFAULT_GEOCODING_URL: &str = "https://api.openweathermap.org/geo/1.0/direct";
const DEFAULT_WEATHER_URL: &str = "https://api.openweathermap.org/data/2.5/weather";
const MAX_HISTORY_DAYS: usize = 30;
const MAX_REQUEST_TIMEOUT_SECONDS: u64 = 120;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config from '{}': {source}", path.display())]
    Read { path: PathBuf, source: io::Error },
    #[error("Failed to parse config: {source}")]
    Parse {
        #[from]
        source: toml::de::Error,
    },
    #[error("An API key is required for the {provider} provider")]
    MissingApiKey { provider: ProviderKind },
    #[error("'{field}' must be an http or https URL with a host, got '{value}'")]
    InvalidUrl { field: &'static str, value: String },
    #[error("'{field}' must be between {min} and {max}, got {value}")]
    OutOfRange {
        field: &'static str,
        value: u64,
        min: u64,
        max: u64,
    },
    #[error("Failed to build HTTP client: {source}")]
    HttpClient {
        #[from]
        source: reqwest::Error,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    #[default]
    #[value(name = "openweathermap")]
    OpenWeatherMap,
    Fake,
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderKind::OpenWeatherMap => write!(f, "openweathermap"),
            ProviderKind::Fake => write!(f, "fake"),
        }
    }
}

#[derive(Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub provider: ProviderKind,
    pub api_key: Option<String>,
    pub geocoding_url: String,
    pub weather_url: String,
    pub default_city: Option<String>,
    pub history_days: usize,
    pub request_timeout_seconds: u64,
    pub port: u16,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            provider: ProviderKind::default(),
            api_key: None,
            geocoding_url: DEFAULT_GEOCODING_URL.to_string(),
            weather_url: DEFAULT_WEATHER_URL.to_string(),
            default_city: Some("London".to_string()),
            history_days: 5,
            request_timeout_seconds: 10,
            port: 3000,
        }
    }
}

// The key must never reach the log.
impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("provider", &self.provider)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("geocoding_url", &self.geocoding_url)
            .field("weather_url", &self.weather_url)
            .field("default_city", &self.default_city)
            .field("history_days", &self.history_days)
            .field("request_timeout_seconds", &self.request_timeout_seconds)
            .field("port", &self.port)
            .finish()
    }
}

impl Settings {
    pub fn from_toml(contents: &str) -> Result<Settings, ConfigError> {
        Ok(toml::from_str(contents)?)
    }

    /// Reads settings from `path`. Without an explicit path the default
    /// location is tried and silently skipped when absent.
    pub fn load(path: Option<&Path>) -> Result<Settings, ConfigError> {
        let (path, required) = match path {
            Some(path) => (path.to_path_buf(), true),
            None => (PathBuf::from(DEFAULT_CONFIG_PATH), false),
        };
        match read_to_string(&path) {
            Ok(contents) => {
                log::info!("reading config from {}", path.display());
                Settings::from_toml(&contents)
            }
            Err(err) if !required && err.kind() == io::ErrorKind::NotFound => {
                log::info!("no config at {}, using defaults", path.display());
                Ok(Settings::default())
            }
            Err(source) => Err(ConfigError::Read { path, source }),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.provider == ProviderKind::OpenWeatherMap && self.api_key().is_none() {
            return Err(ConfigError::MissingApiKey {
                provider: self.provider,
            });
        }
        for (field, value) in [
            ("geocoding_url", &self.geocoding_url),
            ("weather_url", &self.weather_url),
        ] {
            if !is_http_url(value) {
                return Err(ConfigError::InvalidUrl {
                    field,
                    value: value.clone(),
                });
            }
        }
        check_range(
            "history_days",
            self.history_days as u64,
            1,
            MAX_HISTORY_DAYS as u64,
        )?;
        check_range(
            "request_timeout_seconds",
            self.request_timeout_seconds,
            1,
            MAX_REQUEST_TIMEOUT_SECONDS,
        )?;
        Ok(())
    }

    /// The configured key with surrounding whitespace removed, if any is left.
    pub fn api_key(&self) -> Option<&str> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }

    pub fn default_city(&self) -> Option<&str> {
        self.default_city
            .as_deref()
            .map(str::trim)
            .filter(|city| !city.is_empty())
    }
}

/// An absolute http(s) URL with a host.
fn is_http_url(value: &str) -> bool {
    match Url::parse(value) {
        Ok(url) => matches!(url.scheme(), "http" | "https") && url.host().is_some(),
        Err(_) => false,
    }
}

fn check_range(field: &'static str, value: u64, min: u64, max: u64) -> Result<(), ConfigError> {
    if value < min || value > max {
        return Err(ConfigError::OutOfRange {
            field,
            value,
            min,
            max,
        });
    }
    Ok(())
}
