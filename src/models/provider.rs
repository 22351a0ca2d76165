use async_trait::async_trait;
use std::sync::Arc;

use crate::config::{ConfigError, ProviderKind, Settings};
use crate::error::LoadError;
use crate::models::coordinates::Coordinates;

/// A source of geocoding and current-weather data.
#[async_trait]
pub trait WeatherProvider: Send + Sync {
    /// Resolves a free-text city name to the first match the provider knows.
    async fn resolve_coordinates(&self, city: &str) -> Result<Coordinates, LoadError>;
    /// Current temperature at `coordinates` in degrees Celsius.
    async fn current_temperature(&self, coordinates: Coordinates) -> Result<f64, LoadError>;
    fn name(&self) -> &str;
}

pub type ProviderHandle = Arc<dyn WeatherProvider>;

pub fn create_provider(settings: &Settings) -> Result<ProviderHandle, ConfigError> {
    log::info!("Creating {} weather provider", settings.provider);
    let provider: ProviderHandle = match settings.provider {
        ProviderKind::OpenWeatherMap => {
            let api_key = settings
                .api_key()
                .ok_or(ConfigError::MissingApiKey {
                    provider: settings.provider,
                })?
                .to_string();
            Arc::new(crate::models::openweathermap::create(
                api_key,
                settings.geocoding_url.clone(),
                settings.weather_url.clone(),
                settings.request_timeout(),
            )?)
        }
        ProviderKind::Fake => Arc::new(crate::models::fake_provider::create()),
    };
    Ok(provider)
}
