use async_trait::async_trait;
use log::{debug, info};
use reqwest::{Client, Response};
use serde::Deserialize;
use std::time::Duration;

use crate::error::LoadError;
use crate::models::coordinates::Coordinates;
use crate::models::provider::WeatherProvider;

const GEOCODING_LIMIT: &str = "1";
const USER_AGENT: &str = concat!("weatherboard/", env!("CARGO_PKG_VERSION"));

pub struct OpenWeatherMap {
    client: Client,
    api_key: String,
    geocoding_url: String,
    weather_url: String,
}

pub fn create(
    api_key: String,
    geocoding_url: String,
    weather_url: String,
    timeout: Duration,
) -> Result<OpenWeatherMap, reqwest::Error> {
    let client = Client::builder()
        .timeout(timeout)
        .user_agent(USER_AGENT)
        .build()?;
    Ok(OpenWeatherMap {
        client,
        api_key,
        geocoding_url,
        weather_url,
    })
}

#[derive(Deserialize, Debug)]
struct GeocodingMatch {
    lat: f64,
    lon: f64,
}

#[derive(Deserialize, Debug)]
struct CurrentWeatherResponse {
    main: MainReadings,
}

#[derive(Deserialize, Debug)]
struct MainReadings {
    temp: f64,
}

fn check_status(response: Response) -> Result<Response, String> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        Err(format!("provider answered with HTTP {status}"))
    }
}

#[async_trait]
impl WeatherProvider for OpenWeatherMap {
    async fn resolve_coordinates(&self, city: &str) -> Result<Coordinates, LoadError> {
        debug!("Geocoding '{city}'");
        let response = self
            .client
            .get(&self.geocoding_url)
            .query(&[
                ("q", city),
                ("limit", GEOCODING_LIMIT),
                ("appid", self.api_key.as_str()),
            ])
            .send()
            .await
            .map_err(LoadError::coordinates)?;
        let matches: Vec<GeocodingMatch> = check_status(response)
            .map_err(LoadError::coordinates)?
            .json()
            .await
            .map_err(LoadError::coordinates)?;

        let Some(first) = matches.first() else {
            info!("No geocoding match for '{city}'");
            return Err(LoadError::CityNotFound {
                city: city.to_string(),
            });
        };
        let coordinates = Coordinates::new(first.lat, first.lon);
        debug!("Resolved '{city}' to {coordinates}");
        Ok(coordinates)
    }

    async fn current_temperature(&self, coordinates: Coordinates) -> Result<f64, LoadError> {
        debug!("Fetching current weather at {coordinates}");
        let response = self
            .client
            .get(&self.weather_url)
            .query(&[
                ("lat", coordinates.latitude.to_string()),
                ("lon", coordinates.longitude.to_string()),
                ("appid", self.api_key.clone()),
                ("units", "metric".to_string()),
            ])
            .send()
            .await
            .map_err(LoadError::weather)?;
        let weather: CurrentWeatherResponse = check_status(response)
            .map_err(LoadError::weather)?
            .json()
            .await
            .map_err(LoadError::weather)?;
        Ok(weather.main.temp)
    }

    fn name(&self) -> &str {
        "openweathermap"
    }
}
