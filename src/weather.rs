use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::LoadError;
use crate::models::coordinates::Coordinates;
use crate::models::history::{HistoryPoint, generate_history};
use crate::models::provider::WeatherProvider;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct WeatherReport {
    pub city: String,
    pub coordinates: Coordinates,
    /// Celsius.
    pub current: f64,
    /// Oldest first; the last point is `current`.
    pub history: Vec<HistoryPoint>,
    pub fetched_at: DateTime<Utc>,
}

/// Resolves `city`, reads its current temperature and pads it with
/// `history_days` of synthetic history. The first failure aborts the load.
pub async fn fetch_weather_report(
    provider: &dyn WeatherProvider,
    city: &str,
    history_days: usize,
    today: NaiveDate,
) -> Result<WeatherReport, LoadError> {
    let coordinates = provider.resolve_coordinates(city).await?;
    let current = provider.current_temperature(coordinates).await?;
    log::info!(
        "Current temperature in {} ({}) is {:.2}°C according to {}",
        city,
        coordinates,
        current,
        provider.name()
    );
    let history = generate_history(current, history_days, today, &mut rand::rng());
    Ok(WeatherReport {
        city: city.to_string(),
        coordinates,
        current,
        history,
        fetched_at: Utc::now(),
    })
}
