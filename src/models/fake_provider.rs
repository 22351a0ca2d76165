use crate::error::LoadError;
use crate::models::coordinates::Coordinates;
use crate::models::provider::WeatherProvider;
use async_trait::async_trait;
use rand::Rng;
use rand_distr::StandardNormal;

pub const FAKE_PROVIDER_NOISE: f64 = 1.5;
pub const FAKE_PROVIDER_EQUATOR_TEMPERATURE: f64 = 30.0;
pub const FAKE_PROVIDER_LAPSE_PER_DEGREE: f64 = 0.45;

const FAKE_PROVIDER_CITIES: &[(&str, f64, f64)] = &[
    ("London", 51.5073, -0.1276),
    ("Chennai", 13.0837, 80.2702),
    ("New York", 40.7127, -74.0059),
    ("Gothenburg", 57.7072, 11.9668),
    ("Onsala", 57.3934, 11.9178),
    ("Tokyo", 35.6828, 139.7594),
    ("Sydney", -33.8698, 151.2083),
    ("Reykjavik", 64.1460, -21.9422),
    ("Nairobi", -1.2833, 36.8167),
    ("Buenos Aires", -34.6076, -58.4371),
];

/// Offline provider with a small built-in gazetteer. Temperatures fall off
/// with latitude and carry some gaussian noise.
pub struct FakeProvider {
    pub cities: Vec<(String, Coordinates)>,
}

pub fn create() -> FakeProvider {
    FakeProvider {
        cities: FAKE_PROVIDER_CITIES
            .iter()
            .map(|(name, latitude, longitude)| {
                (name.to_string(), Coordinates::new(*latitude, *longitude))
            })
            .collect(),
    }
}

fn fake_temperature(coordinates: Coordinates, noise: f64) -> f64 {
    let temperature = FAKE_PROVIDER_EQUATOR_TEMPERATURE
        - FAKE_PROVIDER_LAPSE_PER_DEGREE * coordinates.latitude.abs()
        + FAKE_PROVIDER_NOISE * noise;
    (temperature * 100.0).round() / 100.0
}

#[async_trait]
impl WeatherProvider for FakeProvider {
    async fn resolve_coordinates(&self, city: &str) -> Result<Coordinates, LoadError> {
        let city = city.trim();
        self.cities
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(city))
            .map(|(_, coordinates)| *coordinates)
            .ok_or_else(|| {
                log::info!("Fake provider does not know '{city}'");
                LoadError::CityNotFound {
                    city: city.to_string(),
                }
            })
    }

    async fn current_temperature(&self, coordinates: Coordinates) -> Result<f64, LoadError> {
        let noise: f64 = rand::rng().sample(StandardNormal);
        Ok(fake_temperature(coordinates, noise))
    }

    fn name(&self) -> &str {
        "fake"
    }
}
